pub mod site_cache;
