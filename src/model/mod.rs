pub mod attendance;
pub mod project_site;
pub mod role;
