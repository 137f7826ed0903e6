pub mod api;
pub mod auth;
pub mod clock_in;
pub mod config;
pub mod db;
pub mod device;
pub mod docs;
pub mod geo;
pub mod liveness;
pub mod model;
pub mod models;
pub mod offline;
pub mod routes;
pub mod state;
pub mod store;
pub mod sync;
pub mod utils;
pub mod writer;
