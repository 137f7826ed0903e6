pub mod camera;
pub mod geolocation;
