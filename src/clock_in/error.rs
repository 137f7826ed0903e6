use thiserror::Error;

use crate::device::camera::CameraError;
use crate::device::geolocation::LocationError;
use crate::offline::QueueError;

#[derive(Debug, Error)]
pub enum ClockInError {
    #[error("{0}")]
    Camera(#[from] CameraError),
    #[error("{0}")]
    Location(#[from] LocationError),
    #[error("You are {distance_meters}m away from {site}. Required: {radius_meters}m")]
    OutsideGeofence {
        site: String,
        distance_meters: u64,
        radius_meters: u64,
    },
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
    #[error("Could not save attendance: {0}")]
    Queue(#[from] QueueError),
}
