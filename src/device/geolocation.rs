use async_trait::async_trait;
use thiserror::Error;

/// A device location fix, degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self { high_accuracy: true }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("Geolocation is not supported by this device")]
    Unsupported,
    #[error("Location permission denied: {0}")]
    Denied(String),
    #[error("Location unavailable: {0}")]
    Unavailable(String),
    #[error("Timed out waiting for a location fix")]
    Timeout,
}

/// Source of the device's current position.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self, options: PositionOptions) -> Result<Position, LocationError>;
}
