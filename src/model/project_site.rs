use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Geofence radius used when a site row carries none.
pub const DEFAULT_RADIUS_METERS: f64 = 200.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "title": "Harbour Tower",
        "latitude": 23.8103,
        "longitude": 90.4125,
        "radius_meters": 200.0
    })
)]
pub struct ProjectSite {
    #[schema(example = 7)]
    pub id: u64,

    #[schema(example = "Harbour Tower")]
    pub title: String,

    #[schema(example = 23.8103, nullable = true)]
    pub latitude: Option<f64>,

    #[schema(example = 90.4125, nullable = true)]
    pub longitude: Option<f64>,

    #[schema(example = 200.0)]
    pub radius_meters: f64,
}

impl ProjectSite {
    /// Site centre, only when both coordinates are configured.
    pub fn centre(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}
