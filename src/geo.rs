use crate::model::project_site::ProjectSite;

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance in metres between two points given in degrees (haversine).
///
/// NaN inputs propagate; callers guard before invoking.
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Outcome of checking a position against a site geofence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceVerdict {
    /// `None` when the site has no configured centre.
    pub distance_meters: Option<f64>,
    pub radius_meters: f64,
    pub within_radius: bool,
}

impl GeofenceVerdict {
    /// Rounded `(distance, radius)` as shown to the user.
    pub fn rounded(&self) -> (u64, u64) {
        let d = self.distance_meters.unwrap_or(0.0).round().max(0.0) as u64;
        (d, self.radius_meters.round().max(0.0) as u64)
    }
}

/// Boundary is inclusive. A site without coordinates admits every position.
pub fn evaluate(site: &ProjectSite, latitude: f64, longitude: f64) -> GeofenceVerdict {
    match site.centre() {
        Some((site_lat, site_lng)) => {
            let d = distance(latitude, longitude, site_lat, site_lng);
            GeofenceVerdict {
                distance_meters: Some(d),
                radius_meters: site.radius_meters,
                within_radius: d <= site.radius_meters,
            }
        }
        None => GeofenceVerdict {
            distance_meters: None,
            radius_meters: site.radius_meters,
            within_radius: true,
        },
    }
}

/// Finite and inside the WGS84 ranges.
pub fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}
