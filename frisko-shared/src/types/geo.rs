use serde::{Deserialize, Serialize};

/// Earth radius in km
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        validate_coordinates(self.lat, self.lng)
    }

    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        haversine_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Haversine distance in km between two lat/lng points.
///
/// Defined for all real inputs; callers validate ranges beforehand,
/// out-of-range coordinates produce a meaningless (but finite) result.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// lat in [-90, 90], lng in [-180, 180], both finite.
pub fn validate_coordinates(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_zero_distance() {
        assert_eq!(haversine_km(45.815, 15.9819, 45.815, 15.9819), 0.0);
        assert_eq!(haversine_km(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let d1 = haversine_km(45.815, 15.9819, 43.5081, 16.4402);
        let d2 = haversine_km(43.5081, 16.4402, 45.815, 15.9819);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn zagreb_neighbourhood_distance_scale() {
        // Two points in Zagreb, roughly 2 km apart
        let d = haversine_km(45.8150, 15.9819, 45.8000, 15.9700);
        assert!(d > 1.0 && d < 3.0, "expected ~2 km, got {d}");
    }

    #[test]
    fn zagreb_split_distance_scale() {
        // Zagreb to Split is roughly 260 km as the crow flies
        let d = haversine_km(45.815, 15.9819, 43.5081, 16.4402);
        assert!(d > 240.0 && d < 280.0, "expected ~260 km, got {d}");
    }

    #[test]
    fn coordinate_validation_ranges() {
        assert!(validate_coordinates(45.815, 15.9819));
        assert!(validate_coordinates(-90.0, 180.0));
        assert!(!validate_coordinates(90.1, 0.0));
        assert!(!validate_coordinates(0.0, -180.5));
        assert!(!validate_coordinates(f64::NAN, 0.0));
        assert!(!validate_coordinates(0.0, f64::INFINITY));
    }
}
