use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters; the spherical approximation used throughout.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Exactly `(0, 0)` means "no location supplied", not the Gulf of
    /// Guinea. Callers that genuinely mean the null island cannot express
    /// it; that trade-off is accepted.
    pub fn is_unset(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }

    pub fn in_bounds(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Great-circle distance in meters between two coordinates, via the
/// Haversine formula on a spherical Earth.
pub fn haversine_distance(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);

    // Rounding can push `a` a hair past 1.0 for antipodal points, which
    // would feed sqrt a negative argument.
    let a = a.min(1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coincident_points_have_zero_distance() {
        let jakarta = Coordinate::new(-6.2088, 106.8456);

        assert_eq!(haversine_distance(jakarta, jakarta), 0.0);
        assert_eq!(
            haversine_distance(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0)),
            0.0
        );
    }

    #[test]
    fn hundred_meters_due_north() {
        // 0.0009 degrees of latitude is roughly 100 meters anywhere.
        let office = Coordinate::new(-6.2088, 106.8456);
        let north = Coordinate::new(-6.2088 + 0.0009, 106.8456);

        let distance = haversine_distance(office, north);

        assert!((distance - 100.0).abs() < 1.0, "expected ~100m, got {distance}");
    }

    #[test]
    fn antipodal_points_are_half_the_circumference() {
        let distance = haversine_distance(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_METERS;

        assert!(distance.is_finite());
        assert!((distance - half_circumference).abs() < 1.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(-6.2088, 106.8456);
        let b = Coordinate::new(-6.1751, 106.8650);

        assert!((haversine_distance(a, b) - haversine_distance(b, a)).abs() < 1e-9);
    }

    #[test]
    fn sentinel_and_bounds() {
        assert!(Coordinate::new(0.0, 0.0).is_unset());
        assert!(!Coordinate::new(0.0, 0.1).is_unset());

        assert!(Coordinate::new(90.0, 180.0).in_bounds());
        assert!(!Coordinate::new(90.5, 0.0).in_bounds());
        assert!(!Coordinate::new(0.0, -180.5).in_bounds());
    }
}
