//! Great-circle distance and the proximity predicate.

use crate::error::ValidationError;
use crate::rules::{EARTH_RADIUS_METERS, UNLOCK_RADIUS_METERS};
use serde::{Deserialize, Serialize};

/// WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ValidationError::InvalidValue {
                field: "latitude".to_string(),
                reason: format!("{} is outside [-90, 90]", self.latitude),
            });
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ValidationError::InvalidValue {
                field: "longitude".to_string(),
                reason: format!("{} is outside [-180, 180]", self.longitude),
            });
        }
        Ok(())
    }
}

/// Haversine distance in meters. Non-finite input yields `f64::INFINITY`.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    if !(a.latitude.is_finite()
        && a.longitude.is_finite()
        && b.latitude.is_finite()
        && b.longitude.is_finite())
    {
        return f64::INFINITY;
    }

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h slightly past 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Distance from an optional position fix. No fix means "infinitely far".
pub fn distance_from_fix(current: Option<Coordinate>, target: Coordinate) -> f64 {
    match current {
        Some(position) => distance_meters(position, target),
        None => f64::INFINITY,
    }
}

/// Strict less-than: a distance equal to the threshold is out of range.
pub fn within_threshold(distance_m: f64, threshold_m: f64) -> bool {
    distance_m < threshold_m
}

pub fn is_within_range(current: Coordinate, target: Coordinate, threshold_m: f64) -> bool {
    within_threshold(distance_meters(current, target), threshold_m)
}

/// Result of a proximity check, kept around so callers can render "x m away".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProximityCheck {
    pub distance_m: f64,
    pub threshold_m: f64,
    pub within_range: bool,
}

impl ProximityCheck {
    pub fn evaluate(current: Option<Coordinate>, target: Coordinate, threshold_m: f64) -> Self {
        let distance_m = distance_from_fix(current, target);
        Self {
            distance_m,
            threshold_m,
            within_range: within_threshold(distance_m, threshold_m),
        }
    }

    /// Check against the game-wide unlock radius.
    pub fn for_unlock(current: Option<Coordinate>, target: Coordinate) -> Self {
        Self::evaluate(current, target, UNLOCK_RADIUS_METERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campus() -> Coordinate {
        Coordinate::new(40.7128, -74.0060)
    }

    #[test]
    fn test_identical_points_are_zero_apart() {
        assert_eq!(distance_meters(campus(), campus()), 0.0);
    }

    #[test]
    fn test_thousandth_degree_latitude_is_about_111m() {
        let a = Coordinate::new(10.0, 20.0);
        let b = Coordinate::new(10.001, 20.0);
        let d = distance_meters(a, b);
        assert_eq!(d.round(), 111.0);
    }

    #[test]
    fn test_antipodal_points_are_finite() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        let d = distance_meters(a, b);
        assert!(d.is_finite());
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_METERS;
        assert!((d - half_circumference).abs() < 1.0);

        let north = Coordinate::new(90.0, 0.0);
        let south = Coordinate::new(-90.0, 0.0);
        assert!(distance_meters(north, south).is_finite());
    }

    #[test]
    fn test_missing_fix_is_never_near() {
        assert_eq!(distance_from_fix(None, campus()), f64::INFINITY);
        let check = ProximityCheck::for_unlock(None, campus());
        assert!(!check.within_range);
    }

    #[test]
    fn test_non_finite_coordinate_is_infinitely_far() {
        let bad = Coordinate::new(f64::NAN, 0.0);
        assert_eq!(distance_meters(bad, campus()), f64::INFINITY);
    }

    #[test]
    fn test_threshold_boundary_is_exclusive() {
        assert!(!within_threshold(50.0, UNLOCK_RADIUS_METERS));
        assert!(within_threshold(49.999, UNLOCK_RADIUS_METERS));
    }

    #[test]
    fn test_is_within_range_uses_strict_inequality() {
        let a = Coordinate::new(51.5007, -0.1246);
        let b = Coordinate::new(51.5010, -0.1246);
        let d = distance_meters(a, b);
        assert!(!is_within_range(a, b, d));
        assert!(is_within_range(a, b, d + 0.001));
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(45.0, 90.0).validate().is_ok());
        assert!(Coordinate::new(91.0, 0.0).validate().is_err());
        assert!(Coordinate::new(0.0, -180.5).validate().is_err());
        assert!(!Coordinate::new(f64::INFINITY, 0.0).is_valid());
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_coordinate() -> impl Strategy<Value = Coordinate> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lon)| Coordinate::new(lat, lon))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_distance_to_self_is_zero(p in arb_coordinate()) {
            prop_assert_eq!(distance_meters(p, p), 0.0);
        }

        #[test]
        fn prop_distance_is_symmetric(a in arb_coordinate(), b in arb_coordinate()) {
            let ab = distance_meters(a, b);
            let ba = distance_meters(b, a);
            prop_assert!((ab - ba).abs() <= 1e-9 * ab.max(1.0));
        }

        #[test]
        fn prop_distance_is_bounded(a in arb_coordinate(), b in arb_coordinate()) {
            let d = distance_meters(a, b);
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_METERS + 1.0);
        }
    }
}
