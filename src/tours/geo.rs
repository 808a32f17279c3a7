use serde::Serialize;

use crate::error::ApiError;
use crate::tours::repo::LocationSource;

pub const EARTH_RADIUS_MI: f64 = 3963.2;
pub const EARTH_RADIUS_KM: f64 = 6378.1;

/// Radius used to express great-circle angles as meters before the unit
/// multipliers are applied.
const MEAN_EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Miles,
    Kilometers,
}

impl Unit {
    /// "mi" selects miles; any other value falls back to kilometers.
    pub fn from_param(param: &str) -> Self {
        if param == "mi" {
            Unit::Miles
        } else {
            Unit::Kilometers
        }
    }

    pub fn earth_radius(self) -> f64 {
        match self {
            Unit::Miles => EARTH_RADIUS_MI,
            Unit::Kilometers => EARTH_RADIUS_KM,
        }
    }

    /// Converts a surface distance in this unit to an angular radius in
    /// radians.
    pub fn angular_radius(self, distance: f64) -> f64 {
        distance / self.earth_radius()
    }

    /// Multiplier taking meters to this unit.
    pub fn meters_multiplier(self) -> f64 {
        match self {
            Unit::Miles => 0.000621371,
            Unit::Kilometers => 0.001,
        }
    }
}

/// Parses a "lat,lng" path segment. Both halves must be finite numbers;
/// anything else is a client error and no query runs afterwards.
pub fn parse_latlng(latlng: &str) -> Result<(f64, f64), ApiError> {
    let mut parts = latlng.splitn(2, ',');
    let lat = parts.next().map(str::trim).and_then(|s| s.parse::<f64>().ok());
    let lng = parts.next().map(str::trim).and_then(|s| s.parse::<f64>().ok());

    match (lat, lng) {
        (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Ok((lat, lng)),
        _ => Err(ApiError::Validation(
            "Please provide latitude and longitude in the format lat,lng".into(),
        )),
    }
}

/// Great-circle angle between two (lat, lng) points, in radians (haversine).
pub fn central_angle(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lng1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lng2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

pub fn distance_meters(a: (f64, f64), b: (f64, f64)) -> f64 {
    central_angle(a, b) * MEAN_EARTH_RADIUS_M
}

/// Spherical-cap membership test against an angular radius in radians.
pub fn within_radius(center: (f64, f64), point: (f64, f64), angular_radius: f64) -> bool {
    central_angle(center, point) <= angular_radius
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourDistance {
    pub name: String,
    pub distance: f64,
}

/// Distance from `center` to every tour start location, scaled to `unit`,
/// nearest first.
pub fn distances_from(
    center: (f64, f64),
    locations: &[LocationSource],
    unit: Unit,
) -> Vec<TourDistance> {
    let multiplier = unit.meters_multiplier();
    let mut out: Vec<TourDistance> = locations
        .iter()
        .map(|loc| TourDistance {
            name: loc.name.clone(),
            distance: distance_meters(center, (loc.start_lat, loc.start_lng)) * multiplier,
        })
        .collect();
    out.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn location(name: &str, lat: f64, lng: f64) -> LocationSource {
        LocationSource {
            id: Uuid::new_v4(),
            name: name.to_string(),
            start_lat: lat,
            start_lng: lng,
        }
    }

    #[test]
    fn unit_parsing_defaults_to_kilometers() {
        assert_eq!(Unit::from_param("mi"), Unit::Miles);
        assert_eq!(Unit::from_param("km"), Unit::Kilometers);
        assert_eq!(Unit::from_param("furlongs"), Unit::Kilometers);
        assert_eq!(Unit::from_param(""), Unit::Kilometers);
    }

    #[test]
    fn angular_radius_divides_by_earth_radius() {
        let radius = Unit::Miles.angular_radius(100.0);
        assert!((radius - 0.02523).abs() < 1e-5);
        assert!((Unit::Kilometers.angular_radius(100.0) - 100.0 / 6378.1).abs() < 1e-12);
    }

    #[test]
    fn radius_conversion_is_unit_consistent() {
        // The same physical distance expressed in either unit must produce
        // the same angular radius, hence the same spherical cap.
        let miles = 100.0;
        let kilometers = miles * EARTH_RADIUS_KM / EARTH_RADIUS_MI;
        let from_miles = Unit::Miles.angular_radius(miles);
        let from_km = Unit::Kilometers.angular_radius(kilometers);
        assert!((from_miles - from_km).abs() < 1e-12);

        let center = (34.05, -118.25);
        let points = [(34.5, -118.0), (35.9, -116.0), (34.05, -118.25)];
        for point in points {
            assert_eq!(
                within_radius(center, point, from_miles),
                within_radius(center, point, from_km)
            );
        }
    }

    #[test]
    fn latlng_parsing_accepts_signed_decimals() {
        assert_eq!(parse_latlng("34.05,-118.25").unwrap(), (34.05, -118.25));
        assert_eq!(parse_latlng(" 10 , 20 ").unwrap(), (10.0, 20.0));
    }

    #[test]
    fn latlng_parsing_rejects_garbage_before_any_query() {
        for bad in ["", "34.05", "34.05,", ",-118.25", "abc,-118.25", "34.05,xyz", "NaN,10"] {
            let err = parse_latlng(bad).unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "{bad:?} should fail");
        }
    }

    #[test]
    fn central_angle_is_zero_for_identical_points() {
        assert_eq!(central_angle((51.5, -0.1), (51.5, -0.1)), 0.0);
    }

    #[test]
    fn one_degree_of_longitude_on_the_equator() {
        // One degree of arc is about 111.19 km on the mean sphere.
        let meters = distance_meters((0.0, 0.0), (0.0, 1.0));
        assert!((meters - 111_195.0).abs() < 100.0);
    }

    #[test]
    fn distances_are_scaled_by_the_unit_multiplier() {
        let locations = [location("Equator Step", 0.0, 1.0)];
        let km = distances_from((0.0, 0.0), &locations, Unit::Kilometers);
        let mi = distances_from((0.0, 0.0), &locations, Unit::Miles);
        let meters = distance_meters((0.0, 0.0), (0.0, 1.0));
        assert!((km[0].distance - meters * 0.001).abs() < 1e-9);
        assert!((mi[0].distance - meters * 0.000621371).abs() < 1e-9);
    }

    #[test]
    fn distances_are_sorted_nearest_first() {
        let locations = [
            location("Far", 40.0, 40.0),
            location("Near", 1.0, 1.0),
            location("Mid", 10.0, 10.0),
        ];
        let result = distances_from((0.0, 0.0), &locations, Unit::Kilometers);
        let names: Vec<_> = result.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Near", "Mid", "Far"]);
        for pair in result.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn within_radius_bounds_the_cap() {
        let center = (34.05, -118.25);
        let radius = Unit::Miles.angular_radius(100.0);
        // Roughly 30 miles away.
        assert!(within_radius(center, (34.4, -118.6), radius));
        // Several hundred miles away.
        assert!(!within_radius(center, (40.7, -74.0), radius));
        // The center itself is always inside.
        assert!(within_radius(center, center, radius));
    }
}
