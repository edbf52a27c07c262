//! Geographic positions and great-circle distance.

use serde::{Deserialize, Serialize};

/// Sphere radius used for spherical distance queries, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_100.0;

/// A longitude/latitude pair.
///
/// On the wire this is a GeoJSON point: `{"type": "Point", "coordinates": [lng, lat]}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "GeoJsonPoint", try_from = "GeoJsonPoint")]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Check that both coordinates are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }
}

/// Haversine distance between two lat/lng pairs (degrees), in meters.
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Clamp guards against rounding pushing `a` just past 1.0 for antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// GeoJSON wire form of a point.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeoJsonPoint {
    #[serde(rename = "type")]
    kind: String,
    coordinates: [f64; 2],
}

impl From<GeoPoint> for GeoJsonPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            kind: "Point".into(),
            coordinates: [point.longitude, point.latitude],
        }
    }
}

impl TryFrom<GeoJsonPoint> for GeoPoint {
    type Error = String;

    fn try_from(value: GeoJsonPoint) -> Result<Self, Self::Error> {
        if value.kind != "Point" {
            return Err(format!("expected GeoJSON Point, got {}", value.kind));
        }
        let [longitude, latitude] = value.coordinates;
        Ok(GeoPoint {
            longitude,
            latitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity() {
        assert!(GeoPoint::new(77.59, 12.97).is_valid());
        assert!(GeoPoint::new(-180.0, 90.0).is_valid());
        assert!(!GeoPoint::new(180.5, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -91.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_zero_distance() {
        assert_eq!(haversine_m(12.97, 77.59, 12.97, 77.59), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let expected = EARTH_RADIUS_M * 1f64.to_radians();
        assert!((haversine_m(0.0, 0.0, 1.0, 0.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let there = haversine_m(12.97, 77.59, 19.07, 72.87);
        let back = haversine_m(19.07, 72.87, 12.97, 77.59);
        assert!((there - back).abs() < 1e-6);
        // Bangalore to Mumbai is roughly 840 km
        let km = there / 1000.0;
        assert!(km > 800.0 && km < 880.0, "got {km}");
    }

    #[test]
    fn test_geojson_wire_form() {
        let p = GeoPoint::new(77.59, 12.97);
        let json = serde_json::to_value(p).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], 77.59);
        assert_eq!(json["coordinates"][1], 12.97);

        let back: GeoPoint = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);

        let bad = serde_json::json!({"type": "Polygon", "coordinates": [0.0, 0.0]});
        assert!(serde_json::from_value::<GeoPoint>(bad).is_err());
    }
}
