//! WGS-84 → GCJ-02 coordinate shift for Chinese map bases.
//!
//! Renderer support only: the detector never consults this transform. Points
//! outside the mainland bounding box pass through unchanged.

use crate::core::constants::{GCJ02_BBOX, GCJ02_ECCENTRICITY_SQ, GCJ02_SEMI_MAJOR_M};
use crate::core::GeoPoint;
use std::f64::consts::PI;

/// Whether the transform applies at all; outside this box GCJ-02 equals
/// WGS-84.
pub fn in_china_bbox(p: GeoPoint) -> bool {
    let (lng_min, lng_max, lat_min, lat_max) = GCJ02_BBOX;
    p.lng >= lng_min && p.lng <= lng_max && p.lat >= lat_min && p.lat <= lat_max
}

/// Apply the standard closed-form perturbation, bypassed outside the
/// bounding box.
pub fn wgs84_to_gcj02(p: GeoPoint) -> GeoPoint {
    if !in_china_bbox(p) {
        return p;
    }
    let x = p.lng - 105.0;
    let y = p.lat - 35.0;
    let mut dlat = transform_lat(x, y);
    let mut dlng = transform_lng(x, y);

    let rad_lat = p.lat / 180.0 * PI;
    let mut magic = rad_lat.sin();
    magic = 1.0 - GCJ02_ECCENTRICITY_SQ * magic * magic;
    let sqrt_magic = magic.sqrt();
    dlat = (dlat * 180.0) / ((GCJ02_SEMI_MAJOR_M * (1.0 - GCJ02_ECCENTRICITY_SQ)) / (magic * sqrt_magic) * PI);
    dlng = (dlng * 180.0) / (GCJ02_SEMI_MAJOR_M / sqrt_magic * rad_lat.cos() * PI);

    GeoPoint::new(p.lat + dlat, p.lng + dlng)
}

fn transform_lat(x: f64, y: f64) -> f64 {
    let mut ret = -100.0 + 2.0 * x + 3.0 * y + 0.2 * y * y + 0.1 * x * y + 0.2 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (y * PI).sin() + 40.0 * (y / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (160.0 * (y / 12.0 * PI).sin() + 320.0 * (y * PI / 30.0).sin()) * 2.0 / 3.0;
    ret
}

fn transform_lng(x: f64, y: f64) -> f64 {
    let mut ret = 300.0 + x + 2.0 * y + 0.1 * x * x + 0.1 * x * y + 0.1 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (x * PI).sin() + 40.0 * (x / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (150.0 * (x / 12.0 * PI).sin() + 300.0 * (x / 30.0 * PI).sin()) * 2.0 / 3.0;
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::geodesic::haversine_distance_m;

    #[test]
    fn test_outside_bbox_is_identity() {
        let sf = GeoPoint::new(37.7749, -122.4194);
        assert_eq!(wgs84_to_gcj02(sf), sf);
        let sydney = GeoPoint::new(-33.8688, 151.2093);
        assert_eq!(wgs84_to_gcj02(sydney), sydney);
    }

    #[test]
    fn test_beijing_shift_magnitude() {
        let beijing = GeoPoint::new(39.9042, 116.4074);
        let shifted = wgs84_to_gcj02(beijing);
        let d = haversine_distance_m(beijing, shifted);
        // the documented offset in eastern China is a few hundred meters
        assert!(d > 100.0 && d < 1000.0, "shift was {} m", d);
    }

    #[test]
    fn test_bbox_edges() {
        assert!(in_china_bbox(GeoPoint::new(0.8293, 72.004)));
        assert!(in_china_bbox(GeoPoint::new(55.8271, 137.8347)));
        assert!(!in_china_bbox(GeoPoint::new(0.8292, 100.0)));
        assert!(!in_china_bbox(GeoPoint::new(30.0, 137.84)));
    }
}
