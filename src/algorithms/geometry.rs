//! Point-set aggregates and the collinearity oracle used by the detector.

use crate::algorithms::geodesic::haversine_distance_m;
use crate::core::GeoPoint;
use std::fmt;

/// Errors from the point-set aggregates. `EmptyPointSet` is a programmer
/// error: the detector never calls these with an empty window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    EmptyPointSet { operation: &'static str },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::EmptyPointSet { operation } => {
                write!(f, "{} called on an empty point set", operation)
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Arithmetic mean of latitude and longitude. Acceptable for the detector's
/// use because the window spans well under a kilometer.
pub fn centroid(points: &[GeoPoint]) -> Result<GeoPoint, GeometryError> {
    if points.is_empty() {
        return Err(GeometryError::EmptyPointSet { operation: "centroid" });
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
    let lng = points.iter().map(|p| p.lng).sum::<f64>() / n;
    Ok(GeoPoint::new(lat, lng))
}

/// Coordinate-wise median: latitude and longitude are sorted independently
/// and the middles taken (averaged for even counts). The result is robust to
/// outliers and is not required to be one of the inputs.
pub fn median_point(points: &[GeoPoint]) -> Result<GeoPoint, GeometryError> {
    if points.is_empty() {
        return Err(GeometryError::EmptyPointSet { operation: "median_point" });
    }
    Ok(GeoPoint::new(
        median_of(points.iter().map(|p| p.lat).collect()),
        median_of(points.iter().map(|p| p.lng).collect()),
    ))
}

fn median_of(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    if n % 2 == 0 {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    } else {
        values[n / 2]
    }
}

/// Smallest interior angle of the triangle `p q r`, in degrees.
///
/// Side lengths come from the haversine distance; the law of cosines gives
/// the angles. Returns 0 when any side is degenerate. `acos` arguments are
/// clamped to [-1, 1] to absorb floating-point slack.
pub fn min_triangle_angle_deg(p: GeoPoint, q: GeoPoint, r: GeoPoint) -> f64 {
    let a = haversine_distance_m(q, r);
    let b = haversine_distance_m(p, r);
    let c = haversine_distance_m(p, q);
    if a == 0.0 || b == 0.0 || c == 0.0 {
        return 0.0;
    }
    let angle_p = ((b * b + c * c - a * a) / (2.0 * b * c)).clamp(-1.0, 1.0).acos();
    let angle_q = ((a * a + c * c - b * b) / (2.0 * a * c)).clamp(-1.0, 1.0).acos();
    let angle_r = ((a * a + b * b - c * c) / (2.0 * a * b)).clamp(-1.0, 1.0).acos();
    angle_p.min(angle_q).min(angle_r).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::geodesic::offset_by;

    #[test]
    fn test_centroid_of_symmetric_square() {
        let points = vec![
            GeoPoint::new(39.0, 116.0),
            GeoPoint::new(39.0, 116.2),
            GeoPoint::new(39.2, 116.0),
            GeoPoint::new(39.2, 116.2),
        ];
        let c = centroid(&points).unwrap();
        assert!((c.lat - 39.1).abs() < 1e-12);
        assert!((c.lng - 116.1).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_empty_fails() {
        assert_eq!(
            centroid(&[]),
            Err(GeometryError::EmptyPointSet { operation: "centroid" })
        );
    }

    #[test]
    fn test_median_resists_outlier() {
        let mut points: Vec<GeoPoint> =
            (0..9).map(|i| GeoPoint::new(39.0 + i as f64 * 1e-5, 116.0)).collect();
        // a 7 km outlier drags the centroid but not the median
        points.push(GeoPoint::new(39.95, 116.0));
        let m = median_point(&points).unwrap();
        let c = centroid(&points).unwrap();
        assert!(m.lat < 39.001);
        assert!(c.lat > 39.09);
    }

    #[test]
    fn test_median_even_count_averages_middles() {
        let points = vec![
            GeoPoint::new(1.0, 10.0),
            GeoPoint::new(2.0, 20.0),
            GeoPoint::new(3.0, 30.0),
            GeoPoint::new(4.0, 40.0),
        ];
        let m = median_point(&points).unwrap();
        assert_eq!(m.lat, 2.5);
        assert_eq!(m.lng, 25.0);
    }

    #[test]
    fn test_min_angle_equilateral() {
        let origin = GeoPoint::new(39.0, 116.0);
        let p = origin;
        let q = offset_by(origin, 1000.0, 0.0);
        let r = offset_by(origin, 1000.0, 60.0);
        let angle = min_triangle_angle_deg(p, q, r);
        assert!((angle - 60.0).abs() < 0.5, "got {}", angle);
    }

    #[test]
    fn test_min_angle_collinear_is_small() {
        let origin = GeoPoint::new(39.0, 116.0);
        let p = origin;
        let q = offset_by(origin, 500.0, 45.0);
        let r = offset_by(origin, 1000.0, 45.0);
        let angle = min_triangle_angle_deg(p, q, r);
        assert!(angle < 1.0, "got {}", angle);
    }

    #[test]
    fn test_min_angle_degenerate_side() {
        let p = GeoPoint::new(39.0, 116.0);
        let q = GeoPoint::new(39.01, 116.0);
        assert_eq!(min_triangle_angle_deg(p, p, q), 0.0);
    }
}
