//! Great-circle and local-tangent-plane primitives.
//!
//! All functions are pure and re-entrant. Distances assume the spherical
//! Earth model with the mean radius from `core::constants`; the window the
//! detector operates over spans far less than a kilometer, where the
//! spherical error is negligible.

use crate::core::constants::EARTH_RADIUS_M;
use crate::core::GeoPoint;
use nalgebra::Vector2;

/// Great-circle distance in meters between two geodetic points (haversine).
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Forward azimuth from `a` to `b` in degrees, north-clockwise, in [0, 360).
pub fn initial_bearing_deg(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let y = dlng.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlng.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Circular difference between two bearings in degrees, in [0, 180].
pub fn angle_diff_deg(alpha: f64, beta: f64) -> f64 {
    let d = (alpha - beta).rem_euclid(360.0);
    if d > 180.0 { 360.0 - d } else { d }
}

/// East/north displacement of `p` relative to `origin` on the local tangent
/// plane, in meters.
pub fn enu_offset_m(origin: GeoPoint, p: GeoPoint) -> Vector2<f64> {
    let east = (p.lng - origin.lng).to_radians() * EARTH_RADIUS_M * origin.lat.to_radians().cos();
    let north = (p.lat - origin.lat).to_radians() * EARTH_RADIUS_M;
    Vector2::new(east, north)
}

/// Displace `origin` by `distance_m` meters along `bearing_deg`
/// (north-clockwise), using the local-tangent approximation.
pub fn offset_by(origin: GeoPoint, distance_m: f64, bearing_deg: f64) -> GeoPoint {
    let theta = bearing_deg.to_radians();
    let displacement = Vector2::new(distance_m * theta.sin(), distance_m * theta.cos());
    let dlat = (displacement.y / EARTH_RADIUS_M).to_degrees();
    let dlng = (displacement.x / (EARTH_RADIUS_M * origin.lat.to_radians().cos())).to_degrees();
    GeoPoint::new(origin.lat + dlat, origin.lng + dlng)
}
