//! Geodesic and geometry kernel
//!
//! Pure, stateless functions shared by the detector and the simulator.

pub mod gcj02;
pub mod geodesic;
pub mod geometry;

pub use gcj02::wgs84_to_gcj02;
pub use geodesic::{angle_diff_deg, enu_offset_m, haversine_distance_m, initial_bearing_deg, offset_by};
pub use geometry::{centroid, median_point, min_triangle_angle_deg, GeometryError};
