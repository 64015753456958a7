//! GPS Trajectory Drift Filter
//!
//! Filters raw GPS trajectories to remove spurious position reports caused
//! by multipath, signal loss, or receiver noise, while preserving genuine
//! motion. The filter is strictly causal with bounded state: a moving
//! reference (the base point) with a lifetime and a radius, a classifier
//! that rejects outliers relative to that reference, and a recovery
//! protocol that tells sustained drift apart from a legitimate high-speed
//! straight line. A seeded anomaly simulator builds the evaluation corpus.

pub mod algorithms;
pub mod api;
pub mod core;
pub mod detector;
pub mod input;
pub mod simulator;

// Re-export commonly used types
pub use crate::core::{AnomalyMarker, BasePoint, ExtendedFix, Fix, GeoPoint, MarkerKind};
pub use algorithms::{haversine_distance_m, min_triangle_angle_deg};
pub use api::{
    export_fixes_csv, export_fixes_json, export_result_json, CoordinateFrame, ProcessingResult,
    TrackSimulator, TrajectoryDetector,
};
pub use detector::{
    DetectorConfig, DetectorConfigUpdate, DriftDetector, FixVerdict, StatusSnapshot,
};
pub use input::{
    load_from_json, load_from_json_str, parse_csv, parse_from_string, ParseOutcome, ParseWarning,
};
pub use simulator::{
    evaluate_detection, AnomalySimulator, EvaluationReport, SimulationResult, SimulatorConfig,
};
