//! Public API surface
//!
//! Capability traits over the concrete detector and simulator, the batch
//! processing result, and the output formatters.

pub mod formatting;
pub mod types;

pub use formatting::{export_fixes_csv, export_fixes_json, export_result_json, CoordinateFrame};
pub use types::{ProcessingResult, TrackSimulator, TrajectoryDetector};
