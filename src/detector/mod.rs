//! Streaming drift detection
//!
//! The per-fix accept/reject state machine, its configuration, the
//! detector-owned window and buffer state, and the statistics it reports.

pub mod config;
pub mod drift;
pub mod state;
pub mod stats;

pub use config::{ConfigError, DetectorConfig, DetectorConfigUpdate};
pub use drift::{DriftDetector, FixVerdict};
pub use state::DetectorState;
pub use stats::{ProcessingStats, StatusSnapshot};
