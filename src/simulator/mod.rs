//! Synthetic-anomaly generation
//!
//! Turns a clean baseline trajectory into a corrupted one plus ground-truth
//! markers, defining the anomaly taxonomy the detector is evaluated against.

pub mod config;
pub mod evaluation;
pub mod generator;
pub mod plan;

pub use config::{DriftBand, SimulatorConfig, SimulatorConfigError};
pub use evaluation::{evaluate_detection, EvaluationReport};
pub use generator::{AnomalySimulator, SimulationResult};
pub use plan::{AnomalySpan, AnomalyType};
