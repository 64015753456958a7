//! Capability traits and the batch processing result.
//!
//! Each subsystem is usable through a small trait so alternative
//! implementations (a Kalman-style detector, a replay-driven simulator) can
//! slot in behind the same seams. One concrete implementation of each
//! exists today.

use crate::core::{AnomalyMarker, Fix};
use crate::detector::{ConfigError, DetectorConfigUpdate, DriftDetector, FixVerdict, StatusSnapshot};
use crate::simulator::{AnomalySimulator, SimulationResult};
use serde::Serialize;

/// Result of running a whole trajectory through a detector: the partition of
/// the input, the statistics snapshot, and the markers recorded along the
/// way.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    pub original_points: Vec<Fix>,
    /// Accepted fixes, in acceptance order
    pub processed_points: Vec<Fix>,
    /// Rejected fixes, in rejection order
    pub filtered_points: Vec<Fix>,
    pub statistics: StatusSnapshot,
    pub markers: Vec<AnomalyMarker>,
}

/// The detector capability set.
pub trait TrajectoryDetector {
    /// Classify one fix; calls must arrive in timestamp order.
    fn process_fix(&mut self, fix: Fix) -> FixVerdict;
    /// Run a batch; an empty input yields an empty result, not an error.
    fn process_trajectory(&mut self, fixes: &[Fix]) -> ProcessingResult;
    /// By-value snapshot of the current state.
    fn status(&self) -> StatusSnapshot;
    /// Apply a partial configuration update.
    fn set_config(&mut self, update: DetectorConfigUpdate) -> Result<(), ConfigError>;
}

impl TrajectoryDetector for DriftDetector {
    fn process_fix(&mut self, fix: Fix) -> FixVerdict {
        DriftDetector::process_fix(self, fix)
    }

    fn process_trajectory(&mut self, fixes: &[Fix]) -> ProcessingResult {
        DriftDetector::process_trajectory(self, fixes)
    }

    fn status(&self) -> StatusSnapshot {
        DriftDetector::status(self)
    }

    fn set_config(&mut self, update: DetectorConfigUpdate) -> Result<(), ConfigError> {
        DriftDetector::set_config(self, update)
    }
}

/// The simulator capability set.
pub trait TrackSimulator {
    /// Corrupt a baseline reproducibly from a seed.
    fn generate_simulated(&self, baseline: &[Fix], seed: u64) -> SimulationResult;
}

impl TrackSimulator for AnomalySimulator {
    fn generate_simulated(&self, baseline: &[Fix], seed: u64) -> SimulationResult {
        self.generate(baseline, seed)
    }
}
