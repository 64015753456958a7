//! Processing counters and the by-value status snapshot.

use crate::core::{BasePoint, GeoPoint};
use serde::Serialize;
use std::time::Duration;

/// Monotone counters accumulated across `process_fix` calls.
///
/// The only non-monotone movement is the reversal applied when a
/// linear-motion recovery retroactively reclassifies buffered rejections.
#[derive(Debug, Clone, Default)]
pub struct ProcessingStats {
    pub input_count: u64,
    pub accepted_count: u64,
    pub rejected_count: u64,
    pub rebuild_count: u64,
    /// Wall time spent inside `process_fix`
    pub processing_time: Duration,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of the input stream that was rejected, in [0, 1].
    pub fn filtering_rate(&self) -> f64 {
        self.rejected_count as f64 / self.input_count.max(1) as f64
    }

    pub fn processing_time_ms(&self) -> f64 {
        self.processing_time.as_secs_f64() * 1000.0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// By-value snapshot of the detector, safe to hand across any boundary.
/// Nothing in it aliases detector-owned state.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    /// Current sliding-window occupancy
    pub window_length: usize,
    pub accepted_count: u64,
    pub has_base_point: bool,
    /// Zero when no base point exists
    pub base_radius_m: f64,
    /// Current drift-buffer occupancy
    pub consecutive_drift_count: usize,
    /// Age of the base point as of the last processed fix (ms)
    pub base_age_ms: u64,
    /// Whether that age exceeds the validity period
    pub base_expired: bool,
    pub base_point: Option<BasePoint>,
    pub rejected_count: u64,
    pub rebuild_count: u64,
    /// Positions of the fixes that triggered each rebuild, in order
    pub rebuild_positions: Vec<GeoPoint>,
    pub processing_time_ms: f64,
    /// `rejected_count / max(input_count, 1)`
    pub filtering_rate: f64,
}
