//! Detector effectiveness scoring against simulator ground truth.
//!
//! A simulated fix is *corrupt* when it does not occur in the baseline: the
//! fabricated static-cluster fixes and every displaced fix differ from the
//! baseline in coordinates or existence, so the bit-exact dedup key tells
//! them apart. Tunnel and speed deletions remove fixes instead of corrupting
//! them and are therefore invisible to this per-fix comparison; they show up
//! through the rebuild statistics instead.

use crate::api::ProcessingResult;
use crate::core::Fix;
use crate::simulator::generator::SimulationResult;
use serde::Serialize;
use std::collections::HashSet;

/// How the detector's partition lines up with what the simulator injected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Fixes in the simulated track that are not baseline fixes
    pub corrupted_count: usize,
    /// Corrupt fixes the detector rejected
    pub detected_count: usize,
    /// Corrupt fixes the detector accepted
    pub missed_count: usize,
    /// Genuine baseline fixes the detector rejected
    pub false_rejection_count: usize,
    /// `detected / max(corrupted, 1)`
    pub detection_rate: f64,
    /// `false_rejections / max(genuine, 1)`
    pub false_rejection_rate: f64,
    /// Rebuilds the detector performed while processing the track
    pub rebuild_count: u64,
    /// Ground-truth markers the simulator emitted
    pub injected_anomaly_count: usize,
}

/// Score a processing result against the baseline the simulation started
/// from. `result` must come from running the detector over
/// `simulated.points`.
pub fn evaluate_detection(
    baseline: &[Fix],
    simulated: &SimulationResult,
    result: &ProcessingResult,
) -> EvaluationReport {
    let baseline_keys: HashSet<(u64, u64, u64)> =
        baseline.iter().map(Fix::dedup_key).collect();
    let is_corrupt = |fix: &Fix| !baseline_keys.contains(&fix.dedup_key());

    let corrupted_count = simulated.points.iter().filter(|f| is_corrupt(f)).count();
    let genuine_count = simulated.points.len() - corrupted_count;

    let detected_count = result.filtered_points.iter().filter(|f| is_corrupt(f)).count();
    let false_rejection_count = result.filtered_points.len() - detected_count;
    let missed_count = corrupted_count - detected_count;

    EvaluationReport {
        corrupted_count,
        detected_count,
        missed_count,
        false_rejection_count,
        detection_rate: detected_count as f64 / corrupted_count.max(1) as f64,
        false_rejection_rate: false_rejection_count as f64 / genuine_count.max(1) as f64,
        rebuild_count: result.statistics.rebuild_count,
        injected_anomaly_count: simulated.markers.len(),
    }
}
