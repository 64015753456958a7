//! The streaming drift detector and base-point manager.
//!
//! One detector owns one trajectory: its sliding window, drift buffer, base
//! point, partitions, markers, and counters are never shared. Concurrent
//! trajectories get independent detectors. `process_fix` is O(W) time and
//! O(W + M) memory with no suspension points; calls must arrive in
//! timestamp order (out-of-order fixes are processed in arrival order, not
//! reordered).

use crate::algorithms::geometry::min_triangle_angle_deg;
use crate::algorithms::haversine_distance_m;
use crate::api::ProcessingResult;
use crate::core::{AnomalyMarker, BasePoint, Fix, GeoPoint, MarkerKind};
use crate::detector::config::{ConfigError, DetectorConfig, DetectorConfigUpdate};
use crate::detector::state::{
    build_base_initial, build_base_rebuild, DetectorState, DriftBuffer, SlidingWindow,
};
use crate::detector::stats::{ProcessingStats, StatusSnapshot};
use std::time::Instant;

/// Ratio of `drift_multiplier * radius` within which three collinear
/// rejections still count as plausible straight-line motion rather than a
/// teleport.
const LINEAR_RECOVERY_REACH: f64 = 5.0;

/// Outcome of processing one fix.
///
/// Every variant except `Rejected` is an acceptance; the recovery variants
/// additionally report which path installed a fresh base point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixVerdict {
    Accepted,
    Rejected,
    /// Three collinear rejections were reclassified as straight-line motion;
    /// `reclaimed` counts every buffered fix moved to accepted, the
    /// triggering fix included.
    LinearRecovery { reclaimed: usize },
    /// The drift buffer filled: the cluster of rejections became the new
    /// truth and the triggering fix was accepted.
    ForcedRebuild,
}

impl FixVerdict {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, FixVerdict::Rejected)
    }
}

/// Streaming drift detector. See the module docs for the ownership and
/// ordering contract.
#[derive(Debug)]
pub struct DriftDetector {
    config: DetectorConfig,
    state: DetectorState,
    window: SlidingWindow,
    drift_buffer: DriftBuffer,
    accepted: Vec<Fix>,
    rejected: Vec<Fix>,
    markers: Vec<AnomalyMarker>,
    rebuild_positions: Vec<GeoPoint>,
    stats: ProcessingStats,
    last_fix_t: Option<u64>,
}

impl Default for DriftDetector {
    fn default() -> Self {
        Self::with_valid_config(DetectorConfig::default())
    }
}

impl DriftDetector {
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: DetectorConfig) -> Self {
        let window = SlidingWindow::new(config.window_size);
        let drift_buffer = DriftBuffer::new(config.max_drift_sequence);
        Self {
            config,
            state: DetectorState::Warmup,
            window,
            drift_buffer,
            accepted: Vec::new(),
            rejected: Vec::new(),
            markers: Vec::new(),
            rebuild_positions: Vec::new(),
            stats: ProcessingStats::new(),
            last_fix_t: None,
        }
    }

    /// Classify one fix. Decisions depend only on fixes seen so far; the
    /// expiry test compares fix timestamps, so replaying a logged trajectory
    /// is deterministic.
    pub fn process_fix(&mut self, fix: Fix) -> FixVerdict {
        let started = Instant::now();
        self.stats.input_count += 1;
        self.last_fix_t = Some(fix.t);

        let verdict = match self.state {
            DetectorState::Warmup => self.accept_warmup(fix),
            DetectorState::Tracking(base) => {
                if base.age_ms(fix.t) > self.config.validity_period_ms {
                    self.restart_after_expiry(fix)
                } else {
                    self.classify_tracking(fix, base)
                }
            }
        };

        self.stats.processing_time += started.elapsed();
        verdict
    }

    /// Run a whole trajectory through `process_fix`. An empty input yields
    /// an empty partition with zeroed statistics, not an error.
    pub fn process_trajectory(&mut self, fixes: &[Fix]) -> ProcessingResult {
        for fix in fixes {
            self.process_fix(*fix);
        }
        ProcessingResult {
            original_points: fixes.to_vec(),
            processed_points: self.accepted.clone(),
            filtered_points: self.rejected.clone(),
            statistics: self.status(),
            markers: self.markers.clone(),
        }
    }

    // Step 1: no drift check during warmup; the first W fixes are taken on
    // faith and seed the reference.
    fn accept_warmup(&mut self, fix: Fix) -> FixVerdict {
        self.window.push(fix);
        self.accept(fix);
        if self.window.is_full() {
            let base = build_base_initial(&self.window, fix.t)
                .expect("a full window is never empty");
            self.state = DetectorState::Tracking(base);
        }
        FixVerdict::Accepted
    }

    // Step 2: a base point older than the validity period says nothing about
    // the present. Drop it and start over from this fix.
    fn restart_after_expiry(&mut self, fix: Fix) -> FixVerdict {
        self.state = DetectorState::Warmup;
        self.window.clear();
        self.drift_buffer.clear();
        self.accept_warmup(fix)
    }

    // Steps 3-5.
    fn classify_tracking(&mut self, fix: Fix, base: BasePoint) -> FixVerdict {
        let distance = haversine_distance_m(fix.into(), base.point);
        let threshold = self.config.drift_multiplier * base.radius_m;
        let is_drift = base.radius_m > 0.0 && distance > threshold;

        if !is_drift {
            return self.accept_tracking(fix);
        }

        // Provisional rejection; a recovery below may reverse it.
        self.drift_buffer.push(fix);
        self.rejected.push(fix);
        self.stats.rejected_count += 1;

        if let Some([p, q, r]) = self.drift_buffer.last_three() {
            let angle = min_triangle_angle_deg(p.into(), q.into(), r.into());
            let furthest = [p, q, r]
                .iter()
                .map(|f| haversine_distance_m(f.into(), base.point))
                .fold(0.0, f64::max);
            let reach = LINEAR_RECOVERY_REACH * threshold;
            if angle < self.config.linear_angle_threshold_deg && furthest <= reach {
                return self.linear_recovery(fix);
            }
        }

        if self.drift_buffer.len() >= self.config.max_drift_sequence {
            return self.forced_rebuild(fix);
        }

        FixVerdict::Rejected
    }

    // Step 4b: three collinear rejections inside the reach cap mean the
    // vehicle is on a straight high-speed heading that left the reference
    // circle. Everything in the buffer was real motion.
    fn linear_recovery(&mut self, trigger: Fix) -> FixVerdict {
        let reclaimed = self.drift_buffer.drain();
        let n = reclaimed.len();

        // The buffered fixes are exactly the newest n entries of the
        // rejected partition: any acceptance clears the buffer, and overflow
        // drops from the buffer only.
        self.rejected.truncate(self.rejected.len() - n);
        self.stats.rejected_count -= n as u64;

        for fix in &reclaimed {
            self.window.push(*fix);
            self.accept(*fix);
        }

        self.install_rebuilt_base(trigger, "linear-motion recovery");
        FixVerdict::LinearRecovery { reclaimed: n }
    }

    // Step 4c: a full buffer of scattered rejections means the true position
    // has shifted. The buffer becomes the window; only the triggering fix
    // joins the accepted partition.
    fn forced_rebuild(&mut self, trigger: Fix) -> FixVerdict {
        let buffered = self.drift_buffer.drain();

        self.window.clear();
        let keep_from = buffered.len().saturating_sub(self.window.capacity());
        for fix in &buffered[keep_from..] {
            self.window.push(*fix);
        }

        // The trigger was provisionally rejected a moment ago; reverse that
        // one entry. The earlier buffered fixes stay rejected.
        self.rejected.pop();
        self.stats.rejected_count -= 1;
        self.accept(trigger);

        self.install_rebuilt_base(trigger, "consecutive-drift rebuild");
        FixVerdict::ForcedRebuild
    }

    // Step 5: one good fix cancels the drift suspicion entirely.
    fn accept_tracking(&mut self, fix: Fix) -> FixVerdict {
        if !self.drift_buffer.is_empty() {
            self.drift_buffer.clear();
        }
        self.window.push(fix);
        self.accept(fix);
        if self.window.is_full() {
            let base = build_base_initial(&self.window, fix.t)
                .expect("a full window is never empty");
            self.state = DetectorState::Tracking(base);
        }
        FixVerdict::Accepted
    }

    fn accept(&mut self, fix: Fix) {
        self.accepted.push(fix);
        self.stats.accepted_count += 1;
    }

    fn install_rebuilt_base(&mut self, trigger: Fix, reason: &str) {
        let base = build_base_rebuild(&self.window, trigger.t)
            .expect("rebuild paths always leave the window non-empty");
        self.state = DetectorState::Tracking(base);
        self.stats.rebuild_count += 1;
        self.rebuild_positions.push(trigger.into());
        self.markers.push(AnomalyMarker::new(
            MarkerKind::Rebuild,
            trigger.into(),
            reason,
            trigger.t,
        ));
    }

    /// By-value snapshot of the current state. Ages are measured as of the
    /// last processed fix.
    pub fn status(&self) -> StatusSnapshot {
        let base = self.state.base_point();
        let base_age_ms = match (base, self.last_fix_t) {
            (Some(b), Some(t)) => b.age_ms(t),
            _ => 0,
        };
        StatusSnapshot {
            window_length: self.window.len(),
            accepted_count: self.stats.accepted_count,
            has_base_point: base.is_some(),
            base_radius_m: base.map_or(0.0, |b| b.radius_m),
            consecutive_drift_count: self.drift_buffer.len(),
            base_age_ms,
            base_expired: base.is_some() && base_age_ms > self.config.validity_period_ms,
            base_point: base,
            rejected_count: self.stats.rejected_count,
            rebuild_count: self.stats.rebuild_count,
            rebuild_positions: self.rebuild_positions.clone(),
            processing_time_ms: self.stats.processing_time_ms(),
            filtering_rate: self.stats.filtering_rate(),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Apply a partial configuration update. Accumulated state survives; the
    /// window and buffer shrink from the oldest end if their caps tightened.
    pub fn set_config(&mut self, update: DetectorConfigUpdate) -> Result<(), ConfigError> {
        let merged = update.apply_to(&self.config)?;
        self.window.set_capacity(merged.window_size);
        self.drift_buffer.set_capacity(merged.max_drift_sequence);
        self.config = merged;
        Ok(())
    }

    /// Return to the freshly-constructed state. Replaying a trajectory after
    /// a reset reproduces the identical partition and markers.
    pub fn reset(&mut self) {
        self.state = DetectorState::Warmup;
        self.window.clear();
        self.drift_buffer.clear();
        self.accepted.clear();
        self.rejected.clear();
        self.markers.clear();
        self.rebuild_positions.clear();
        self.stats.reset();
        self.last_fix_t = None;
    }

    pub fn accepted(&self) -> &[Fix] {
        &self.accepted
    }

    pub fn rejected(&self) -> &[Fix] {
        &self.rejected
    }

    pub fn markers(&self) -> &[AnomalyMarker] {
        &self.markers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::offset_by;

    const T0: u64 = 1_700_000_000_000;

    fn fix(lat: f64, lng: f64, t: u64) -> Fix {
        Fix::new(lat, lng, t).unwrap()
    }

    /// The S1 warmup track: ten fixes trending north-east in 1 s steps.
    fn warmup_track() -> Vec<Fix> {
        (0..10)
            .map(|i| {
                fix(
                    39.9042 + i as f64 * 1e-5,
                    116.4074 + i as f64 * 1e-5,
                    T0 + i as u64 * 1000,
                )
            })
            .collect()
    }

    fn warmed_up_detector(config: DetectorConfig) -> DriftDetector {
        let mut detector = DriftDetector::new(config).unwrap();
        for f in warmup_track() {
            assert_eq!(detector.process_fix(f), FixVerdict::Accepted);
        }
        detector
    }

    fn long_validity_config() -> DetectorConfig {
        DetectorConfig { validity_period_ms: u64::MAX, ..DetectorConfig::default() }
    }

    #[test]
    fn test_s1_warmup_only() {
        let detector = warmed_up_detector(DetectorConfig::default());
        let status = detector.status();
        assert_eq!(status.accepted_count, 10);
        assert_eq!(status.rejected_count, 0);
        assert_eq!(status.rebuild_count, 0);
        assert!(status.has_base_point);
        assert_eq!(status.window_length, 10);
        assert_eq!(status.filtering_rate, 0.0);
    }

    #[test]
    fn test_s2_single_outlier_rejected() {
        let mut detector = warmed_up_detector(DetectorConfig::default());
        // continue the trend for ten more fixes
        for i in 10..20 {
            let f = fix(
                39.9042 + i as f64 * 1e-5,
                116.4074 + i as f64 * 1e-5,
                T0 + i as u64 * 1000,
            );
            assert_eq!(detector.process_fix(f), FixVerdict::Accepted, "trend fix {}", i);
        }
        let window_before = detector.window.contents();

        // ~7 km away
        let outlier = fix(39.95, 116.45, T0 + 21_000);
        assert_eq!(detector.process_fix(outlier), FixVerdict::Rejected);

        let status = detector.status();
        assert_eq!(status.rejected_count, 1);
        assert_eq!(status.rebuild_count, 0);
        assert_eq!(status.consecutive_drift_count, 1);
        // rejection does not disturb the window
        assert_eq!(detector.window.contents(), window_before);
    }

    #[test]
    fn test_s3_static_cluster_forces_rebuild() {
        let mut detector = warmed_up_detector(long_validity_config());

        // a cluster far away; identical coordinates defeat the linear test
        // via the 5·K·radius reach cap
        for i in 0..9u64 {
            let f = fix(40.0, 117.0, T0 + 10_000 + i * 1000);
            assert_eq!(detector.process_fix(f), FixVerdict::Rejected, "cluster fix {}", i);
        }
        let tenth = fix(40.0, 117.0, T0 + 19_000);
        assert_eq!(detector.process_fix(tenth), FixVerdict::ForcedRebuild);

        let status = detector.status();
        assert_eq!(status.rejected_count, 9);
        assert_eq!(status.rebuild_count, 1);
        assert!(status.has_base_point);
        assert_eq!(status.base_age_ms, 0);

        // the new base is at the cluster: a nearby fix is accepted
        let nearby = fix(40.0001, 117.0001, T0 + 20_000);
        assert_eq!(detector.process_fix(nearby), FixVerdict::Accepted);
    }

    #[test]
    fn test_s4_linear_recovery_reclaims_all_three() {
        let mut detector = warmed_up_detector(long_validity_config());
        let base = detector.status().base_point.unwrap();
        let radius = base.radius_m;
        assert!(radius > 0.0);

        // three collinear fixes heading out at 3r, 4r, 5r: outside K·r = 2r,
        // inside the 5·K·r = 10r reach
        let line: Vec<Fix> = [3.0, 4.0, 5.0]
            .iter()
            .enumerate()
            .map(|(i, mult)| {
                let p = offset_by(base.point, mult * radius, 45.0);
                fix(p.lat, p.lng, T0 + 10_000 + i as u64 * 1000)
            })
            .collect();

        assert_eq!(detector.process_fix(line[0]), FixVerdict::Rejected);
        assert_eq!(detector.process_fix(line[1]), FixVerdict::Rejected);
        assert_eq!(
            detector.process_fix(line[2]),
            FixVerdict::LinearRecovery { reclaimed: 3 }
        );

        let status = detector.status();
        assert_eq!(status.rejected_count, 0);
        assert_eq!(status.rebuild_count, 1);
        assert_eq!(status.accepted_count, 13);
        assert_eq!(status.consecutive_drift_count, 0);
        // the reclaimed fixes joined the accepted partition in order
        let tail: Vec<u64> = detector.accepted().iter().rev().take(3).map(|f| f.t).collect();
        assert_eq!(tail, vec![T0 + 12_000, T0 + 11_000, T0 + 10_000]);
    }

    #[test]
    fn test_s5_expiry_restarts_warmup() {
        let mut detector = warmed_up_detector(DetectorConfig::default());
        let created_at = detector.status().base_point.unwrap().created_at;

        let late = fix(39.9043, 116.4075, created_at + 15_001);
        assert_eq!(detector.process_fix(late), FixVerdict::Accepted);

        let status = detector.status();
        assert!(!status.has_base_point);
        assert_eq!(status.window_length, 1);
        assert_eq!(status.consecutive_drift_count, 0);
        // subsequent fixes re-enter warmup
        let next = fix(39.9043, 116.4075, created_at + 16_001);
        assert_eq!(detector.process_fix(next), FixVerdict::Accepted);
        assert_eq!(detector.status().window_length, 2);
    }

    #[test]
    fn test_fix_at_exact_validity_bound_is_not_expired() {
        let mut detector = warmed_up_detector(DetectorConfig::default());
        let created_at = detector.status().base_point.unwrap().created_at;
        // age == V: not strictly greater, so the base survives
        let boundary = fix(39.9043, 116.4075, created_at + 15_000);
        detector.process_fix(boundary);
        assert!(detector.status().has_base_point);
        assert_eq!(detector.status().window_length, 10);
    }

    #[test]
    fn test_partition_and_bounds_invariants() {
        let config = long_validity_config();
        let mut detector = DriftDetector::new(config.clone()).unwrap();

        let mut track = warmup_track();
        // interleave genuine motion, outliers, and a far cluster
        for i in 0..30u64 {
            let f = if i % 7 == 3 {
                fix(40.5, 117.5, T0 + 10_000 + i * 1000)
            } else {
                fix(
                    39.9042 + (10 + i) as f64 * 1e-5,
                    116.4074 + (10 + i) as f64 * 1e-5,
                    T0 + 10_000 + i * 1000,
                )
            };
            track.push(f);
        }

        let mut accepted = 0u64;
        let mut rejected = 0u64;
        for f in &track {
            let verdict = detector.process_fix(*f);
            match verdict {
                FixVerdict::Rejected => rejected += 1,
                FixVerdict::LinearRecovery { reclaimed } => {
                    accepted += reclaimed as u64;
                    rejected -= reclaimed as u64 - 1;
                }
                FixVerdict::ForcedRebuild => accepted += 1,
                FixVerdict::Accepted => accepted += 1,
            }
            let status = detector.status();
            assert!(status.window_length <= config.window_size);
            assert!(status.consecutive_drift_count <= config.max_drift_sequence);
        }

        let status = detector.status();
        // partition: accepted ∪ rejected = input, disjoint
        assert_eq!(status.accepted_count + status.rejected_count, track.len() as u64);
        assert_eq!(status.accepted_count, accepted);
        assert_eq!(status.rejected_count, rejected);
        assert_eq!(
            detector.accepted().len() + detector.rejected().len(),
            track.len()
        );
    }

    #[test]
    fn test_reset_replay_is_identical() {
        let mut detector = warmed_up_detector(long_validity_config());
        let mut track = warmup_track();
        for i in 0..25u64 {
            let f = if (8..12).contains(&i) {
                fix(40.2, 117.2, T0 + 10_000 + i * 1000)
            } else {
                fix(
                    39.9042 + (10 + i) as f64 * 1e-5,
                    116.4074 + (10 + i) as f64 * 1e-5,
                    T0 + 10_000 + i * 1000,
                )
            };
            track.push(f);
        }

        detector.reset();
        for f in &track {
            detector.process_fix(*f);
        }
        let first_accepted = detector.accepted().to_vec();
        let first_rejected = detector.rejected().to_vec();
        let first_markers = detector.markers().to_vec();

        detector.reset();
        assert_eq!(detector.status().accepted_count, 0);
        for f in &track {
            detector.process_fix(*f);
        }
        assert_eq!(detector.accepted(), first_accepted.as_slice());
        assert_eq!(detector.rejected(), first_rejected.as_slice());
        assert_eq!(detector.markers(), first_markers.as_slice());
    }

    #[test]
    fn test_good_fix_clears_drift_suspicion() {
        let mut detector = warmed_up_detector(long_validity_config());
        let outlier = fix(40.5, 117.5, T0 + 10_000);
        assert_eq!(detector.process_fix(outlier), FixVerdict::Rejected);
        assert_eq!(detector.status().consecutive_drift_count, 1);

        let good = fix(39.90425, 116.40745, T0 + 11_000);
        assert_eq!(detector.process_fix(good), FixVerdict::Accepted);
        assert_eq!(detector.status().consecutive_drift_count, 0);
    }

    #[test]
    fn test_rebuild_marker_recorded_inline() {
        let mut detector = warmed_up_detector(long_validity_config());
        for i in 0..10u64 {
            detector.process_fix(fix(40.0, 117.0, T0 + 10_000 + i * 1000));
        }
        let markers = detector.markers();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].kind, MarkerKind::Rebuild);
        assert_eq!(markers[0].t, T0 + 19_000);
        assert_eq!(detector.status().rebuild_positions.len(), 1);
    }

    #[test]
    fn test_empty_trajectory_is_not_an_error() {
        let mut detector = DriftDetector::default();
        let result = detector.process_trajectory(&[]);
        assert!(result.original_points.is_empty());
        assert!(result.processed_points.is_empty());
        assert!(result.filtered_points.is_empty());
        assert_eq!(result.statistics.accepted_count, 0);
        assert_eq!(result.statistics.rejected_count, 0);
        assert_eq!(result.statistics.filtering_rate, 0.0);
    }

    #[test]
    fn test_set_config_tightens_caps() {
        let mut detector = warmed_up_detector(long_validity_config());
        detector
            .set_config(DetectorConfigUpdate::new().with_window_size(5))
            .unwrap();
        assert_eq!(detector.status().window_length, 5);

        let err = detector.set_config(DetectorConfigUpdate::new().with_window_size(1));
        assert!(err.is_err());
        // failed update leaves the config untouched
        assert_eq!(detector.config().window_size, 5);
    }

    #[test]
    fn test_zero_radius_base_never_flags_drift() {
        // identical warmup fixes give a zero-radius base; nothing may be
        // classified as drift then
        let mut detector = DriftDetector::new(long_validity_config()).unwrap();
        for i in 0..10u64 {
            detector.process_fix(fix(39.9, 116.4, T0 + i * 1000));
        }
        assert_eq!(detector.status().base_radius_m, 0.0);
        let far = fix(40.5, 117.5, T0 + 10_000);
        assert_eq!(detector.process_fix(far), FixVerdict::Accepted);
    }
}
