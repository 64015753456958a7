//! Anomaly injection over a clean baseline trajectory.
//!
//! The generator produces a corrupted fix stream plus ground-truth markers
//! so detector effectiveness can be measured against a known answer. Every
//! entry point takes an explicit seed or caller-supplied RNG; two runs with
//! the same seed and baseline are bit-identical. Deleted fixes are removed
//! by filtering; no transient tags ever appear on a fix.

use crate::algorithms::{angle_diff_deg, initial_bearing_deg, offset_by};
use crate::core::{AnomalyMarker, Fix, MarkerKind};
use crate::simulator::config::{SimulatorConfig, SimulatorConfigError};
use crate::simulator::plan::{plan_anomalies, AnomalySpan, AnomalyType};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::f64::consts::PI;

/// Bearing agreement below which consecutive segments count as one straight
/// run (degrees).
const STRAIGHT_RUN_TOLERANCE_DEG: f64 = 10.0;

/// Fixes per sub-sampling chunk in a speed scenario; offsets 1, 3, 4 of
/// each chunk are dropped.
const SPEED_CHUNK: usize = 6;
const SPEED_DROP_OFFSETS: [usize; 3] = [1, 3, 4];

/// Corrupted trajectory plus the ground truth of what was injected where.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub points: Vec<Fix>,
    pub markers: Vec<AnomalyMarker>,
}

/// Injects the configured anomalies into baseline trajectories.
#[derive(Debug, Clone)]
pub struct AnomalySimulator {
    config: SimulatorConfig,
}

impl AnomalySimulator {
    pub fn new(config: SimulatorConfig) -> Result<Self, SimulatorConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Corrupt `baseline` reproducibly from a seed.
    pub fn generate(&self, baseline: &[Fix], seed: u64) -> SimulationResult {
        let mut rng = StdRng::seed_from_u64(seed);
        self.generate_with_rng(baseline, &mut rng)
    }

    /// Corrupt `baseline` drawing randomness from a caller-supplied RNG.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        baseline: &[Fix],
        rng: &mut R,
    ) -> SimulationResult {
        if baseline.is_empty() {
            return SimulationResult { points: Vec::new(), markers: Vec::new() };
        }

        let spans = plan_anomalies(&self.config, baseline.len(), rng);

        let mut points = baseline.to_vec();
        let mut deleted = vec![false; baseline.len()];
        let mut inserted: Vec<Fix> = Vec::new();
        let mut markers: Vec<AnomalyMarker> = Vec::new();

        for span in &spans {
            match span.kind {
                AnomalyType::StaticDrift => {
                    self.apply_static_drift(span, baseline, &mut inserted, &mut markers, rng);
                }
                AnomalyType::MovingDrift => {
                    self.apply_moving_drift(span, baseline, &mut points, &mut markers, rng);
                }
                AnomalyType::Tunnel => {
                    for flag in &mut deleted[span.start..=span.end] {
                        *flag = true;
                    }
                    markers.push(AnomalyMarker::new(
                        MarkerKind::Tunnel,
                        baseline[span.start].into(),
                        format!("signal loss over {} fixes", span.len()),
                        baseline[span.start].t,
                    ));
                }
                AnomalyType::Speed => {
                    self.apply_speed_scenario(span, &mut points, &mut deleted, &mut markers);
                }
            }
        }

        let mut out: Vec<Fix> = points
            .into_iter()
            .zip(deleted)
            .filter_map(|(fix, gone)| (!gone).then_some(fix))
            .collect();
        out.extend(inserted);
        out.sort_by_key(|f| f.t);

        let mut seen = HashSet::with_capacity(out.len());
        out.retain(|f| seen.insert(f.dedup_key()));

        SimulationResult { points: out, markers }
    }

    // A cluster of fabricated fixes around one baseline anchor, as a
    // stationary receiver under multipath would report.
    fn apply_static_drift<R: Rng + ?Sized>(
        &self,
        span: &AnomalySpan,
        baseline: &[Fix],
        inserted: &mut Vec<Fix>,
        markers: &mut Vec<AnomalyMarker>,
        rng: &mut R,
    ) {
        let anchor = baseline[span.start];
        for i in 0..self.config.static_cluster_size {
            let distance = self.sample_magnitude(rng);
            let bearing = rng.gen_range(0.0..360.0);
            let p = offset_by(anchor.into(), distance, bearing);
            let t = anchor.t + (i as u64 + 1) * 120;
            if let Ok(fix) = Fix::new(p.lat, p.lng, t) {
                inserted.push(fix);
            }
        }
        markers.push(AnomalyMarker::new(
            MarkerKind::StaticDrift,
            anchor.into(),
            format!("{} fabricated fixes", self.config.static_cluster_size),
            anchor.t,
        ));
    }

    // Displace a moving segment: magnitude ramps in and out with
    // sin(π·progress) so the corruption joins the real track smoothly at
    // both ends, direction rotating half a turn across the segment.
    fn apply_moving_drift<R: Rng + ?Sized>(
        &self,
        span: &AnomalySpan,
        baseline: &[Fix],
        points: &mut [Fix],
        markers: &mut Vec<AnomalyMarker>,
        rng: &mut R,
    ) {
        let magnitude = self.sample_magnitude(rng);
        let start_bearing = rng.gen_range(0.0..360.0);
        let span_len = (span.len() - 1).max(1) as f64;

        for i in span.start..=span.end {
            let progress = (i - span.start) as f64 / span_len;
            let displacement = magnitude * (PI * progress).sin();
            let direction = start_bearing + 180.0 * progress;
            let p = offset_by(baseline[i].into(), displacement, direction);
            if let Ok(fix) = Fix::new(p.lat, p.lng, baseline[i].t) {
                points[i] = fix;
            }
        }
        markers.push(AnomalyMarker::new(
            MarkerKind::MovingDrift,
            baseline[span.start].into(),
            format!("displaced segment, peak {:.0} m", magnitude),
            baseline[span.start].t,
        ));
    }

    // Inside straight runs (consecutive bearings agreeing within 10°), drop
    // fixes 2, 4 and 5 of every six-point chunk to mimic high-speed
    // under-sampling; optionally overlay a periodic lateral drift on the
    // survivors.
    fn apply_speed_scenario(
        &self,
        span: &AnomalySpan,
        points: &mut [Fix],
        deleted: &mut [bool],
        markers: &mut Vec<AnomalyMarker>,
    ) {
        for run in straight_runs(&points[span.start..=span.end]) {
            let run_indices: Vec<usize> = run.map(|i| i + span.start).collect();
            if run_indices.len() < SPEED_CHUNK {
                continue;
            }

            let first = run_indices[0];
            markers.push(AnomalyMarker::new(
                MarkerKind::Speed,
                points[first].into(),
                format!("under-sampled straight run of {} fixes", run_indices.len()),
                points[first].t,
            ));

            for chunk in run_indices.chunks_exact(SPEED_CHUNK) {
                for offset in SPEED_DROP_OFFSETS {
                    deleted[chunk[offset]] = true;
                }
            }

            if let Some(amplitude) = self.config.speed_lateral_drift_m {
                let last = run_indices[run_indices.len() - 1];
                let run_bearing =
                    initial_bearing_deg(points[first].into(), points[last].into());
                let survivors: Vec<usize> = run_indices
                    .iter()
                    .copied()
                    .filter(|&i| !deleted[i])
                    .collect();
                for (k, &i) in survivors.iter().enumerate() {
                    let sway = amplitude * (2.0 * PI * k as f64 / SPEED_CHUNK as f64).sin();
                    let p = offset_by(points[i].into(), sway, run_bearing + 90.0);
                    if let Ok(fix) = Fix::new(p.lat, p.lng, points[i].t) {
                        points[i] = fix;
                    }
                }
            }
        }
    }

    // Draw a displacement magnitude from the banded distribution, falling
    // back to the plain range when no bands are configured.
    fn sample_magnitude<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let (min, max) = self.config.drift_distance_range_m;
        if self.config.drift_distribution.is_empty() {
            return rng.gen_range(min..=max);
        }
        let roll: f64 = rng.gen();
        let mut cumulative = 0.0;
        for band in &self.config.drift_distribution {
            cumulative += band.ratio;
            if roll < cumulative {
                let (b_min, b_max) = band.range_m;
                return rng.gen_range(b_min..=b_max);
            }
        }
        // float residue: land in the last band
        let (b_min, b_max) = self.config.drift_distribution[self.config.drift_distribution.len() - 1].range_m;
        rng.gen_range(b_min..=b_max)
    }
}

/// Maximal index ranges (relative to `segment`) whose consecutive bearings
/// agree within the straight-run tolerance.
fn straight_runs(segment: &[Fix]) -> Vec<std::ops::RangeInclusive<usize>> {
    if segment.len() < 2 {
        return Vec::new();
    }
    let bearings: Vec<f64> = segment
        .windows(2)
        .map(|pair| initial_bearing_deg(pair[0].into(), pair[1].into()))
        .collect();

    let mut runs = Vec::new();
    let mut run_start = 0usize;
    for i in 1..bearings.len() {
        if angle_diff_deg(bearings[i], bearings[i - 1]) >= STRAIGHT_RUN_TOLERANCE_DEG {
            if i > run_start {
                runs.push(run_start..=i); // fixes run_start..=i
            }
            run_start = i;
        }
    }
    runs.push(run_start..=bearings.len());
    runs
}
