//! Sampling and collision resolution for anomaly index ranges.

use crate::simulator::config::SimulatorConfig;
use rand::Rng;

/// Which corruption a planned span applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyType {
    StaticDrift,
    MovingDrift,
    Tunnel,
    Speed,
}

/// An inclusive `[start, end]` index range over the baseline, tagged with
/// the anomaly to apply there. Static drift anchors on a single fix, so its
/// span is one index wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnomalySpan {
    pub kind: AnomalyType,
    pub start: usize,
    pub end: usize,
}

impl AnomalySpan {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

// Span lengths in baseline fixes, per anomaly type.
const MOVING_SPAN: (usize, usize) = (8, 20);
const TUNNEL_SPAN: (usize, usize) = (10, 25);
const SPEED_SPAN: (usize, usize) = (12, 30);

/// Sample one span of each requested anomaly, then resolve overlaps: spans
/// are sorted by start, an overlapping successor has its start pushed past
/// its predecessor's end, and spans that collapse to empty (or fall off the
/// baseline) are dropped.
pub fn plan_anomalies<R: Rng + ?Sized>(
    config: &SimulatorConfig,
    baseline_len: usize,
    rng: &mut R,
) -> Vec<AnomalySpan> {
    if baseline_len == 0 {
        return Vec::new();
    }

    let mut spans = Vec::new();
    for _ in 0..config.static_drift_count {
        let anchor = rng.gen_range(0..baseline_len);
        spans.push(AnomalySpan { kind: AnomalyType::StaticDrift, start: anchor, end: anchor });
    }
    for _ in 0..config.moving_drift_count {
        spans.push(sample_span(AnomalyType::MovingDrift, MOVING_SPAN, baseline_len, rng));
    }
    for _ in 0..config.tunnel_count {
        spans.push(sample_span(AnomalyType::Tunnel, TUNNEL_SPAN, baseline_len, rng));
    }
    for _ in 0..config.speed_scenario_count {
        spans.push(sample_span(AnomalyType::Speed, SPEED_SPAN, baseline_len, rng));
    }

    spans.sort_by_key(|s| (s.start, s.end));

    let mut resolved: Vec<AnomalySpan> = Vec::with_capacity(spans.len());
    for mut span in spans {
        if let Some(prev) = resolved.last() {
            if span.start <= prev.end {
                span.start = prev.end + 1;
            }
        }
        if span.start > span.end || span.start >= baseline_len {
            continue; // collapsed by the shift
        }
        span.end = span.end.min(baseline_len - 1);
        resolved.push(span);
    }
    resolved
}

fn sample_span<R: Rng + ?Sized>(
    kind: AnomalyType,
    (min_len, max_len): (usize, usize),
    baseline_len: usize,
    rng: &mut R,
) -> AnomalySpan {
    let len = rng.gen_range(min_len..=max_len).min(baseline_len);
    let start = rng.gen_range(0..baseline_len);
    let end = (start + len - 1).min(baseline_len - 1);
    AnomalySpan { kind, start, end }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_spans_are_disjoint_and_ordered() {
        let config = SimulatorConfig {
            static_drift_count: 3,
            moving_drift_count: 2,
            tunnel_count: 2,
            speed_scenario_count: 2,
            ..SimulatorConfig::default()
        };
        for seed in 0..50u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let spans = plan_anomalies(&config, 200, &mut rng);
            for pair in spans.windows(2) {
                assert!(pair[0].end < pair[1].start, "overlap at seed {}: {:?}", seed, pair);
            }
            for span in &spans {
                assert!(span.start <= span.end);
                assert!(span.end < 200);
            }
        }
    }

    #[test]
    fn test_empty_baseline_plans_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(plan_anomalies(&SimulatorConfig::default(), 0, &mut rng).is_empty());
    }

    #[test]
    fn test_zero_counts_plan_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(plan_anomalies(&SimulatorConfig::passthrough(), 100, &mut rng).is_empty());
    }

    #[test]
    fn test_plan_is_seed_reproducible() {
        let config = SimulatorConfig::default();
        let a = plan_anomalies(&config, 150, &mut StdRng::seed_from_u64(42));
        let b = plan_anomalies(&config, 150, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_crowded_baseline_drops_collapsed_spans() {
        // far more anomalies than a short baseline can host
        let config = SimulatorConfig {
            static_drift_count: 10,
            moving_drift_count: 10,
            tunnel_count: 10,
            speed_scenario_count: 10,
            ..SimulatorConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(99);
        let spans = plan_anomalies(&config, 30, &mut rng);
        for pair in spans.windows(2) {
            assert!(pair[0].end < pair[1].start);
        }
        assert!(spans.len() <= 30);
    }
}
