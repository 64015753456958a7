//! Anomaly-injection configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One band of the piecewise displacement-magnitude distribution: with
/// probability `ratio`, magnitudes are drawn uniformly from `range_m`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftBand {
    pub ratio: f64,
    /// Inclusive magnitude bounds in meters
    pub range_m: (f64, f64),
}

/// Parameters controlling how a baseline trajectory is corrupted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Number of static-drift clusters (stationary receiver under multipath)
    pub static_drift_count: usize,
    /// Number of moving-drift segments (displaced runs along real motion)
    pub moving_drift_count: usize,
    /// Number of tunnels (contiguous signal-loss deletions)
    pub tunnel_count: usize,
    /// Number of high-speed under-sampling segments
    pub speed_scenario_count: usize,
    /// Synthetic fixes fabricated per static-drift cluster
    pub static_cluster_size: usize,
    /// Absolute bounds for every displacement magnitude, meters
    pub drift_distance_range_m: (f64, f64),
    /// Probability bands for displacement magnitudes; ratios sum to 1
    pub drift_distribution: Vec<DriftBand>,
    /// Amplitude of the optional periodic lateral drift overlaid on speed
    /// scenarios, meters
    pub speed_lateral_drift_m: Option<f64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            static_drift_count: 2,
            moving_drift_count: 1,
            tunnel_count: 1,
            speed_scenario_count: 1,
            static_cluster_size: 8,
            drift_distance_range_m: (80.0, 400.0),
            drift_distribution: vec![
                DriftBand { ratio: 0.6, range_m: (80.0, 150.0) },
                DriftBand { ratio: 0.3, range_m: (150.0, 250.0) },
                DriftBand { ratio: 0.1, range_m: (250.0, 400.0) },
            ],
            speed_lateral_drift_m: None,
        }
    }
}

impl SimulatorConfig {
    /// A configuration with every anomaly count zeroed; the generator then
    /// reproduces the baseline (up to ordering and deduplication).
    pub fn passthrough() -> Self {
        Self {
            static_drift_count: 0,
            moving_drift_count: 0,
            tunnel_count: 0,
            speed_scenario_count: 0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SimulatorConfigError> {
        let (min, max) = self.drift_distance_range_m;
        if !(min.is_finite() && max.is_finite()) || min <= 0.0 || max < min {
            return Err(SimulatorConfigError::InvalidDistanceRange { min, max });
        }
        if !self.drift_distribution.is_empty() {
            let sum: f64 = self.drift_distribution.iter().map(|b| b.ratio).sum();
            if (sum - 1.0).abs() > 1e-6 {
                return Err(SimulatorConfigError::DistributionRatioSum { sum });
            }
            for band in &self.drift_distribution {
                let (b_min, b_max) = band.range_m;
                if band.ratio < 0.0 || b_min < min || b_max > max || b_max < b_min {
                    return Err(SimulatorConfigError::InvalidBand { band: *band });
                }
            }
        }
        if self.static_drift_count > 0 && self.static_cluster_size == 0 {
            return Err(SimulatorConfigError::EmptyCluster);
        }
        if let Some(amplitude) = self.speed_lateral_drift_m {
            if !amplitude.is_finite() || amplitude < 0.0 {
                return Err(SimulatorConfigError::InvalidLateralAmplitude { amplitude });
            }
        }
        Ok(())
    }
}

/// Simulator configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatorConfigError {
    InvalidDistanceRange { min: f64, max: f64 },
    DistributionRatioSum { sum: f64 },
    InvalidBand { band: DriftBand },
    EmptyCluster,
    InvalidLateralAmplitude { amplitude: f64 },
}

impl fmt::Display for SimulatorConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorConfigError::InvalidDistanceRange { min, max } => {
                write!(f, "invalid drift distance range [{}, {}]", min, max)
            }
            SimulatorConfigError::DistributionRatioSum { sum } => {
                write!(f, "drift distribution ratios sum to {}, expected 1", sum)
            }
            SimulatorConfigError::InvalidBand { band } => {
                write!(
                    f,
                    "band ratio {} range [{}, {}] outside the configured bounds",
                    band.ratio, band.range_m.0, band.range_m.1
                )
            }
            SimulatorConfigError::EmptyCluster => {
                write!(f, "static drift requested with a zero cluster size")
            }
            SimulatorConfigError::InvalidLateralAmplitude { amplitude } => {
                write!(f, "invalid lateral drift amplitude {}", amplitude)
            }
        }
    }
}

impl std::error::Error for SimulatorConfigError {}
