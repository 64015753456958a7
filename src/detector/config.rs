//! Detector configuration with validated runtime updates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tuning parameters of the drift detector.
///
/// Passed at construction; individual fields may be updated at runtime
/// through [`DetectorConfigUpdate`]. Unspecified fields keep their current
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Fixes collected before the first base point is computed; also the
    /// rolling window size (W)
    pub window_size: usize,
    /// Age in milliseconds after which the base point is invalidated (V)
    pub validity_period_ms: u64,
    /// Consecutive rejections that trigger an unconditional rebuild (M)
    pub max_drift_sequence: usize,
    /// A fix is a drift candidate when its distance from the base point
    /// exceeds this multiple of the base radius (K)
    pub drift_multiplier: f64,
    /// Minimum triangle angle in degrees below which three recent rejections
    /// count as collinear straight-line motion (Θ)
    pub linear_angle_threshold_deg: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            validity_period_ms: 15_000, // 15 seconds
            max_drift_sequence: 10,
            drift_multiplier: 2.0,
            linear_angle_threshold_deg: 30.0,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidParameter { parameter: &'static str, value: String, reason: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidParameter { parameter, value, reason } => {
                write!(f, "invalid parameter '{}' = '{}': {}", parameter, value, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl DetectorConfig {
    /// Check every parameter against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size < 3 {
            return Err(ConfigError::InvalidParameter {
                parameter: "window_size",
                value: self.window_size.to_string(),
                reason: "at least 3 fixes are needed for a meaningful base point",
            });
        }
        if self.validity_period_ms == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "validity_period_ms",
                value: self.validity_period_ms.to_string(),
                reason: "a zero validity period would expire every base point immediately",
            });
        }
        if self.max_drift_sequence < 3 {
            return Err(ConfigError::InvalidParameter {
                parameter: "max_drift_sequence",
                value: self.max_drift_sequence.to_string(),
                reason: "the linear-motion test needs at least 3 buffered rejections",
            });
        }
        if !self.drift_multiplier.is_finite() || self.drift_multiplier <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "drift_multiplier",
                value: self.drift_multiplier.to_string(),
                reason: "must be a positive finite factor",
            });
        }
        if !(0.0..180.0).contains(&self.linear_angle_threshold_deg)
            || self.linear_angle_threshold_deg == 0.0
        {
            return Err(ConfigError::InvalidParameter {
                parameter: "linear_angle_threshold_deg",
                value: self.linear_angle_threshold_deg.to_string(),
                reason: "must lie strictly between 0 and 180 degrees",
            });
        }
        Ok(())
    }
}

/// Partial runtime update: every field optional, unspecified fields retain
/// the detector's current values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfigUpdate {
    pub window_size: Option<usize>,
    pub validity_period_ms: Option<u64>,
    pub max_drift_sequence: Option<usize>,
    pub drift_multiplier: Option<f64>,
    pub linear_angle_threshold_deg: Option<f64>,
}

impl DetectorConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = Some(window_size);
        self
    }

    pub fn with_validity_period_ms(mut self, validity_period_ms: u64) -> Self {
        self.validity_period_ms = Some(validity_period_ms);
        self
    }

    pub fn with_max_drift_sequence(mut self, max_drift_sequence: usize) -> Self {
        self.max_drift_sequence = Some(max_drift_sequence);
        self
    }

    pub fn with_drift_multiplier(mut self, drift_multiplier: f64) -> Self {
        self.drift_multiplier = Some(drift_multiplier);
        self
    }

    pub fn with_linear_angle_threshold_deg(mut self, threshold_deg: f64) -> Self {
        self.linear_angle_threshold_deg = Some(threshold_deg);
        self
    }

    /// Merge this update over `current`, returning the validated result.
    /// `current` is untouched when validation fails.
    pub fn apply_to(&self, current: &DetectorConfig) -> Result<DetectorConfig, ConfigError> {
        let merged = DetectorConfig {
            window_size: self.window_size.unwrap_or(current.window_size),
            validity_period_ms: self.validity_period_ms.unwrap_or(current.validity_period_ms),
            max_drift_sequence: self.max_drift_sequence.unwrap_or(current.max_drift_sequence),
            drift_multiplier: self.drift_multiplier.unwrap_or(current.drift_multiplier),
            linear_angle_threshold_deg: self
                .linear_angle_threshold_deg
                .unwrap_or(current.linear_angle_threshold_deg),
        };
        merged.validate()?;
        Ok(merged)
    }
}
