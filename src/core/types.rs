//! Core data types for the trajectory filter

use crate::core::constants::{LAT_RANGE_DEG, LNG_RANGE_DEG};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// One GPS position report: geodetic coordinates plus a millisecond timestamp.
///
/// Fixes are immutable once constructed; every adapter and the simulator go
/// through [`Fix::new`] so the coordinate-range invariants hold everywhere
/// downstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Latitude in decimal degrees WGS-84
    pub lat: f64,
    /// Longitude in decimal degrees WGS-84
    pub lng: f64,
    /// Milliseconds since the Unix epoch
    #[serde(rename = "timestamp")]
    pub t: u64,
}

/// Violations of the fix coordinate invariants
#[derive(Debug, Clone, PartialEq)]
pub enum FixError {
    LatitudeOutOfRange { value: f64 },
    LongitudeOutOfRange { value: f64 },
    NonFiniteCoordinate { field: &'static str, value: f64 },
}

impl fmt::Display for FixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixError::LatitudeOutOfRange { value } => {
                write!(f, "latitude {} outside [-90, 90]", value)
            }
            FixError::LongitudeOutOfRange { value } => {
                write!(f, "longitude {} outside [-180, 180]", value)
            }
            FixError::NonFiniteCoordinate { field, value } => {
                write!(f, "non-finite {}: {}", field, value)
            }
        }
    }
}

impl std::error::Error for FixError {}

impl Fix {
    /// Create a fix, validating the coordinate ranges.
    pub fn new(lat: f64, lng: f64, t: u64) -> Result<Self, FixError> {
        if !lat.is_finite() {
            return Err(FixError::NonFiniteCoordinate { field: "lat", value: lat });
        }
        if !lng.is_finite() {
            return Err(FixError::NonFiniteCoordinate { field: "lng", value: lng });
        }
        if lat < LAT_RANGE_DEG.0 || lat > LAT_RANGE_DEG.1 {
            return Err(FixError::LatitudeOutOfRange { value: lat });
        }
        if lng < LNG_RANGE_DEG.0 || lng > LNG_RANGE_DEG.1 {
            return Err(FixError::LongitudeOutOfRange { value: lng });
        }
        Ok(Self { lat, lng, t })
    }

    /// Key used for exact-duplicate elimination: bit-identical coordinates
    /// and the same timestamp.
    pub fn dedup_key(&self) -> (u64, u64, u64) {
        (self.lat.to_bits(), self.lng.to_bits(), self.t)
    }
}

/// A fix carrying the optional receiver fields some sources report.
///
/// Reduced to a plain [`Fix`] before the detector sees it; the detector never
/// consults speed, altitude, or course.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtendedFix {
    #[serde(flatten)]
    pub fix: Fix,
    /// Ground speed in m/s, when the receiver reported one
    #[serde(rename = "spd", default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Altitude in meters above the ellipsoid
    #[serde(rename = "alt", default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Course over ground in degrees
    #[serde(rename = "cog", default, skip_serializing_if = "Option::is_none")]
    pub course: Option<f64>,
}

impl ExtendedFix {
    pub fn from_fix(fix: Fix) -> Self {
        Self { fix, speed: None, altitude: None, course: None }
    }

    /// Drop the optional fields and keep the canonical triple.
    pub fn reduce(&self) -> Fix {
        self.fix
    }
}

/// A plain geodetic coordinate without a timestamp, used for derived points
/// (base point position, marker positions from aggregates).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<Fix> for GeoPoint {
    fn from(fix: Fix) -> Self {
        Self { lat: fix.lat, lng: fix.lng }
    }
}

impl From<&Fix> for GeoPoint {
    fn from(fix: &Fix) -> Self {
        Self { lat: fix.lat, lng: fix.lng }
    }
}

/// The detector's rolling reference position.
///
/// At most one base point exists per detector. `created_at` is the timestamp
/// of the fix that caused the build, so expiry decisions replay
/// deterministically from logged data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasePoint {
    /// Reference position derived from the sliding window
    pub point: GeoPoint,
    /// Spread of the contributing fixes around `point`, in meters
    pub radius_m: f64,
    /// Timestamp (ms) of the fix that triggered this build
    pub created_at: u64,
    /// Number of fixes the build drew from
    pub source_count: usize,
}

impl BasePoint {
    /// Age of the base point as seen from a fix with timestamp `now_ms`.
    /// Out-of-order fixes (earlier than `created_at`) report zero age.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at)
    }
}

/// Classification of an anomaly marker.
///
/// Internally static and moving drift stay distinct (the simulator's ground
/// truth needs the distinction); on the wire both serialize as `"drift"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    StaticDrift,
    MovingDrift,
    Tunnel,
    Speed,
    Rebuild,
}

impl MarkerKind {
    /// The wire name: `"tunnel" | "drift" | "speed" | "rebuild"`.
    pub fn wire_name(&self) -> &'static str {
        match self {
            MarkerKind::StaticDrift | MarkerKind::MovingDrift => "drift",
            MarkerKind::Tunnel => "tunnel",
            MarkerKind::Speed => "speed",
            MarkerKind::Rebuild => "rebuild",
        }
    }
}

impl Serialize for MarkerKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// An annotation emitted for visualisation or evaluation: where something
/// happened and why. Markers are append-only and reference positions by value.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyMarker {
    pub kind: MarkerKind,
    pub position: GeoPoint,
    pub description: String,
    /// Timestamp (ms) of the fix the marker is anchored to
    pub t: u64,
}

impl AnomalyMarker {
    pub fn new(kind: MarkerKind, position: GeoPoint, description: impl Into<String>, t: u64) -> Self {
        Self { kind, position, description: description.into(), t }
    }
}

impl Serialize for AnomalyMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("AnomalyMarker", 4)?;
        s.serialize_field("kind", &self.kind)?;
        s.serialize_field("position", &self.position)?;
        s.serialize_field("description", &self.description)?;
        s.serialize_field("timestamp", &self.t)?;
        s.end()
    }
}
