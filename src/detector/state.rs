//! Detector-owned state: sliding window, drift buffer, base-point builds.

use crate::algorithms::geometry::{centroid, median_point, GeometryError};
use crate::algorithms::haversine_distance_m;
use crate::core::constants::REBUILD_RADIUS_FLOOR_M;
use crate::core::{BasePoint, Fix, GeoPoint};
use std::collections::VecDeque;

/// Bounded FIFO of recently accepted fixes. The base point is always derived
/// from this window.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    fixes: VecDeque<Fix>,
    capacity: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        Self { fixes: VecDeque::with_capacity(capacity), capacity }
    }

    /// Append a fix, evicting the oldest when at capacity.
    pub fn push(&mut self, fix: Fix) -> Option<Fix> {
        let evicted = if self.fixes.len() >= self.capacity {
            self.fixes.pop_front()
        } else {
            None
        };
        self.fixes.push_back(fix);
        evicted
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.fixes.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.fixes.clear();
    }

    /// Shrinking the capacity drops the oldest entries.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.fixes.len() > capacity {
            self.fixes.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fix> {
        self.fixes.iter()
    }

    pub fn positions(&self) -> Vec<GeoPoint> {
        self.fixes.iter().map(GeoPoint::from).collect()
    }

    pub fn contents(&self) -> Vec<Fix> {
        self.fixes.iter().copied().collect()
    }
}

/// Bounded FIFO of the most recent consecutive rejections, awaiting either a
/// linear-motion recovery or a forced rebuild.
#[derive(Debug, Clone)]
pub struct DriftBuffer {
    fixes: VecDeque<Fix>,
    capacity: usize,
}

impl DriftBuffer {
    pub fn new(capacity: usize) -> Self {
        Self { fixes: VecDeque::with_capacity(capacity), capacity }
    }

    /// Append a rejection, dropping the oldest when at capacity.
    pub fn push(&mut self, fix: Fix) {
        if self.fixes.len() >= self.capacity {
            self.fixes.pop_front();
        }
        self.fixes.push_back(fix);
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn clear(&mut self) {
        self.fixes.clear();
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.fixes.len() > capacity {
            self.fixes.pop_front();
        }
    }

    /// The three most recent rejections, oldest first, when present.
    pub fn last_three(&self) -> Option<[Fix; 3]> {
        let n = self.fixes.len();
        if n < 3 {
            return None;
        }
        Some([self.fixes[n - 3], self.fixes[n - 2], self.fixes[n - 1]])
    }

    /// Empty the buffer and hand back its contents, oldest first.
    pub fn drain(&mut self) -> Vec<Fix> {
        self.fixes.drain(..).collect()
    }
}

/// Explicit detector phase. A tagged variant rather than an
/// `Option<BasePoint>`, so the warmup edge cases stay unambiguous.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectorState {
    /// Fewer than `window_size` fixes accepted since the last reset or
    /// invalidation; no base point exists.
    Warmup,
    /// A base point is installed; expiry is checked against each fix.
    Tracking(BasePoint),
}

impl DetectorState {
    pub fn base_point(&self) -> Option<BasePoint> {
        match self {
            DetectorState::Warmup => None,
            DetectorState::Tracking(base) => Some(*base),
        }
    }
}

/// Initial build and steady-state refresh: median-point position with the
/// maximum-radius variant (radius = furthest window fix from the position).
pub fn build_base_initial(window: &SlidingWindow, created_at: u64) -> Result<BasePoint, GeometryError> {
    let positions = window.positions();
    let point = median_point(&positions)?;
    let radius_m = positions
        .iter()
        .map(|p| haversine_distance_m(*p, point))
        .fold(0.0, f64::max);
    Ok(BasePoint { point, radius_m, created_at, source_count: positions.len() })
}

/// Rebuild paths (linear recovery and forced rebuild): centroid position
/// with the median-radius variant clamped to the 50 m floor.
pub fn build_base_rebuild(window: &SlidingWindow, created_at: u64) -> Result<BasePoint, GeometryError> {
    let positions = window.positions();
    let point = centroid(&positions)?;
    let mut distances: Vec<f64> = positions
        .iter()
        .map(|p| haversine_distance_m(*p, point))
        .collect();
    distances.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = distances.len();
    let median = if n % 2 == 0 {
        (distances[n / 2 - 1] + distances[n / 2]) / 2.0
    } else {
        distances[n / 2]
    };
    let radius_m = median.max(REBUILD_RADIUS_FLOOR_M);
    Ok(BasePoint { point, radius_m, created_at, source_count: n })
}
