use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::types::PositionPoint;

pub const DEFAULT_WINDOW_CAPACITY: usize = 20;

/// Merge `candidates` into `current` and return the next window.
///
/// Candidates whose instant is already present (in `current`, or earlier in
/// the same batch) are dropped, the survivors are appended, the whole
/// sequence is sorted by instant and only the newest `capacity` points are
/// kept. Pure: the output depends on nothing but the arguments.
pub fn merge_points(
    current: &[PositionPoint],
    candidates: &[PositionPoint],
    capacity: usize,
) -> Vec<PositionPoint> {
    let mut seen: HashSet<DateTime<Utc>> = current.iter().map(|p| p.timestamp).collect();

    let mut merged = current.to_vec();
    merged.extend(
        candidates
            .iter()
            .filter(|p| seen.insert(p.timestamp))
            .copied(),
    );

    // Stable sort: points sharing an instant keep their relative order.
    merged.sort_by_key(|p| p.timestamp);

    if merged.len() > capacity {
        merged.drain(..merged.len() - capacity);
    }
    merged
}

// ---------------------------------------------------------------------------
// RollingWindow
// ---------------------------------------------------------------------------

/// Bounded, time-ordered, duplicate-free history of one actuator's positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollingWindow {
    capacity: usize,
    points: Vec<PositionPoint>,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn points(&self) -> &[PositionPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&PositionPoint> {
        self.points.last()
    }

    /// Merge in place. Returns `true` if the window changed.
    pub fn merge(&mut self, candidates: &[PositionPoint]) -> bool {
        let next = merge_points(&self.points, candidates, self.capacity);
        let changed = next != self.points;
        self.points = next;
        changed
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}
