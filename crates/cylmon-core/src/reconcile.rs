use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::types::{Position, PositionPoint, SensorSample};

/// Readings of both sensors at one instant. `None` means the sensor reported
/// nothing at that instant, which is not the same as reporting 0.
#[derive(Debug, Default, Clone, Copy)]
struct Pair {
    extended: Option<bool>,
    retracted: Option<bool>,
}

/// Apply the sensor-priority rule to one instant's readings.
///
/// An active extended sensor wins, even when the retracted sensor is active
/// at the same instant.
pub fn derive_position(extended: Option<bool>, retracted: Option<bool>) -> Position {
    if extended == Some(true) {
        Position::Extended
    } else if retracted == Some(true) {
        Position::Retracted
    } else {
        Position::Undefined
    }
}

/// Merge the extended and retracted histories of one actuator into a position
/// series with exactly one point per distinct instant seen in either input.
///
/// Samples whose timestamp cannot be parsed never produce a point. When a
/// stream repeats an instant, its first sample is the one that counts. The
/// result happens to be ascending, but callers must not rely on it.
pub fn reconcile(extended: &[SensorSample], retracted: &[SensorSample]) -> Vec<PositionPoint> {
    let mut by_instant: BTreeMap<DateTime<Utc>, Pair> = BTreeMap::new();

    for sample in extended {
        if let Some(at) = instant_of(sample) {
            let pair = by_instant.entry(at).or_default();
            pair.extended.get_or_insert(sample.active);
        }
    }
    for sample in retracted {
        if let Some(at) = instant_of(sample) {
            let pair = by_instant.entry(at).or_default();
            pair.retracted.get_or_insert(sample.active);
        }
    }

    by_instant
        .into_iter()
        .map(|(at, pair)| PositionPoint::new(at, derive_position(pair.extended, pair.retracted)))
        .collect()
}

fn instant_of(sample: &SensorSample) -> Option<DateTime<Utc>> {
    match sample.ts.to_instant() {
        Ok(at) => Some(at),
        Err(e) => {
            tracing::debug!(error = %e, "discarding sample with unparseable timestamp");
            None
        }
    }
}
