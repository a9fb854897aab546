//! Numeric rendering of position series for step charts.

use chrono::SecondsFormat;
use cylmon_core::types::{Position, PositionPoint};
use cylmon_core::window::RollingWindow;
use serde::Serialize;

/// One plotted point: `valor` is 1 for extended, 0 for retracted and 0.5 in
/// between.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub ts: String,
    pub valor: f64,
}

pub fn position_value(position: Position) -> f64 {
    match position {
        Position::Extended => 1.0,
        Position::Retracted => 0.0,
        Position::Undefined => 0.5,
    }
}

impl From<&PositionPoint> for ChartPoint {
    fn from(p: &PositionPoint) -> Self {
        Self {
            ts: p.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            valor: position_value(p.position),
        }
    }
}

/// The window as chart points, oldest first.
pub fn series(window: &RollingWindow) -> Vec<ChartPoint> {
    window.points().iter().map(ChartPoint::from).collect()
}
