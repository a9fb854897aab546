use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::timestamp::RawTimestamp;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Derived three-valued position of an actuator at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Extended,
    Retracted,
    Undefined,
}

impl Position {
    pub fn all() -> &'static [Position] {
        &[Position::Extended, Position::Retracted, Position::Undefined]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Position::Extended => "extended",
            Position::Retracted => "retracted",
            Position::Undefined => "undefined",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SensorSample
// ---------------------------------------------------------------------------

/// One raw proximity-sensor reading as served by `/api/cylinder/history`.
///
/// Wire shape: `{ "ts": <timestamp>, "valor": 0 | 1 }`. A missing `ts` is
/// kept as an unparseable timestamp and a missing or non-numeric `valor`
/// reads as inactive, so one odd sample never rejects the whole response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    #[serde(default)]
    pub ts: RawTimestamp,
    #[serde(rename = "valor", with = "sensor_value", default)]
    pub active: bool,
}

impl SensorSample {
    pub fn new(ts: impl Into<RawTimestamp>, active: bool) -> Self {
        Self {
            ts: ts.into(),
            active,
        }
    }
}

mod sensor_value {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Flag(bool),
        Number(f64),
        Other(serde::de::IgnoredAny),
    }

    pub fn serialize<S: Serializer>(active: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(u8::from(*active))
    }

    // Only an exact 1 (or `true`) means the sensor is triggered.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Wire::deserialize(d)? {
            Wire::Flag(b) => b,
            Wire::Number(n) => n == 1.0,
            Wire::Other(_) => false,
        })
    }
}

// ---------------------------------------------------------------------------
// PositionPoint
// ---------------------------------------------------------------------------

/// One reconciled point of an actuator's position series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionPoint {
    pub timestamp: DateTime<Utc>,
    pub position: Position,
}

impl PositionPoint {
    pub fn new(timestamp: DateTime<Utc>, position: Position) -> Self {
        Self {
            timestamp,
            position,
        }
    }
}

// ---------------------------------------------------------------------------
// ActuatorStatus
// ---------------------------------------------------------------------------

/// Label shown until the status endpoint has answered at least once.
pub const UNDEFINED_STATUS_LABEL: &str = "POSIÇÃO INDEFINIDA";

/// Current discrete status of one actuator, as labelled by the status service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorStatus {
    pub label: String,
}

impl ActuatorStatus {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Classify the service label into the position vocabulary.
    pub fn position(&self) -> Position {
        match self.label.trim().to_uppercase().as_str() {
            "AVANÇADO" | "AVANCADO" | "EXTENDED" => Position::Extended,
            "RECUADO" | "RETRACTED" => Position::Retracted,
            _ => Position::Undefined,
        }
    }
}

impl Default for ActuatorStatus {
    fn default() -> Self {
        Self::new(UNDEFINED_STATUS_LABEL)
    }
}

impl fmt::Display for ActuatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_decodes_integer_valor() {
        let s: SensorSample =
            serde_json::from_str(r#"{"ts":"2024-05-01T10:00:00Z","valor":1}"#).unwrap();
        assert!(s.active);
        assert_eq!(s.ts, RawTimestamp::Text("2024-05-01T10:00:00Z".into()));

        let s: SensorSample =
            serde_json::from_str(r#"{"ts":"2024-05-01T10:00:00Z","valor":0}"#).unwrap();
        assert!(!s.active);
    }

    #[test]
    fn sample_decodes_bool_and_float_valor() {
        let s: SensorSample = serde_json::from_str(r#"{"ts":"x","valor":true}"#).unwrap();
        assert!(s.active);
        let s: SensorSample = serde_json::from_str(r#"{"ts":"x","valor":1.0}"#).unwrap();
        assert!(s.active);
        let s: SensorSample = serde_json::from_str(r#"{"ts":"x","valor":2}"#).unwrap();
        assert!(!s.active);
    }

    #[test]
    fn sample_with_odd_valor_is_inactive() {
        for body in [
            r#"{"ts":"x","valor":"1"}"#,
            r#"{"ts":"x","valor":null}"#,
            r#"{"ts":"x"}"#,
        ] {
            let s: SensorSample = serde_json::from_str(body).unwrap();
            assert!(!s.active, "{body} should read as inactive");
        }
    }

    #[test]
    fn sample_without_ts_keeps_an_unparseable_timestamp() {
        let s: SensorSample = serde_json::from_str(r#"{"valor":1}"#).unwrap();
        assert!(s.active);
        assert!(s.ts.to_instant().is_err());
    }

    #[test]
    fn sample_serializes_valor_as_integer() {
        let json = serde_json::to_value(SensorSample::new("t", true)).unwrap();
        assert_eq!(json, serde_json::json!({ "ts": "t", "valor": 1 }));
    }

    #[test]
    fn status_defaults_to_undefined_label() {
        let status = ActuatorStatus::default();
        assert_eq!(status.label, UNDEFINED_STATUS_LABEL);
        assert_eq!(status.position(), Position::Undefined);
    }

    #[test]
    fn status_classifies_known_labels() {
        assert_eq!(ActuatorStatus::new("AVANÇADO").position(), Position::Extended);
        assert_eq!(ActuatorStatus::new("avançado").position(), Position::Extended);
        assert_eq!(ActuatorStatus::new("RECUADO").position(), Position::Retracted);
        assert_eq!(ActuatorStatus::new(" retracted ").position(), Position::Retracted);
        assert_eq!(ActuatorStatus::new("EM MOVIMENTO").position(), Position::Undefined);
    }

    #[test]
    fn position_as_str_matches_serde() {
        for p in Position::all() {
            let json = serde_json::to_value(p).unwrap();
            assert_eq!(json, serde_json::Value::String(p.as_str().to_string()));
        }
    }
}
