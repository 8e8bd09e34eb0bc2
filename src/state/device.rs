//! Device record and partial update structures

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::utils::duration::ZERO_HHMM;

/// Field names of the v1 record schema. They are refused instead of being
/// merged into the v2 record under a different meaning.
const LEGACY_FIELDS: &[(&str, &str)] = &[
    ("waterHeight", "waterDepth"),
    ("waterVolume", "totalLitres"),
    ("totalWater", "totalLitres"),
    ("timer", "timerRemaining"),
];

/// Fields a patch may never carry as pass-through telemetry.
const RESERVED_FIELDS: &[&str] = &["key"];

/// Two-state motor switch. Serialized as `"OFF"`/`"ON"`, parsed in any casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MotorState {
    #[default]
    Off,
    On,
}

impl FromStr for MotorState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("off") {
            Ok(MotorState::Off)
        } else if s.eq_ignore_ascii_case("on") {
            Ok(MotorState::On)
        } else {
            Err(format!("motorState must be \"OFF\" or \"ON\", got {:?}", s))
        }
    }
}

impl<'de> Deserialize<'de> for MotorState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for MotorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorState::Off => write!(f, "OFF"),
            MotorState::On => write!(f, "ON"),
        }
    }
}

/// Stored state of one water-level/motor controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub key: String,
    /// Water depth in cm
    pub water_depth: f64,
    /// Installed tank height in cm
    pub height: f64,
    pub total_litres: f64,
    /// Total electricity in kW
    pub total_electricity: f64,
    pub motor_state: MotorState,
    pub timer_remaining: String,
    pub last_timer_time: Option<DateTime<Utc>>,
    pub last_heartbeat: Option<DateTime<Utc>>,
    /// Any other telemetry the device reports, stored untouched
    #[serde(flatten)]
    pub telemetry: Map<String, Value>,
}

impl DeviceRecord {
    /// Create a record with every field at its default value
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            water_depth: 0.0,
            height: 0.0,
            total_litres: 0.0,
            total_electricity: 0.0,
            motor_state: MotorState::Off,
            timer_remaining: ZERO_HHMM.to_string(),
            last_timer_time: None,
            last_heartbeat: None,
            telemetry: Map::new(),
        }
    }

    /// Copy every field present in `patch` onto the record; absent fields stay as they are.
    pub fn apply(&mut self, patch: &DevicePatch) {
        if let Some(v) = patch.water_depth {
            self.water_depth = v;
        }
        if let Some(v) = patch.height {
            self.height = v;
        }
        if let Some(v) = patch.total_litres {
            self.total_litres = v;
        }
        if let Some(v) = patch.total_electricity {
            self.total_electricity = v;
        }
        if let Some(v) = patch.motor_state {
            self.motor_state = v;
        }
        if let Some(v) = &patch.timer_remaining {
            self.timer_remaining = v.clone();
        }
        if let Some(v) = patch.last_timer_time {
            self.last_timer_time = Some(v);
        }
        if let Some(v) = patch.last_heartbeat {
            self.last_heartbeat = Some(v);
        }
        for (name, value) in &patch.telemetry {
            self.telemetry.insert(name.clone(), value.clone());
        }
    }
}

/// Partial update of a device record.
///
/// Serializes to exactly the fields that are present, which is also the
/// payload handed to the notifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_depth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_litres: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_electricity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motor_state: Option<MotorState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_remaining: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_timer_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub telemetry: Map<String, Value>,
}

impl DevicePatch {
    /// Only `lastTimerTime`, written when a countdown starts
    pub fn timer_started(at: DateTime<Utc>) -> Self {
        Self {
            last_timer_time: Some(at),
            ..Self::default()
        }
    }

    /// Periodic countdown progress
    pub fn timer_sync(remaining: String, at: DateTime<Utc>) -> Self {
        Self {
            timer_remaining: Some(remaining),
            last_timer_time: Some(at),
            ..Self::default()
        }
    }

    /// Terminal state of a countdown: motor off, display at zero
    pub fn timer_finished(at: DateTime<Utc>) -> Self {
        Self {
            motor_state: Some(MotorState::Off),
            timer_remaining: Some(ZERO_HHMM.to_string()),
            last_timer_time: Some(at),
            ..Self::default()
        }
    }

    pub fn heartbeat(at: DateTime<Utc>) -> Self {
        Self {
            last_heartbeat: Some(at),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reject v1 field names and reserved names hiding in the telemetry map.
    pub fn check_schema(&self) -> Result<(), String> {
        for (legacy, current) in LEGACY_FIELDS {
            if self.telemetry.contains_key(*legacy) {
                return Err(format!(
                    "field {:?} belongs to the v1 record schema, use {:?}",
                    legacy, current
                ));
            }
        }
        for reserved in RESERVED_FIELDS {
            if self.telemetry.contains_key(*reserved) {
                return Err(format!("field {:?} cannot be updated", reserved));
            }
        }
        Ok(())
    }
}

/// One page of the device listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePage {
    pub data: Vec<DeviceRecord>,
    pub total: usize,
    pub page: usize,
    pub last_page: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn motor_state_accepts_any_casing() {
        for raw in ["\"on\"", "\"ON\"", "\"On\""] {
            let state: MotorState = serde_json::from_str(raw).unwrap();
            assert_eq!(state, MotorState::On);
        }
        assert!(serde_json::from_str::<MotorState>("\"idle\"").is_err());
        assert_eq!(serde_json::to_value(MotorState::Off).unwrap(), json!("OFF"));
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch: DevicePatch =
            serde_json::from_value(json!({"timerRemaining": "00:05", "motorState": "on"})).unwrap();
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"timerRemaining": "00:05", "motorState": "ON"})
        );
    }

    #[test]
    fn apply_leaves_absent_fields_untouched() {
        let mut record = DeviceRecord::new("dev1");
        record.water_depth = 12.5;
        let patch: DevicePatch =
            serde_json::from_value(json!({"height": 80.0, "pumpTemp": 41})).unwrap();

        record.apply(&patch);

        assert_eq!(record.water_depth, 12.5);
        assert_eq!(record.height, 80.0);
        assert_eq!(record.motor_state, MotorState::Off);
        assert_eq!(record.telemetry.get("pumpTemp"), Some(&json!(41)));
    }

    #[test]
    fn legacy_and_reserved_fields_are_refused() {
        let legacy: DevicePatch = serde_json::from_value(json!({"timer": "00:05"})).unwrap();
        assert!(legacy.check_schema().unwrap_err().contains("timerRemaining"));

        let rename: DevicePatch = serde_json::from_value(json!({"key": "other"})).unwrap();
        assert!(rename.check_schema().is_err());

        let fine: DevicePatch = serde_json::from_value(json!({"waterDepth": 3.0})).unwrap();
        assert!(fine.check_schema().is_ok());
    }

    #[test]
    fn finished_patch_matches_wire_shape() {
        let at = DateTime::parse_from_rfc3339("2025-06-01T12:34:56Z").unwrap().with_timezone(&Utc);
        assert_eq!(
            serde_json::to_value(DevicePatch::timer_finished(at)).unwrap(),
            json!({
                "motorState": "OFF",
                "timerRemaining": "00:00",
                "lastTimerTime": "2025-06-01T12:34:56Z"
            })
        );
    }
}
