use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ActuatorId, Direction, SensorId};

/// Placeholder rendered for a numeric reading that is absent or falsy.
pub const SENTINEL_NA: &str = "N/A";
/// Placeholder rendered for a missing stepper status.
pub const STATUS_IDLE: &str = "IDLE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    #[serde(with = "reading")]
    pub temperature_c: Option<f64>,
    #[serde(with = "reading")]
    pub distance_cm: Option<f64>,
    pub stepper_status: String,
    pub fetched_at: DateTime<Utc>,
}

impl SensorSnapshot {
    /// Snapshot with every field at its sentinel, used when the store cannot be read.
    pub fn degraded(fetched_at: DateTime<Utc>) -> Self {
        Self {
            temperature_c: None,
            distance_cm: None,
            stepper_status: STATUS_IDLE.to_string(),
            fetched_at,
        }
    }
}

/// Serializes an optional reading as a bare number, or as [`SENTINEL_NA`] when absent.
mod reading {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::SENTINEL_NA;

    pub fn serialize<S: Serializer>(
        value: &Option<f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_f64(*v),
            None => serializer.serialize_str(SENTINEL_NA),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Number(v)) => Some(v),
            Some(Raw::Text(_)) | None => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorDisplay {
    pub id: SensorId,
    pub name: String,
    pub value: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorDisplay {
    pub id: ActuatorId,
    pub name: String,
    pub status: String,
    pub directions: Vec<Direction>,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub data: SensorSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorListingView {
    pub sensors: Vec<SensorDisplay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuatorListingView {
    pub actuators: Vec<ActuatorDisplay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Inbound actuator command as posted by the dashboard. Both fields are kept loose so
/// that missing, null or mistyped values reach validation instead of failing extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlRequest {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub direction: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub success: bool,
    pub message: String,
    #[serde(
        rename = "direction",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub normalized_direction: Option<Direction>,
}

impl DispatchResult {
    pub fn accepted(actuator_id: ActuatorId, direction: Direction) -> Self {
        Self {
            success: true,
            message: format!("Actuator {actuator_id} set to {direction}"),
            normalized_direction: Some(direction),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            normalized_direction: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
}
