use chrono::{DateTime, Utc};
use remote_state::{CONTROL_PATH, SENSOR_DATA_PATH};
use serde_json::Value;
use shared::{
    domain::{Direction, SensorId},
    protocol::{ActuatorDisplay, SensorDisplay, SensorSnapshot, SENTINEL_NA, STATUS_IDLE},
};
use tracing::warn;

use crate::{actuators::ACTUATORS, ApiContext};

pub const SENSOR_READ_FAILED: &str = "Failed to load sensor data";
pub const ACTUATOR_READ_FAILED: &str = "Failed to load actuator data";

/// Result of a read that never fails outright: `data` is always usable and `error`
/// carries an advisory message when the store could not be reached.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRead<T> {
    pub data: T,
    pub error: Option<String>,
}

impl<T> TelemetryRead<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TelemetryRead<U> {
        TelemetryRead {
            data: f(self.data),
            error: self.error,
        }
    }
}

pub async fn read_sensors(ctx: &ApiContext) -> TelemetryRead<SensorSnapshot> {
    let fetched_at = Utc::now();
    match ctx.store_get(SENSOR_DATA_PATH).await {
        Ok(raw) => TelemetryRead {
            data: normalize_snapshot(raw.as_ref(), fetched_at),
            error: None,
        },
        Err(error) => {
            warn!(path = SENSOR_DATA_PATH, %error, "sensor read failed, serving sentinels");
            TelemetryRead {
                data: SensorSnapshot::degraded(fetched_at),
                error: Some(SENSOR_READ_FAILED.to_string()),
            }
        }
    }
}

pub async fn read_sensors_for_listing(ctx: &ApiContext) -> TelemetryRead<Vec<SensorDisplay>> {
    read_sensors(ctx).await.map(|snapshot| sensor_listing(&snapshot))
}

pub async fn read_actuators(ctx: &ApiContext) -> TelemetryRead<Vec<ActuatorDisplay>> {
    match ctx.store_get(CONTROL_PATH).await {
        Ok(raw) => TelemetryRead {
            data: ACTUATORS
                .iter()
                .map(|actuator| ActuatorDisplay {
                    id: actuator.id,
                    name: actuator.name.to_string(),
                    status: status_or_idle(raw.as_ref().and_then(|v| v.get(actuator.control_key))),
                    directions: Direction::ALL.to_vec(),
                    icon: actuator.icon.to_string(),
                })
                .collect(),
            error: None,
        },
        Err(error) => {
            warn!(path = CONTROL_PATH, %error, "control state read failed");
            TelemetryRead {
                data: Vec::new(),
                error: Some(ACTUATOR_READ_FAILED.to_string()),
            }
        }
    }
}

/// Maps the raw `sensor/data` record (`suhu`, `jarak`, `stepper`) onto a snapshot.
///
/// Numeric fields follow truthiness: a numeric reading of exactly zero is
/// indistinguishable from a missing one and both become absent.
pub fn normalize_snapshot(raw: Option<&Value>, fetched_at: DateTime<Utc>) -> SensorSnapshot {
    let field = |key: &str| raw.and_then(|value| value.get(key));
    SensorSnapshot {
        temperature_c: truthy_number(field("suhu")),
        distance_cm: truthy_number(field("jarak")),
        stepper_status: status_or_idle(field("stepper")),
        fetched_at,
    }
}

pub fn sensor_listing(snapshot: &SensorSnapshot) -> Vec<SensorDisplay> {
    vec![
        SensorDisplay {
            id: SensorId(1),
            name: "Temperature".into(),
            value: format_reading(snapshot.temperature_c, "°C"),
            icon: "fa-thermometer-half".into(),
        },
        SensorDisplay {
            id: SensorId(2),
            name: "Distance".into(),
            value: format_reading(snapshot.distance_cm, "cm"),
            icon: "fa-ruler-vertical".into(),
        },
        SensorDisplay {
            id: SensorId(3),
            name: "Stepper Status".into(),
            value: snapshot.stepper_status.clone(),
            icon: "fa-cog".into(),
        },
    ]
}

pub fn format_reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v} {unit}"),
        None => SENTINEL_NA.to_string(),
    }
}

/// A numeric zero is falsy, a non-empty string is not: `"0"` stays a reading of zero.
fn truthy_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite() && *v != 0.0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn status_or_idle(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => STATUS_IDLE.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/telemetry_tests.rs"]
mod tests;
