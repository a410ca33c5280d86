use remote_state::StoreError;
use serde_json::Value;
use shared::{
    domain::{ActuatorCommand, ActuatorId, Direction},
    error::ErrorCode,
    protocol::{ControlRequest, DispatchResult},
};
use thiserror::Error;
use tracing::{error, info};

use crate::{actuators::find_actuator, ApiContext};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid parameters")]
    InvalidParameters,
    #[error("Invalid direction '{0}'")]
    InvalidDirection(String),
    #[error("Unknown actuator {0}")]
    UnknownActuator(ActuatorId),
    #[error("Failed to control actuator")]
    DispatchFailed(#[source] StoreError),
}

impl DispatchError {
    pub fn code(&self) -> ErrorCode {
        match self {
            DispatchError::InvalidParameters | DispatchError::InvalidDirection(_) => {
                ErrorCode::Validation
            }
            DispatchError::UnknownActuator(_) => ErrorCode::NotFound,
            DispatchError::DispatchFailed(_) => ErrorCode::UpstreamUnavailable,
        }
    }

    pub fn to_result(&self) -> DispatchResult {
        DispatchResult::rejected(self.to_string())
    }
}

/// Validates `request` and writes the normalized direction to the actuator's control
/// slot. The write overwrites whatever is stored; concurrent commands race and the last
/// write wins. Callers must have authorized the identity beforehand.
pub async fn dispatch(
    ctx: &ApiContext,
    request: &ControlRequest,
) -> Result<DispatchResult, DispatchError> {
    let command = validate_command(request)?;
    let actuator = find_actuator(command.actuator_id)
        .ok_or(DispatchError::UnknownActuator(command.actuator_id))?;

    ctx.store_set(
        actuator.control_path,
        Value::String(command.direction.as_str().to_string()),
    )
    .await
    .map_err(|err| {
        error!(
            actuator_id = %command.actuator_id,
            direction = %command.direction,
            path = actuator.control_path,
            error = %err,
            "actuator command was not written"
        );
        DispatchError::DispatchFailed(err)
    })?;

    info!(
        actuator_id = %command.actuator_id,
        direction = %command.direction,
        "actuator command written"
    );
    Ok(DispatchResult::accepted(command.actuator_id, command.direction))
}

/// Checks presence of both fields, then normalizes the direction to one of the known
/// commands. Nothing here touches the store.
pub fn validate_command(request: &ControlRequest) -> Result<ActuatorCommand, DispatchError> {
    let actuator_id = request.id.as_ref().and_then(actuator_id_from);
    let raw_direction = request
        .direction
        .as_ref()
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|raw| !raw.is_empty());

    let (Some(actuator_id), Some(raw_direction)) = (actuator_id, raw_direction) else {
        return Err(DispatchError::InvalidParameters);
    };

    let direction = raw_direction
        .parse::<Direction>()
        .map_err(|err| DispatchError::InvalidDirection(err.0))?;

    Ok(ActuatorCommand {
        actuator_id,
        direction,
    })
}

/// Accepts a non-zero integer, either as a JSON number or as the numeric string a
/// form-encoded body carries.
fn actuator_id_from(value: &Value) -> Option<ActuatorId> {
    let id = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (id != 0).then_some(ActuatorId(id))
}

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod tests;
