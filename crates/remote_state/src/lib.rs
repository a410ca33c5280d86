use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

mod memory;
mod realtime_db;

pub use memory::MemoryStore;
pub use realtime_db::RealtimeDbClient;

/// Key-path of the latest sensor readings.
pub const SENSOR_DATA_PATH: &str = "sensor/data";
/// Subtree holding actuator control state.
pub const CONTROL_PATH: &str = "kontrol";
/// Scalar command slot of the stepper motor.
pub const STEPPER_CONTROL_PATH: &str = "kontrol/stepper";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store path '{0}'")]
    InvalidPath(String),
    #[error("invalid store configuration: {0}")]
    Config(String),
    #[error("store request timed out after {0:?}")]
    Timeout(Duration),
    #[error("store transport failure: {0}")]
    Transport(String),
    #[error("store responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("store returned an undecodable body: {0}")]
    Decode(String),
}

/// Hierarchical key-path store shared by every request. Implementations must be safe for
/// concurrent use; callers hold them behind an `Arc`.
#[async_trait]
pub trait RemoteStateClient: Send + Sync {
    /// Returns `None` when nothing is stored at `path`.
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Overwrites the value at `path`. Writing `null` removes it.
    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;
}

/// Splits a slash separated key-path into its segments. Leading and trailing slashes are
/// ignored and the empty path addresses the root.
pub fn path_segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    trimmed
        .split('/')
        .map(|segment| {
            let forbidden = segment.is_empty()
                || segment
                    .chars()
                    .any(|c| matches!(c, '.' | '#' | '$' | '[' | ']') || c.is_control());
            if forbidden {
                Err(StoreError::InvalidPath(path.to_string()))
            } else {
                Ok(segment)
            }
        })
        .collect()
}
