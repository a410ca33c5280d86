use std::{sync::Arc, time::Duration};

use remote_state::{RemoteStateClient, StoreError};
use serde_json::Value;

pub mod access;
pub mod actuators;
pub mod dispatch;
pub mod telemetry;

pub use access::{authorize, require, AccessDecision, AccessDenied};
pub use dispatch::{dispatch, validate_command, DispatchError};
pub use telemetry::{read_actuators, read_sensors, read_sensors_for_listing, TelemetryRead};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-process handles shared by every request. The store is injected so the same code
/// runs against the realtime database, the in-memory store, or a test double.
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn RemoteStateClient>,
    pub store_timeout: Duration,
}

impl ApiContext {
    pub fn new(store: Arc<dyn RemoteStateClient>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    /// Store read bounded by `store_timeout`; an elapsed deadline is a store failure.
    pub(crate) async fn store_get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        tokio::time::timeout(self.store_timeout, self.store.get(path))
            .await
            .map_err(|_| StoreError::Timeout(self.store_timeout))?
    }

    pub(crate) async fn store_set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        tokio::time::timeout(self.store_timeout, self.store.set(path, value))
            .await
            .map_err(|_| StoreError::Timeout(self.store_timeout))?
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
