use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use remote_state::{MemoryStore, RemoteStateClient, StoreError};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::ApiContext;

/// Store double that records every call and can be told to fail or stall.
#[derive(Clone, Default)]
pub(crate) struct RecordingStore {
    pub(crate) inner: MemoryStore,
    pub(crate) calls: Arc<Mutex<Vec<String>>>,
    pub(crate) fail_reads: bool,
    pub(crate) fail_writes_on: Option<&'static str>,
    pub(crate) stall: Option<Duration>,
}

impl RecordingStore {
    pub(crate) fn seeded(root: Value) -> Self {
        Self {
            inner: MemoryStore::with_value(root),
            ..Self::default()
        }
    }

    pub(crate) fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    pub(crate) fn failing_writes_on(path: &'static str) -> Self {
        Self {
            fail_writes_on: Some(path),
            ..Self::default()
        }
    }

    pub(crate) fn stalled(delay: Duration) -> Self {
        Self {
            stall: Some(delay),
            ..Self::default()
        }
    }

    pub(crate) async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    pub(crate) fn context(&self) -> ApiContext {
        ApiContext::new(Arc::new(self.clone()), Duration::from_millis(200))
    }
}

#[async_trait]
impl RemoteStateClient for RecordingStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.calls.lock().await.push(format!("get {path}"));
        if let Some(delay) = self.stall {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads {
            return Err(StoreError::Transport("connection reset".into()));
        }
        self.inner.get(path).await
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.calls.lock().await.push(format!("set {path}"));
        if let Some(delay) = self.stall {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes_on == Some(path) {
            return Err(StoreError::Status {
                status: 401,
                body: "Permission denied".into(),
            });
        }
        self.inner.set(path, value).await
    }
}
