use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::{path_segments, RemoteStateClient, StoreError};

/// In-process JSON tree with the same path semantics as the realtime database. Used when
/// no remote store is configured and as a seeded store in tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    root: Arc<RwLock<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(root: Value) -> Self {
        Self {
            root: Arc::new(RwLock::new(root)),
        }
    }

    pub async fn snapshot(&self) -> Value {
        self.root.read().await.clone()
    }
}

#[async_trait]
impl RemoteStateClient for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let segments = path_segments(path)?;
        let guard = self.root.read().await;

        let mut node = &*guard;
        for segment in segments {
            match node.get(segment) {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }

        if node.is_null() {
            Ok(None)
        } else {
            Ok(Some(node.clone()))
        }
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = path_segments(path)?;
        let mut guard = self.root.write().await;
        let root = std::mem::take(&mut *guard);
        *guard = insert_at(root, &segments, value);
        Ok(())
    }
}

/// Rebuilds `node` with `value` placed under `segments`. Non-object parents are replaced
/// by objects; a `null` value removes the leaf.
fn insert_at(node: Value, segments: &[&str], value: Value) -> Value {
    let Some((head, rest)) = segments.split_first() else {
        return value;
    };
    let mut map = match node {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let child = map.remove(*head).unwrap_or(Value::Null);
    let updated = insert_at(child, rest, value);
    if !updated.is_null() {
        map.insert((*head).to_string(), updated);
    }
    Value::Object(map)
}

#[cfg(test)]
#[path = "tests/memory_tests.rs"]
mod tests;
