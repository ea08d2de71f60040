use async_trait::async_trait;
use dashmap::DashMap;

use super::{KeyValueStore, StoreError, StoreResult};

/// In-memory key-value store backed by a `DashMap`.
///
/// Each node holds its own independent data and everything is lost on
/// restart. Suitable for local development and tests; use the Redis
/// backend for anything shared or durable.
#[derive(Default)]
pub struct MemoryStore {
    data: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.data
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.data.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
