//! Backend key-value store abstraction.
//!
//! Adapters translate store-specific "no value" sentinels into the
//! canonical [`StoreError::NotFound`] so the handler layer can map errors
//! to transport status codes without knowing the backend.

mod memory;
mod redis;

use std::sync::Arc;

use async_trait::async_trait;
pub use memory::MemoryStore;
use thiserror::Error;

pub use self::redis::RedisStore;
use crate::config::StoreConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found")]
    NotFound,

    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("timed out connecting to the store")]
    ConnectTimeout,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A key-value backend.
///
/// Values are opaque byte sequences; the gateway neither interprets nor
/// transforms them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value for a key. A missing key is [`StoreError::NotFound`],
    /// never an empty value.
    async fn get(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Store a value, unconditionally overwriting any existing one.
    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;
}

/// Build the configured store backend, verifying connectivity where the
/// backend supports it.
pub async fn from_config(config: &StoreConfig) -> StoreResult<Arc<dyn KeyValueStore>> {
    match config {
        StoreConfig::Memory(_) => Ok(Arc::new(MemoryStore::new())),
        StoreConfig::Redis(c) => Ok(Arc::new(RedisStore::connect(c).await?)),
    }
}
