use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;

use super::{KeyValueStore, StoreError, StoreResult};
use crate::config::RedisStoreConfig;

/// Redis-backed key-value store.
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    /// Open a client and verify connectivity with a PING.
    ///
    /// A wrong address or bad credentials fail here, at startup, instead of
    /// lazily on the first request.
    pub async fn connect(config: &RedisStoreConfig) -> StoreResult<Self> {
        let client = redis::Client::open(config.url.as_str())?;

        let probe = async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<(), StoreError>(())
        };

        tokio::time::timeout(Duration::from_secs(config.connect_timeout_secs), probe)
            .await
            .map_err(|_| StoreError::ConnectTimeout)??;

        Ok(Self { client })
    }

    async fn connection(&self) -> StoreResult<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        let mut conn = self.connection().await?;

        let value: Option<Vec<u8>> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;

        value.ok_or(StoreError::NotFound)
    }

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let mut conn = self.connection().await?;

        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await?;

        Ok(())
    }
}
