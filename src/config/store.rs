use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Backing key-value store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum StoreConfig {
    /// In-memory store. Data is lost on restart and not shared between
    /// nodes. Only suitable for local development and tests.
    Memory(MemoryStoreConfig),

    /// Redis store. Connectivity is verified at startup; a misconfigured
    /// address fails process initialization rather than the first request.
    Redis(RedisStoreConfig),
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Memory(MemoryStoreConfig::default())
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            StoreConfig::Memory(_) => Ok(()),
            StoreConfig::Redis(c) => c.validate(),
        }
    }

    /// Namespace prefix prepended to every resource key before it reaches
    /// the backend. The prefix is also part of the required-action string,
    /// so permission patterns address prefixed keys.
    pub fn key_prefix(&self) -> &str {
        match self {
            StoreConfig::Memory(c) => &c.key_prefix,
            StoreConfig::Redis(c) => &c.key_prefix,
        }
    }
}

/// In-memory store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryStoreConfig {
    /// Key prefix for all stored keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
        }
    }
}

/// Redis store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedisStoreConfig {
    /// Redis connection URL.
    /// Format: redis://[user:password@]host:port[/database]
    /// Credentials are best supplied via `${REDIS_PASSWORD}` expansion.
    pub url: String,

    /// Connection timeout in seconds, covering the startup liveness probe.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Key prefix for all stored keys.
    /// Useful when sharing a Redis instance with other applications.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl RedisStoreConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::Validation("Redis URL cannot be empty".into()));
        }
        Ok(())
    }
}

fn default_key_prefix() -> String {
    "kave:".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_memory_with_kave_prefix() {
        let config = StoreConfig::default();
        assert!(matches!(config, StoreConfig::Memory(_)));
        assert_eq!(config.key_prefix(), "kave:");
    }

    #[test]
    fn test_empty_redis_url_rejected() {
        let config = StoreConfig::Redis(RedisStoreConfig {
            url: String::new(),
            connect_timeout_secs: default_connect_timeout(),
            key_prefix: default_key_prefix(),
        });
        assert!(config.validate().is_err());
    }
}
