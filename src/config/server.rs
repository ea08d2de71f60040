use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base path under which the key-value routes are mounted
    /// (e.g., "/redis" serves `GET /redis/{key}`).
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Overall per-request timeout in milliseconds.
    ///
    /// Bounds token verification, the request-body read, and the backend
    /// call. A store mutation already in flight when the timeout fires may
    /// still complete at the store side.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Request body size limit in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_path: default_base_path(),
            timeout_ms: default_timeout_ms(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_path.starts_with('/') || self.base_path.len() < 2 {
            return Err(ConfigError::Validation(
                "server.base_path must be an absolute path like \"/redis\"".into(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "server.timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// The socket address to bind the listener to.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    8090
}

fn default_base_path() -> String {
    "/redis".to_string()
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_body_limit() -> usize {
    1024 * 1024 // 1 MiB
}
