mod error;
pub mod jwt;

use async_trait::async_trait;
pub use error::AuthError;
pub use jwt::{JwtValidator, TokenClaims};

/// Pluggable token verification strategy.
///
/// Implementations turn a raw bearer credential into the granted permission
/// patterns. The concrete signing-key source (JWKS discovery, static key
/// material, a test double) is swappable without touching the authorization
/// or handler logic.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a raw token and return the permission patterns it grants.
    ///
    /// Any verification failure yields an error and no permissions; an
    /// absent permission claim on a valid token is an empty grant list.
    async fn verify(&self, token: &str) -> Result<Vec<String>, AuthError>;
}
