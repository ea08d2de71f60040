use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Authentication configuration.
///
/// Authentication is an explicit mode: with `type = "none"` the gateway
/// performs no token verification and no permission checks at all. A
/// presented `Authorization` header is ignored in that mode, never honored.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum AuthConfig {
    /// No authentication. Any request is allowed.
    /// Only suitable for local development.
    #[default]
    None,

    /// JWT authentication.
    /// Tokens are validated against a JWKS key set resolved from the
    /// configured trust domain at startup.
    Jwt(JwtAuthConfig),
}

impl AuthConfig {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, AuthConfig::None)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            AuthConfig::None => Ok(()),
            AuthConfig::Jwt(c) => c.validate(),
        }
    }
}

/// JWT authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JwtAuthConfig {
    /// Trust domain hosting the JWKS discovery document.
    /// The key set is fetched from
    /// `https://{domain}/.well-known/jwks.json` at startup.
    pub domain: String,

    /// Explicit JWKS URL, overriding the one derived from `domain`.
    /// Useful for non-TLS local setups.
    #[serde(default)]
    pub jwks_url: Option<String>,

    /// Expected issuer (iss claim). Not checked when unset.
    #[serde(default)]
    pub issuer: Option<String>,

    /// Expected audience (aud claim). Not checked when unset.
    #[serde(default)]
    pub audience: Option<String>,

    /// Claim holding the granted permission patterns.
    #[serde(default = "default_permissions_claim")]
    pub permissions_claim: String,

    /// How long a fetched key set stays fresh, in seconds. A stale set is
    /// refetched before the next token lookup to pick up key rotation.
    #[serde(default = "default_jwks_refresh")]
    pub jwks_refresh_secs: u64,

    /// Allowed JWT signing algorithms. Tokens signed with any other
    /// algorithm (including "none") are rejected outright.
    #[serde(default = "default_allowed_algorithms")]
    pub allowed_algorithms: Vec<JwtAlgorithm>,
}

impl JwtAuthConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.is_empty() && self.jwks_url.is_none() {
            return Err(ConfigError::Validation(
                "auth.domain cannot be empty unless auth.jwks_url is set".into(),
            ));
        }
        if self.allowed_algorithms.is_empty() {
            return Err(ConfigError::Validation(
                "At least one JWT algorithm must be allowed".into(),
            ));
        }
        for alg in &self.allowed_algorithms {
            if matches!(alg, JwtAlgorithm::HS256) {
                tracing::warn!(
                    algorithm = ?alg,
                    "HMAC algorithms are less secure for public key scenarios. \
                     Consider using asymmetric algorithms (RS256, ES256) instead."
                );
            }
        }
        Ok(())
    }

    /// The JWKS endpoint to resolve the signing key set from.
    pub fn jwks_endpoint(&self) -> String {
        self.jwks_url
            .clone()
            .unwrap_or_else(|| format!("https://{}/.well-known/jwks.json", self.domain))
    }
}

/// JWT signing algorithm.
/// Asymmetric algorithms (RS*, ES*, EdDSA) are strongly recommended; HS256
/// should only be used when you control both signing and verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JwtAlgorithm {
    /// HMAC with SHA-256 (symmetric, use with caution)
    HS256,
    /// RSA with SHA-256 (asymmetric, recommended)
    RS256,
    /// RSA with SHA-384 (asymmetric, recommended)
    RS384,
    /// RSA with SHA-512 (asymmetric, recommended)
    RS512,
    /// ECDSA with P-256 and SHA-256 (asymmetric, recommended)
    ES256,
    /// ECDSA with P-384 and SHA-384 (asymmetric, recommended)
    ES384,
    /// EdDSA (Ed25519)
    EdDSA,
}

impl JwtAlgorithm {
    /// Convert to jsonwebtoken Algorithm.
    pub fn to_jwt_algorithm(self) -> jsonwebtoken::Algorithm {
        match self {
            JwtAlgorithm::HS256 => jsonwebtoken::Algorithm::HS256,
            JwtAlgorithm::RS256 => jsonwebtoken::Algorithm::RS256,
            JwtAlgorithm::RS384 => jsonwebtoken::Algorithm::RS384,
            JwtAlgorithm::RS512 => jsonwebtoken::Algorithm::RS512,
            JwtAlgorithm::ES256 => jsonwebtoken::Algorithm::ES256,
            JwtAlgorithm::ES384 => jsonwebtoken::Algorithm::ES384,
            JwtAlgorithm::EdDSA => jsonwebtoken::Algorithm::EdDSA,
        }
    }

    /// Check if this algorithm matches a jsonwebtoken Algorithm.
    pub fn matches(self, alg: jsonwebtoken::Algorithm) -> bool {
        self.to_jwt_algorithm() == alg
    }
}

fn default_allowed_algorithms() -> Vec<JwtAlgorithm> {
    vec![JwtAlgorithm::RS256]
}

fn default_permissions_claim() -> String {
    "permissions".to_string()
}

fn default_jwks_refresh() -> u64 {
    3600 // 1 hour
}
