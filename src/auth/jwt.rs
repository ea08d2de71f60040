//! JWT validation against a JWKS key set.
//!
//! The key set is resolved once from the trust domain's discovery endpoint
//! at startup; per-request validation only touches in-memory key material.
//! A stale set is refetched on the next lookup to pick up key rotation.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use jsonwebtoken::{
    Algorithm, DecodingKey, TokenData, Validation, decode, decode_header,
    jwk::{AlgorithmParameters, Jwk, JwkSet},
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{AuthError, TokenVerifier};
use crate::config::JwtAuthConfig;

/// Claims extracted from a validated token.
///
/// Temporal claims (exp, nbf) are checked by the validation layer and not
/// re-surfaced here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject
    #[serde(default)]
    pub sub: Option<String>,

    /// Granted permission patterns. An absent claim means no grants,
    /// not an error.
    #[serde(default)]
    pub permissions: Vec<String>,

    /// All other claims (for custom claim extraction)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Cached key set with its fetch time.
struct CachedJwks {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
}

/// JWT validator holding the resolved JWKS key set.
pub struct JwtValidator {
    config: JwtAuthConfig,
    http_client: reqwest::Client,
    jwks_cache: RwLock<CachedJwks>,
}

impl std::fmt::Debug for JwtValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtValidator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl JwtValidator {
    /// Resolve the key set from the configured trust domain and build a
    /// validator. Fails fast so that a misconfigured domain aborts startup
    /// instead of surfacing per request.
    pub async fn discover(
        config: JwtAuthConfig,
        http_client: reqwest::Client,
    ) -> Result<Self, AuthError> {
        let url = config.jwks_endpoint();
        let keys = fetch_keys(&http_client, &url).await?;

        tracing::info!(url = %url, keys_count = keys.len(), "Resolved signing key set");

        Ok(Self {
            config,
            http_client,
            jwks_cache: RwLock::new(CachedJwks {
                keys,
                fetched_at: Instant::now(),
            }),
        })
    }

    /// Build a validator from an already-parsed key set.
    /// Used for static key material and test doubles.
    pub fn from_jwk_set(config: JwtAuthConfig, jwks: &JwkSet) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
            jwks_cache: RwLock::new(CachedJwks {
                keys: keys_from_jwk_set(jwks),
                fetched_at: Instant::now(),
            }),
        }
    }

    /// Validate a token and return its claims.
    pub async fn validate(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let header = decode_header(token).map_err(|e| {
            tracing::debug!(error = %e, "Failed to decode token header");
            AuthError::InvalidToken
        })?;

        // Reject anything outside the configured allowlist before touching
        // key material. This closes off algorithm confusion attacks:
        // "none", HMAC-with-public-key, and downgrades all fail here.
        if !self.is_algorithm_allowed(header.alg) {
            tracing::warn!(algorithm = ?header.alg, "Token algorithm not in allowlist");
            return Err(AuthError::InvalidToken);
        }

        let kid = header.kid.as_ref().ok_or_else(|| {
            tracing::debug!("Token missing key ID (kid)");
            AuthError::InvalidToken
        })?;

        let decoding_key = self.get_decoding_key(kid).await?;

        let mut validation = Validation::new(header.alg);
        // Temporal claims are validated when present but none is mandatory.
        validation.set_required_spec_claims::<&str>(&[]);
        validation.validate_nbf = true;
        validation.validate_aud = self.config.audience.is_some();
        if let Some(issuer) = &self.config.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(audience) = &self.config.audience {
            validation.set_audience(&[audience]);
        }

        let token_data: TokenData<TokenClaims> =
            decode(token, &decoding_key, &validation).map_err(|e| {
                tracing::debug!(error = %e, "Token validation failed");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                    _ => AuthError::InvalidToken,
                }
            })?;

        Ok(token_data.claims)
    }

    /// Extract the granted permission patterns from the configured claim.
    pub fn extract_permissions(&self, claims: &TokenClaims) -> Vec<String> {
        if self.config.permissions_claim == "permissions" {
            return claims.permissions.clone();
        }

        claims
            .extra
            .get(&self.config.permissions_claim)
            .and_then(|v| v.as_array())
            .map(|patterns| {
                patterns
                    .iter()
                    .filter_map(|p| p.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn is_algorithm_allowed(&self, alg: Algorithm) -> bool {
        self.config
            .allowed_algorithms
            .iter()
            .any(|allowed| allowed.matches(alg))
    }

    /// Get the decoding key for a key ID, refetching a stale key set first.
    async fn get_decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let refresh_after = Duration::from_secs(self.config.jwks_refresh_secs);

        {
            let cache = self.jwks_cache.read().await;
            if cache.fetched_at.elapsed() < refresh_after {
                return cache.keys.get(kid).cloned().ok_or_else(|| {
                    tracing::warn!(kid = kid, "Key ID not found in key set");
                    AuthError::InvalidToken
                });
            }
        }

        // Stale: refetch to pick up rotated keys. A failed refetch keeps
        // serving the last known set rather than failing the request.
        if let Err(e) = self.refresh_jwks().await {
            tracing::warn!(error = %e, "Key set refresh failed, using previous keys");
        }

        let cache = self.jwks_cache.read().await;
        cache.keys.get(kid).cloned().ok_or_else(|| {
            tracing::warn!(kid = kid, "Key ID not found in key set");
            AuthError::InvalidToken
        })
    }

    /// Fetch the key set from the discovery endpoint and replace the cache.
    async fn refresh_jwks(&self) -> Result<(), AuthError> {
        let url = self.config.jwks_endpoint();
        let keys = fetch_keys(&self.http_client, &url).await?;

        tracing::info!(keys_count = keys.len(), "Key set refreshed");

        let mut cache = self.jwks_cache.write().await;
        *cache = CachedJwks {
            keys,
            fetched_at: Instant::now(),
        };

        Ok(())
    }
}

#[async_trait]
impl TokenVerifier for JwtValidator {
    async fn verify(&self, token: &str) -> Result<Vec<String>, AuthError> {
        let claims = self.validate(token).await?;
        Ok(self.extract_permissions(&claims))
    }
}

/// Fetch a JWKS document and convert it into decoding keys by key ID.
async fn fetch_keys(
    client: &reqwest::Client,
    url: &str,
) -> Result<HashMap<String, DecodingKey>, AuthError> {
    let response = client.get(url).send().await.map_err(|e| {
        tracing::error!(error = %e, url = %url, "Failed to fetch key set");
        AuthError::KeySetUnavailable(format!("fetch failed: {}", e))
    })?;

    if !response.status().is_success() {
        let status = response.status();
        tracing::error!(status = %status, url = %url, "Key set endpoint returned error");
        return Err(AuthError::KeySetUnavailable(format!(
            "endpoint returned {}",
            status
        )));
    }

    let jwks: JwkSet = response.json().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to parse key set response");
        AuthError::KeySetUnavailable(format!("parse failed: {}", e))
    })?;

    Ok(keys_from_jwk_set(&jwks))
}

/// Convert a JWK set into decoding keys, skipping entries that carry no key
/// ID or unsupported key material.
fn keys_from_jwk_set(jwks: &JwkSet) -> HashMap<String, DecodingKey> {
    let mut keys = HashMap::new();
    for jwk in &jwks.keys {
        let Some(kid) = &jwk.common.key_id else {
            tracing::warn!("Skipping JWK without a key ID");
            continue;
        };
        match jwk_to_decoding_key(jwk) {
            Ok(key) => {
                keys.insert(kid.clone(), key);
            }
            Err(e) => {
                tracing::warn!(kid = kid, error = %e, "Failed to convert JWK to decoding key");
            }
        }
    }
    keys
}

/// Convert a single JWK to a DecodingKey.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            DecodingKey::from_rsa_components(&rsa.n, &rsa.e).map_err(|e| {
                AuthError::KeySetUnavailable(format!("bad RSA key components: {}", e))
            })
        }
        AlgorithmParameters::EllipticCurve(ec) => DecodingKey::from_ec_components(&ec.x, &ec.y)
            .map_err(|e| AuthError::KeySetUnavailable(format!("bad EC key components: {}", e))),
        AlgorithmParameters::OctetKey(oct) => DecodingKey::from_base64_secret(&oct.value)
            .map_err(|e| AuthError::KeySetUnavailable(format!("bad octet key: {}", e))),
        _ => Err(AuthError::KeySetUnavailable(
            "unsupported JWK algorithm type".to_string(),
        )),
    }
}
