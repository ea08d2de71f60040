//! Bearer-token authentication middleware.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::context::Permissions;
use crate::{AppState, auth::AuthError};

/// Authenticate the bearer token and attach the granted permissions to the
/// request.
///
/// Only mounted when authentication is enabled; requests without a Bearer
/// credential never reach the verifier, let alone the store.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(verifier) = state.verifier.clone() else {
        tracing::error!("Authentication middleware mounted without a token verifier");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let Some(token) = bearer_token(req.headers()) else {
        return AuthError::MissingCredentials.into_response();
    };

    let permissions = match verifier.verify(token).await {
        Ok(permissions) => permissions,
        Err(e) => {
            // The token itself never reaches the logs.
            tracing::debug!(error = %e, "Token verification failed");
            return e.into_response();
        }
    };

    req.extensions_mut().insert(Permissions(Arc::new(permissions)));

    next.run(req).await
}

/// Extract the bearer credential from the `Authorization` header.
/// The scheme comparison is case-insensitive; anything else is treated as
/// missing credentials.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
