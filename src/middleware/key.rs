//! Resource-key resolution middleware.

use axum::{
    extract::{Path, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::context::ResourceKey;

/// Extract the `{key}` path segment and attach it to the request.
///
/// Runs before the permission check so that both the authorizer and the
/// handlers read the same resolved key. The router never matches an empty
/// segment, but the guard keeps the invariant local rather than implied.
pub async fn resolve_key_middleware(
    Path(key): Path<String>,
    mut req: Request,
    next: Next,
) -> Response {
    if key.is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }

    req.extensions_mut().insert(ResourceKey(key));

    next.run(req).await
}
