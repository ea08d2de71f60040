//! Permission-check middleware.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::context::{Permissions, ResourceKey};
use crate::{AppState, authz};

/// Deny the request unless a granted pattern covers the required action.
///
/// The required action is `verb:prefix+key`, where the verb comes from the
/// closed GET/POST mapping; any other method is denied without consulting
/// patterns. Runs after authentication and key resolution, before the
/// handler.
pub async fn permission_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(ResourceKey(key)) = req.extensions().get::<ResourceKey>().cloned() else {
        tracing::error!("Permission middleware invoked without a resolved resource key");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let granted = req
        .extensions()
        .get::<Permissions>()
        .cloned()
        .unwrap_or_default();

    let prefix = state.config.store.key_prefix();
    let Some(required) = authz::required_action(req.method(), prefix, &key) else {
        return StatusCode::FORBIDDEN.into_response();
    };

    if !authz::authorize(&state.patterns, &granted.0, &required) {
        tracing::debug!(action = %required, "No granted pattern matches the required action");
        return StatusCode::FORBIDDEN.into_response();
    }

    next.run(req).await
}
