//! Key-value operation handlers.
//!
//! Both handlers expect a request that already passed the pipeline: the
//! resolved [`ResourceKey`] is read from the request extensions, never
//! re-parsed from the route. Each operation makes exactly one backend call,
//! with no retries.

use axum::{
    Extension,
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{AppState, middleware::ResourceKey, store::StoreError};

/// `GET {base_path}/{key}`: fetch the raw value for a key.
///
/// 200 with the value bytes, 404 with an empty body when the backend has no
/// value, 500 on any other backend failure.
pub async fn get_value(
    State(state): State<AppState>,
    Extension(ResourceKey(key)): Extension<ResourceKey>,
) -> Response {
    let key = format_key(&state, &key);

    match state.store.get(&key).await {
        Ok(value) => (StatusCode::OK, value).into_response(),
        Err(StoreError::NotFound) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!(key = %key, error = %e, "Failed to get key");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `POST {base_path}/{key}`: store the request body as the value.
///
/// 201 with an empty body on success. A body-read failure is a 500 and the
/// backend is never called: the store sees either the full value or
/// nothing.
pub async fn set_value(
    State(state): State<AppState>,
    Extension(ResourceKey(key)): Extension<ResourceKey>,
    req: Request,
) -> Response {
    let key = format_key(&state, &key);

    let body = match axum::body::to_bytes(req.into_body(), usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(key = %key, error = %e, "Failed to read request body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match state.store.set(&key, &body).await {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(e) => {
            tracing::error!(key = %key, error = %e, "Failed to set key");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Apply the namespace prefix to a resolved resource key.
fn format_key(state: &AppState, key: &str) -> String {
    format!("{}{}", state.config.store.key_prefix(), key)
}
