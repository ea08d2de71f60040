use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Authentication failures surfaced by the token verification stage.
///
/// Responses carry no body: the gateway serves raw values, and an error
/// payload here would be indistinguishable from stored data to a client.
#[derive(Debug)]
pub enum AuthError {
    /// No bearer credentials provided, or a non-Bearer scheme
    MissingCredentials,

    /// Token failed verification (bad signature, untrusted algorithm,
    /// malformed, unknown signing key)
    InvalidToken,

    /// Token is outside its validity window
    ExpiredToken,

    /// Signing key material could not be resolved
    KeySetUnavailable(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::MissingCredentials
            | AuthError::InvalidToken
            | AuthError::ExpiredToken => StatusCode::UNAUTHORIZED,
            AuthError::KeySetUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        status.into_response()
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingCredentials => write!(f, "Authentication credentials required"),
            AuthError::InvalidToken => write!(f, "Invalid authentication token"),
            AuthError::ExpiredToken => write!(f, "Authentication token has expired"),
            AuthError::KeySetUnavailable(msg) => {
                write!(f, "Signing key set unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for AuthError {}
