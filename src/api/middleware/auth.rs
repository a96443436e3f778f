//! Shared-secret authentication middleware

use axum::{
    body::Body,
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

/// Authentication middleware
///
/// The `Authorization` header must equal the configured token byte for byte.
/// An empty configured token matches nothing.
pub async fn auth_middleware(
    State(expected_token): State<String>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;

    if expected_token.is_empty() || provided.as_bytes() != expected_token.as_bytes() {
        debug!("rejecting {} {}: invalid token", request.method(), request.uri());
        return Err(AuthError::InvalidToken);
    }

    Ok(next.run(request).await)
}

/// Authentication errors
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing Authorization header"),
            AuthError::InvalidToken => (StatusCode::FORBIDDEN, "Invalid token"),
        };

        (status, message).into_response()
    }
}
