//! JWT authentication middleware.
//!
//! Extracts and validates the bearer token from the Authorization header,
//! then inserts [`JwtClaims`] into request extensions for handlers.

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use relgate_auth::{decode_token, JwtClaims};

/// Wrapper for the JWT signing secret, carried in request extensions.
#[derive(Clone)]
pub struct JwtSecret(pub String);

/// JWT authentication middleware.
///
/// This middleware:
/// 1. Extracts the bearer token from the Authorization header
/// 2. Decodes and validates the JWT
/// 3. Inserts [`JwtClaims`] into request extensions
///
/// # Usage
///
/// ```rust,ignore
/// use axum::{Extension, Router, middleware};
/// use relgate_api_governance::middleware::{jwt_auth_middleware, JwtSecret};
///
/// let router = Router::new()
///     .layer(middleware::from_fn(jwt_auth_middleware))
///     .layer(Extension(JwtSecret("secret".to_string())));
/// ```
pub async fn jwt_auth_middleware(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let secret = request
        .extensions()
        .get::<JwtSecret>()
        .cloned()
        .ok_or_else(|| {
            tracing::error!("JWT secret not configured");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server configuration error",
            )
                .into_response()
        })?;

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            (StatusCode::UNAUTHORIZED, "Missing Authorization header").into_response()
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header format",
        )
            .into_response()
    })?;

    // Reject empty bearer tokens before attempting a decode.
    if token.is_empty() {
        tracing::warn!("Rejected empty bearer token");
        return Err((StatusCode::UNAUTHORIZED, "Empty bearer token").into_response());
    }

    let claims: JwtClaims = decode_token(token, secret.0.as_bytes()).map_err(|e| {
        tracing::warn!("JWT validation failed: {}", e);
        (StatusCode::UNAUTHORIZED, "Invalid or expired token").into_response()
    })?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
