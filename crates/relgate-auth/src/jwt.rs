//! Token encoding and validation.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::claims::JwtClaims;

/// Errors from token creation or validation.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token could not be created.
    #[error("Failed to create token: {0}")]
    TokenCreation(jsonwebtoken::errors::Error),

    /// Token has expired.
    #[error("Token has expired")]
    TokenExpired,

    /// Token failed validation.
    #[error("Invalid token: {0}")]
    InvalidToken(jsonwebtoken::errors::Error),
}

/// Encode claims into a signed HS256 token.
pub fn encode_token(claims: &JwtClaims, secret: &[u8]) -> Result<String, AuthError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(AuthError::TokenCreation)
}

/// Decode and validate a token, returning its claims.
///
/// Expiry is always enforced; audience is not, since governance tokens are
/// scoped by role rather than audience.
pub fn decode_token(token: &str, secret: &[u8]) -> Result<JwtClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;

    decode::<JwtClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const SECRET: &[u8] = b"test-signing-secret";

    #[test]
    fn test_round_trip() {
        let claims = JwtClaims::builder()
            .subject("user-1")
            .roles(vec!["cab_reviewer"])
            .expires_in_secs(300)
            .build();

        let token = encode_token(&claims, SECRET).unwrap();
        let decoded = decode_token(&token, SECRET).unwrap();

        assert_eq!(decoded.sub, "user-1");
        assert!(decoded.has_role("cab_reviewer"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = JwtClaims::builder()
            .subject("user-1")
            .expires_in_secs(300)
            .build();

        let token = encode_token(&claims, SECRET).unwrap();
        let result = decode_token(&token, b"other-secret");

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = JwtClaims::builder()
            .subject("user-1")
            .issued_at(Utc::now().timestamp() - 7200)
            .expiration(Utc::now().timestamp() - 3600)
            .build();

        let token = encode_token(&claims, SECRET).unwrap();
        let result = decode_token(&token, SECRET);

        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let result = decode_token("not.a.token", SECRET);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }
}
