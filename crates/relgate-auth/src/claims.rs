//! JWT claims for governance API tokens.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by a relgate access token.
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer
/// - `aud`: Audience (intended recipients)
/// - `exp`: Expiration time (Unix timestamp)
/// - `iat`: Issued at (Unix timestamp)
/// - `jti`: JWT ID (unique identifier)
///
/// # Custom Claims
///
/// - `roles`: Reviewer roles for authorization
///
/// # Example
///
/// ```rust
/// use relgate_auth::JwtClaims;
///
/// let claims = JwtClaims::builder()
///     .subject("3a6f0a3e-8f0f-4f40-9a64-47e4e64708c1")
///     .roles(vec!["cab_reviewer"])
///     .expires_in_secs(3600)
///     .build();
///
/// assert!(claims.has_role("cab_reviewer"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JwtClaims {
    /// Subject - the user ID.
    pub sub: String,

    /// Issuer - who created the token.
    pub iss: String,

    /// Audience - intended recipients.
    #[serde(default)]
    pub aud: Vec<String>,

    /// Expiration time as Unix timestamp.
    pub exp: i64,

    /// Issued at as Unix timestamp.
    pub iat: i64,

    /// JWT ID - unique identifier for this token.
    pub jti: String,

    /// Reviewer roles for authorization.
    #[serde(default)]
    pub roles: Vec<String>,

    /// User email address (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl JwtClaims {
    /// Create a new builder for constructing JWT claims.
    #[must_use]
    pub fn builder() -> JwtClaimsBuilder {
        JwtClaimsBuilder::default()
    }

    /// Check if the token is expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Check if the claims contain a specific role.
    ///
    /// Role names are matched exactly; reviewer roles are deliberately
    /// disjoint so that CAB reviewers cannot decide exceptions and vice versa.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Check if the claims contain any of the specified roles.
    #[must_use]
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|r| self.has_role(r))
    }

    /// The subject parsed as a user UUID, if it is one.
    #[must_use]
    pub fn user_id(&self) -> Option<Uuid> {
        self.sub.parse().ok()
    }
}

/// Builder for constructing JWT claims.
#[derive(Debug, Default)]
pub struct JwtClaimsBuilder {
    sub: Option<String>,
    iss: Option<String>,
    aud: Vec<String>,
    exp: Option<i64>,
    iat: Option<i64>,
    jti: Option<String>,
    roles: Vec<String>,
    email: Option<String>,
}

impl JwtClaimsBuilder {
    /// Set the subject (user ID).
    #[must_use]
    pub fn subject(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Set the issuer.
    #[must_use]
    pub fn issuer(mut self, iss: impl Into<String>) -> Self {
        self.iss = Some(iss.into());
        self
    }

    /// Set the audience.
    #[must_use]
    pub fn audience(mut self, aud: Vec<impl Into<String>>) -> Self {
        self.aud = aud.into_iter().map(Into::into).collect();
        self
    }

    /// Set expiration time as Unix timestamp.
    #[must_use]
    pub fn expiration(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Set expiration time as seconds from now.
    #[must_use]
    pub fn expires_in_secs(mut self, secs: i64) -> Self {
        self.exp = Some(Utc::now().timestamp() + secs);
        self
    }

    /// Set expiration time using a Duration.
    #[must_use]
    pub fn expires_in(mut self, duration: Duration) -> Self {
        self.exp = Some((Utc::now() + duration).timestamp());
        self
    }

    /// Set the issued at time.
    #[must_use]
    pub fn issued_at(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Set the JWT ID.
    #[must_use]
    pub fn jwt_id(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }

    /// Set the roles.
    #[must_use]
    pub fn roles(mut self, roles: Vec<impl Into<String>>) -> Self {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Set the email address.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Build the claims.
    ///
    /// Missing fields fall back to sensible defaults: issuer `relgate`,
    /// issued-at now, expiry one hour out, a random `jti`.
    #[must_use]
    pub fn build(self) -> JwtClaims {
        let now = Utc::now().timestamp();
        JwtClaims {
            sub: self.sub.unwrap_or_default(),
            iss: self.iss.unwrap_or_else(|| "relgate".to_string()),
            aud: self.aud,
            exp: self.exp.unwrap_or(now + 3600),
            iat: self.iat.unwrap_or(now),
            jti: self.jti.unwrap_or_else(|| Uuid::new_v4().to_string()),
            roles: self.roles,
            email: self.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let claims = JwtClaims::builder().subject("user-1").build();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.iss, "relgate");
        assert!(!claims.jti.is_empty());
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_has_role_exact_match_only() {
        let claims = JwtClaims::builder()
            .subject("user-1")
            .roles(vec!["cab_reviewer"])
            .build();

        assert!(claims.has_role("cab_reviewer"));
        assert!(!claims.has_role("security_reviewer"));
        assert!(!claims.has_role("cab"));
    }

    #[test]
    fn test_has_any_role() {
        let claims = JwtClaims::builder()
            .subject("user-1")
            .roles(vec!["security_reviewer"])
            .build();

        assert!(claims.has_any_role(&["cab_reviewer", "security_reviewer"]));
        assert!(!claims.has_any_role(&["cab_reviewer"]));
    }

    #[test]
    fn test_user_id_parses_uuid_subject() {
        let id = Uuid::new_v4();
        let claims = JwtClaims::builder().subject(id.to_string()).build();
        assert_eq!(claims.user_id(), Some(id));

        let claims = JwtClaims::builder().subject("not-a-uuid").build();
        assert_eq!(claims.user_id(), None);
    }

    #[test]
    fn test_expired_token() {
        let claims = JwtClaims::builder()
            .subject("user-1")
            .expiration(Utc::now().timestamp() - 60)
            .build();

        assert!(claims.is_expired());
    }
}
