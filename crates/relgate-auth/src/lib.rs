//! Authentication primitives for the relgate governance surface.
//!
//! Provides the JWT claims model used by the API layer for role-scoped
//! access control, plus token encode/decode helpers.
//!
//! Roles recognized by the governance surface:
//! - `cab_reviewer` - may decide pending CAB approval requests and see all requests
//! - `security_reviewer` - may decide risk exceptions (distinct from CAB reviewers)

pub mod claims;
pub mod jwt;

pub use claims::{JwtClaims, JwtClaimsBuilder};
pub use jwt::{decode_token, encode_token, AuthError};
