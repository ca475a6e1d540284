//! Governance API endpoints for relgate.
//!
//! REST surface for the risk-based deployment governance core: CAB approval
//! requests, time-bounded exceptions, and trust maturity.
//!
//! # Endpoints
//!
//! ## Approval Requests
//! - `POST /cab/submit` - submit a deployment for approval
//! - `POST /cab/{id}/approve`, `POST /cab/{id}/reject` - reviewer decisions
//! - `GET /cab/{id}`, `GET /cab/{id}/decisions` - request record and ledger
//! - `GET /cab/pending`, `GET /cab/my-requests` - role-scoped listings
//! - `GET /cab/intents/{intent_id}/status` - approval standing of an intent
//!
//! ## Exceptions
//! - `POST /cab/exceptions` - request a time-bounded risk exception
//! - `POST /cab/exceptions/{id}/approve|reject` - security reviewer decisions
//! - `GET /cab/exceptions/pending`, `GET /cab/exceptions/my-exceptions`
//!
//! ## Trust Maturity
//! - `GET /cab/maturity/status`, `POST /cab/maturity/evaluate`

pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod router;

pub use error::{ApiGovernanceError, ApiResult, ErrorResponse};
pub use jobs::{
    ExceptionExpiryJob, ExceptionExpiryJobError, ExceptionExpiryStats, MaturityEvaluationJob,
    MaturityEvaluationJobError, MaturityEvaluationStats,
};
pub use middleware::{jwt_auth_middleware, JwtSecret};
pub use router::{governance_router, GovernanceState};
