//! Background sweep jobs for the governance core.
//!
//! Both sweeps are idempotent and may be invoked on any cadence:
//! - Exception expiry - transitions approved-and-lapsed exceptions to `expired`
//! - Maturity evaluation - evaluates the rolling incident window and records
//!   the outcome

pub mod exception_expiry_job;
pub mod maturity_evaluation_job;

pub use exception_expiry_job::{
    ExceptionExpiryJob, ExceptionExpiryJobError, ExceptionExpiryStats,
};
pub use maturity_evaluation_job::{
    MaturityEvaluationJob, MaturityEvaluationJobError, MaturityEvaluationStats,
};
