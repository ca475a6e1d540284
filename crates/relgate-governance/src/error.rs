//! Error types for the governance domain.

use thiserror::Error;
use uuid::Uuid;

use crate::types::{
    ApprovalRequestId, ApprovalStatus, EvidencePackageId, ExceptionId, ExceptionStatus,
    RiskFactorType,
};

/// Result type alias for governance operations.
pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Domain error for governance operations.
///
/// Three recoverable kinds: validation (rejected before any state change),
/// not-found, and state-conflict. Storage failures are propagated, not
/// retried, by this layer.
#[derive(Debug, Error)]
pub enum GovernanceError {
    // Validation errors
    /// Generic validation failure.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Risk score outside the 0-100 range.
    #[error("Risk score {0} is outside the valid range 0-100")]
    InvalidRiskScore(f64),

    /// Exception created without compensating controls.
    #[error("Compensating controls must not be empty")]
    EmptyCompensatingControls,

    /// Exception expiry outside the 1-90 day window.
    #[error("Exception expiry must be between 1 and 90 days, got {0}")]
    InvalidExpiryDays(i64),

    /// Maturity evaluation period is negative.
    #[error("Evaluation period must not be negative, got {0} weeks")]
    InvalidEvaluationPeriod(i64),

    /// Exception approver is the exception requester.
    #[error("Exception approver must differ from the requester")]
    SelfApprovalForbidden,

    /// Progression attempted without the criteria being met.
    #[error("Trust maturity progression criteria are not met")]
    ProgressionNotReady,

    /// Evidence correlation id already in use.
    #[error("Evidence correlation id already exists: {0}")]
    DuplicateCorrelationId(String),

    /// A factor with this type already exists for the model version.
    #[error("Duplicate risk factor {factor_type} for model version {version}")]
    DuplicateRiskFactor {
        version: String,
        factor_type: RiskFactorType,
    },

    /// A model version with this name already exists.
    #[error("Risk model version already exists: {0}")]
    DuplicateModelVersion(String),

    // Not-found errors
    /// Referenced evidence package does not exist.
    #[error("Evidence package not found: {0}")]
    EvidencePackageNotFound(EvidencePackageId),

    /// Approval request does not exist.
    #[error("Approval request not found: {0}")]
    RequestNotFound(ApprovalRequestId),

    /// No approval request recorded for the deployment intent.
    #[error("No approval request found for deployment intent {0}")]
    NoRequestForIntent(Uuid),

    /// Exception does not exist.
    #[error("Exception not found: {0}")]
    ExceptionNotFound(ExceptionId),

    /// Risk model version does not exist.
    #[error("Risk model version not found: {0}")]
    ModelVersionNotFound(String),

    /// No risk model version is currently active.
    #[error("No active risk model version")]
    NoActiveModelVersion,

    /// Trust maturity level name is not part of the ladder.
    #[error("Unknown trust maturity level: {0}")]
    UnknownMaturityLevel(String),

    // State-conflict errors
    /// Request is not in a decidable state.
    #[error("Cannot decide request {id} in status {status}")]
    RequestNotDecidable {
        id: ApprovalRequestId,
        status: ApprovalStatus,
    },

    /// The decision ledger already holds a decision for this request.
    #[error("A decision has already been recorded for request {0}")]
    DecisionAlreadyRecorded(ApprovalRequestId),

    /// Exception is not in a transitionable state.
    #[error("Cannot decide exception {id} in status {status}")]
    ExceptionNotPending {
        id: ExceptionId,
        status: ExceptionStatus,
    },

    /// Exception is past its expiry date; approval is forbidden.
    #[error("Exception {0} has already expired")]
    ExceptionExpired(ExceptionId),

    // Infrastructure
    /// Underlying store failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl GovernanceError {
    /// Whether this error maps to a missing resource.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::EvidencePackageNotFound(_)
                | Self::RequestNotFound(_)
                | Self::NoRequestForIntent(_)
                | Self::ExceptionNotFound(_)
                | Self::ModelVersionNotFound(_)
                | Self::NoActiveModelVersion
                | Self::UnknownMaturityLevel(_)
        )
    }

    /// Whether this error is a state conflict (not in a transitionable state).
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::RequestNotDecidable { .. }
                | Self::DecisionAlreadyRecorded(_)
                | Self::ExceptionNotPending { .. }
                | Self::ExceptionExpired(_)
        )
    }

    /// Whether this error was rejected at validation time.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::InvalidRiskScore(_)
                | Self::EmptyCompensatingControls
                | Self::InvalidExpiryDays(_)
                | Self::InvalidEvaluationPeriod(_)
                | Self::SelfApprovalForbidden
                | Self::ProgressionNotReady
                | Self::DuplicateCorrelationId(_)
                | Self::DuplicateRiskFactor { .. }
                | Self::DuplicateModelVersion(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(GovernanceError::RequestNotFound(ApprovalRequestId::new()).is_not_found());
        assert!(GovernanceError::InvalidRiskScore(120.0).is_validation());
        assert!(GovernanceError::ExceptionExpired(ExceptionId::new()).is_conflict());
        assert!(!GovernanceError::Storage("down".into()).is_validation());
        assert!(!GovernanceError::Storage("down".into()).is_conflict());
        assert!(!GovernanceError::Storage("down".into()).is_not_found());
    }

    #[test]
    fn test_conflict_messages_name_the_state() {
        let err = GovernanceError::RequestNotDecidable {
            id: ApprovalRequestId::new(),
            status: ApprovalStatus::Approved,
        };
        assert!(err.to_string().contains("approved"));
    }
}
