//! Business services for the governance domain.

pub mod exception;
pub mod maturity;
pub mod workflow;

pub use exception::{
    CabException, CabExceptionService, CreateExceptionInput, ExceptionStore,
    InMemoryExceptionStore, DEFAULT_EXPIRY_DAYS, MAX_EXPIRY_DAYS, MIN_EXPIRY_DAYS,
};
pub use maturity::{
    default_ladder, DeploymentVolumeSource, FixedDeploymentVolume, InMemoryMaturityLevelStore,
    InMemoryMaturityProgressStore, MaturityEvaluation, MaturityLevelStore, MaturityProgressStore,
    MaturityStatusReport, TrustMaturityEngine, TrustMaturityLevel, TrustMaturityProgress,
};
pub use workflow::{
    ApprovalDecision, ApprovalRequest, ApprovalRequestStore, ApprovalStatusSummary,
    CabWorkflowService, DecisionStore, InMemoryApprovalRequestStore, InMemoryDecisionStore,
    SubmitApprovalInput, AUTO_APPROVE_MAX_SCORE, MANUAL_REVIEW_MAX_SCORE,
};
