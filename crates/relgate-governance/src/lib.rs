//! Risk-based deployment governance domain logic.
//!
//! This crate decides whether a proposed deployment change may proceed
//! automatically, must be reviewed by the Change Advisory Board, or needs a
//! time-bounded risk exception - and tracks the incident record that earns
//! (or loses) automation headroom over time.
//!
//! # Components
//!
//! - [`scoring::RiskScoringEngine`] - pure evidence-to-score mapping against
//!   the active risk model's weighted factor rubrics
//! - [`services::CabWorkflowService`] - decision tiers, approval request
//!   lifecycle, and the append-only decision ledger
//! - [`services::CabExceptionService`] - time-bounded dual-authority
//!   exceptions for deployments above the exception threshold
//! - [`services::TrustMaturityEngine`] - incident-window evaluation and
//!   risk-model-version promotion
//! - [`model::RiskModelService`] - model version administration with the
//!   single-active-version invariant
//!
//! # Storage
//!
//! All services run over `*Store` traits with in-memory implementations for
//! testing; a relational backend supplies the same contracts (row locks for
//! the decision compare-and-transition, a uniqueness constraint for the
//! decision ledger, one transaction for model activation).
//!
//! # Audit
//!
//! The [`audit`] module records an event for every state-changing operation:
//! submissions, decisions, exceptions, sweeps, model activations, and
//! maturity transitions.

pub mod audit;
pub mod error;
pub mod evidence;
pub mod incident;
pub mod model;
pub mod scoring;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use error::{GovernanceError, Result};
pub use types::{
    ApprovalRequestId,
    ApprovalStatus,
    BlastRadius,
    BlastRadiusClass,
    DecisionId,
    DecisionTier,
    DecisionType,
    EvidencePackageId,
    ExceptionId,
    ExceptionStatus,
    IncidentId,
    IncidentSeverity,
    MaturityStatus,
    RiskFactorType,
    RiskModelMode,
};

// Re-export evidence and incident records
pub use evidence::{EvidencePackage, EvidencePackageStore, InMemoryEvidencePackageStore};
pub use incident::{
    DeploymentIncident, IncidentStore, IncidentWindowCounts, InMemoryIncidentStore,
};

// Re-export model configuration
pub use model::{
    InMemoryRiskModelStore, RegisterModelVersionInput, RiskFactor, RiskModelService,
    RiskModelStore, RiskModelVersion, Rubric, RubricBand,
};

// Re-export scoring
pub use scoring::{FactorScore, RiskAssessment, RiskScoringEngine};

// Re-export service types
pub use services::{
    ApprovalDecision,
    ApprovalRequest,
    ApprovalStatusSummary,
    CabException,
    CabExceptionService,
    CabWorkflowService,
    CreateExceptionInput,
    DeploymentVolumeSource,
    FixedDeploymentVolume,
    MaturityEvaluation,
    MaturityStatusReport,
    SubmitApprovalInput,
    TrustMaturityEngine,
    TrustMaturityLevel,
    TrustMaturityProgress,
};
