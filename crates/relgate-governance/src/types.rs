//! Type definitions for the deployment governance domain.
//!
//! Includes newtype wrappers for IDs and enums for domain values.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types (Newtype Pattern)
// ============================================================================

/// Unique identifier for a CAB approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalRequestId(pub Uuid);

impl ApprovalRequestId {
    /// Create a new random ApprovalRequestId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ApprovalRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApprovalRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ApprovalRequestId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<ApprovalRequestId> for Uuid {
    fn from(id: ApprovalRequestId) -> Self {
        id.0
    }
}

/// Unique identifier for an approval decision record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionId(pub Uuid);

impl DecisionId {
    /// Create a new random DecisionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for DecisionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for DecisionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<DecisionId> for Uuid {
    fn from(id: DecisionId) -> Self {
        id.0
    }
}

/// Unique identifier for a CAB exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExceptionId(pub Uuid);

impl ExceptionId {
    /// Create a new random ExceptionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ExceptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExceptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ExceptionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<ExceptionId> for Uuid {
    fn from(id: ExceptionId) -> Self {
        id.0
    }
}

/// Unique identifier for an evidence package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidencePackageId(pub Uuid);

impl EvidencePackageId {
    /// Create a new random EvidencePackageId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for EvidencePackageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EvidencePackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EvidencePackageId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<EvidencePackageId> for Uuid {
    fn from(id: EvidencePackageId) -> Self {
        id.0
    }
}

/// Unique identifier for a deployment incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentId(pub Uuid);

impl IncidentId {
    /// Create a new random IncidentId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for IncidentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for IncidentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<IncidentId> for Uuid {
    fn from(id: IncidentId) -> Self {
        id.0
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Status of a CAB approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting a manual review decision.
    Submitted,
    /// Approved automatically at submission time.
    AutoApproved,
    /// Risk exceeds the exception threshold; an exception must be raised.
    ExceptionRequired,
    /// Approved by a reviewer.
    Approved,
    /// Rejected by a reviewer.
    Rejected,
}

impl ApprovalStatus {
    /// Whether the request counts as approved for release purposes.
    #[must_use]
    pub fn is_approved(self) -> bool {
        matches!(self, Self::Approved | Self::AutoApproved)
    }

    /// Whether the request has reached a final state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Submitted)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::AutoApproved => write!(f, "auto_approved"),
            Self::ExceptionRequired => write!(f, "exception_required"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Decision types recorded in the approval ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum DecisionType {
    /// Request approved.
    Approved,
    /// Request rejected.
    Rejected,
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Decision tier a risk score routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum DecisionTier {
    /// Proceeds without human review.
    AutoApproved,
    /// Requires a CAB reviewer decision.
    ManualReview,
    /// Requires a time-bounded risk exception.
    ExceptionRequired,
}

impl fmt::Display for DecisionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AutoApproved => write!(f, "auto_approved"),
            Self::ManualReview => write!(f, "manual_review"),
            Self::ExceptionRequired => write!(f, "exception_required"),
        }
    }
}

/// Status of a CAB exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ExceptionStatus {
    /// Awaiting a security reviewer decision.
    Pending,
    /// Granted; active until expiry.
    Approved,
    /// Declined.
    Rejected,
    /// Past its expiry date.
    Expired,
}

impl fmt::Display for ExceptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Operational incident severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum IncidentSeverity {
    /// Full outage or data loss.
    P1,
    /// Major degradation.
    P2,
    /// Minor degradation.
    P3,
    /// Cosmetic or informational.
    P4,
}

impl fmt::Display for IncidentSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P1 => write!(f, "p1"),
            Self::P2 => write!(f, "p2"),
            Self::P3 => write!(f, "p3"),
            Self::P4 => write!(f, "p4"),
        }
    }
}

/// Blast-radius classification of a deployment target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum BlastRadius {
    /// Core infrastructure; an outage affects everything downstream.
    CriticalInfrastructure,
    /// Revenue- or safety-relevant business systems.
    BusinessCritical,
    /// Internal productivity tooling.
    ProductivityTools,
    /// Everything else.
    NonCritical,
}

impl fmt::Display for BlastRadius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CriticalInfrastructure => write!(f, "critical_infrastructure"),
            Self::BusinessCritical => write!(f, "business_critical"),
            Self::ProductivityTools => write!(f, "productivity_tools"),
            Self::NonCritical => write!(f, "non_critical"),
        }
    }
}

/// The closed set of risk factor types the scoring engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RiskFactorType {
    /// Test coverage percentage.
    Coverage,
    /// Critical and high security findings.
    Security,
    /// Manual test execution status.
    Testing,
    /// Rollback plan presence and depth.
    Rollback,
    /// Number of affected components.
    Scope,
}

impl fmt::Display for RiskFactorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coverage => write!(f, "coverage"),
            Self::Security => write!(f, "security"),
            Self::Testing => write!(f, "testing"),
            Self::Rollback => write!(f, "rollback"),
            Self::Scope => write!(f, "scope"),
        }
    }
}

/// Operating mode of a risk model version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RiskModelMode {
    /// Tight ceilings; most changes go to review.
    Conservative,
    /// Balanced ceilings.
    Standard,
    /// Raised ceilings earned through incident history.
    Progressive,
}

impl fmt::Display for RiskModelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conservative => write!(f, "conservative"),
            Self::Standard => write!(f, "standard"),
            Self::Progressive => write!(f, "progressive"),
        }
    }
}

/// Status of a trust maturity evaluation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum MaturityStatus {
    /// Evaluation in progress.
    Evaluating,
    /// All promotion criteria passed.
    CriteriaMet,
    /// One or more promotion criteria failed.
    CriteriaNotMet,
    /// Progression was executed.
    Progressed,
    /// The level was lowered.
    Regressed,
}

impl fmt::Display for MaturityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evaluating => write!(f, "evaluating"),
            Self::CriteriaMet => write!(f, "criteria_met"),
            Self::CriteriaNotMet => write!(f, "criteria_not_met"),
            Self::Progressed => write!(f, "progressed"),
            Self::Regressed => write!(f, "regressed"),
        }
    }
}

// ============================================================================
// Blast Radius Classes
// ============================================================================

/// Configuration for one blast-radius class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastRadiusClass {
    /// Class name.
    pub name: BlastRadius,
    /// Upper bound on users affected by a deployment in this class.
    pub user_impact_max: u32,
    /// Business criticality descriptor.
    pub business_criticality: String,
    /// Number of CAB reviewers required for manual approval.
    pub cab_quorum_required: u32,
    /// Whether automatic approval is permitted at all for this class.
    pub auto_approve_allowed: bool,
}

impl BlastRadiusClass {
    /// The default four-class ladder.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                name: BlastRadius::CriticalInfrastructure,
                user_impact_max: u32::MAX,
                business_criticality: "severe".to_string(),
                cab_quorum_required: 2,
                auto_approve_allowed: false,
            },
            Self {
                name: BlastRadius::BusinessCritical,
                user_impact_max: 50_000,
                business_criticality: "high".to_string(),
                cab_quorum_required: 2,
                auto_approve_allowed: true,
            },
            Self {
                name: BlastRadius::ProductivityTools,
                user_impact_max: 5_000,
                business_criticality: "moderate".to_string(),
                cab_quorum_required: 1,
                auto_approve_allowed: true,
            },
            Self {
                name: BlastRadius::NonCritical,
                user_impact_max: 500,
                business_criticality: "low".to_string(),
                cab_quorum_required: 1,
                auto_approve_allowed: true,
            },
        ]
    }
}
