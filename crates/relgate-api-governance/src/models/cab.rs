//! Request and response models for CAB approval endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use relgate_governance::{
    ApprovalDecision, ApprovalRequest, ApprovalStatus, ApprovalStatusSummary, DecisionTier,
    DecisionType,
};

/// Request to submit a deployment for CAB approval.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitCabRequestRequest {
    /// Evidence package backing the risk score.
    pub evidence_package_id: Uuid,

    /// The deployment intent being governed.
    pub deployment_intent_id: Uuid,

    /// Risk score computed for the evidence package (0-100).
    pub risk_score: f64,

    /// Submitter notes.
    #[validate(length(max = 4000, message = "Notes must not exceed 4000 characters"))]
    pub notes: Option<String>,

    /// Correlation id; generated with a `CAB-` prefix when absent.
    #[validate(length(max = 100, message = "Correlation id must not exceed 100 characters"))]
    pub correlation_id: Option<String>,
}

/// Response after submitting a request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitCabResponse {
    /// Created request ID.
    pub id: Uuid,

    /// Status the request was created in.
    pub status: ApprovalStatus,

    /// Decision tier the risk score routed to.
    pub decision_status: DecisionTier,

    /// Message about the outcome.
    pub message: String,

    /// Correlation id for downstream tracing.
    pub correlation_id: String,
}

/// Request to approve a pending CAB request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ApproveRequestRequest {
    /// Optional rationale from the approver.
    #[validate(length(max = 2000, message = "Rationale must not exceed 2000 characters"))]
    pub rationale: Option<String>,

    /// Conditions attached to the approval; non-empty marks it conditional.
    pub conditions: Option<Vec<String>>,
}

/// Request to reject a pending CAB request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RejectRequestRequest {
    /// Optional rationale from the rejector.
    #[validate(length(max = 2000, message = "Rationale must not exceed 2000 characters"))]
    pub rationale: Option<String>,
}

/// Query parameters for listing endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Maximum number of results (default: 50, max: 100).
    pub limit: Option<usize>,

    /// Number of results to skip.
    pub offset: Option<usize>,
}

impl ListQuery {
    /// Effective limit, clamped to 100.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(50).min(100)
    }

    /// Effective offset.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

/// A CAB approval request record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CabRequestResponse {
    /// Request ID.
    pub id: Uuid,

    /// The deployment intent being governed.
    pub deployment_intent_id: Uuid,

    /// Evidence package backing the risk score.
    pub evidence_package_id: Uuid,

    /// Risk score at submission time.
    pub risk_score: f64,

    /// Current status.
    pub status: ApprovalStatus,

    /// Who submitted the request.
    pub submitted_by: Uuid,

    /// Submitter notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Who approved (submitter for auto-approvals).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<Uuid>,

    /// When the terminal decision was made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,

    /// Conditions attached to the approval.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub approval_conditions: Vec<String>,

    /// Correlation id.
    pub correlation_id: String,

    /// When the request was created.
    pub created_at: DateTime<Utc>,

    /// When the request was last updated.
    pub updated_at: DateTime<Utc>,
}

impl From<ApprovalRequest> for CabRequestResponse {
    fn from(request: ApprovalRequest) -> Self {
        Self {
            id: request.id.into_inner(),
            deployment_intent_id: request.deployment_intent_id,
            evidence_package_id: request.evidence_package_id.into_inner(),
            risk_score: request.risk_score,
            status: request.status,
            submitted_by: request.submitted_by,
            notes: request.notes,
            approved_by: request.approved_by,
            approved_at: request.approved_at,
            approval_conditions: request.approval_conditions,
            correlation_id: request.correlation_id,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

/// A decision from the append-only ledger.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DecisionResponse {
    /// Decision ID.
    pub id: Uuid,

    /// The request this decision is for.
    pub cab_request_id: Uuid,

    /// The decision made.
    pub decision: DecisionType,

    /// Decider rationale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,

    /// Who made the decision.
    pub actor: Uuid,

    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
}

impl From<ApprovalDecision> for DecisionResponse {
    fn from(decision: ApprovalDecision) -> Self {
        Self {
            id: decision.id.into_inner(),
            cab_request_id: decision.cab_request_id.into_inner(),
            decision: decision.decision,
            rationale: decision.rationale,
            actor: decision.actor,
            timestamp: decision.timestamp,
        }
    }
}

/// Paginated list of CAB requests.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CabRequestListResponse {
    /// Request records.
    pub items: Vec<CabRequestResponse>,

    /// Total matching records before pagination.
    pub total: usize,
}

/// The approval standing of a deployment intent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IntentStatusResponse {
    /// The latest request for the intent.
    pub request: CabRequestResponse,

    /// True for `approved` or `auto_approved`.
    pub is_approved: bool,

    /// True for `exception_required`.
    pub requires_exception: bool,
}

impl From<ApprovalStatusSummary> for IntentStatusResponse {
    fn from(summary: ApprovalStatusSummary) -> Self {
        Self {
            is_approved: summary.is_approved,
            requires_exception: summary.requires_exception,
            request: summary.request.into(),
        }
    }
}
