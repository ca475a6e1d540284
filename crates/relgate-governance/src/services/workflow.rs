//! CAB approval workflow.
//!
//! Routes a risk score to a decision tier, manages the approval request
//! lifecycle, and appends decisions to an immutable ledger. Two guards keep
//! concurrent decisions out: the request store's compare-and-transition on
//! status, and the decision store's at-most-one-decision-per-request
//! constraint.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::audit::{AuditStore, GovernanceAuditAction, GovernanceAuditEventInput};
use crate::error::{GovernanceError, Result};
use crate::evidence::EvidencePackageStore;
use crate::model::RiskModelVersion;
use crate::types::{
    ApprovalRequestId, ApprovalStatus, BlastRadiusClass, DecisionId, DecisionTier, DecisionType,
    EvidencePackageId,
};

/// Scores at or below this are auto-approved.
pub const AUTO_APPROVE_MAX_SCORE: f64 = 50.0;

/// Scores above the auto band and at or below this go to manual review;
/// anything higher requires an exception.
pub const MANUAL_REVIEW_MAX_SCORE: f64 = 75.0;

// ============================================================================
// Domain Types
// ============================================================================

/// A CAB approval request for a deployment intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Unique identifier.
    pub id: ApprovalRequestId,
    /// The deployment this request governs.
    pub deployment_intent_id: Uuid,
    /// The evidence package backing the risk score.
    pub evidence_package_id: EvidencePackageId,
    /// Risk score at submission time.
    pub risk_score: f64,
    /// Current workflow status.
    pub status: ApprovalStatus,
    /// Who submitted the request.
    pub submitted_by: Uuid,
    /// Submitter notes.
    pub notes: Option<String>,
    /// Who approved (submitter for auto-approvals).
    pub approved_by: Option<Uuid>,
    /// When the terminal decision was made.
    pub approved_at: Option<DateTime<Utc>>,
    /// Conditions attached to an approval; non-empty marks the approval
    /// conditional without a separate status value.
    pub approval_conditions: Vec<String>,
    /// Correlation id, always `CAB-` prefixed.
    pub correlation_id: String,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
    /// When the request was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ApprovalRequest {
    /// Whether the request counts as approved for release purposes.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.status.is_approved()
    }

    /// Whether the deployment needs a risk exception to proceed.
    #[must_use]
    pub fn requires_exception(&self) -> bool {
        self.status == ApprovalStatus::ExceptionRequired
    }

    /// Whether the approval carries conditions.
    #[must_use]
    pub fn is_conditional(&self) -> bool {
        !self.approval_conditions.is_empty()
    }
}

/// A decision recorded in the append-only ledger.
///
/// Exactly one decision is ever recorded per terminal transition; records
/// are never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalDecision {
    /// Unique identifier.
    pub id: DecisionId,
    /// The request this decision is for.
    pub cab_request_id: ApprovalRequestId,
    /// The decision made.
    pub decision: DecisionType,
    /// Rationale from the decider.
    pub rationale: Option<String>,
    /// Who made the decision.
    pub actor: Uuid,
    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
}

impl ApprovalDecision {
    /// Check if the decision is an approval.
    #[must_use]
    pub fn is_approval(&self) -> bool {
        matches!(self.decision, DecisionType::Approved)
    }
}

/// Input for submitting a deployment for approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitApprovalInput {
    pub evidence_package_id: EvidencePackageId,
    pub deployment_intent_id: Uuid,
    pub risk_score: f64,
    pub submitted_by: Uuid,
    pub notes: Option<String>,
    /// Supplied correlation id; one is generated when absent.
    pub correlation_id: Option<String>,
}

/// The approval standing of a deployment intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalStatusSummary {
    /// The latest request for the intent.
    pub request: ApprovalRequest,
    /// True for `approved` or `auto_approved`.
    pub is_approved: bool,
    /// True for `exception_required`.
    pub requires_exception: bool,
}

// ============================================================================
// Store Traits
// ============================================================================

/// Trait for approval request storage backends.
#[async_trait::async_trait]
pub trait ApprovalRequestStore: Send + Sync {
    /// Insert a new request.
    async fn insert(&self, request: ApprovalRequest) -> Result<ApprovalRequest>;

    /// Get a request by ID.
    async fn get(&self, id: ApprovalRequestId) -> Result<Option<ApprovalRequest>>;

    /// The most recently created request for a deployment intent.
    async fn latest_for_intent(&self, deployment_intent_id: Uuid)
        -> Result<Option<ApprovalRequest>>;

    /// List requests in a given status, newest first.
    async fn list_by_status(&self, status: ApprovalStatus) -> Result<Vec<ApprovalRequest>>;

    /// List requests submitted by a user, newest first.
    async fn list_by_submitter(&self, submitted_by: Uuid) -> Result<Vec<ApprovalRequest>>;

    /// Atomically transition a `submitted` request to `approved` or
    /// `rejected`.
    ///
    /// Implementations MUST check-and-set under a single write guard (a row
    /// lock or optimistic version check in a relational backend) so that
    /// concurrent decisions against the same request cannot both succeed.
    async fn transition_decided(
        &self,
        id: ApprovalRequestId,
        decision: DecisionType,
        actor: Uuid,
        conditions: Vec<String>,
    ) -> Result<ApprovalRequest>;
}

/// Trait for the append-only decision ledger.
#[async_trait::async_trait]
pub trait DecisionStore: Send + Sync {
    /// Append the decision for a request.
    ///
    /// Implementations MUST enforce at most one decision per request id (a
    /// uniqueness constraint keyed by request id in a relational backend).
    async fn append(&self, decision: ApprovalDecision) -> Result<ApprovalDecision>;

    /// All decisions for a request, oldest first.
    async fn for_request(&self, id: ApprovalRequestId) -> Result<Vec<ApprovalDecision>>;

    /// Count decisions for a request.
    async fn count_for_request(&self, id: ApprovalRequestId) -> Result<usize>;
}

// ============================================================================
// In-Memory Stores (for testing)
// ============================================================================

/// In-memory approval request store for testing.
#[derive(Debug, Default)]
pub struct InMemoryApprovalRequestStore {
    requests: Arc<RwLock<HashMap<ApprovalRequestId, ApprovalRequest>>>,
}

impl InMemoryApprovalRequestStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get request count.
    pub async fn count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait::async_trait]
impl ApprovalRequestStore for InMemoryApprovalRequestStore {
    async fn insert(&self, request: ApprovalRequest) -> Result<ApprovalRequest> {
        self.requests
            .write()
            .await
            .insert(request.id, request.clone());
        Ok(request)
    }

    async fn get(&self, id: ApprovalRequestId) -> Result<Option<ApprovalRequest>> {
        Ok(self.requests.read().await.get(&id).cloned())
    }

    async fn latest_for_intent(
        &self,
        deployment_intent_id: Uuid,
    ) -> Result<Option<ApprovalRequest>> {
        Ok(self
            .requests
            .read()
            .await
            .values()
            .filter(|r| r.deployment_intent_id == deployment_intent_id)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn list_by_status(&self, status: ApprovalStatus) -> Result<Vec<ApprovalRequest>> {
        let requests = self.requests.read().await;
        let mut results: Vec<_> = requests
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    async fn list_by_submitter(&self, submitted_by: Uuid) -> Result<Vec<ApprovalRequest>> {
        let requests = self.requests.read().await;
        let mut results: Vec<_> = requests
            .values()
            .filter(|r| r.submitted_by == submitted_by)
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    async fn transition_decided(
        &self,
        id: ApprovalRequestId,
        decision: DecisionType,
        actor: Uuid,
        conditions: Vec<String>,
    ) -> Result<ApprovalRequest> {
        // Check-and-set under one write guard.
        let mut requests = self.requests.write().await;

        let request = requests
            .get_mut(&id)
            .ok_or(GovernanceError::RequestNotFound(id))?;

        if request.status != ApprovalStatus::Submitted {
            return Err(GovernanceError::RequestNotDecidable {
                id,
                status: request.status,
            });
        }

        let now = Utc::now();
        request.status = match decision {
            DecisionType::Approved => ApprovalStatus::Approved,
            DecisionType::Rejected => ApprovalStatus::Rejected,
        };
        request.approved_by = Some(actor);
        request.approved_at = Some(now);
        request.approval_conditions = conditions;
        request.updated_at = now;

        Ok(request.clone())
    }
}

/// In-memory decision ledger for testing.
#[derive(Debug, Default)]
pub struct InMemoryDecisionStore {
    decisions: Arc<RwLock<HashMap<ApprovalRequestId, Vec<ApprovalDecision>>>>,
}

impl InMemoryDecisionStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            decisions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait::async_trait]
impl DecisionStore for InMemoryDecisionStore {
    async fn append(&self, decision: ApprovalDecision) -> Result<ApprovalDecision> {
        let mut decisions = self.decisions.write().await;

        let ledger = decisions.entry(decision.cab_request_id).or_default();
        if !ledger.is_empty() {
            return Err(GovernanceError::DecisionAlreadyRecorded(
                decision.cab_request_id,
            ));
        }

        ledger.push(decision.clone());
        Ok(decision)
    }

    async fn for_request(&self, id: ApprovalRequestId) -> Result<Vec<ApprovalDecision>> {
        Ok(self
            .decisions
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn count_for_request(&self, id: ApprovalRequestId) -> Result<usize> {
        Ok(self
            .decisions
            .read()
            .await
            .get(&id)
            .map_or(0, Vec::len))
    }
}

// ============================================================================
// Service
// ============================================================================

/// Service for the CAB approval workflow.
pub struct CabWorkflowService {
    request_store: Arc<dyn ApprovalRequestStore>,
    decision_store: Arc<dyn DecisionStore>,
    evidence_store: Arc<dyn EvidencePackageStore>,
    audit_store: Arc<dyn AuditStore>,
}

impl CabWorkflowService {
    /// Create a new workflow service.
    pub fn new(
        request_store: Arc<dyn ApprovalRequestStore>,
        decision_store: Arc<dyn DecisionStore>,
        evidence_store: Arc<dyn EvidencePackageStore>,
        audit_store: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            request_store,
            decision_store,
            evidence_store,
            audit_store,
        }
    }

    /// Route a risk score to a decision tier.
    ///
    /// Bands are inclusive on the lower bound: `score <= 50` auto-approves,
    /// `50 < score <= 75` goes to manual review, `score > 75` requires an
    /// exception.
    #[must_use]
    pub fn evaluate_risk_threshold(score: f64) -> DecisionTier {
        if score <= AUTO_APPROVE_MAX_SCORE {
            DecisionTier::AutoApproved
        } else if score <= MANUAL_REVIEW_MAX_SCORE {
            DecisionTier::ManualReview
        } else {
            DecisionTier::ExceptionRequired
        }
    }

    /// The tier after applying a blast-radius class and the active model's
    /// per-class ceiling.
    ///
    /// Class constraints only tighten the outcome: an auto-approved tier is
    /// escalated to manual review when the class forbids auto-approval or the
    /// score exceeds the class ceiling. The base bands are never relaxed.
    #[must_use]
    pub fn effective_tier(
        score: f64,
        class: &BlastRadiusClass,
        model: &RiskModelVersion,
    ) -> DecisionTier {
        let base = Self::evaluate_risk_threshold(score);
        if base != DecisionTier::AutoApproved {
            return base;
        }

        if !class.auto_approve_allowed {
            return DecisionTier::ManualReview;
        }

        match model.auto_approve_thresholds.get(&class.name) {
            Some(ceiling) if score > *ceiling => DecisionTier::ManualReview,
            _ => DecisionTier::AutoApproved,
        }
    }

    /// Submit a deployment for approval.
    ///
    /// Auto-approvable submissions come back already approved with their
    /// single ledger decision recorded; manual-review submissions come back
    /// `submitted`; scores above the exception threshold come back
    /// `exception_required` and the caller must raise an exception
    /// separately.
    pub async fn submit_for_approval(
        &self,
        input: SubmitApprovalInput,
    ) -> Result<(ApprovalRequest, DecisionTier)> {
        if !(0.0..=100.0).contains(&input.risk_score) {
            return Err(GovernanceError::InvalidRiskScore(input.risk_score));
        }

        if !self.evidence_store.exists(input.evidence_package_id).await? {
            return Err(GovernanceError::EvidencePackageNotFound(
                input.evidence_package_id,
            ));
        }

        let correlation_id = match input.correlation_id.filter(|c| !c.trim().is_empty()) {
            Some(id) if id.starts_with("CAB-") => id,
            Some(id) => format!("CAB-{id}"),
            None => format!("CAB-{}", Uuid::new_v4()),
        };

        let tier = Self::evaluate_risk_threshold(input.risk_score);
        let now = Utc::now();

        let mut request = ApprovalRequest {
            id: ApprovalRequestId::new(),
            deployment_intent_id: input.deployment_intent_id,
            evidence_package_id: input.evidence_package_id,
            risk_score: input.risk_score,
            status: ApprovalStatus::Submitted,
            submitted_by: input.submitted_by,
            notes: input.notes,
            approved_by: None,
            approved_at: None,
            approval_conditions: Vec::new(),
            correlation_id,
            created_at: now,
            updated_at: now,
        };

        let action = match tier {
            DecisionTier::AutoApproved => {
                request.status = ApprovalStatus::AutoApproved;
                request.approved_by = Some(input.submitted_by);
                request.approved_at = Some(now);
                GovernanceAuditAction::RequestAutoApproved
            }
            DecisionTier::ManualReview => GovernanceAuditAction::RequestSubmitted,
            DecisionTier::ExceptionRequired => {
                request.status = ApprovalStatus::ExceptionRequired;
                GovernanceAuditAction::RequestSubmitted
            }
        };

        let request = self.request_store.insert(request).await?;

        if tier == DecisionTier::AutoApproved {
            self.decision_store
                .append(ApprovalDecision {
                    id: DecisionId::new(),
                    cab_request_id: request.id,
                    decision: DecisionType::Approved,
                    rationale: Some(format!(
                        "Auto-approved: risk score {} within the auto-approval threshold",
                        request.risk_score
                    )),
                    actor: input.submitted_by,
                    timestamp: now,
                })
                .await?;
        }

        tracing::info!(
            request_id = %request.id,
            deployment_intent_id = %request.deployment_intent_id,
            risk_score = request.risk_score,
            tier = %tier,
            "Approval request submitted"
        );

        self.audit_store
            .log_event(GovernanceAuditEventInput {
                action,
                actor: input.submitted_by,
                deployment_intent_id: Some(request.deployment_intent_id),
                request_id: Some(request.id.into_inner()),
                after_state: Some(serde_json::to_value(&request).unwrap_or_default()),
                metadata: Some(serde_json::json!({ "tier": tier.to_string() })),
                ..Default::default()
            })
            .await?;

        Ok((request, tier))
    }

    /// Approve a submitted request.
    ///
    /// Fails with a state-conflict error unless the request is currently
    /// `submitted`. Non-empty `conditions` mark the approval conditional.
    pub async fn approve_request(
        &self,
        id: ApprovalRequestId,
        approver: Uuid,
        rationale: Option<String>,
        conditions: Vec<String>,
    ) -> Result<ApprovalRequest> {
        let before = self
            .request_store
            .get(id)
            .await?
            .ok_or(GovernanceError::RequestNotFound(id))?;

        let request = self
            .request_store
            .transition_decided(id, DecisionType::Approved, approver, conditions)
            .await?;

        self.decision_store
            .append(ApprovalDecision {
                id: DecisionId::new(),
                cab_request_id: id,
                decision: DecisionType::Approved,
                rationale,
                actor: approver,
                timestamp: request.approved_at.unwrap_or_else(Utc::now),
            })
            .await?;

        tracing::info!(request_id = %id, approver = %approver, "Approval request approved");

        self.audit_store
            .log_event(GovernanceAuditEventInput {
                action: GovernanceAuditAction::RequestApproved,
                actor: approver,
                deployment_intent_id: Some(request.deployment_intent_id),
                request_id: Some(id.into_inner()),
                before_state: Some(serde_json::to_value(&before).unwrap_or_default()),
                after_state: Some(serde_json::to_value(&request).unwrap_or_default()),
                ..Default::default()
            })
            .await?;

        Ok(request)
    }

    /// Reject a submitted request.
    pub async fn reject_request(
        &self,
        id: ApprovalRequestId,
        rejector: Uuid,
        rationale: Option<String>,
    ) -> Result<ApprovalRequest> {
        let before = self
            .request_store
            .get(id)
            .await?
            .ok_or(GovernanceError::RequestNotFound(id))?;

        let request = self
            .request_store
            .transition_decided(id, DecisionType::Rejected, rejector, Vec::new())
            .await?;

        self.decision_store
            .append(ApprovalDecision {
                id: DecisionId::new(),
                cab_request_id: id,
                decision: DecisionType::Rejected,
                rationale,
                actor: rejector,
                timestamp: request.approved_at.unwrap_or_else(Utc::now),
            })
            .await?;

        tracing::info!(request_id = %id, rejector = %rejector, "Approval request rejected");

        self.audit_store
            .log_event(GovernanceAuditEventInput {
                action: GovernanceAuditAction::RequestRejected,
                actor: rejector,
                deployment_intent_id: Some(request.deployment_intent_id),
                request_id: Some(id.into_inner()),
                before_state: Some(serde_json::to_value(&before).unwrap_or_default()),
                after_state: Some(serde_json::to_value(&request).unwrap_or_default()),
                ..Default::default()
            })
            .await?;

        Ok(request)
    }

    /// Get a request by ID.
    pub async fn get_request(&self, id: ApprovalRequestId) -> Result<ApprovalRequest> {
        self.request_store
            .get(id)
            .await?
            .ok_or(GovernanceError::RequestNotFound(id))
    }

    /// The approval standing of a deployment intent, from its latest request.
    pub async fn get_approval_status(
        &self,
        deployment_intent_id: Uuid,
    ) -> Result<ApprovalStatusSummary> {
        let request = self
            .request_store
            .latest_for_intent(deployment_intent_id)
            .await?
            .ok_or(GovernanceError::NoRequestForIntent(deployment_intent_id))?;

        Ok(ApprovalStatusSummary {
            is_approved: request.is_approved(),
            requires_exception: request.requires_exception(),
            request,
        })
    }

    /// The decision ledger for a request, oldest first.
    pub async fn decisions(&self, id: ApprovalRequestId) -> Result<Vec<ApprovalDecision>> {
        self.get_request(id).await?;
        self.decision_store.for_request(id).await
    }

    /// Requests awaiting manual review.
    pub async fn list_pending(&self) -> Result<Vec<ApprovalRequest>> {
        self.request_store
            .list_by_status(ApprovalStatus::Submitted)
            .await
    }

    /// Requests submitted by a user.
    pub async fn list_by_submitter(&self, submitted_by: Uuid) -> Result<Vec<ApprovalRequest>> {
        self.request_store.list_by_submitter(submitted_by).await
    }
}

// ============================================================================
// Tests
// ============================================================================
