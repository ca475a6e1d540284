//! Time-bounded CAB exceptions.
//!
//! An exception is a dual-authority override allowing a high-risk deployment
//! to proceed outside the normal thresholds. Expiry is calendar-based and
//! pre-empts approval: once `expires_at` has passed, an exception can no
//! longer be approved no matter what state it is in.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::audit::{AuditStore, GovernanceAuditAction, GovernanceAuditEventInput};
use crate::error::{GovernanceError, Result};
use crate::types::{ExceptionId, ExceptionStatus};

/// Default exception lifetime in days.
pub const DEFAULT_EXPIRY_DAYS: i64 = 30;

/// Minimum exception lifetime in days.
pub const MIN_EXPIRY_DAYS: i64 = 1;

/// Maximum exception lifetime in days.
pub const MAX_EXPIRY_DAYS: i64 = 90;

// ============================================================================
// Domain Types
// ============================================================================

/// A time-bounded risk exception for a deployment intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CabException {
    /// Unique identifier.
    pub id: ExceptionId,
    /// The deployment this exception covers.
    pub deployment_intent_id: Uuid,
    /// Why the exception is needed.
    pub reason: String,
    /// Why the risk is acceptable.
    pub risk_justification: String,
    /// Controls that offset the accepted risk (required, non-empty).
    pub compensating_controls: Vec<String>,
    /// Who requested the exception.
    pub requested_by: Uuid,
    /// Exception status.
    pub status: ExceptionStatus,
    /// When the exception lapses.
    pub expires_at: DateTime<Utc>,
    /// Who decided the exception.
    pub approved_by: Option<Uuid>,
    /// When the exception was decided.
    pub approved_at: Option<DateTime<Utc>>,
    /// Decider rationale.
    pub decision_rationale: Option<String>,
    /// When the exception was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl CabException {
    /// Whether the exception currently authorizes a deployment.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ExceptionStatus::Approved && Utc::now() <= self.expires_at
    }

    /// Whether the exception is past its expiry date, independent of status.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Input for creating an exception.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExceptionInput {
    pub deployment_intent_id: Uuid,
    pub requested_by: Uuid,
    pub reason: String,
    pub risk_justification: String,
    pub compensating_controls: Vec<String>,
    /// Lifetime in days; defaults to [`DEFAULT_EXPIRY_DAYS`].
    pub expiry_days: Option<i64>,
}

// ============================================================================
// Store Trait
// ============================================================================

/// Trait for exception storage backends.
#[async_trait::async_trait]
pub trait ExceptionStore: Send + Sync {
    /// Insert a new exception.
    async fn insert(&self, exception: CabException) -> Result<CabException>;

    /// Get an exception by ID.
    async fn get(&self, id: ExceptionId) -> Result<Option<CabException>>;

    /// List exceptions in a given status, newest first.
    async fn list_by_status(&self, status: ExceptionStatus) -> Result<Vec<CabException>>;

    /// List exceptions requested by a user, newest first.
    async fn list_by_requester(&self, requested_by: Uuid) -> Result<Vec<CabException>>;

    /// Atomically transition a `pending` exception to `approved` or
    /// `rejected`.
    ///
    /// Implementations MUST check-and-set under a single write guard so
    /// concurrent decisions cannot both succeed.
    async fn transition_decided(
        &self,
        id: ExceptionId,
        to: ExceptionStatus,
        actor: Uuid,
        rationale: Option<String>,
    ) -> Result<CabException>;

    /// Transition `approved` exceptions whose `expires_at` has passed to
    /// `expired`, returning the number affected. Idempotent.
    async fn expire_approved(&self, now: DateTime<Utc>) -> Result<u64>;
}

// ============================================================================
// In-Memory Store (for testing)
// ============================================================================

/// In-memory exception store for testing.
#[derive(Debug, Default)]
pub struct InMemoryExceptionStore {
    exceptions: Arc<RwLock<HashMap<ExceptionId, CabException>>>,
}

impl InMemoryExceptionStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            exceptions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get exception count.
    pub async fn count(&self) -> usize {
        self.exceptions.read().await.len()
    }
}

#[async_trait::async_trait]
impl ExceptionStore for InMemoryExceptionStore {
    async fn insert(&self, exception: CabException) -> Result<CabException> {
        self.exceptions
            .write()
            .await
            .insert(exception.id, exception.clone());
        Ok(exception)
    }

    async fn get(&self, id: ExceptionId) -> Result<Option<CabException>> {
        Ok(self.exceptions.read().await.get(&id).cloned())
    }

    async fn list_by_status(&self, status: ExceptionStatus) -> Result<Vec<CabException>> {
        let exceptions = self.exceptions.read().await;
        let mut results: Vec<_> = exceptions
            .values()
            .filter(|e| e.status == status)
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    async fn list_by_requester(&self, requested_by: Uuid) -> Result<Vec<CabException>> {
        let exceptions = self.exceptions.read().await;
        let mut results: Vec<_> = exceptions
            .values()
            .filter(|e| e.requested_by == requested_by)
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    async fn transition_decided(
        &self,
        id: ExceptionId,
        to: ExceptionStatus,
        actor: Uuid,
        rationale: Option<String>,
    ) -> Result<CabException> {
        let mut exceptions = self.exceptions.write().await;

        let exception = exceptions
            .get_mut(&id)
            .ok_or(GovernanceError::ExceptionNotFound(id))?;

        if exception.status != ExceptionStatus::Pending {
            return Err(GovernanceError::ExceptionNotPending {
                id,
                status: exception.status,
            });
        }

        let now = Utc::now();
        exception.status = to;
        exception.approved_by = Some(actor);
        exception.approved_at = Some(now);
        exception.decision_rationale = rationale;
        exception.updated_at = now;

        Ok(exception.clone())
    }

    async fn expire_approved(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut exceptions = self.exceptions.write().await;
        let mut affected = 0u64;

        for exception in exceptions.values_mut() {
            if exception.status == ExceptionStatus::Approved && now > exception.expires_at {
                exception.status = ExceptionStatus::Expired;
                exception.updated_at = now;
                affected += 1;
            }
        }

        Ok(affected)
    }
}

// ============================================================================
// Service
// ============================================================================

/// Service for managing CAB exceptions.
pub struct CabExceptionService {
    store: Arc<dyn ExceptionStore>,
    audit_store: Arc<dyn AuditStore>,
}

impl CabExceptionService {
    /// Create a new exception service.
    pub fn new(store: Arc<dyn ExceptionStore>, audit_store: Arc<dyn AuditStore>) -> Self {
        Self { store, audit_store }
    }

    /// Create a pending exception.
    ///
    /// Fails when `compensating_controls` is empty or `expiry_days` is
    /// outside `[1, 90]`.
    pub async fn create_exception(&self, input: CreateExceptionInput) -> Result<CabException> {
        if input.compensating_controls.is_empty()
            || input
                .compensating_controls
                .iter()
                .all(|c| c.trim().is_empty())
        {
            return Err(GovernanceError::EmptyCompensatingControls);
        }

        let expiry_days = input.expiry_days.unwrap_or(DEFAULT_EXPIRY_DAYS);
        if !(MIN_EXPIRY_DAYS..=MAX_EXPIRY_DAYS).contains(&expiry_days) {
            return Err(GovernanceError::InvalidExpiryDays(expiry_days));
        }

        let now = Utc::now();
        let exception = CabException {
            id: ExceptionId::new(),
            deployment_intent_id: input.deployment_intent_id,
            reason: input.reason,
            risk_justification: input.risk_justification,
            compensating_controls: input.compensating_controls,
            requested_by: input.requested_by,
            status: ExceptionStatus::Pending,
            expires_at: now + Duration::days(expiry_days),
            approved_by: None,
            approved_at: None,
            decision_rationale: None,
            created_at: now,
            updated_at: now,
        };

        let exception = self.store.insert(exception).await?;

        tracing::info!(
            exception_id = %exception.id,
            deployment_intent_id = %exception.deployment_intent_id,
            expires_at = %exception.expires_at,
            "Exception requested"
        );

        self.audit_store
            .log_event(GovernanceAuditEventInput {
                action: GovernanceAuditAction::ExceptionRequested,
                actor: exception.requested_by,
                deployment_intent_id: Some(exception.deployment_intent_id),
                exception_id: Some(exception.id.into_inner()),
                after_state: Some(serde_json::to_value(&exception).unwrap_or_default()),
                ..Default::default()
            })
            .await?;

        Ok(exception)
    }

    /// Approve a pending exception.
    ///
    /// Expiry pre-empts approval: an exception past `expires_at` fails with
    /// [`GovernanceError::ExceptionExpired`] irrespective of its status. The
    /// approver must not be the requester.
    pub async fn approve_exception(
        &self,
        id: ExceptionId,
        approver: Uuid,
        rationale: Option<String>,
    ) -> Result<CabException> {
        let exception = self
            .store
            .get(id)
            .await?
            .ok_or(GovernanceError::ExceptionNotFound(id))?;

        if exception.is_expired() {
            return Err(GovernanceError::ExceptionExpired(id));
        }
        if exception.requested_by == approver {
            return Err(GovernanceError::SelfApprovalForbidden);
        }

        let updated = self
            .store
            .transition_decided(id, ExceptionStatus::Approved, approver, rationale)
            .await?;

        tracing::info!(exception_id = %id, approver = %approver, "Exception approved");

        self.audit_store
            .log_event(GovernanceAuditEventInput {
                action: GovernanceAuditAction::ExceptionApproved,
                actor: approver,
                deployment_intent_id: Some(updated.deployment_intent_id),
                exception_id: Some(id.into_inner()),
                before_state: Some(serde_json::to_value(&exception).unwrap_or_default()),
                after_state: Some(serde_json::to_value(&updated).unwrap_or_default()),
                ..Default::default()
            })
            .await?;

        Ok(updated)
    }

    /// Reject a pending exception. Not expiry-gated.
    pub async fn reject_exception(
        &self,
        id: ExceptionId,
        rejector: Uuid,
        rationale: Option<String>,
    ) -> Result<CabException> {
        let exception = self
            .store
            .get(id)
            .await?
            .ok_or(GovernanceError::ExceptionNotFound(id))?;

        let updated = self
            .store
            .transition_decided(id, ExceptionStatus::Rejected, rejector, rationale)
            .await?;

        tracing::info!(exception_id = %id, rejector = %rejector, "Exception rejected");

        self.audit_store
            .log_event(GovernanceAuditEventInput {
                action: GovernanceAuditAction::ExceptionRejected,
                actor: rejector,
                deployment_intent_id: Some(updated.deployment_intent_id),
                exception_id: Some(id.into_inner()),
                before_state: Some(serde_json::to_value(&exception).unwrap_or_default()),
                after_state: Some(serde_json::to_value(&updated).unwrap_or_default()),
                ..Default::default()
            })
            .await?;

        Ok(updated)
    }

    /// Get an exception by ID.
    pub async fn get_exception(&self, id: ExceptionId) -> Result<CabException> {
        self.store
            .get(id)
            .await?
            .ok_or(GovernanceError::ExceptionNotFound(id))
    }

    /// Exceptions awaiting a decision.
    pub async fn list_pending(&self) -> Result<Vec<CabException>> {
        self.store.list_by_status(ExceptionStatus::Pending).await
    }

    /// Exceptions requested by a user.
    pub async fn list_by_requester(&self, requested_by: Uuid) -> Result<Vec<CabException>> {
        self.store.list_by_requester(requested_by).await
    }

    /// Sweep approved exceptions past their expiry date to `expired`,
    /// returning the number affected.
    ///
    /// Pending exceptions past expiry are left pending; they are refused
    /// reactively on any approval attempt. Safe to re-run on any cadence.
    pub async fn cleanup_expired_exceptions(&self) -> Result<u64> {
        let affected = self.store.expire_approved(Utc::now()).await?;

        if affected > 0 {
            tracing::info!(affected, "Expired exceptions swept");

            self.audit_store
                .log_event(GovernanceAuditEventInput {
                    action: GovernanceAuditAction::ExceptionsExpired,
                    actor: Uuid::nil(),
                    metadata: Some(serde_json::json!({ "affected": affected })),
                    ..Default::default()
                })
                .await?;
        }

        Ok(affected)
    }
}

// ============================================================================
// Tests
// ============================================================================
