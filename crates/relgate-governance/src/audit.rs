//! Audit logging for governance operations.
//!
//! Every state-changing operation in the workflow, exception, model, and
//! maturity services emits an audit event with before/after state snapshots.
//!
//! # Example
//!
//! ```rust,ignore
//! use relgate_governance::audit::{AuditStore, InMemoryAuditStore, GovernanceAuditEventInput, GovernanceAuditAction};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! let store = Arc::new(InMemoryAuditStore::new());
//! let input = GovernanceAuditEventInput {
//!     action: GovernanceAuditAction::RequestSubmitted,
//!     actor: Uuid::new_v4(),
//!     ..Default::default()
//! };
//! let event = store.log_event(input).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;

/// Action recorded by a governance audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceAuditAction {
    /// An approval request was submitted.
    #[default]
    RequestSubmitted,
    /// An approval request was auto-approved at submission.
    RequestAutoApproved,
    /// A reviewer approved a request.
    RequestApproved,
    /// A reviewer rejected a request.
    RequestRejected,
    /// An exception was requested.
    ExceptionRequested,
    /// A security reviewer approved an exception.
    ExceptionApproved,
    /// A security reviewer rejected an exception.
    ExceptionRejected,
    /// Expired exceptions were swept.
    ExceptionsExpired,
    /// A risk model version was activated.
    ModelActivated,
    /// A trust maturity evaluation was recorded.
    MaturityEvaluated,
    /// A trust maturity progression was executed.
    MaturityProgressed,
}

impl std::fmt::Display for GovernanceAuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestSubmitted => write!(f, "request_submitted"),
            Self::RequestAutoApproved => write!(f, "request_auto_approved"),
            Self::RequestApproved => write!(f, "request_approved"),
            Self::RequestRejected => write!(f, "request_rejected"),
            Self::ExceptionRequested => write!(f, "exception_requested"),
            Self::ExceptionApproved => write!(f, "exception_approved"),
            Self::ExceptionRejected => write!(f, "exception_rejected"),
            Self::ExceptionsExpired => write!(f, "exceptions_expired"),
            Self::ModelActivated => write!(f, "model_activated"),
            Self::MaturityEvaluated => write!(f, "maturity_evaluated"),
            Self::MaturityProgressed => write!(f, "maturity_progressed"),
        }
    }
}

/// An audit event for a governance operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceAuditEvent {
    /// Unique identifier for the event.
    pub id: Uuid,
    /// Action performed.
    pub action: GovernanceAuditAction,
    /// User who performed the action.
    pub actor: Uuid,
    /// The deployment intent involved (if any).
    pub deployment_intent_id: Option<Uuid>,
    /// The approval request involved (if any).
    pub request_id: Option<Uuid>,
    /// The exception involved (if any).
    pub exception_id: Option<Uuid>,
    /// State before the change (JSON).
    pub before_state: Option<serde_json::Value>,
    /// State after the change (JSON).
    pub after_state: Option<serde_json::Value>,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Additional metadata.
    pub metadata: Option<serde_json::Value>,
}

/// Input for creating an audit event.
#[derive(Debug, Clone, Default)]
pub struct GovernanceAuditEventInput {
    /// Action performed.
    pub action: GovernanceAuditAction,
    /// User who performed the action.
    pub actor: Uuid,
    /// The deployment intent involved (if any).
    pub deployment_intent_id: Option<Uuid>,
    /// The approval request involved (if any).
    pub request_id: Option<Uuid>,
    /// The exception involved (if any).
    pub exception_id: Option<Uuid>,
    /// State before the change (JSON).
    pub before_state: Option<serde_json::Value>,
    /// State after the change (JSON).
    pub after_state: Option<serde_json::Value>,
    /// Additional metadata.
    pub metadata: Option<serde_json::Value>,
}

/// Filter for querying audit events.
#[derive(Debug, Clone, Default)]
pub struct AuditEventFilter {
    /// Filter by action type.
    pub action: Option<GovernanceAuditAction>,
    /// Filter by actor.
    pub actor: Option<Uuid>,
    /// Filter by deployment intent.
    pub deployment_intent_id: Option<Uuid>,
    /// Filter by events after this date.
    pub from_date: Option<DateTime<Utc>>,
    /// Filter by events before this date.
    pub to_date: Option<DateTime<Utc>>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

/// Trait for audit event storage backends.
#[async_trait::async_trait]
pub trait AuditStore: Send + Sync {
    /// Log an audit event.
    async fn log_event(&self, input: GovernanceAuditEventInput) -> Result<GovernanceAuditEvent>;

    /// Query audit events, newest first.
    async fn query_events(&self, filter: AuditEventFilter) -> Result<Vec<GovernanceAuditEvent>>;
}

/// In-memory audit store for testing.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    events: Arc<RwLock<HashMap<Uuid, GovernanceAuditEvent>>>,
}

impl InMemoryAuditStore {
    /// Create a new in-memory audit store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get the count of events in the store.
    pub async fn count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Clear all events (for testing).
    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait::async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn log_event(&self, input: GovernanceAuditEventInput) -> Result<GovernanceAuditEvent> {
        let event = GovernanceAuditEvent {
            id: Uuid::new_v4(),
            action: input.action,
            actor: input.actor,
            deployment_intent_id: input.deployment_intent_id,
            request_id: input.request_id,
            exception_id: input.exception_id,
            before_state: input.before_state,
            after_state: input.after_state,
            timestamp: Utc::now(),
            metadata: input.metadata,
        };

        self.events.write().await.insert(event.id, event.clone());
        Ok(event)
    }

    async fn query_events(&self, filter: AuditEventFilter) -> Result<Vec<GovernanceAuditEvent>> {
        let events = self.events.read().await;
        let mut results: Vec<_> = events
            .values()
            .filter(|e| filter.action.map_or(true, |a| e.action == a))
            .filter(|e| filter.actor.map_or(true, |a| e.actor == a))
            .filter(|e| {
                filter
                    .deployment_intent_id
                    .map_or(true, |d| e.deployment_intent_id == Some(d))
            })
            .filter(|e| filter.from_date.map_or(true, |d| e.timestamp >= d))
            .filter(|e| filter.to_date.map_or(true, |d| e.timestamp <= d))
            .cloned()
            .collect();

        results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }
        Ok(results)
    }
}
