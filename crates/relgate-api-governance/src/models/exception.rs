//! Request and response models for exception endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use relgate_governance::{CabException, ExceptionStatus};

/// Request to create a risk exception.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateExceptionRequest {
    /// The deployment the exception covers.
    pub deployment_intent_id: Uuid,

    /// Why the exception is needed.
    #[validate(length(min = 1, max = 2000, message = "Reason is required (1-2000 characters)"))]
    pub reason: String,

    /// Why the risk is acceptable.
    #[validate(length(
        min = 1,
        max = 4000,
        message = "Risk justification is required (1-4000 characters)"
    ))]
    pub risk_justification: String,

    /// Controls offsetting the accepted risk; must not be empty.
    pub compensating_controls: Vec<String>,

    /// Lifetime in days (1-90, default 30).
    pub expiry_days: Option<i64>,
}

/// Request to approve or reject an exception.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ExceptionActionRequest {
    /// Optional rationale from the decider.
    #[validate(length(max = 2000, message = "Rationale must not exceed 2000 characters"))]
    pub rationale: Option<String>,
}

/// An exception record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExceptionResponse {
    /// Exception ID.
    pub id: Uuid,

    /// The deployment the exception covers.
    pub deployment_intent_id: Uuid,

    /// Why the exception is needed.
    pub reason: String,

    /// Why the risk is acceptable.
    pub risk_justification: String,

    /// Controls offsetting the accepted risk.
    pub compensating_controls: Vec<String>,

    /// Who requested the exception.
    pub requested_by: Uuid,

    /// Exception status.
    pub status: ExceptionStatus,

    /// When the exception lapses.
    pub expires_at: DateTime<Utc>,

    /// Who decided the exception.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<Uuid>,

    /// When the exception was decided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,

    /// Decider rationale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_rationale: Option<String>,

    /// Whether the exception currently authorizes a deployment.
    pub is_active: bool,

    /// Whether the exception is past its expiry date, independent of status.
    pub is_expired: bool,

    /// When the exception was created.
    pub created_at: DateTime<Utc>,
}

impl From<CabException> for ExceptionResponse {
    fn from(exception: CabException) -> Self {
        let is_active = exception.is_active();
        let is_expired = exception.is_expired();
        Self {
            id: exception.id.into_inner(),
            deployment_intent_id: exception.deployment_intent_id,
            reason: exception.reason,
            risk_justification: exception.risk_justification,
            compensating_controls: exception.compensating_controls,
            requested_by: exception.requested_by,
            status: exception.status,
            expires_at: exception.expires_at,
            approved_by: exception.approved_by,
            approved_at: exception.approved_at,
            decision_rationale: exception.decision_rationale,
            is_active,
            is_expired,
            created_at: exception.created_at,
        }
    }
}

/// Paginated list of exceptions.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExceptionListResponse {
    /// Exception records.
    pub items: Vec<ExceptionResponse>,

    /// Total matching records before pagination.
    pub total: usize,
}
