//! API error types for governance endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use relgate_governance::GovernanceError;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for client handling.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Governance API error type.
#[derive(Debug, Error)]
pub enum ApiGovernanceError {
    /// Domain error from the governance crate.
    #[error(transparent)]
    Governance(#[from] GovernanceError),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication required.
    #[error("Authentication required")]
    Unauthorized,

    /// Access denied.
    #[error("Access denied")]
    Forbidden,

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiGovernanceError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Self::Governance(e) => {
                if e.is_not_found() {
                    (StatusCode::NOT_FOUND, "not_found", e.to_string())
                } else if e.is_conflict() {
                    // State conflicts surface as 400: the request referenced a
                    // record that is not in a transitionable state.
                    (StatusCode::BAD_REQUEST, "invalid_state", e.to_string())
                } else if e.is_validation() {
                    (StatusCode::BAD_REQUEST, "validation_error", e.to_string())
                } else {
                    tracing::error!("Unhandled governance error: {:?}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal_error",
                        "An internal error occurred".to_string(),
                    )
                }
            }
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authentication required".to_string(),
            ),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "forbidden",
                "Access denied".to_string(),
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            Self::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details: None,
        });

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiGovernanceError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type alias for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiGovernanceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use relgate_governance::{ApprovalRequestId, EvidencePackageId};

    fn status_of(err: ApiGovernanceError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(GovernanceError::EvidencePackageNotFound(EvidencePackageId::new()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(GovernanceError::InvalidRiskScore(120.0).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                GovernanceError::DecisionAlreadyRecorded(ApprovalRequestId::new()).into()
            ),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ApiGovernanceError::Unauthorized),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(ApiGovernanceError::Forbidden),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(GovernanceError::Storage("down".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
