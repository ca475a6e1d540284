//! CAB exception handlers.
//!
//! Exception decisions require the `security_reviewer` role, which is
//! deliberately distinct from `cab_reviewer`: the override authority and the
//! routine approval authority never sit with the same role.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use relgate_auth::JwtClaims;
use relgate_governance::{CreateExceptionInput, ExceptionId};

use crate::error::{ApiGovernanceError, ApiResult};
use crate::models::{
    CreateExceptionRequest, ExceptionActionRequest, ExceptionListResponse, ExceptionResponse,
    ListQuery,
};
use crate::router::GovernanceState;

/// Role allowed to decide exceptions.
pub const SECURITY_REVIEWER_ROLE: &str = "security_reviewer";

fn caller_id(claims: &JwtClaims) -> ApiResult<Uuid> {
    claims.user_id().ok_or(ApiGovernanceError::Unauthorized)
}

/// Request a time-bounded risk exception.
#[utoipa::path(
    post,
    path = "/cab/exceptions",
    tag = "CAB - Exceptions",
    request_body = CreateExceptionRequest,
    responses(
        (status = 201, description = "Exception created", body = ExceptionResponse),
        (status = 400, description = "Empty compensating controls or invalid expiry"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_exception(
    State(state): State<GovernanceState>,
    Extension(claims): Extension<JwtClaims>,
    Json(request): Json<CreateExceptionRequest>,
) -> ApiResult<(StatusCode, Json<ExceptionResponse>)> {
    request.validate()?;
    let requested_by = caller_id(&claims)?;

    let exception = state
        .exception_service
        .create_exception(CreateExceptionInput {
            deployment_intent_id: request.deployment_intent_id,
            requested_by,
            reason: request.reason,
            risk_justification: request.risk_justification,
            compensating_controls: request.compensating_controls,
            expiry_days: request.expiry_days,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(exception.into())))
}

/// Approve a pending exception. Security reviewers only.
#[utoipa::path(
    post,
    path = "/cab/exceptions/{id}/approve",
    tag = "CAB - Exceptions",
    params(("id" = Uuid, Path, description = "Exception ID")),
    request_body = ExceptionActionRequest,
    responses(
        (status = 200, description = "Exception approved", body = ExceptionResponse),
        (status = 400, description = "Exception expired or not in a transitionable state"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a security reviewer"),
        (status = 404, description = "Exception not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn approve_exception(
    State(state): State<GovernanceState>,
    Extension(claims): Extension<JwtClaims>,
    Path(id): Path<Uuid>,
    Json(request): Json<ExceptionActionRequest>,
) -> ApiResult<Json<ExceptionResponse>> {
    if !claims.has_role(SECURITY_REVIEWER_ROLE) {
        return Err(ApiGovernanceError::Forbidden);
    }
    request.validate()?;
    let approver = caller_id(&claims)?;

    let approved = state
        .exception_service
        .approve_exception(ExceptionId::from(id), approver, request.rationale)
        .await?;

    Ok(Json(approved.into()))
}

/// Reject a pending exception. Security reviewers only.
#[utoipa::path(
    post,
    path = "/cab/exceptions/{id}/reject",
    tag = "CAB - Exceptions",
    params(("id" = Uuid, Path, description = "Exception ID")),
    request_body = ExceptionActionRequest,
    responses(
        (status = 200, description = "Exception rejected", body = ExceptionResponse),
        (status = 400, description = "Exception is not in a transitionable state"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a security reviewer"),
        (status = 404, description = "Exception not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn reject_exception(
    State(state): State<GovernanceState>,
    Extension(claims): Extension<JwtClaims>,
    Path(id): Path<Uuid>,
    Json(request): Json<ExceptionActionRequest>,
) -> ApiResult<Json<ExceptionResponse>> {
    if !claims.has_role(SECURITY_REVIEWER_ROLE) {
        return Err(ApiGovernanceError::Forbidden);
    }
    request.validate()?;
    let rejector = caller_id(&claims)?;

    let rejected = state
        .exception_service
        .reject_exception(ExceptionId::from(id), rejector, request.rationale)
        .await?;

    Ok(Json(rejected.into()))
}

/// Exceptions awaiting a decision. Security reviewers only.
#[utoipa::path(
    get,
    path = "/cab/exceptions/pending",
    tag = "CAB - Exceptions",
    params(ListQuery),
    responses(
        (status = 200, description = "Pending exceptions", body = ExceptionListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a security reviewer")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_pending(
    State(state): State<GovernanceState>,
    Extension(claims): Extension<JwtClaims>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ExceptionListResponse>> {
    if !claims.has_role(SECURITY_REVIEWER_ROLE) {
        return Err(ApiGovernanceError::Forbidden);
    }

    let pending = state.exception_service.list_pending().await?;
    let total = pending.len();
    let items = pending
        .into_iter()
        .skip(query.offset())
        .take(query.limit())
        .map(Into::into)
        .collect();

    Ok(Json(ExceptionListResponse { items, total }))
}

/// The caller's own exceptions.
#[utoipa::path(
    get,
    path = "/cab/exceptions/my-exceptions",
    tag = "CAB - Exceptions",
    params(ListQuery),
    responses(
        (status = 200, description = "Own exceptions", body = ExceptionListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_exceptions(
    State(state): State<GovernanceState>,
    Extension(claims): Extension<JwtClaims>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ExceptionListResponse>> {
    let caller = caller_id(&claims)?;

    let exceptions = state.exception_service.list_by_requester(caller).await?;
    let total = exceptions.len();
    let items = exceptions
        .into_iter()
        .skip(query.offset())
        .take(query.limit())
        .map(Into::into)
        .collect();

    Ok(Json(ExceptionListResponse { items, total }))
}
