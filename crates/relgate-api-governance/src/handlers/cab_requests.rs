//! CAB approval request handlers.
//!
//! Visibility is role-scoped: requesters see their own requests, holders of
//! the `cab_reviewer` role see (and decide) everything.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use relgate_auth::JwtClaims;
use relgate_governance::{ApprovalRequestId, SubmitApprovalInput};

use crate::error::{ApiGovernanceError, ApiResult};
use crate::models::{
    ApproveRequestRequest, CabRequestListResponse, CabRequestResponse, DecisionResponse,
    IntentStatusResponse, ListQuery, RejectRequestRequest, SubmitCabRequestRequest,
    SubmitCabResponse,
};
use crate::router::GovernanceState;

/// Role allowed to decide CAB requests and see all of them.
pub const CAB_REVIEWER_ROLE: &str = "cab_reviewer";

fn caller_id(claims: &JwtClaims) -> ApiResult<Uuid> {
    claims.user_id().ok_or(ApiGovernanceError::Unauthorized)
}

/// Submit a deployment for CAB approval.
#[utoipa::path(
    post,
    path = "/cab/submit",
    tag = "CAB - Approval Requests",
    request_body = SubmitCabRequestRequest,
    responses(
        (status = 201, description = "Request created", body = SubmitCabResponse),
        (status = 400, description = "Invalid risk score or payload"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Evidence package not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn submit_request(
    State(state): State<GovernanceState>,
    Extension(claims): Extension<JwtClaims>,
    Json(request): Json<SubmitCabRequestRequest>,
) -> ApiResult<(StatusCode, Json<SubmitCabResponse>)> {
    request.validate()?;
    let submitted_by = caller_id(&claims)?;

    let (created, tier) = state
        .workflow_service
        .submit_for_approval(SubmitApprovalInput {
            evidence_package_id: request.evidence_package_id.into(),
            deployment_intent_id: request.deployment_intent_id,
            risk_score: request.risk_score,
            submitted_by,
            notes: request.notes,
            correlation_id: request.correlation_id,
        })
        .await?;

    let message = format!(
        "Risk score {} routed to {tier}; request is {}",
        created.risk_score, created.status
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitCabResponse {
            id: created.id.into_inner(),
            status: created.status,
            decision_status: tier,
            message,
            correlation_id: created.correlation_id,
        }),
    ))
}

/// Get a CAB request by ID.
#[utoipa::path(
    get,
    path = "/cab/{id}",
    tag = "CAB - Approval Requests",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request details", body = CabRequestResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the requester or a CAB reviewer"),
        (status = 404, description = "Request not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_request(
    State(state): State<GovernanceState>,
    Extension(claims): Extension<JwtClaims>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CabRequestResponse>> {
    let caller = caller_id(&claims)?;

    let request = state
        .workflow_service
        .get_request(ApprovalRequestId::from(id))
        .await?;

    if request.submitted_by != caller && !claims.has_role(CAB_REVIEWER_ROLE) {
        return Err(ApiGovernanceError::Forbidden);
    }

    Ok(Json(request.into()))
}

/// Approve a pending CAB request.
#[utoipa::path(
    post,
    path = "/cab/{id}/approve",
    tag = "CAB - Approval Requests",
    params(("id" = Uuid, Path, description = "Request ID")),
    request_body = ApproveRequestRequest,
    responses(
        (status = 200, description = "Request approved", body = CabRequestResponse),
        (status = 400, description = "Request is not in a transitionable state"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a CAB reviewer"),
        (status = 404, description = "Request not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn approve_request(
    State(state): State<GovernanceState>,
    Extension(claims): Extension<JwtClaims>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApproveRequestRequest>,
) -> ApiResult<Json<CabRequestResponse>> {
    if !claims.has_role(CAB_REVIEWER_ROLE) {
        return Err(ApiGovernanceError::Forbidden);
    }
    request.validate()?;
    let approver = caller_id(&claims)?;

    let approved = state
        .workflow_service
        .approve_request(
            ApprovalRequestId::from(id),
            approver,
            request.rationale,
            request.conditions.unwrap_or_default(),
        )
        .await?;

    Ok(Json(approved.into()))
}

/// Reject a pending CAB request.
#[utoipa::path(
    post,
    path = "/cab/{id}/reject",
    tag = "CAB - Approval Requests",
    params(("id" = Uuid, Path, description = "Request ID")),
    request_body = RejectRequestRequest,
    responses(
        (status = 200, description = "Request rejected", body = CabRequestResponse),
        (status = 400, description = "Request is not in a transitionable state"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a CAB reviewer"),
        (status = 404, description = "Request not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn reject_request(
    State(state): State<GovernanceState>,
    Extension(claims): Extension<JwtClaims>,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectRequestRequest>,
) -> ApiResult<Json<CabRequestResponse>> {
    if !claims.has_role(CAB_REVIEWER_ROLE) {
        return Err(ApiGovernanceError::Forbidden);
    }
    request.validate()?;
    let rejector = caller_id(&claims)?;

    let rejected = state
        .workflow_service
        .reject_request(ApprovalRequestId::from(id), rejector, request.rationale)
        .await?;

    Ok(Json(rejected.into()))
}

/// The decision ledger for a request.
#[utoipa::path(
    get,
    path = "/cab/{id}/decisions",
    tag = "CAB - Approval Requests",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Decision ledger", body = [DecisionResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the requester or a CAB reviewer"),
        (status = 404, description = "Request not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_decisions(
    State(state): State<GovernanceState>,
    Extension(claims): Extension<JwtClaims>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<DecisionResponse>>> {
    let caller = caller_id(&claims)?;
    let request_id = ApprovalRequestId::from(id);

    let request = state.workflow_service.get_request(request_id).await?;
    if request.submitted_by != caller && !claims.has_role(CAB_REVIEWER_ROLE) {
        return Err(ApiGovernanceError::Forbidden);
    }

    let decisions = state.workflow_service.decisions(request_id).await?;
    Ok(Json(decisions.into_iter().map(Into::into).collect()))
}

/// Requests awaiting manual review. CAB reviewers only.
#[utoipa::path(
    get,
    path = "/cab/pending",
    tag = "CAB - Approval Requests",
    params(ListQuery),
    responses(
        (status = 200, description = "Pending requests", body = CabRequestListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a CAB reviewer")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_pending(
    State(state): State<GovernanceState>,
    Extension(claims): Extension<JwtClaims>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<CabRequestListResponse>> {
    if !claims.has_role(CAB_REVIEWER_ROLE) {
        return Err(ApiGovernanceError::Forbidden);
    }

    let pending = state.workflow_service.list_pending().await?;
    let total = pending.len();
    let items = pending
        .into_iter()
        .skip(query.offset())
        .take(query.limit())
        .map(Into::into)
        .collect();

    Ok(Json(CabRequestListResponse { items, total }))
}

/// The caller's own requests.
#[utoipa::path(
    get,
    path = "/cab/my-requests",
    tag = "CAB - Approval Requests",
    params(ListQuery),
    responses(
        (status = 200, description = "Own requests", body = CabRequestListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_requests(
    State(state): State<GovernanceState>,
    Extension(claims): Extension<JwtClaims>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<CabRequestListResponse>> {
    let caller = caller_id(&claims)?;

    let requests = state.workflow_service.list_by_submitter(caller).await?;
    let total = requests.len();
    let items = requests
        .into_iter()
        .skip(query.offset())
        .take(query.limit())
        .map(Into::into)
        .collect();

    Ok(Json(CabRequestListResponse { items, total }))
}

/// The approval standing of a deployment intent, from its latest request.
#[utoipa::path(
    get,
    path = "/cab/intents/{intent_id}/status",
    tag = "CAB - Approval Requests",
    params(("intent_id" = Uuid, Path, description = "Deployment intent ID")),
    responses(
        (status = 200, description = "Approval standing", body = IntentStatusResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the requester or a CAB reviewer"),
        (status = 404, description = "No request recorded for the intent")
    ),
    security(("bearer_auth" = []))
)]
pub async fn intent_status(
    State(state): State<GovernanceState>,
    Extension(claims): Extension<JwtClaims>,
    Path(intent_id): Path<Uuid>,
) -> ApiResult<Json<IntentStatusResponse>> {
    let caller = caller_id(&claims)?;

    let summary = state
        .workflow_service
        .get_approval_status(intent_id)
        .await?;

    if summary.request.submitted_by != caller && !claims.has_role(CAB_REVIEWER_ROLE) {
        return Err(ApiGovernanceError::Forbidden);
    }

    Ok(Json(summary.into()))
}
