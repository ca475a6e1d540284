//! Trust maturity handlers.

use axum::{extract::State, Extension, Json};
use uuid::Uuid;
use validator::Validate;

use relgate_auth::JwtClaims;

use crate::error::{ApiGovernanceError, ApiResult};
use crate::handlers::cab_requests::CAB_REVIEWER_ROLE;
use crate::models::{EvaluateMaturityRequest, MaturityEvaluationResponse, MaturityStatusResponse};
use crate::router::GovernanceState;

fn caller_id(claims: &JwtClaims) -> ApiResult<Uuid> {
    claims.user_id().ok_or(ApiGovernanceError::Unauthorized)
}

/// The current maturity posture. CAB reviewers only.
#[utoipa::path(
    get,
    path = "/cab/maturity/status",
    tag = "CAB - Trust Maturity",
    responses(
        (status = 200, description = "Current posture", body = MaturityStatusResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a CAB reviewer"),
        (status = 404, description = "No active risk model version")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_status(
    State(state): State<GovernanceState>,
    Extension(claims): Extension<JwtClaims>,
) -> ApiResult<Json<MaturityStatusResponse>> {
    if !claims.has_role(CAB_REVIEWER_ROLE) {
        return Err(ApiGovernanceError::Forbidden);
    }

    let report = state.maturity_engine.get_current_maturity_status().await?;
    Ok(Json(report.into()))
}

/// Run a trust maturity evaluation. CAB reviewers only.
///
/// The evaluation is pure; set `record: true` to also persist it as a
/// progress record.
#[utoipa::path(
    post,
    path = "/cab/maturity/evaluate",
    tag = "CAB - Trust Maturity",
    request_body = EvaluateMaturityRequest,
    responses(
        (status = 200, description = "Evaluation outcome", body = MaturityEvaluationResponse),
        (status = 400, description = "Negative evaluation period"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a CAB reviewer"),
        (status = 404, description = "Unknown maturity level")
    ),
    security(("bearer_auth" = []))
)]
pub async fn evaluate(
    State(state): State<GovernanceState>,
    Extension(claims): Extension<JwtClaims>,
    Json(request): Json<EvaluateMaturityRequest>,
) -> ApiResult<Json<MaturityEvaluationResponse>> {
    if !claims.has_role(CAB_REVIEWER_ROLE) {
        return Err(ApiGovernanceError::Forbidden);
    }
    request.validate()?;
    caller_id(&claims)?;

    let evaluation = state
        .maturity_engine
        .evaluate_maturity_progression(
            &request.current_level,
            request.evaluation_period_weeks,
            request.total_deployments,
        )
        .await?;

    if request.record.unwrap_or(false) {
        state
            .maturity_engine
            .record_progress(&evaluation, None)
            .await?;
    }

    Ok(Json(evaluation.into()))
}
