//! Request and response models for trust maturity endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::Validate;

use relgate_governance::{
    MaturityEvaluation, MaturityStatus, MaturityStatusReport, RiskModelMode, TrustMaturityProgress,
};

/// Request to run a trust maturity evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct EvaluateMaturityRequest {
    /// Level name to evaluate, e.g. `initial`.
    #[validate(length(min = 1, max = 64, message = "Level name is required"))]
    pub current_level: String,

    /// Evaluation window in weeks.
    pub evaluation_period_weeks: i64,

    /// Deployments dispatched in the window, from the dispatch process.
    pub total_deployments: Option<u64>,

    /// Persist the evaluation as a progress record (default false).
    pub record: Option<bool>,
}

/// The outcome of a maturity evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MaturityEvaluationResponse {
    /// When the evaluation ran.
    pub evaluation_date: DateTime<Utc>,

    /// Level evaluated.
    pub current_level: u8,

    /// Level name evaluated.
    pub current_level_name: String,

    /// Next level ordinal, absent at the ladder maximum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_level: Option<u8>,

    /// Window start.
    pub period_start: DateTime<Utc>,

    /// Window end.
    pub period_end: DateTime<Utc>,

    /// Deployments in the window.
    pub deployments_total: u64,

    /// Total incidents in the window.
    pub incidents_total: u64,

    /// P1 incidents in the window.
    pub incidents_p1: u64,

    /// P2 incidents in the window.
    pub incidents_p2: u64,

    /// P3 incidents in the window.
    pub incidents_p3: u64,

    /// P4 incidents in the window.
    pub incidents_p4: u64,

    /// Incidents per deployment.
    pub incident_rate: f64,

    /// Whether every promotion criterion passed.
    pub ready_to_progress: bool,

    /// Explanations for failing criteria.
    pub blocking_criteria: Vec<String>,

    /// Recommendation text.
    pub recommendation: String,
}

impl From<MaturityEvaluation> for MaturityEvaluationResponse {
    fn from(evaluation: MaturityEvaluation) -> Self {
        Self {
            evaluation_date: evaluation.evaluation_date,
            current_level: evaluation.current_level,
            current_level_name: evaluation.current_level_name,
            next_level: evaluation.next_level,
            period_start: evaluation.period_start,
            period_end: evaluation.period_end,
            deployments_total: evaluation.deployments_total,
            incidents_total: evaluation.incidents.total,
            incidents_p1: evaluation.incidents.p1,
            incidents_p2: evaluation.incidents.p2,
            incidents_p3: evaluation.incidents.p3,
            incidents_p4: evaluation.incidents.p4,
            incident_rate: evaluation.incident_rate,
            ready_to_progress: evaluation.ready_to_progress,
            blocking_criteria: evaluation.blocking_criteria,
            recommendation: evaluation.recommendation,
        }
    }
}

/// A persisted maturity progress record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MaturityProgressResponse {
    /// When the evaluation ran.
    pub evaluation_date: DateTime<Utc>,

    /// Level evaluated.
    pub current_level: u8,

    /// Next level ordinal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_level: Option<u8>,

    /// Deployments in the window.
    pub deployments_total: u64,

    /// Total incidents in the window.
    pub incidents_total: u64,

    /// Incidents per deployment.
    pub incident_rate: f64,

    /// Evaluation outcome.
    pub status: MaturityStatus,

    /// Explanations for failing criteria.
    pub blocking_criteria: Vec<String>,

    /// Free-form notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_notes: Option<String>,
}

impl From<TrustMaturityProgress> for MaturityProgressResponse {
    fn from(progress: TrustMaturityProgress) -> Self {
        Self {
            evaluation_date: progress.evaluation_date,
            current_level: progress.current_level,
            next_level: progress.next_level,
            deployments_total: progress.deployments_total,
            incidents_total: progress.incidents.total,
            incident_rate: progress.incident_rate,
            status: progress.status,
            blocking_criteria: progress.blocking_criteria,
            decision_notes: progress.decision_notes,
        }
    }
}

/// The current maturity posture.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MaturityStatusResponse {
    /// Active risk model version.
    pub active_model_version: String,

    /// Active model mode.
    pub mode: RiskModelMode,

    /// Active model per-class auto-approve ceilings.
    pub auto_approve_thresholds: BTreeMap<String, f64>,

    /// Most recent progress record, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_progress: Option<MaturityProgressResponse>,
}

impl From<MaturityStatusReport> for MaturityStatusResponse {
    fn from(report: MaturityStatusReport) -> Self {
        Self {
            active_model_version: report.active_model_version,
            mode: report.mode,
            auto_approve_thresholds: report
                .auto_approve_thresholds
                .into_iter()
                .map(|(class, ceiling)| (class.to_string(), ceiling))
                .collect(),
            latest_progress: report.latest_progress.map(Into::into),
        }
    }
}
