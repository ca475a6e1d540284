//! Trust maturity engine.
//!
//! Evaluates a rolling incident window against per-level promotion criteria
//! and recommends or executes risk-model-version transitions. Evaluation is
//! pure with respect to its inputs; persisting a progress record and
//! activating a model version are separate, explicit steps.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::audit::{AuditStore, GovernanceAuditAction, GovernanceAuditEventInput};
use crate::error::{GovernanceError, Result};
use crate::incident::{IncidentStore, IncidentWindowCounts};
use crate::model::{RiskModelStore, RiskModelVersion};
use crate::types::{BlastRadius, MaturityStatus, RiskModelMode};

// ============================================================================
// Domain Types
// ============================================================================

/// One rung of the trust maturity ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustMaturityLevel {
    /// Ordinal, 0 (least trusted) through the ladder maximum.
    pub level: u8,
    /// Level name, e.g. `defined`.
    pub name: String,
    /// Minimum evaluation window before promotion out of this level.
    pub weeks_required: i64,
    /// Maximum incidents-per-deployment rate tolerated in the window.
    pub max_incident_rate: f64,
    /// Maximum P1 incidents tolerated in the window (typically 0).
    pub max_p1_incidents: u64,
    /// Maximum P2 incidents tolerated in the window.
    pub max_p2_incidents: u64,
    /// Risk model version activated when this level is reached.
    pub risk_model_version_to_activate: String,
    /// Per-class auto-approve ceilings granted at this level.
    pub auto_approve_thresholds: BTreeMap<BlastRadius, f64>,
}

/// The outcome of one maturity evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaturityEvaluation {
    /// When the evaluation ran.
    pub evaluation_date: DateTime<Utc>,
    /// Level evaluated.
    pub current_level: u8,
    /// Level name evaluated.
    pub current_level_name: String,
    /// Next level ordinal, absent at the ladder maximum.
    pub next_level: Option<u8>,
    /// Window start.
    pub period_start: DateTime<Utc>,
    /// Window end.
    pub period_end: DateTime<Utc>,
    /// Deployments in the window.
    pub deployments_total: u64,
    /// Incidents in the window by severity.
    pub incidents: IncidentWindowCounts,
    /// Incidents per deployment (0 when no deployments).
    pub incident_rate: f64,
    /// Whether every promotion criterion passed.
    pub ready_to_progress: bool,
    /// Human-readable explanation for each failing criterion.
    pub blocking_criteria: Vec<String>,
    /// Recommendation text.
    pub recommendation: String,
}

/// A persisted maturity evaluation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustMaturityProgress {
    /// Unique identifier.
    pub id: Uuid,
    /// When the evaluation ran.
    pub evaluation_date: DateTime<Utc>,
    /// Level evaluated.
    pub current_level: u8,
    /// Next level ordinal, absent at the ladder maximum.
    pub next_level: Option<u8>,
    /// Window start.
    pub period_start: DateTime<Utc>,
    /// Window end.
    pub period_end: DateTime<Utc>,
    /// Deployments in the window.
    pub deployments_total: u64,
    /// Incidents in the window by severity.
    pub incidents: IncidentWindowCounts,
    /// Incidents per deployment.
    pub incident_rate: f64,
    /// Evaluation outcome.
    pub status: MaturityStatus,
    /// Explanations for failing criteria.
    pub blocking_criteria: Vec<String>,
    /// Free-form notes from the caller.
    pub decision_notes: Option<String>,
}

/// Current maturity posture: the active model and the latest evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaturityStatusReport {
    /// Active risk model version.
    pub active_model_version: String,
    /// Active model mode.
    pub mode: RiskModelMode,
    /// Active model per-class ceilings.
    pub auto_approve_thresholds: BTreeMap<BlastRadius, f64>,
    /// Most recent progress record, if any.
    pub latest_progress: Option<TrustMaturityProgress>,
}

/// Source of deployment volume over a window.
///
/// Deployment dispatch lives outside this core; the maturity engine and its
/// sweep job consume volume through this seam.
#[async_trait::async_trait]
pub trait DeploymentVolumeSource: Send + Sync {
    /// Number of deployments dispatched within `[from, to]`.
    async fn deployments_in_window(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<u64>;
}

/// Fixed deployment volume for tests and bootstrap wiring.
#[derive(Debug, Clone, Copy)]
pub struct FixedDeploymentVolume(pub u64);

#[async_trait::async_trait]
impl DeploymentVolumeSource for FixedDeploymentVolume {
    async fn deployments_in_window(
        &self,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<u64> {
        Ok(self.0)
    }
}

// ============================================================================
// Store Traits
// ============================================================================

/// Trait for maturity ladder storage backends.
#[async_trait::async_trait]
pub trait MaturityLevelStore: Send + Sync {
    /// Get a level by name.
    async fn get_by_name(&self, name: &str) -> Result<Option<TrustMaturityLevel>>;

    /// Get a level by ordinal.
    async fn get_by_ordinal(&self, level: u8) -> Result<Option<TrustMaturityLevel>>;

    /// All levels, lowest ordinal first.
    async fn list(&self) -> Result<Vec<TrustMaturityLevel>>;

    /// The highest ordinal on the ladder.
    async fn max_ordinal(&self) -> Result<u8>;
}

/// Trait for maturity progress storage backends.
#[async_trait::async_trait]
pub trait MaturityProgressStore: Send + Sync {
    /// Append a progress record.
    async fn append(&self, progress: TrustMaturityProgress) -> Result<TrustMaturityProgress>;

    /// The most recent progress record, if any.
    async fn latest(&self) -> Result<Option<TrustMaturityProgress>>;
}

// ============================================================================
// In-Memory Stores (for testing)
// ============================================================================

/// In-memory maturity ladder store.
#[derive(Debug, Default)]
pub struct InMemoryMaturityLevelStore {
    levels: Arc<RwLock<Vec<TrustMaturityLevel>>>,
}

impl InMemoryMaturityLevelStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            levels: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a store seeded with the default five-level ladder.
    #[must_use]
    pub fn with_default_ladder() -> Self {
        Self {
            levels: Arc::new(RwLock::new(default_ladder())),
        }
    }

    /// Replace the ladder (for testing).
    pub async fn set_levels(&self, mut levels: Vec<TrustMaturityLevel>) {
        levels.sort_by_key(|l| l.level);
        *self.levels.write().await = levels;
    }
}

/// The default five-level ladder: ceilings rise as incident history earns
/// trust; a single P1 blocks promotion at every level.
#[must_use]
pub fn default_ladder() -> Vec<TrustMaturityLevel> {
    let thresholds = |critical: f64, business: f64, productivity: f64, non_critical: f64| {
        BTreeMap::from([
            (BlastRadius::CriticalInfrastructure, critical),
            (BlastRadius::BusinessCritical, business),
            (BlastRadius::ProductivityTools, productivity),
            (BlastRadius::NonCritical, non_critical),
        ])
    };

    vec![
        TrustMaturityLevel {
            level: 0,
            name: "initial".to_string(),
            weeks_required: 4,
            max_incident_rate: 0.20,
            max_p1_incidents: 0,
            max_p2_incidents: 3,
            risk_model_version_to_activate: "rm-baseline-v1".to_string(),
            auto_approve_thresholds: thresholds(10.0, 20.0, 30.0, 40.0),
        },
        TrustMaturityLevel {
            level: 1,
            name: "developing".to_string(),
            weeks_required: 6,
            max_incident_rate: 0.15,
            max_p1_incidents: 0,
            max_p2_incidents: 2,
            risk_model_version_to_activate: "rm-guarded-v2".to_string(),
            auto_approve_thresholds: thresholds(15.0, 25.0, 35.0, 45.0),
        },
        TrustMaturityLevel {
            level: 2,
            name: "defined".to_string(),
            weeks_required: 8,
            max_incident_rate: 0.10,
            max_p1_incidents: 0,
            max_p2_incidents: 2,
            risk_model_version_to_activate: "rm-standard-v3".to_string(),
            auto_approve_thresholds: thresholds(20.0, 30.0, 40.0, 50.0),
        },
        TrustMaturityLevel {
            level: 3,
            name: "managed".to_string(),
            weeks_required: 12,
            max_incident_rate: 0.07,
            max_p1_incidents: 0,
            max_p2_incidents: 1,
            risk_model_version_to_activate: "rm-extended-v4".to_string(),
            auto_approve_thresholds: thresholds(25.0, 35.0, 45.0, 50.0),
        },
        TrustMaturityLevel {
            level: 4,
            name: "optimizing".to_string(),
            weeks_required: 16,
            max_incident_rate: 0.05,
            max_p1_incidents: 0,
            max_p2_incidents: 1,
            risk_model_version_to_activate: "rm-autonomous-v5".to_string(),
            auto_approve_thresholds: thresholds(30.0, 40.0, 50.0, 50.0),
        },
    ]
}

#[async_trait::async_trait]
impl MaturityLevelStore for InMemoryMaturityLevelStore {
    async fn get_by_name(&self, name: &str) -> Result<Option<TrustMaturityLevel>> {
        Ok(self
            .levels
            .read()
            .await
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn get_by_ordinal(&self, level: u8) -> Result<Option<TrustMaturityLevel>> {
        Ok(self
            .levels
            .read()
            .await
            .iter()
            .find(|l| l.level == level)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<TrustMaturityLevel>> {
        Ok(self.levels.read().await.clone())
    }

    async fn max_ordinal(&self) -> Result<u8> {
        Ok(self
            .levels
            .read()
            .await
            .iter()
            .map(|l| l.level)
            .max()
            .unwrap_or(0))
    }
}

/// In-memory maturity progress store.
#[derive(Debug, Default)]
pub struct InMemoryMaturityProgressStore {
    records: Arc<RwLock<Vec<TrustMaturityProgress>>>,
}

impl InMemoryMaturityProgressStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get record count.
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait::async_trait]
impl MaturityProgressStore for InMemoryMaturityProgressStore {
    async fn append(&self, progress: TrustMaturityProgress) -> Result<TrustMaturityProgress> {
        self.records.write().await.push(progress.clone());
        Ok(progress)
    }

    async fn latest(&self) -> Result<Option<TrustMaturityProgress>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .max_by_key(|p| p.evaluation_date)
            .cloned())
    }
}

// ============================================================================
// Engine
// ============================================================================

/// The trust maturity engine.
pub struct TrustMaturityEngine {
    level_store: Arc<dyn MaturityLevelStore>,
    progress_store: Arc<dyn MaturityProgressStore>,
    incident_store: Arc<dyn IncidentStore>,
    model_store: Arc<dyn RiskModelStore>,
    audit_store: Arc<dyn AuditStore>,
}

impl TrustMaturityEngine {
    /// Create a new maturity engine.
    pub fn new(
        level_store: Arc<dyn MaturityLevelStore>,
        progress_store: Arc<dyn MaturityProgressStore>,
        incident_store: Arc<dyn IncidentStore>,
        model_store: Arc<dyn RiskModelStore>,
        audit_store: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            level_store,
            progress_store,
            incident_store,
            model_store,
            audit_store,
        }
    }

    /// Evaluate whether the given level may progress, over the incident
    /// window `[now - evaluation_period_weeks, now]`.
    ///
    /// `total_deployments` comes from the external dispatch process; `None`
    /// means no volume data, which blocks progression the same way zero
    /// deployments does. The evaluation itself persists nothing - call
    /// [`record_progress`](Self::record_progress) or
    /// [`apply_progression`](Self::apply_progression) to act on it.
    pub async fn evaluate_maturity_progression(
        &self,
        current_level: &str,
        evaluation_period_weeks: i64,
        total_deployments: Option<u64>,
    ) -> Result<MaturityEvaluation> {
        let level = self
            .level_store
            .get_by_name(current_level)
            .await?
            .ok_or_else(|| GovernanceError::UnknownMaturityLevel(current_level.to_string()))?;

        if evaluation_period_weeks < 0 {
            return Err(GovernanceError::InvalidEvaluationPeriod(
                evaluation_period_weeks,
            ));
        }

        let now = Utc::now();
        let period_start = now - Duration::weeks(evaluation_period_weeks);
        let max_ordinal = self.level_store.max_ordinal().await?;

        if level.level >= max_ordinal {
            return Ok(MaturityEvaluation {
                evaluation_date: now,
                current_level: level.level,
                current_level_name: level.name,
                next_level: None,
                period_start,
                period_end: now,
                deployments_total: total_deployments.unwrap_or(0),
                incidents: IncidentWindowCounts::default(),
                incident_rate: 0.0,
                ready_to_progress: false,
                blocking_criteria: Vec::new(),
                recommendation: "Maximum trust maturity level reached; no further progression \
                                 is available."
                    .to_string(),
            });
        }

        let incidents = self
            .incident_store
            .count_in_window(period_start, now)
            .await?;
        let deployments_total = total_deployments.unwrap_or(0);
        let incident_rate = if deployments_total > 0 {
            incidents.total as f64 / deployments_total as f64
        } else {
            0.0
        };

        let mut blocking_criteria = Vec::new();

        if evaluation_period_weeks < level.weeks_required {
            blocking_criteria.push(format!(
                "Evaluation period of {evaluation_period_weeks} weeks is below the {} weeks \
                 required at level '{}'",
                level.weeks_required, level.name
            ));
        }

        if deployments_total == 0 {
            blocking_criteria.push(
                "No deployments recorded in the evaluation window; an incident rate cannot \
                 be established"
                    .to_string(),
            );
        } else if incident_rate > level.max_incident_rate {
            blocking_criteria.push(format!(
                "Incident rate {incident_rate:.3} exceeds the maximum {:.3} allowed at level \
                 '{}'",
                level.max_incident_rate, level.name
            ));
        }

        if incidents.p1 > level.max_p1_incidents {
            blocking_criteria.push(format!(
                "{} P1 incident(s) in the evaluation window; at most {} allowed",
                incidents.p1, level.max_p1_incidents
            ));
        }

        if incidents.p2 > level.max_p2_incidents {
            blocking_criteria.push(format!(
                "{} P2 incident(s) in the evaluation window; at most {} allowed",
                incidents.p2, level.max_p2_incidents
            ));
        }

        let ready_to_progress = blocking_criteria.is_empty();

        let next = self
            .level_store
            .get_by_ordinal(level.level + 1)
            .await?
            .ok_or_else(|| {
                GovernanceError::Storage(format!(
                    "maturity ladder has no level {} above '{}'",
                    level.level + 1,
                    level.name
                ))
            })?;

        let recommendation = if ready_to_progress {
            format!(
                "All promotion criteria met; ready to progress to level {} ('{}'), activating \
                 risk model version {}",
                next.level, next.name, next.risk_model_version_to_activate
            )
        } else {
            format!(
                "Promotion criteria not met; remaining at level {} ('{}')",
                level.level, level.name
            )
        };

        Ok(MaturityEvaluation {
            evaluation_date: now,
            current_level: level.level,
            current_level_name: level.name,
            next_level: Some(next.level),
            period_start,
            period_end: now,
            deployments_total,
            incidents,
            incident_rate,
            ready_to_progress,
            blocking_criteria,
            recommendation,
        })
    }

    /// Persist an evaluation as a progress record.
    pub async fn record_progress(
        &self,
        evaluation: &MaturityEvaluation,
        decision_notes: Option<String>,
    ) -> Result<TrustMaturityProgress> {
        let status = if evaluation.ready_to_progress {
            MaturityStatus::CriteriaMet
        } else {
            MaturityStatus::CriteriaNotMet
        };

        let progress = self
            .progress_store
            .append(progress_from(evaluation, status, decision_notes))
            .await?;

        self.audit_store
            .log_event(GovernanceAuditEventInput {
                action: GovernanceAuditAction::MaturityEvaluated,
                actor: Uuid::nil(),
                after_state: Some(serde_json::to_value(&progress).unwrap_or_default()),
                ..Default::default()
            })
            .await?;

        Ok(progress)
    }

    /// Execute a ready progression: activate the next level's risk model
    /// version (atomically swapping the single active version) and record a
    /// `progressed` row.
    pub async fn apply_progression(
        &self,
        evaluation: &MaturityEvaluation,
        actor: Uuid,
    ) -> Result<(TrustMaturityProgress, RiskModelVersion)> {
        if !evaluation.ready_to_progress {
            return Err(GovernanceError::ProgressionNotReady);
        }
        let next_level = evaluation
            .next_level
            .ok_or(GovernanceError::ProgressionNotReady)?;

        let next = self
            .level_store
            .get_by_ordinal(next_level)
            .await?
            .ok_or_else(|| {
                GovernanceError::Storage(format!("maturity ladder has no level {next_level}"))
            })?;

        let activated = self
            .model_store
            .activate(&next.risk_model_version_to_activate)
            .await?;

        let progress = self
            .progress_store
            .append(progress_from(
                evaluation,
                MaturityStatus::Progressed,
                Some(format!(
                    "Progressed to level {} ('{}'); activated {}",
                    next.level, next.name, activated.version
                )),
            ))
            .await?;

        tracing::info!(
            level = next.level,
            level_name = %next.name,
            model_version = %activated.version,
            "Trust maturity progression executed"
        );

        self.audit_store
            .log_event(GovernanceAuditEventInput {
                action: GovernanceAuditAction::MaturityProgressed,
                actor,
                after_state: Some(serde_json::to_value(&progress).unwrap_or_default()),
                metadata: Some(serde_json::json!({
                    "activated_model_version": activated.version,
                })),
                ..Default::default()
            })
            .await?;

        Ok((progress, activated))
    }

    /// The current maturity posture: active model version, mode, thresholds,
    /// and the latest progress record.
    pub async fn get_current_maturity_status(&self) -> Result<MaturityStatusReport> {
        let active = self
            .model_store
            .get_active()
            .await?
            .ok_or(GovernanceError::NoActiveModelVersion)?;
        let latest_progress = self.progress_store.latest().await?;

        Ok(MaturityStatusReport {
            active_model_version: active.version,
            mode: active.mode,
            auto_approve_thresholds: active.auto_approve_thresholds,
            latest_progress,
        })
    }

    /// The level name the system currently operates at, derived from the
    /// latest progress record (the lowest rung when none exists).
    pub async fn current_level_name(&self) -> Result<String> {
        let ordinal = match self.progress_store.latest().await? {
            Some(progress) => match (progress.status, progress.next_level) {
                (MaturityStatus::Progressed, Some(next)) => next,
                _ => progress.current_level,
            },
            None => 0,
        };

        let level = self
            .level_store
            .get_by_ordinal(ordinal)
            .await?
            .ok_or_else(|| {
                GovernanceError::Storage(format!("maturity ladder has no level {ordinal}"))
            })?;
        Ok(level.name)
    }
}

fn progress_from(
    evaluation: &MaturityEvaluation,
    status: MaturityStatus,
    decision_notes: Option<String>,
) -> TrustMaturityProgress {
    TrustMaturityProgress {
        id: Uuid::new_v4(),
        evaluation_date: evaluation.evaluation_date,
        current_level: evaluation.current_level,
        next_level: evaluation.next_level,
        period_start: evaluation.period_start,
        period_end: evaluation.period_end,
        deployments_total: evaluation.deployments_total,
        incidents: evaluation.incidents,
        incident_rate: evaluation.incident_rate,
        status,
        blocking_criteria: evaluation.blocking_criteria.clone(),
        decision_notes,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditStore;
    use crate::incident::{InMemoryIncidentStore, RecordIncidentInput};
    use crate::model::{InMemoryRiskModelStore, RegisterModelVersionInput};
    use crate::types::IncidentSeverity;

    struct Harness {
        engine: TrustMaturityEngine,
        incidents: Arc<InMemoryIncidentStore>,
        models: Arc<InMemoryRiskModelStore>,
        progress: Arc<InMemoryMaturityProgressStore>,
    }

    async fn harness() -> Harness {
        let levels = Arc::new(InMemoryMaturityLevelStore::with_default_ladder());
        let progress = Arc::new(InMemoryMaturityProgressStore::new());
        let incidents = Arc::new(InMemoryIncidentStore::new());
        let models = Arc::new(InMemoryRiskModelStore::new());

        for (version, mode) in [
            ("rm-baseline-v1", RiskModelMode::Conservative),
            ("rm-guarded-v2", RiskModelMode::Conservative),
            ("rm-standard-v3", RiskModelMode::Standard),
            ("rm-extended-v4", RiskModelMode::Progressive),
            ("rm-autonomous-v5", RiskModelMode::Progressive),
        ] {
            models
                .insert_version(RegisterModelVersionInput {
                    version: version.to_string(),
                    mode,
                    effective_date: Utc::now(),
                    review_date: None,
                    approved_by_cab: true,
                    auto_approve_thresholds: BTreeMap::new(),
                    calibration_data: None,
                })
                .await
                .unwrap();
        }
        models.activate("rm-baseline-v1").await.unwrap();

        let engine = TrustMaturityEngine::new(
            levels,
            progress.clone(),
            incidents.clone(),
            models.clone(),
            Arc::new(InMemoryAuditStore::new()),
        );

        Harness {
            engine,
            incidents,
            models,
            progress,
        }
    }

    fn incident(days_ago: i64, severity: IncidentSeverity) -> RecordIncidentInput {
        RecordIncidentInput {
            deployment_intent_id: Uuid::new_v4(),
            severity,
            incident_date: Utc::now() - Duration::days(days_ago),
            was_auto_approved: true,
            risk_score_at_approval: Some(35.0),
            risk_model_version: "rm-baseline-v1".to_string(),
            blast_radius_class: BlastRadius::NonCritical,
        }
    }

    #[tokio::test]
    async fn test_clean_window_is_ready_to_progress() {
        let h = harness().await;

        let evaluation = h
            .engine
            .evaluate_maturity_progression("initial", 4, Some(120))
            .await
            .unwrap();

        assert!(evaluation.ready_to_progress);
        assert!(evaluation.blocking_criteria.is_empty());
        assert_eq!(evaluation.next_level, Some(1));
        assert!(evaluation.recommendation.contains("rm-guarded-v2"));
    }

    #[tokio::test]
    async fn test_single_p1_always_blocks() {
        let h = harness().await;

        h.incidents
            .record(incident(3, IncidentSeverity::P1))
            .await
            .unwrap();

        // Even with a huge deployment volume keeping the rate tiny.
        let evaluation = h
            .engine
            .evaluate_maturity_progression("initial", 4, Some(10_000))
            .await
            .unwrap();

        assert!(!evaluation.ready_to_progress);
        assert!(evaluation
            .blocking_criteria
            .iter()
            .any(|c| c.contains("P1")));
    }

    #[tokio::test]
    async fn test_zero_deployments_blocks_without_division_error() {
        let h = harness().await;

        for total in [Some(0), None] {
            let evaluation = h
                .engine
                .evaluate_maturity_progression("initial", 4, total)
                .await
                .unwrap();

            assert!(!evaluation.ready_to_progress);
            assert_eq!(evaluation.incident_rate, 0.0);
            assert!(evaluation
                .blocking_criteria
                .iter()
                .any(|c| c.contains("No deployments")));
        }
    }

    #[tokio::test]
    async fn test_incident_rate_blocks() {
        let h = harness().await;

        for day in 1..=5 {
            h.incidents
                .record(incident(day, IncidentSeverity::P3))
                .await
                .unwrap();
        }

        // 5 incidents over 20 deployments = 0.25 > 0.20 at level `initial`.
        let evaluation = h
            .engine
            .evaluate_maturity_progression("initial", 4, Some(20))
            .await
            .unwrap();

        assert!(!evaluation.ready_to_progress);
        assert!(evaluation
            .blocking_criteria
            .iter()
            .any(|c| c.contains("Incident rate")));
    }

    #[tokio::test]
    async fn test_p2_budget_blocks() {
        let h = harness().await;

        for day in [2, 5, 9, 12] {
            h.incidents
                .record(incident(day, IncidentSeverity::P2))
                .await
                .unwrap();
        }

        // 4 P2s over 100 deployments: rate 0.04 passes, P2 budget (3) fails.
        let evaluation = h
            .engine
            .evaluate_maturity_progression("initial", 4, Some(100))
            .await
            .unwrap();

        assert!(!evaluation.ready_to_progress);
        assert_eq!(evaluation.blocking_criteria.len(), 1);
        assert!(evaluation.blocking_criteria[0].contains("P2"));
    }

    #[tokio::test]
    async fn test_short_window_blocks() {
        let h = harness().await;

        let evaluation = h
            .engine
            .evaluate_maturity_progression("initial", 2, Some(50))
            .await
            .unwrap();

        assert!(!evaluation.ready_to_progress);
        assert!(evaluation
            .blocking_criteria
            .iter()
            .any(|c| c.contains("weeks")));
    }

    #[tokio::test]
    async fn test_maximum_level_never_progresses() {
        let h = harness().await;

        let evaluation = h
            .engine
            .evaluate_maturity_progression("optimizing", 52, Some(1_000))
            .await
            .unwrap();

        assert!(!evaluation.ready_to_progress);
        assert!(evaluation.next_level.is_none());
        assert!(evaluation
            .recommendation
            .to_lowercase()
            .contains("maximum"));
    }

    #[tokio::test]
    async fn test_invalid_inputs() {
        let h = harness().await;

        assert!(matches!(
            h.engine
                .evaluate_maturity_progression("ascended", 4, Some(10))
                .await,
            Err(GovernanceError::UnknownMaturityLevel(_))
        ));

        assert!(matches!(
            h.engine
                .evaluate_maturity_progression("initial", -1, Some(10))
                .await,
            Err(GovernanceError::InvalidEvaluationPeriod(-1))
        ));
    }

    #[tokio::test]
    async fn test_evaluation_persists_nothing_until_recorded() {
        let h = harness().await;

        let evaluation = h
            .engine
            .evaluate_maturity_progression("initial", 4, Some(100))
            .await
            .unwrap();
        assert_eq!(h.progress.count().await, 0);

        let progress = h.engine.record_progress(&evaluation, None).await.unwrap();
        assert_eq!(progress.status, MaturityStatus::CriteriaMet);
        assert_eq!(h.progress.count().await, 1);
    }

    #[tokio::test]
    async fn test_apply_progression_activates_next_model_version() {
        let h = harness().await;

        let evaluation = h
            .engine
            .evaluate_maturity_progression("initial", 4, Some(100))
            .await
            .unwrap();

        let (progress, activated) = h
            .engine
            .apply_progression(&evaluation, Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(progress.status, MaturityStatus::Progressed);
        assert_eq!(activated.version, "rm-guarded-v2");
        assert_eq!(h.models.active_count().await, 1);

        let status = h.engine.get_current_maturity_status().await.unwrap();
        assert_eq!(status.active_model_version, "rm-guarded-v2");
        assert_eq!(h.engine.current_level_name().await.unwrap(), "developing");
    }

    #[tokio::test]
    async fn test_apply_progression_refused_when_not_ready() {
        let h = harness().await;

        let evaluation = h
            .engine
            .evaluate_maturity_progression("initial", 4, None)
            .await
            .unwrap();

        let result = h.engine.apply_progression(&evaluation, Uuid::new_v4()).await;
        assert!(matches!(result, Err(GovernanceError::ProgressionNotReady)));
    }

    #[tokio::test]
    async fn test_current_level_name_defaults_to_lowest_rung() {
        let h = harness().await;
        assert_eq!(h.engine.current_level_name().await.unwrap(), "initial");
    }
}
