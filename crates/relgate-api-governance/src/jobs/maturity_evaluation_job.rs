//! Periodic trust maturity evaluation job.
//!
//! Evaluates the current level's promotion criteria over the configured
//! incident window and records the outcome. Deployment volume comes from the
//! external dispatch process through [`DeploymentVolumeSource`].

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, instrument};

use relgate_governance::{DeploymentVolumeSource, GovernanceError, TrustMaturityEngine};

/// Default polling interval in seconds (1 day).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 86_400;

/// Default evaluation window in weeks.
pub const DEFAULT_EVALUATION_PERIOD_WEEKS: i64 = 4;

/// Job for periodic maturity evaluation.
pub struct MaturityEvaluationJob {
    engine: Arc<TrustMaturityEngine>,
    volume_source: Arc<dyn DeploymentVolumeSource>,
    evaluation_period_weeks: i64,
    poll_interval_secs: u64,
}

/// Statistics from an evaluation cycle.
#[derive(Debug, Clone, Default)]
pub struct MaturityEvaluationStats {
    /// Evaluations run.
    pub evaluated: u64,
    /// Evaluations where every criterion passed.
    pub criteria_met: u64,
    /// Evaluations blocked by at least one criterion.
    pub criteria_not_met: u64,
}

impl MaturityEvaluationStats {
    /// Merge stats from another instance.
    pub fn merge(&mut self, other: &MaturityEvaluationStats) {
        self.evaluated += other.evaluated;
        self.criteria_met += other.criteria_met;
        self.criteria_not_met += other.criteria_not_met;
    }
}

/// Errors that can occur during maturity evaluation.
#[derive(Debug, thiserror::Error)]
pub enum MaturityEvaluationJobError {
    #[error("Service error: {0}")]
    Service(#[from] GovernanceError),
}

impl MaturityEvaluationJob {
    /// Create a new evaluation job.
    pub fn new(
        engine: Arc<TrustMaturityEngine>,
        volume_source: Arc<dyn DeploymentVolumeSource>,
    ) -> Self {
        Self {
            engine,
            volume_source,
            evaluation_period_weeks: DEFAULT_EVALUATION_PERIOD_WEEKS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }

    /// Create with a custom evaluation window.
    #[must_use]
    pub fn with_evaluation_period_weeks(mut self, weeks: i64) -> Self {
        self.evaluation_period_weeks = weeks.max(0);
        self
    }

    /// Create with a custom polling interval.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval_secs: u64) -> Self {
        self.poll_interval_secs = poll_interval_secs.max(1);
        self
    }

    /// Run a single evaluation cycle: evaluate the current level and record
    /// the outcome. Re-running is safe; each cycle appends one record.
    #[instrument(skip(self))]
    pub async fn poll(&self) -> Result<MaturityEvaluationStats, MaturityEvaluationJobError> {
        let current_level = self.engine.current_level_name().await?;

        let now = Utc::now();
        let window_start = now - Duration::weeks(self.evaluation_period_weeks);
        let deployments = self
            .volume_source
            .deployments_in_window(window_start, now)
            .await?;

        let evaluation = self
            .engine
            .evaluate_maturity_progression(
                &current_level,
                self.evaluation_period_weeks,
                Some(deployments),
            )
            .await?;

        self.engine.record_progress(&evaluation, None).await?;

        let mut stats = MaturityEvaluationStats {
            evaluated: 1,
            ..Default::default()
        };
        if evaluation.ready_to_progress {
            stats.criteria_met += 1;
        } else {
            stats.criteria_not_met += 1;
        }

        info!(
            level = %current_level,
            ready = evaluation.ready_to_progress,
            blocking = evaluation.blocking_criteria.len(),
            "Maturity evaluation cycle complete"
        );

        Ok(stats)
    }

    /// Run the evaluation on its polling interval until the task is dropped.
    pub async fn run(self) {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(self.poll_interval_secs));

        loop {
            interval.tick().await;
            if let Err(e) = self.poll().await {
                error!(error = %e, "Maturity evaluation cycle failed");
            }
        }
    }
}
