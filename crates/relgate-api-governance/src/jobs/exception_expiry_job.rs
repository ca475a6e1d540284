//! Exception expiry sweep job.
//!
//! Transitions approved exceptions past their expiry date to `expired`.
//! The sweep is idempotent and safe to run on any cadence.

use std::sync::Arc;

use tracing::{error, info, instrument};

use relgate_governance::{CabExceptionService, GovernanceError};

/// Default polling interval in seconds (1 hour).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3600;

/// Job for sweeping expired exceptions.
pub struct ExceptionExpiryJob {
    exception_service: Arc<CabExceptionService>,
    poll_interval_secs: u64,
}

/// Statistics from an expiry sweep.
#[derive(Debug, Clone, Default)]
pub struct ExceptionExpiryStats {
    /// Exceptions transitioned to `expired`.
    pub expired: u64,
}

impl ExceptionExpiryStats {
    /// Merge stats from another instance.
    pub fn merge(&mut self, other: &ExceptionExpiryStats) {
        self.expired += other.expired;
    }
}

/// Errors that can occur during the expiry sweep.
#[derive(Debug, thiserror::Error)]
pub enum ExceptionExpiryJobError {
    #[error("Service error: {0}")]
    Service(#[from] GovernanceError),
}

impl ExceptionExpiryJob {
    /// Create a new expiry job.
    #[must_use]
    pub fn new(exception_service: Arc<CabExceptionService>) -> Self {
        Self {
            exception_service,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }

    /// Create with a custom polling interval.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval_secs: u64) -> Self {
        self.poll_interval_secs = poll_interval_secs.max(1);
        self
    }

    /// Get the configured poll interval.
    #[must_use]
    pub const fn poll_interval_secs(&self) -> u64 {
        self.poll_interval_secs
    }

    /// Run a single sweep cycle.
    #[instrument(skip(self))]
    pub async fn poll(&self) -> Result<ExceptionExpiryStats, ExceptionExpiryJobError> {
        let expired = self.exception_service.cleanup_expired_exceptions().await?;

        if expired > 0 {
            info!(expired, "Exception expiry sweep complete");
        }

        Ok(ExceptionExpiryStats { expired })
    }

    /// Run the sweep on its polling interval until the task is dropped.
    pub async fn run(self) {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(self.poll_interval_secs));

        loop {
            interval.tick().await;
            if let Err(e) = self.poll().await {
                error!(error = %e, "Exception expiry sweep failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use relgate_governance::audit::InMemoryAuditStore;
    use relgate_governance::services::{CreateExceptionInput, InMemoryExceptionStore};
    use relgate_governance::ExceptionStatus;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_poll_sweeps_and_is_idempotent() {
        let store = Arc::new(InMemoryExceptionStore::new());
        let service = Arc::new(CabExceptionService::new(
            store.clone(),
            Arc::new(InMemoryAuditStore::new()),
        ));

        let exception = service
            .create_exception(CreateExceptionInput {
                deployment_intent_id: Uuid::new_v4(),
                requested_by: Uuid::new_v4(),
                reason: "Patch window".to_string(),
                risk_justification: "Vendor fix".to_string(),
                compensating_controls: vec!["Canary".to_string()],
                expiry_days: Some(5),
            })
            .await
            .unwrap();
        service
            .approve_exception(exception.id, Uuid::new_v4(), None)
            .await
            .unwrap();

        // Force the approval past its expiry.
        let mut lapsed = service.get_exception(exception.id).await.unwrap();
        lapsed.expires_at = Utc::now() - Duration::hours(1);
        use relgate_governance::services::ExceptionStore;
        store.insert(lapsed).await.unwrap();

        let job = ExceptionExpiryJob::new(service.clone()).with_poll_interval(60);
        assert_eq!(job.poll_interval_secs(), 60);

        let stats = job.poll().await.unwrap();
        assert_eq!(stats.expired, 1);
        assert_eq!(
            service.get_exception(exception.id).await.unwrap().status,
            ExceptionStatus::Expired
        );

        let stats = job.poll().await.unwrap();
        assert_eq!(stats.expired, 0);
    }
}
