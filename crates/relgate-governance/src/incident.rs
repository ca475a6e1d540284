//! Deployment incident records.
//!
//! Incidents are created by an external operations process and only read
//! here; the trust maturity engine evaluates them over a rolling window.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::{BlastRadius, IncidentId, IncidentSeverity};

/// An operational incident attributed to a deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentIncident {
    /// Unique identifier.
    pub id: IncidentId,
    /// The deployment this incident is attributed to.
    pub deployment_intent_id: uuid::Uuid,
    /// Incident severity.
    pub severity: IncidentSeverity,
    /// When the incident occurred.
    pub incident_date: DateTime<Utc>,
    /// Whether the causing deployment was auto-approved.
    pub was_auto_approved: bool,
    /// Risk score recorded when the deployment was approved.
    pub risk_score_at_approval: Option<f64>,
    /// Risk model version in force at approval time.
    pub risk_model_version: String,
    /// Blast-radius class of the deployment target.
    pub blast_radius_class: BlastRadius,
}

/// Input for recording an incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordIncidentInput {
    pub deployment_intent_id: uuid::Uuid,
    pub severity: IncidentSeverity,
    pub incident_date: DateTime<Utc>,
    pub was_auto_approved: bool,
    pub risk_score_at_approval: Option<f64>,
    pub risk_model_version: String,
    pub blast_radius_class: BlastRadius,
}

/// Incident counts by severity over an evaluation window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentWindowCounts {
    pub total: u64,
    pub p1: u64,
    pub p2: u64,
    pub p3: u64,
    pub p4: u64,
}

impl IncidentWindowCounts {
    /// Add one incident of the given severity.
    pub fn record(&mut self, severity: IncidentSeverity) {
        self.total += 1;
        match severity {
            IncidentSeverity::P1 => self.p1 += 1,
            IncidentSeverity::P2 => self.p2 += 1,
            IncidentSeverity::P3 => self.p3 += 1,
            IncidentSeverity::P4 => self.p4 += 1,
        }
    }
}

/// Trait for incident storage backends.
#[async_trait::async_trait]
pub trait IncidentStore: Send + Sync {
    /// Record an incident (called by the external operations process).
    async fn record(&self, input: RecordIncidentInput) -> Result<DeploymentIncident>;

    /// Count incidents by severity within `[from, to]`.
    async fn count_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<IncidentWindowCounts>;

    /// List incidents within `[from, to]`, newest first.
    async fn list_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DeploymentIncident>>;
}

/// In-memory incident store for testing.
#[derive(Debug, Default)]
pub struct InMemoryIncidentStore {
    incidents: Arc<RwLock<HashMap<IncidentId, DeploymentIncident>>>,
}

impl InMemoryIncidentStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            incidents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get incident count.
    pub async fn count(&self) -> usize {
        self.incidents.read().await.len()
    }
}

#[async_trait::async_trait]
impl IncidentStore for InMemoryIncidentStore {
    async fn record(&self, input: RecordIncidentInput) -> Result<DeploymentIncident> {
        let incident = DeploymentIncident {
            id: IncidentId::new(),
            deployment_intent_id: input.deployment_intent_id,
            severity: input.severity,
            incident_date: input.incident_date,
            was_auto_approved: input.was_auto_approved,
            risk_score_at_approval: input.risk_score_at_approval,
            risk_model_version: input.risk_model_version,
            blast_radius_class: input.blast_radius_class,
        };

        self.incidents
            .write()
            .await
            .insert(incident.id, incident.clone());
        Ok(incident)
    }

    async fn count_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<IncidentWindowCounts> {
        let incidents = self.incidents.read().await;
        let mut counts = IncidentWindowCounts::default();

        for incident in incidents.values() {
            if incident.incident_date >= from && incident.incident_date <= to {
                counts.record(incident.severity);
            }
        }

        Ok(counts)
    }

    async fn list_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DeploymentIncident>> {
        let incidents = self.incidents.read().await;
        let mut results: Vec<_> = incidents
            .values()
            .filter(|i| i.incident_date >= from && i.incident_date <= to)
            .cloned()
            .collect();

        results.sort_by(|a, b| b.incident_date.cmp(&a.incident_date));
        Ok(results)
    }
}
