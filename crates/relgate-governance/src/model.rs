//! Risk model versions and their factor configuration.
//!
//! A risk model version carries the factor weights, rubrics, and per-class
//! auto-approve ceilings the scoring engine and workflow consult. Exactly one
//! version is active system-wide; activation atomically deactivates the
//! previous active version.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::audit::{AuditStore, GovernanceAuditAction, GovernanceAuditEventInput};
use crate::error::{GovernanceError, Result};
use crate::scoring::{RiskAssessment, RiskScoringEngine};
use crate::types::{BlastRadius, RiskFactorType, RiskModelMode};

// ============================================================================
// Rubrics
// ============================================================================

/// One band of a scoring rubric: a threshold expression mapped to a point
/// value on the 0-100 risk scale.
///
/// Numeric band grammar: `"<N"`, `"<=N"`, `">N"`, `">=N"`, `"A-B"` (inclusive
/// range), or a bare number for exact match. Categorical rubrics use plain
/// labels (`"passed"`, `"missing"`, ...) instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricBand {
    /// Threshold expression or categorical label.
    pub band: String,
    /// Points awarded when the band matches (0-100).
    pub points: f64,
}

/// An ordered list of rubric bands; the first matching band wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    pub bands: Vec<RubricBand>,
}

impl Rubric {
    /// Build a rubric from `(band, points)` pairs.
    pub fn new<S: Into<String>>(bands: impl IntoIterator<Item = (S, f64)>) -> Self {
        Self {
            bands: bands
                .into_iter()
                .map(|(band, points)| RubricBand {
                    band: band.into(),
                    points,
                })
                .collect(),
        }
    }

    /// Points for a numeric value, if any band matches.
    #[must_use]
    pub fn points_for_value(&self, value: f64) -> Option<f64> {
        self.bands
            .iter()
            .find(|b| band_matches_value(&b.band, value))
            .map(|b| b.points)
    }

    /// Points for a categorical label, if any band matches.
    #[must_use]
    pub fn points_for_label(&self, label: &str) -> Option<f64> {
        let label = label.trim();
        self.bands
            .iter()
            .find(|b| b.band.trim().eq_ignore_ascii_case(label))
            .map(|b| b.points)
    }
}

/// Whether a numeric band expression matches a value.
///
/// Malformed expressions never match; a mistyped rubric band degrades to the
/// caller's neutral default rather than failing the evaluation.
fn band_matches_value(band: &str, value: f64) -> bool {
    let band = band.trim();

    if let Some(rest) = band.strip_prefix("<=") {
        return rest.trim().parse::<f64>().map_or(false, |n| value <= n);
    }
    if let Some(rest) = band.strip_prefix(">=") {
        return rest.trim().parse::<f64>().map_or(false, |n| value >= n);
    }
    if let Some(rest) = band.strip_prefix('<') {
        return rest.trim().parse::<f64>().map_or(false, |n| value < n);
    }
    if let Some(rest) = band.strip_prefix('>') {
        return rest.trim().parse::<f64>().map_or(false, |n| value > n);
    }

    // Inclusive range "A-B". Split on the first '-' that is not a leading sign.
    if let Some(idx) = band.char_indices().skip(1).find_map(|(i, c)| {
        if c == '-' {
            Some(i)
        } else {
            None
        }
    }) {
        let (low, high) = band.split_at(idx);
        if let (Ok(low), Ok(high)) = (
            low.trim().parse::<f64>(),
            high[1..].trim().parse::<f64>(),
        ) {
            return value >= low && value <= high;
        }
    }

    band.parse::<f64>()
        .map_or(false, |n| (value - n).abs() < f64::EPSILON)
}

// ============================================================================
// Domain Types
// ============================================================================

/// A weighted scoring factor configured under a model version.
///
/// Unique per `(model_version, factor_type)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Owning model version.
    pub model_version: String,
    /// Which evaluator scores this factor.
    pub factor_type: RiskFactorType,
    /// Human-readable factor name.
    pub name: String,
    /// Weight in the aggregate (weights are expected to sum to roughly 1).
    pub weight: f64,
    /// Scoring rubric.
    pub rubric: Rubric,
}

/// A versioned risk model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskModelVersion {
    /// Version identifier, e.g. `rm-baseline-v1`.
    pub version: String,
    /// Operating mode.
    pub mode: RiskModelMode,
    /// When the version takes effect.
    pub effective_date: DateTime<Utc>,
    /// When the version is due for review.
    pub review_date: Option<DateTime<Utc>>,
    /// Whether this is the single active version.
    pub is_active: bool,
    /// Whether the CAB signed off on this version.
    pub approved_by_cab: bool,
    /// Per-blast-radius auto-approve score ceilings.
    pub auto_approve_thresholds: BTreeMap<BlastRadius, f64>,
    /// Calibration payload from the model review process.
    pub calibration_data: Option<serde_json::Value>,
}

/// Input for registering a model version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterModelVersionInput {
    pub version: String,
    pub mode: RiskModelMode,
    pub effective_date: DateTime<Utc>,
    pub review_date: Option<DateTime<Utc>>,
    pub approved_by_cab: bool,
    pub auto_approve_thresholds: BTreeMap<BlastRadius, f64>,
    pub calibration_data: Option<serde_json::Value>,
}

// ============================================================================
// Store Trait
// ============================================================================

/// Trait for risk model storage backends.
#[async_trait::async_trait]
pub trait RiskModelStore: Send + Sync {
    /// Get a version by identifier.
    async fn get_version(&self, version: &str) -> Result<Option<RiskModelVersion>>;

    /// Get the single active version, if one exists.
    async fn get_active(&self) -> Result<Option<RiskModelVersion>>;

    /// Register a new, inactive version. Fails on duplicate identifiers.
    async fn insert_version(&self, input: RegisterModelVersionInput) -> Result<RiskModelVersion>;

    /// Activate `version`, deactivating the previous active version.
    ///
    /// Implementations MUST perform the swap atomically (one write guard or
    /// one transaction) so the "exactly one active version" invariant holds
    /// under concurrent activation attempts.
    async fn activate(&self, version: &str) -> Result<RiskModelVersion>;

    /// Add a factor to a version. Fails if the version already has a factor
    /// of the same type.
    async fn add_factor(&self, factor: RiskFactor) -> Result<RiskFactor>;

    /// All factors configured under a version.
    async fn factors_for_version(&self, version: &str) -> Result<Vec<RiskFactor>>;
}

// ============================================================================
// In-Memory Store (for testing)
// ============================================================================

/// In-memory risk model store for testing.
#[derive(Debug, Default)]
pub struct InMemoryRiskModelStore {
    versions: Arc<RwLock<HashMap<String, RiskModelVersion>>>,
    factors: Arc<RwLock<Vec<RiskFactor>>>,
}

impl InMemoryRiskModelStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            versions: Arc::new(RwLock::new(HashMap::new())),
            factors: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Count active versions (for invariant tests).
    pub async fn active_count(&self) -> usize {
        self.versions
            .read()
            .await
            .values()
            .filter(|v| v.is_active)
            .count()
    }
}

#[async_trait::async_trait]
impl RiskModelStore for InMemoryRiskModelStore {
    async fn get_version(&self, version: &str) -> Result<Option<RiskModelVersion>> {
        Ok(self.versions.read().await.get(version).cloned())
    }

    async fn get_active(&self) -> Result<Option<RiskModelVersion>> {
        Ok(self
            .versions
            .read()
            .await
            .values()
            .find(|v| v.is_active)
            .cloned())
    }

    async fn insert_version(&self, input: RegisterModelVersionInput) -> Result<RiskModelVersion> {
        let mut versions = self.versions.write().await;

        if versions.contains_key(&input.version) {
            return Err(GovernanceError::DuplicateModelVersion(input.version));
        }

        let version = RiskModelVersion {
            version: input.version,
            mode: input.mode,
            effective_date: input.effective_date,
            review_date: input.review_date,
            is_active: false,
            approved_by_cab: input.approved_by_cab,
            auto_approve_thresholds: input.auto_approve_thresholds,
            calibration_data: input.calibration_data,
        };

        versions.insert(version.version.clone(), version.clone());
        Ok(version)
    }

    async fn activate(&self, version: &str) -> Result<RiskModelVersion> {
        // Single write guard covers deactivate-then-activate.
        let mut versions = self.versions.write().await;

        if !versions.contains_key(version) {
            return Err(GovernanceError::ModelVersionNotFound(version.to_string()));
        }

        for v in versions.values_mut() {
            v.is_active = false;
        }
        match versions.get_mut(version) {
            Some(target) => {
                target.is_active = true;
                Ok(target.clone())
            }
            None => Err(GovernanceError::ModelVersionNotFound(version.to_string())),
        }
    }

    async fn add_factor(&self, factor: RiskFactor) -> Result<RiskFactor> {
        let mut factors = self.factors.write().await;

        if factors
            .iter()
            .any(|f| f.model_version == factor.model_version && f.factor_type == factor.factor_type)
        {
            return Err(GovernanceError::DuplicateRiskFactor {
                version: factor.model_version,
                factor_type: factor.factor_type,
            });
        }

        factors.push(factor.clone());
        Ok(factor)
    }

    async fn factors_for_version(&self, version: &str) -> Result<Vec<RiskFactor>> {
        Ok(self
            .factors
            .read()
            .await
            .iter()
            .filter(|f| f.model_version == version)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Service
// ============================================================================

/// Service for risk model administration and scoring against the active
/// version.
pub struct RiskModelService {
    store: Arc<dyn RiskModelStore>,
    audit_store: Arc<dyn AuditStore>,
}

impl RiskModelService {
    /// Create a new risk model service.
    pub fn new(store: Arc<dyn RiskModelStore>, audit_store: Arc<dyn AuditStore>) -> Self {
        Self { store, audit_store }
    }

    /// The currently active model version.
    pub async fn active_version(&self) -> Result<RiskModelVersion> {
        self.store
            .get_active()
            .await?
            .ok_or(GovernanceError::NoActiveModelVersion)
    }

    /// Get a version by identifier.
    pub async fn get_version(&self, version: &str) -> Result<RiskModelVersion> {
        self.store
            .get_version(version)
            .await?
            .ok_or_else(|| GovernanceError::ModelVersionNotFound(version.to_string()))
    }

    /// Register a new, inactive version.
    pub async fn register_version(
        &self,
        input: RegisterModelVersionInput,
    ) -> Result<RiskModelVersion> {
        self.store.insert_version(input).await
    }

    /// Register a factor under a version.
    pub async fn register_factor(&self, factor: RiskFactor) -> Result<RiskFactor> {
        self.get_version(&factor.model_version).await?;
        self.store.add_factor(factor).await
    }

    /// Activate a version, atomically deactivating the previous one.
    pub async fn activate_version(
        &self,
        version: &str,
        actor: Uuid,
    ) -> Result<RiskModelVersion> {
        let before = self.store.get_active().await?;
        let activated = self.store.activate(version).await?;

        tracing::info!(version = %activated.version, "Risk model version activated");

        self.audit_store
            .log_event(GovernanceAuditEventInput {
                action: GovernanceAuditAction::ModelActivated,
                actor,
                before_state: before
                    .map(|v| serde_json::to_value(&v).unwrap_or_default()),
                after_state: Some(serde_json::to_value(&activated).unwrap_or_default()),
                ..Default::default()
            })
            .await?;

        Ok(activated)
    }

    /// Score an evidence payload against the active version's factors.
    pub async fn score_evidence(
        &self,
        evidence_data: &serde_json::Value,
    ) -> Result<(RiskModelVersion, RiskAssessment)> {
        let active = self.active_version().await?;
        let factors = self.store.factors_for_version(&active.version).await?;
        let assessment = RiskScoringEngine::compute_risk_score(evidence_data, &factors);
        Ok((active, assessment))
    }
}
