//! Evidence package access.
//!
//! Evidence packages are produced and hashed by an external evidence
//! pipeline; this core consumes them read-only. A package row is immutable
//! once written - `content_hash` is computed over `evidence_data` at creation
//! and is never recomputed here, so any divergence between the two is
//! tamper evidence.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{GovernanceError, Result};
use crate::types::EvidencePackageId;

/// An immutable bundle of test/scan/deployment/rollback artifacts backing a
/// risk decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidencePackage {
    /// Unique identifier.
    pub id: EvidencePackageId,
    /// Globally unique correlation id assigned by the evidence pipeline.
    pub correlation_id: String,
    /// The evidence payload. Immutable after creation.
    pub evidence_data: serde_json::Value,
    /// Risk score recorded at evidence-generation time, if any.
    pub risk_score: Option<f64>,
    /// Factor breakdown recorded at evidence-generation time, if any.
    pub risk_factors: Option<serde_json::Value>,
    /// Hash of `evidence_data` computed at creation. Opaque here.
    pub content_hash: String,
    /// When the package was stored.
    pub created_at: DateTime<Utc>,
}

/// Input for registering an externally produced evidence package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterEvidenceInput {
    pub correlation_id: String,
    pub evidence_data: serde_json::Value,
    pub risk_score: Option<f64>,
    pub risk_factors: Option<serde_json::Value>,
    pub content_hash: String,
}

/// Trait for evidence package storage backends.
///
/// There is deliberately no update operation: packages are immutable once
/// written and require no read locking.
#[async_trait::async_trait]
pub trait EvidencePackageStore: Send + Sync {
    /// Get a package by ID.
    async fn get(&self, id: EvidencePackageId) -> Result<Option<EvidencePackage>>;

    /// Check whether a package exists.
    async fn exists(&self, id: EvidencePackageId) -> Result<bool>;

    /// Register a package produced by the external evidence pipeline.
    ///
    /// Fails if the correlation id is already in use.
    async fn register(&self, input: RegisterEvidenceInput) -> Result<EvidencePackage>;
}

/// In-memory evidence package store for testing.
#[derive(Debug, Default)]
pub struct InMemoryEvidencePackageStore {
    packages: Arc<RwLock<HashMap<EvidencePackageId, EvidencePackage>>>,
}

impl InMemoryEvidencePackageStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            packages: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get package count.
    pub async fn count(&self) -> usize {
        self.packages.read().await.len()
    }
}

#[async_trait::async_trait]
impl EvidencePackageStore for InMemoryEvidencePackageStore {
    async fn get(&self, id: EvidencePackageId) -> Result<Option<EvidencePackage>> {
        Ok(self.packages.read().await.get(&id).cloned())
    }

    async fn exists(&self, id: EvidencePackageId) -> Result<bool> {
        Ok(self.packages.read().await.contains_key(&id))
    }

    async fn register(&self, input: RegisterEvidenceInput) -> Result<EvidencePackage> {
        let mut packages = self.packages.write().await;

        if packages
            .values()
            .any(|p| p.correlation_id == input.correlation_id)
        {
            return Err(GovernanceError::DuplicateCorrelationId(input.correlation_id));
        }

        let package = EvidencePackage {
            id: EvidencePackageId::new(),
            correlation_id: input.correlation_id,
            evidence_data: input.evidence_data,
            risk_score: input.risk_score,
            risk_factors: input.risk_factors,
            content_hash: input.content_hash,
            created_at: Utc::now(),
        };

        packages.insert(package.id, package.clone());
        Ok(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_input(correlation_id: &str) -> RegisterEvidenceInput {
        RegisterEvidenceInput {
            correlation_id: correlation_id.to_string(),
            evidence_data: json!({"test_results": {"coverage_percent": 87.5}}),
            risk_score: None,
            risk_factors: None,
            content_hash: "sha256:deadbeef".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let store = InMemoryEvidencePackageStore::new();

        let package = store.register(sample_input("EV-001")).await.unwrap();
        assert!(store.exists(package.id).await.unwrap());

        let fetched = store.get(package.id).await.unwrap().unwrap();
        assert_eq!(fetched.correlation_id, "EV-001");
        assert_eq!(fetched.content_hash, "sha256:deadbeef");
    }

    #[tokio::test]
    async fn test_duplicate_correlation_id_rejected() {
        let store = InMemoryEvidencePackageStore::new();

        store.register(sample_input("EV-001")).await.unwrap();
        let result = store.register(sample_input("EV-001")).await;

        assert!(matches!(
            result,
            Err(GovernanceError::DuplicateCorrelationId(_))
        ));
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_missing_package() {
        let store = InMemoryEvidencePackageStore::new();
        let id = EvidencePackageId::new();

        assert!(!store.exists(id).await.unwrap());
        assert!(store.get(id).await.unwrap().is_none());
    }
}
