//! Router configuration for the governance API.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};

use relgate_governance::{
    audit::InMemoryAuditStore,
    evidence::EvidencePackageStore,
    incident::IncidentStore,
    services::{
        CabExceptionService, CabWorkflowService, InMemoryApprovalRequestStore,
        InMemoryDecisionStore, InMemoryExceptionStore, InMemoryMaturityLevelStore,
        InMemoryMaturityProgressStore, TrustMaturityEngine,
    },
    InMemoryEvidencePackageStore, InMemoryIncidentStore, InMemoryRiskModelStore,
    RiskModelService,
};

use crate::handlers::{cab_exceptions, cab_requests, maturity};
use crate::middleware::{jwt_auth_middleware, JwtSecret};

/// Shared state for governance handlers.
#[derive(Clone)]
pub struct GovernanceState {
    pub workflow_service: Arc<CabWorkflowService>,
    pub exception_service: Arc<CabExceptionService>,
    pub maturity_engine: Arc<TrustMaturityEngine>,
    pub model_service: Arc<RiskModelService>,
    /// Exposed for the external evidence pipeline seam and tests.
    pub evidence_store: Arc<dyn EvidencePackageStore>,
    /// Exposed for the external operations-process seam and tests.
    pub incident_store: Arc<dyn IncidentStore>,
}

impl GovernanceState {
    /// Build a fully in-memory state: every store is the in-memory
    /// implementation and the maturity ladder is the default five-level one.
    #[must_use]
    pub fn in_memory() -> Self {
        let audit_store = Arc::new(InMemoryAuditStore::new());
        let evidence_store = Arc::new(InMemoryEvidencePackageStore::new());
        let incident_store = Arc::new(InMemoryIncidentStore::new());
        let model_store = Arc::new(InMemoryRiskModelStore::new());

        let workflow_service = Arc::new(CabWorkflowService::new(
            Arc::new(InMemoryApprovalRequestStore::new()),
            Arc::new(InMemoryDecisionStore::new()),
            evidence_store.clone(),
            audit_store.clone(),
        ));

        let exception_service = Arc::new(CabExceptionService::new(
            Arc::new(InMemoryExceptionStore::new()),
            audit_store.clone(),
        ));

        let maturity_engine = Arc::new(TrustMaturityEngine::new(
            Arc::new(InMemoryMaturityLevelStore::with_default_ladder()),
            Arc::new(InMemoryMaturityProgressStore::new()),
            incident_store.clone(),
            model_store.clone(),
            audit_store.clone(),
        ));

        let model_service = Arc::new(RiskModelService::new(model_store, audit_store));

        Self {
            workflow_service,
            exception_service,
            maturity_engine,
            model_service,
            evidence_store,
            incident_store,
        }
    }
}

/// Build the governance router with bearer-JWT authentication.
pub fn governance_router(state: GovernanceState, jwt_secret: &str) -> Router {
    Router::new()
        // Approval requests
        .route("/cab/submit", post(cab_requests::submit_request))
        .route("/cab/pending", get(cab_requests::list_pending))
        .route("/cab/my-requests", get(cab_requests::my_requests))
        .route(
            "/cab/intents/:intent_id/status",
            get(cab_requests::intent_status),
        )
        // Exceptions
        .route("/cab/exceptions", post(cab_exceptions::create_exception))
        .route(
            "/cab/exceptions/pending",
            get(cab_exceptions::list_pending),
        )
        .route(
            "/cab/exceptions/my-exceptions",
            get(cab_exceptions::my_exceptions),
        )
        .route(
            "/cab/exceptions/:id/approve",
            post(cab_exceptions::approve_exception),
        )
        .route(
            "/cab/exceptions/:id/reject",
            post(cab_exceptions::reject_exception),
        )
        // Trust maturity
        .route("/cab/maturity/status", get(maturity::get_status))
        .route("/cab/maturity/evaluate", post(maturity::evaluate))
        // Individual requests (param routes last)
        .route("/cab/:id", get(cab_requests::get_request))
        .route("/cab/:id/approve", post(cab_requests::approve_request))
        .route("/cab/:id/reject", post(cab_requests::reject_request))
        .route("/cab/:id/decisions", get(cab_requests::list_decisions))
        .layer(axum::middleware::from_fn(jwt_auth_middleware))
        .layer(Extension(JwtSecret(jwt_secret.to_string())))
        .with_state(state)
}
