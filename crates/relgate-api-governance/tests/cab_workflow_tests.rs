//! Service-level tests for the CAB workflow, exceptions, and maturity
//! progression, wired through the in-memory governance state.

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use relgate_api_governance::GovernanceState;
use relgate_governance::{
    ApprovalStatus, BlastRadius, CreateExceptionInput, DecisionTier, EvidencePackageId,
    EvidencePackageStore, GovernanceError, RegisterModelVersionInput, RiskFactor, RiskFactorType,
    RiskModelMode, Rubric, SubmitApprovalInput,
};
use relgate_governance::evidence::RegisterEvidenceInput;

async fn seed_evidence(state: &GovernanceState) -> EvidencePackageId {
    state
        .evidence_store
        .register(RegisterEvidenceInput {
            correlation_id: format!("EV-{}", Uuid::new_v4()),
            evidence_data: json!({
                "test_results": { "coverage_percent": 88.0 },
                "security_scan": { "critical_count": 0, "high_count": 1 },
                "manual_testing": { "status": "passed" },
                "deployment_scope": { "affected_components": ["api", "billing"] }
            }),
            risk_score: None,
            risk_factors: None,
            content_hash: "sha256:feedface".to_string(),
        })
        .await
        .unwrap()
        .id
}

fn submit(evidence: EvidencePackageId, risk_score: f64) -> SubmitApprovalInput {
    SubmitApprovalInput {
        evidence_package_id: evidence,
        deployment_intent_id: Uuid::new_v4(),
        risk_score,
        submitted_by: Uuid::new_v4(),
        notes: None,
        correlation_id: None,
    }
}

#[tokio::test]
async fn auto_approved_submission_has_exactly_one_decision() {
    let state = GovernanceState::in_memory();
    let evidence = seed_evidence(&state).await;

    let (request, tier) = state
        .workflow_service
        .submit_for_approval(submit(evidence, 40.0))
        .await
        .unwrap();

    assert_eq!(tier, DecisionTier::AutoApproved);
    assert_eq!(request.status, ApprovalStatus::AutoApproved);

    let decisions = state.workflow_service.decisions(request.id).await.unwrap();
    assert_eq!(decisions.len(), 1);
    assert!(decisions[0].is_approval());
}

#[tokio::test]
async fn manual_review_submission_has_no_decision_until_decided() {
    let state = GovernanceState::in_memory();
    let evidence = seed_evidence(&state).await;

    let (request, tier) = state
        .workflow_service
        .submit_for_approval(submit(evidence, 60.0))
        .await
        .unwrap();

    assert_eq!(tier, DecisionTier::ManualReview);
    assert_eq!(request.status, ApprovalStatus::Submitted);
    assert!(state
        .workflow_service
        .decisions(request.id)
        .await
        .unwrap()
        .is_empty());

    state
        .workflow_service
        .approve_request(request.id, Uuid::new_v4(), None, Vec::new())
        .await
        .unwrap();

    let decisions = state.workflow_service.decisions(request.id).await.unwrap();
    assert_eq!(decisions.len(), 1);
}

#[tokio::test]
async fn second_decision_conflicts_and_ledger_stays_at_one() {
    let state = GovernanceState::in_memory();
    let evidence = seed_evidence(&state).await;

    let (request, _) = state
        .workflow_service
        .submit_for_approval(submit(evidence, 70.0))
        .await
        .unwrap();

    state
        .workflow_service
        .approve_request(request.id, Uuid::new_v4(), None, Vec::new())
        .await
        .unwrap();

    let second = state
        .workflow_service
        .approve_request(request.id, Uuid::new_v4(), None, Vec::new())
        .await;
    assert!(matches!(
        second,
        Err(GovernanceError::RequestNotDecidable { .. })
    ));

    let decisions = state.workflow_service.decisions(request.id).await.unwrap();
    assert_eq!(decisions.len(), 1);
}

#[tokio::test]
async fn exception_lifecycle_with_dual_authority() {
    let state = GovernanceState::in_memory();
    let evidence = seed_evidence(&state).await;

    let (request, tier) = state
        .workflow_service
        .submit_for_approval(submit(evidence, 82.0))
        .await
        .unwrap();
    assert_eq!(tier, DecisionTier::ExceptionRequired);

    let requester = Uuid::new_v4();
    let exception = state
        .exception_service
        .create_exception(CreateExceptionInput {
            deployment_intent_id: request.deployment_intent_id,
            requested_by: requester,
            reason: "Vendor-mandated emergency upgrade".to_string(),
            risk_justification: "Known exploit in the wild".to_string(),
            compensating_controls: vec!["Staged rollout".to_string()],
            expiry_days: Some(14),
        })
        .await
        .unwrap();

    // The requester cannot approve their own exception.
    assert!(matches!(
        state
            .exception_service
            .approve_exception(exception.id, requester, None)
            .await,
        Err(GovernanceError::SelfApprovalForbidden)
    ));

    let approved = state
        .exception_service
        .approve_exception(exception.id, Uuid::new_v4(), Some("Controls verified".to_string()))
        .await
        .unwrap();
    assert!(approved.is_active());
}

#[tokio::test]
async fn scoring_through_the_active_model_is_deterministic() {
    let state = GovernanceState::in_memory();

    state
        .model_service
        .register_version(RegisterModelVersionInput {
            version: "rm-standard-v3".to_string(),
            mode: RiskModelMode::Standard,
            effective_date: Utc::now(),
            review_date: None,
            approved_by_cab: true,
            auto_approve_thresholds: BTreeMap::from([(BlastRadius::NonCritical, 50.0)]),
            calibration_data: None,
        })
        .await
        .unwrap();
    state
        .model_service
        .activate_version("rm-standard-v3", Uuid::new_v4())
        .await
        .unwrap();

    for (factor_type, weight, rubric) in [
        (
            RiskFactorType::Coverage,
            0.5,
            Rubric::new([(">90", 10.0), ("80-90", 30.0), ("<80", 70.0)]),
        ),
        (
            RiskFactorType::Security,
            0.5,
            Rubric::new([("0", 5.0), ("1-5", 50.0), (">5", 90.0)]),
        ),
    ] {
        state
            .model_service
            .register_factor(RiskFactor {
                model_version: "rm-standard-v3".to_string(),
                factor_type,
                name: factor_type.to_string(),
                weight,
                rubric,
            })
            .await
            .unwrap();
    }

    let evidence = json!({
        "test_results": { "coverage_percent": 85.0 },
        "security_scan": { "critical_count": 0, "high_count": 2 }
    });

    let (version_a, assessment_a) = state.model_service.score_evidence(&evidence).await.unwrap();
    let (_, assessment_b) = state.model_service.score_evidence(&evidence).await.unwrap();

    assert_eq!(version_a.version, "rm-standard-v3");
    // 0.5*30 + 0.5*50 = 40
    assert!((assessment_a.score - 40.0).abs() < 1e-9);
    assert_eq!(assessment_a, assessment_b);
}

#[tokio::test]
async fn maturity_progression_moves_the_active_model() {
    let state = GovernanceState::in_memory();

    for version in ["rm-baseline-v1", "rm-guarded-v2"] {
        state
            .model_service
            .register_version(RegisterModelVersionInput {
                version: version.to_string(),
                mode: RiskModelMode::Conservative,
                effective_date: Utc::now(),
                review_date: None,
                approved_by_cab: true,
                auto_approve_thresholds: BTreeMap::new(),
                calibration_data: None,
            })
            .await
            .unwrap();
    }
    state
        .model_service
        .activate_version("rm-baseline-v1", Uuid::new_v4())
        .await
        .unwrap();

    let evaluation = state
        .maturity_engine
        .evaluate_maturity_progression("initial", 4, Some(200))
        .await
        .unwrap();
    assert!(evaluation.ready_to_progress);

    state
        .maturity_engine
        .apply_progression(&evaluation, Uuid::new_v4())
        .await
        .unwrap();

    let status = state
        .maturity_engine
        .get_current_maturity_status()
        .await
        .unwrap();
    assert_eq!(status.active_model_version, "rm-guarded-v2");
    assert!(status.latest_progress.is_some());
}
