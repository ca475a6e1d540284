//! HTTP-layer tests for the status-code contract: 201/400/404 on submit,
//! 400 on non-transitionable states, and 401/403 role scoping.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use relgate_api_governance::{governance_router, GovernanceState};
use relgate_auth::{encode_token, JwtClaims};
use relgate_governance::evidence::RegisterEvidenceInput;
use relgate_governance::EvidencePackageStore;

const SECRET: &str = "router-test-secret";

struct TestApp {
    router: Router,
    state: GovernanceState,
}

fn app() -> TestApp {
    let state = GovernanceState::in_memory();
    let router = governance_router(state.clone(), SECRET);
    TestApp { router, state }
}

fn token(user: Uuid, roles: &[&str]) -> String {
    let claims = JwtClaims::builder()
        .subject(user.to_string())
        .roles(roles.to_vec())
        .expires_in_secs(600)
        .build();
    encode_token(&claims, SECRET.as_bytes()).unwrap()
}

fn request(method: &str, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header("Authorization", format!("Bearer {bearer}"));
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn seed_evidence(state: &GovernanceState) -> Uuid {
    state
        .evidence_store
        .register(RegisterEvidenceInput {
            correlation_id: format!("EV-{}", Uuid::new_v4()),
            evidence_data: json!({"test_results": {"coverage_percent": 92.0}}),
            risk_score: None,
            risk_factors: None,
            content_hash: "sha256:0ddba11".to_string(),
        })
        .await
        .unwrap()
        .id
        .into_inner()
}

fn submit_body(evidence_id: Uuid, risk_score: f64) -> Value {
    json!({
        "evidence_package_id": evidence_id,
        "deployment_intent_id": Uuid::new_v4(),
        "risk_score": risk_score,
        "notes": "Rollout of the payments service"
    })
}

#[tokio::test]
async fn unauthenticated_requests_get_401() {
    let app = app();

    for (method, uri) in [
        ("POST", "/cab/submit"),
        ("GET", "/cab/pending"),
        ("GET", "/cab/my-requests"),
        ("GET", "/cab/exceptions/pending"),
    ] {
        let response = app
            .router
            .clone()
            .oneshot(request(method, uri, None, Some(json!({}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
    }

    // Garbage bearer token is also 401.
    let response = app
        .router
        .clone()
        .oneshot(request("GET", "/cab/my-requests", Some("garbage"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn submit_returns_201_with_decision_fields() {
    let app = app();
    let evidence_id = seed_evidence(&app.state).await;
    let submitter = Uuid::new_v4();

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/cab/submit",
            Some(&token(submitter, &[])),
            Some(submit_body(evidence_id, 42.0)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "auto_approved");
    assert_eq!(body["decision_status"], "auto_approved");
    assert!(body["correlation_id"].as_str().unwrap().starts_with("CAB-"));
}

#[tokio::test]
async fn submit_validation_and_not_found() {
    let app = app();
    let evidence_id = seed_evidence(&app.state).await;
    let submitter = Uuid::new_v4();
    let bearer = token(submitter, &[]);

    // Out-of-range risk score: 400.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/cab/submit",
            Some(&bearer),
            Some(submit_body(evidence_id, 140.0)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown evidence package: 404.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/cab/submit",
            Some(&bearer),
            Some(submit_body(Uuid::new_v4(), 42.0)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn approve_flow_and_role_scoping() {
    let app = app();
    let evidence_id = seed_evidence(&app.state).await;
    let submitter = Uuid::new_v4();
    let reviewer = Uuid::new_v4();

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/cab/submit",
            Some(&token(submitter, &[])),
            Some(submit_body(evidence_id, 65.0)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    // A non-reviewer cannot approve.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/cab/{id}/approve"),
            Some(&token(submitter, &[])),
            Some(json!({"rationale": "self-approval attempt"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A CAB reviewer can.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/cab/{id}/approve"),
            Some(&token(reviewer, &["cab_reviewer"])),
            Some(json!({"rationale": "Change record complete", "conditions": ["off-peak"]})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let approved = body_json(response).await;
    assert_eq!(approved["status"], "approved");

    // A second decision is a 400: not in a transitionable state.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/cab/{id}/reject"),
            Some(&token(reviewer, &["cab_reviewer"])),
            Some(json!({"rationale": "too late"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown id is a 404.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/cab/{}/approve", Uuid::new_v4()),
            Some(&token(reviewer, &["cab_reviewer"])),
            Some(json!({})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn request_visibility_is_role_scoped() {
    let app = app();
    let evidence_id = seed_evidence(&app.state).await;
    let submitter = Uuid::new_v4();

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/cab/submit",
            Some(&token(submitter, &[])),
            Some(submit_body(evidence_id, 60.0)),
        ))
        .await
        .unwrap();
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    // The requester sees their own request.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "GET",
            &format!("/cab/{id}"),
            Some(&token(submitter, &[])),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A stranger without the reviewer role gets 403.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "GET",
            &format!("/cab/{id}"),
            Some(&token(Uuid::new_v4(), &[])),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A CAB reviewer sees everything, including the pending queue.
    let reviewer_bearer = token(Uuid::new_v4(), &["cab_reviewer"]);
    let response = app
        .router
        .clone()
        .oneshot(request("GET", &format!("/cab/{id}"), Some(&reviewer_bearer), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(request("GET", "/cab/pending", Some(&reviewer_bearer), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pending = body_json(response).await;
    assert_eq!(pending["total"], 1);

    // The pending queue is reviewer-only.
    let response = app
        .router
        .clone()
        .oneshot(request("GET", "/cab/pending", Some(&token(submitter, &[])), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // my-requests works for any authenticated user.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "GET",
            "/cab/my-requests",
            Some(&token(submitter, &[])),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mine = body_json(response).await;
    assert_eq!(mine["total"], 1);
}

#[tokio::test]
async fn exception_endpoints_enforce_security_reviewer_role() {
    let app = app();
    let requester = Uuid::new_v4();

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/cab/exceptions",
            Some(&token(requester, &[])),
            Some(json!({
                "deployment_intent_id": Uuid::new_v4(),
                "reason": "Emergency kernel patch",
                "risk_justification": "Actively exploited CVE",
                "compensating_controls": ["Phased rollout", "Rollback rehearsed"],
                "expiry_days": 14
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "pending");

    // A CAB reviewer is NOT a security reviewer: 403.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/cab/exceptions/{id}/approve"),
            Some(&token(Uuid::new_v4(), &["cab_reviewer"])),
            Some(json!({"rationale": "fine by me"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A security reviewer approves.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/cab/exceptions/{id}/approve"),
            Some(&token(Uuid::new_v4(), &["security_reviewer"])),
            Some(json!({"rationale": "Controls verified"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let approved = body_json(response).await;
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["is_active"], true);

    // Empty compensating controls: 400.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/cab/exceptions",
            Some(&token(requester, &[])),
            Some(json!({
                "deployment_intent_id": Uuid::new_v4(),
                "reason": "No controls",
                "risk_justification": "None",
                "compensating_controls": []
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Out-of-range expiry: 400.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/cab/exceptions",
            Some(&token(requester, &[])),
            Some(json!({
                "deployment_intent_id": Uuid::new_v4(),
                "reason": "Too long",
                "risk_justification": "n/a",
                "compensating_controls": ["Canary"],
                "expiry_days": 91
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Pending queue visibility: security reviewers only.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "GET",
            "/cab/exceptions/pending",
            Some(&token(requester, &[])),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // my-exceptions for the requester.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "GET",
            "/cab/exceptions/my-exceptions",
            Some(&token(requester, &[])),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mine = body_json(response).await;
    assert_eq!(mine["total"], 1);
}

#[tokio::test]
async fn maturity_endpoints() {
    let app = app();
    let reviewer_bearer = token(Uuid::new_v4(), &["cab_reviewer"]);

    // No active model yet: 404.
    let response = app
        .router
        .clone()
        .oneshot(request("GET", "/cab/maturity/status", Some(&reviewer_bearer), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Evaluation runs without an active model and reports blockers.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/cab/maturity/evaluate",
            Some(&reviewer_bearer),
            Some(json!({
                "current_level": "initial",
                "evaluation_period_weeks": 4,
                "total_deployments": 0
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let evaluation = body_json(response).await;
    assert_eq!(evaluation["ready_to_progress"], false);
    assert!(!evaluation["blocking_criteria"].as_array().unwrap().is_empty());

    // Unknown level: 404; negative period: 400.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/cab/maturity/evaluate",
            Some(&reviewer_bearer),
            Some(json!({"current_level": "ascended", "evaluation_period_weeks": 4})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/cab/maturity/evaluate",
            Some(&reviewer_bearer),
            Some(json!({"current_level": "initial", "evaluation_period_weeks": -2})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Non-reviewers cannot evaluate.
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/cab/maturity/evaluate",
            Some(&token(Uuid::new_v4(), &[])),
            Some(json!({"current_level": "initial", "evaluation_period_weeks": 4})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
