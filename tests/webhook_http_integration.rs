//! Integration tests for the billing HTTP surface.
//!
//! These tests drive the full router with `tower::ServiceExt::oneshot`:
//! 1. Signed callbacks are accepted as form or JSON bodies
//! 2. Unsigned or tampered callbacks are rejected with 401
//! 3. Validation and deliverability failures map to 400

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use flow_membership::adapters::http::{billing_router, BillingAppState, BillingPorts, BillingSettings};
use flow_membership::adapters::{
    InMemoryCustomerMirror, InMemoryObservationLog, MockPaymentGateway, RecordingNotifier,
    StaticMxResolver,
};
use flow_membership::application::billing::{ReconcilerSettings, SubscriptionUrls};
use flow_membership::domain::billing::StatusCodes;
use flow_membership::domain::signing::{CanonicalForm, ParameterSet, Signer};

const CALLBACK_SECRET: &str = "callback-secret";

// =============================================================================
// Test Infrastructure
// =============================================================================

fn signer() -> Signer {
    Signer::new(
        SecretString::new(CALLBACK_SECRET.to_string()),
        CanonicalForm::Concatenated,
    )
}

struct TestApp {
    router: Router,
    gateway: MockPaymentGateway,
    notifier: RecordingNotifier,
}

fn app() -> TestApp {
    let gateway = MockPaymentGateway::new();
    let notifier = RecordingNotifier::new();

    let ports = BillingPorts {
        gateway: Arc::new(gateway.clone()),
        mirror: Arc::new(InMemoryCustomerMirror::new()),
        observation_log: Arc::new(InMemoryObservationLog::new()),
        notifier: Arc::new(notifier.clone()),
        mx_resolver: Arc::new(StaticMxResolver::with_domains(["example.com"])),
    };
    let settings = BillingSettings {
        subscription_urls: SubscriptionUrls {
            success: "https://shop.example.com/ok".to_string(),
            failure: "https://shop.example.com/fail".to_string(),
            callback: Some("https://shop.example.com/api/webhooks/flow".to_string()),
        },
        reconciler: ReconcilerSettings {
            plans: vec!["membresia_basica".to_string()],
            status_filters: vec!["1".to_string(), "4".to_string()],
            page_size: 100,
            max_concurrency: 2,
        },
        status_codes: StatusCodes::new(["1", "2"], ["4"]),
        notifier_timeout: Duration::from_secs(1),
        callback_verifier: Some(signer()),
    };

    TestApp {
        router: billing_router().with_state(BillingAppState::new(ports, settings)),
        gateway,
        notifier,
    }
}

fn canceled_callback() -> ParameterSet {
    ParameterSet::new()
        .with("subscriptionId", "sus_1")
        .with("customerId", "cus_1")
        .with("planId", "membresia_basica")
        .with("status", "4")
        .with("customerExternalId", "cli-1")
}

/// Values used here need no percent-encoding.
fn form_body(params: &ParameterSet) -> String {
    params
        .to_pairs()
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn form_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_returns_ok() {
    let app = app();
    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

// =============================================================================
// Callbacks
// =============================================================================

#[tokio::test]
async fn signed_form_callback_downgrades() {
    let app = app();
    let params = signer().sign_params(canceled_callback());

    let response = app
        .router
        .oneshot(form_request("/api/webhooks/flow", form_body(&params)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["observation"]["notification"], "downgrade_sent");
    assert_eq!(app.notifier.downgrades_for("cli-1"), 1);
}

#[tokio::test]
async fn signed_json_callback_is_accepted() {
    let app = app();
    let params = signer().sign_params(canceled_callback());
    let body: serde_json::Map<String, Value> = params
        .to_pairs()
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();

    let response = app
        .router
        .oneshot(json_request("/api/webhooks/flow", Value::Object(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.notifier.downgrades_for("cli-1"), 1);
}

#[tokio::test]
async fn unsigned_callback_is_rejected() {
    let app = app();

    let response = app
        .router
        .oneshot(form_request(
            "/api/webhooks/flow",
            form_body(&canceled_callback()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "INVALID_SIGNATURE");
    assert!(app.notifier.calls().is_empty());
}

#[tokio::test]
async fn tampered_callback_is_rejected() {
    let app = app();
    let mut params = signer().sign_params(canceled_callback());
    params.insert("status", "1");

    let response = app
        .router
        .oneshot(form_request("/api/webhooks/flow", form_body(&params)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.notifier.calls().is_empty());
}

#[tokio::test]
async fn callback_without_status_is_bad_request() {
    let app = app();
    let params = signer().sign_params(
        ParameterSet::new()
            .with("subscriptionId", "sus_1")
            .with("customerExternalId", "cli-1"),
    );

    let response = app
        .router
        .oneshot(form_request("/api/webhooks/flow", form_body(&params)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// API endpoints
// =============================================================================

#[tokio::test]
async fn create_subscription_returns_created() {
    let app = app();

    let response = app
        .router
        .oneshot(json_request(
            "/api/subscriptions",
            json!({ "email": "new@example.com", "plan_id": "membresia_basica", "name": "Test User" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(app.gateway.call_count("create_subscription"), 1);
}

#[tokio::test]
async fn plan_batch_reports_each_outcome() {
    let app = app();
    let plan = json!({ "plan_id": "membresia_basica", "name": "Membresía Básica", "amount": 9990, "interval": "month" });

    let response = app
        .router
        .oneshot(json_request(
            "/api/plans/batch",
            json!([
                plan,
                plan,
                { "plan_id": "membresia_cero", "name": "Gratis", "amount": 0, "interval": "month" }
            ]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body[0]["plan"]["plan_id"], "membresia_basica");
    assert!(body[0].get("error").is_none());
    assert_eq!(body[1]["error"]["error_code"], "PLAN_ALREADY_CREATED");
    assert_eq!(body[2]["plan_id"], "membresia_cero");
    assert_eq!(body[2]["error"]["error_code"], "VALIDATION_FAILED");
    assert_eq!(app.gateway.call_count("create_plan"), 1);
}

#[tokio::test]
async fn undeliverable_email_is_bad_request() {
    let app = app();

    let response = app
        .router
        .oneshot(json_request(
            "/api/customers",
            json!({ "email": "someone@no-mx.invalid", "name": "Test User" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "UNDELIVERABLE_EMAIL");
    assert_eq!(app.gateway.total_calls(), 0);
}

#[tokio::test]
async fn reconcile_without_body_uses_configured_plans() {
    let app = app();

    let response = app
        .router
        .oneshot(
            Request::post("/api/reconcile")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["examined"], 0);
    assert_eq!(body["list_calls"], 2);
    assert_eq!(app.gateway.list_calls_for("membresia_basica", "4"), 1);
}
