//! HTTP handlers for billing endpoints.
//!
//! These handlers connect Axum routes to application layer command handlers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{FromRequest, Json, Request, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Form;

use crate::application::billing::{
    CreateCustomerHandler, CreatePlanCommand, CreatePlanHandler, CreateSubscriptionHandler, EmailDeliverability,
    HandleGatewayCallbackCommand, HandleGatewayCallbackHandler, ReconcileSubscriptionsCommand,
    ReconcileSubscriptionsHandler, ReconcilerSettings, ReconciliationStep, SubscriptionUrls,
};
use crate::domain::billing::{BillingError, StatusCodes};
use crate::domain::signing::{ParameterSet, Signer};
use crate::ports::{CustomerMirror, MembershipNotifier, MxResolver, ObservationLog, PaymentGateway};

use super::dto::{
    CreateCustomerRequest, CreatePlanRequest, CreateSubscriptionRequest, CustomerResponse,
    ErrorResponse, PlanOutcomeResponse, PlanResponse, ReconcileRequest, SubscriptionResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Port implementations the billing handlers run on.
#[derive(Clone)]
pub struct BillingPorts {
    pub gateway: Arc<dyn PaymentGateway>,
    pub mirror: Arc<dyn CustomerMirror>,
    pub observation_log: Arc<dyn ObservationLog>,
    pub notifier: Arc<dyn MembershipNotifier>,
    pub mx_resolver: Arc<dyn MxResolver>,
}

/// Settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct BillingSettings {
    pub subscription_urls: SubscriptionUrls,
    pub reconciler: ReconcilerSettings,
    pub status_codes: StatusCodes,
    pub notifier_timeout: Duration,
    /// `None` disables callback signature checks.
    pub callback_verifier: Option<Signer>,
}

/// Shared application state.
///
/// Handlers are built once: the plan handler remembers created plans and the
/// reconciliation step owns the per-customer locks, so both must outlive a
/// single request.
#[derive(Clone)]
pub struct BillingAppState {
    pub create_customer: Arc<CreateCustomerHandler>,
    pub create_subscription: Arc<CreateSubscriptionHandler>,
    pub create_plan: Arc<CreatePlanHandler>,
    pub reconcile: Arc<ReconcileSubscriptionsHandler>,
    pub gateway_callback: Arc<HandleGatewayCallbackHandler>,
}

impl BillingAppState {
    pub fn new(ports: BillingPorts, settings: BillingSettings) -> Self {
        let deliverability = EmailDeliverability::new(ports.mx_resolver.clone());
        let step = Arc::new(ReconciliationStep::new(
            ports.observation_log.clone(),
            ports.mirror.clone(),
            ports.notifier.clone(),
            settings.status_codes,
            settings.notifier_timeout,
        ));

        Self {
            create_customer: Arc::new(CreateCustomerHandler::new(
                ports.gateway.clone(),
                ports.mirror.clone(),
                deliverability.clone(),
            )),
            create_subscription: Arc::new(CreateSubscriptionHandler::new(
                ports.gateway.clone(),
                ports.mirror.clone(),
                deliverability,
                settings.subscription_urls,
            )),
            create_plan: Arc::new(CreatePlanHandler::new(ports.gateway.clone())),
            reconcile: Arc::new(ReconcileSubscriptionsHandler::new(
                ports.gateway,
                step.clone(),
                settings.reconciler,
            )),
            gateway_callback: Arc::new(HandleGatewayCallbackHandler::new(
                settings.callback_verifier,
                step,
            )),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/customers - Create a gateway customer
pub async fn create_customer(
    State(state): State<BillingAppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state.create_customer.handle(request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(CustomerResponse::from(result.customer)),
    ))
}

/// POST /api/subscriptions - Subscribe an email to a plan
pub async fn create_subscription(
    State(state): State<BillingAppState>,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state.create_subscription.handle(request.into()).await?;
    Ok((StatusCode::CREATED, Json(SubscriptionResponse::from(result))))
}

/// POST /api/plans - Define a plan at the gateway
pub async fn create_plan(
    State(state): State<BillingAppState>,
    Json(request): Json<CreatePlanRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let plan = state.create_plan.handle(request.into()).await?;
    Ok((StatusCode::CREATED, Json(PlanResponse::from(plan))))
}

/// POST /api/plans/batch - Define several plans
///
/// Always answers 200; each entry carries either the plan or its error.
pub async fn create_plans(
    State(state): State<BillingAppState>,
    Json(requests): Json<Vec<CreatePlanRequest>>,
) -> Json<Vec<PlanOutcomeResponse>> {
    let commands = requests.into_iter().map(CreatePlanCommand::from).collect();
    let outcomes = state.create_plan.create_plans(commands).await;

    let body = outcomes
        .into_iter()
        .map(|outcome| match outcome.result {
            Ok(plan) => PlanOutcomeResponse {
                plan_id: outcome.plan_id,
                plan: Some(PlanResponse::from(plan)),
                error: None,
            },
            Err(err) => PlanOutcomeResponse {
                plan_id: outcome.plan_id,
                plan: None,
                error: Some(ErrorResponse::new(error_status(&err).1, err.message())),
            },
        })
        .collect();
    Json(body)
}

/// POST /api/reconcile - Run one reconciliation pass
///
/// The body is optional; without it the configured plans and statuses are used.
pub async fn reconcile(
    State(state): State<BillingAppState>,
    request: Option<Json<ReconcileRequest>>,
) -> Result<impl IntoResponse, BillingApiError> {
    let cmd = request
        .map(|Json(r)| ReconcileSubscriptionsCommand::from(r))
        .unwrap_or_default();
    let handler = state.reconcile.clone();
    let report = detached(async move { handler.handle(cmd).await }).await?;
    Ok(Json(report))
}

/// POST /api/webhooks/flow - Handle a gateway callback
///
/// Accepts a form-encoded or JSON body with flat scalar values.
pub async fn handle_flow_callback(
    State(state): State<BillingAppState>,
    request: Request,
) -> Result<impl IntoResponse, BillingApiError> {
    let params = callback_params(request).await?;
    let handler = state.gateway_callback.clone();
    let result =
        detached(async move { handler.handle(HandleGatewayCallbackCommand { params }).await })
            .await?;
    Ok(Json(result))
}

/// GET /health - Liveness probe
pub async fn health() -> &'static str {
    "ok"
}

/// Runs `work` on its own task. A request timeout or client disconnect drops
/// only the wait, so a sent notification is always followed by its record.
async fn detached<T, F>(work: F) -> Result<T, BillingError>
where
    F: Future<Output = Result<T, BillingError>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(work)
        .await
        .map_err(|e| BillingError::infrastructure(format!("request task failed: {}", e)))?
}

async fn callback_params(request: Request) -> Result<ParameterSet, BillingError> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);

    if is_json {
        let Json(value) = Json::<serde_json::Value>::from_request(request, &())
            .await
            .map_err(|e| BillingError::validation("body", e.body_text()))?;
        Ok(ParameterSet::from_json_object(&value)?)
    } else {
        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(request, &())
            .await
            .map_err(|e| BillingError::validation("body", e.body_text()))?;
        Ok(ParameterSet::from_pairs(pairs))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
#[derive(Debug)]
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

fn error_status(err: &BillingError) -> (StatusCode, &'static str) {
    match err {
        BillingError::ValidationFailed { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
        BillingError::UndeliverableEmail(_) => (StatusCode::BAD_REQUEST, "UNDELIVERABLE_EMAIL"),
        BillingError::InvalidSignature(_) => (StatusCode::UNAUTHORIZED, "INVALID_SIGNATURE"),
        BillingError::PlanAlreadyCreated(_) => (StatusCode::CONFLICT, "PLAN_ALREADY_CREATED"),
        BillingError::Gateway { .. } => (StatusCode::BAD_GATEWAY, "GATEWAY_ERROR"),
        BillingError::Infrastructure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code) = error_status(&self.0);
        let body = ErrorResponse::new(error_code, self.0.message());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signing::SignatureError;

    fn status_of(err: BillingError) -> StatusCode {
        BillingApiError::from(err).into_response().status()
    }

    #[test]
    fn errors_map_to_statuses() {
        assert_eq!(
            status_of(BillingError::validation("email", "bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(BillingError::undeliverable_email("a@no-mx.example")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(BillingError::invalid_signature(SignatureError::Mismatch)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(BillingError::plan_already_created("p")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(BillingError::gateway("create_plan", Some(500), "boom")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(BillingError::infrastructure("db down")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn detached_work_finishes_after_caller_gives_up() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let work = detached(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            Ok::<_, BillingError>(())
        });

        let waited = tokio::time::timeout(Duration::from_millis(5), work).await;
        assert!(waited.is_err());
        assert!(!finished.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn detached_panic_becomes_infrastructure_error() {
        let result = detached(async {
            if true {
                panic!("boom");
            }
            Ok::<(), BillingError>(())
        })
        .await;

        assert!(matches!(result, Err(BillingError::Infrastructure(_))));
    }

    #[tokio::test]
    async fn form_body_becomes_text_params() {
        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(axum::body::Body::from("status=4&subscriptionId=sus_1"))
            .unwrap();

        let params = callback_params(request).await.unwrap();

        assert_eq!(params.get_text("status").as_deref(), Some("4"));
        assert_eq!(params.get_text("subscriptionId").as_deref(), Some("sus_1"));
    }

    #[tokio::test]
    async fn json_body_keeps_integers() {
        let request = Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(r#"{"status": 4, "morose": null}"#))
            .unwrap();

        let params = callback_params(request).await.unwrap();

        assert_eq!(
            params.get("status"),
            Some(&crate::domain::signing::ParamValue::Integer(4))
        );
        assert!(params.get("morose").is_none());
    }

    #[tokio::test]
    async fn nested_json_is_rejected() {
        let request = Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(r#"{"data": {"status": 4}}"#))
            .unwrap();

        assert!(matches!(
            callback_params(request).await,
            Err(BillingError::ValidationFailed { .. })
        ));
    }
}
