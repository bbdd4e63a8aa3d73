//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_customer, create_plan, create_plans, create_subscription, handle_flow_callback, health,
    reconcile, BillingAppState,
};

/// Create the billing API router.
///
/// # Routes
/// - `POST /customers` - Create a gateway customer
/// - `POST /subscriptions` - Subscribe an email to a plan
/// - `POST /plans` - Define a plan
/// - `POST /plans/batch` - Define several plans, one outcome each
/// - `POST /reconcile` - Run one reconciliation pass
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/customers", post(create_customer))
        .route("/subscriptions", post(create_subscription))
        .route("/plans", post(create_plan))
        .route("/plans/batch", post(create_plans))
        .route("/reconcile", post(reconcile))
}

/// Create the gateway callback router.
///
/// Separate from the API routes because callbacks are authenticated by
/// their signature.
///
/// # Routes
/// - `POST /flow` - Handle Flow callbacks
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/flow", post(handle_flow_callback))
}

/// Create the complete billing router, mounted at the application root.
///
/// # Example
///
/// ```ignore
/// let app = billing_router().with_state(BillingAppState::new(ports, settings));
/// ```
pub fn billing_router() -> Router<BillingAppState> {
    Router::new()
        .route("/health", get(health))
        .nest(
            "/api",
            billing_routes().nest("/webhooks", webhook_routes()),
        )
}
