//! HTTP adapter for billing endpoints.
//!
//! Exposes the billing application layer via REST API:
//! - `POST /api/customers` - Create a gateway customer
//! - `POST /api/subscriptions` - Subscribe an email to a plan
//! - `POST /api/plans` - Define a plan
//! - `POST /api/reconcile` - Run one reconciliation pass
//! - `POST /api/webhooks/flow` - Handle signed gateway callbacks
//! - `GET /health` - Liveness probe

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{BillingApiError, BillingAppState, BillingPorts, BillingSettings};
pub use routes::{billing_router, billing_routes, webhook_routes};
