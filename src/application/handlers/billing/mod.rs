//! Billing handlers.
//!
//! Command handlers for the gateway integration:
//!
//! ## Commands
//! - Creating customers (behind the email deliverability gate)
//! - Creating subscriptions, creating the customer on demand
//! - Creating plans, once per process
//! - Running a reconciliation pass over subscription listings
//! - Processing signed gateway callbacks
//!
//! Polling passes and callbacks share one `ReconciliationStep`, which owns
//! the per-customer locks.

mod create_customer;
mod create_plan;
mod create_subscription;
mod email_deliverability;
mod handle_gateway_callback;
mod reconcile_subscriptions;
mod reconciliation_step;

// Commands
pub use create_customer::{CreateCustomerCommand, CreateCustomerHandler, CreateCustomerResult};
pub use create_plan::{CreatePlanCommand, CreatePlanHandler, PlanOutcome};
pub use create_subscription::{
    CreateSubscriptionCommand, CreateSubscriptionHandler, CreateSubscriptionResult,
    SubscriptionUrls,
};
pub use handle_gateway_callback::{
    HandleGatewayCallbackCommand, HandleGatewayCallbackHandler, HandleGatewayCallbackResult,
};
pub use reconcile_subscriptions::{
    FailedPage, PassReport, ReconcileSubscriptionsCommand, ReconcileSubscriptionsHandler,
    ReconcilerSettings,
};

// Shared
pub use email_deliverability::EmailDeliverability;
pub use reconciliation_step::{KeyedLocks, Observation, ReconciliationStep};
