//! Application handlers.
//!
//! Command handlers that orchestrate domain operations over the ports.

pub mod billing;

pub use billing::{
    // Commands and results
    CreateCustomerCommand,
    CreateCustomerHandler,
    CreateCustomerResult,
    CreatePlanCommand,
    CreatePlanHandler,
    CreateSubscriptionCommand,
    CreateSubscriptionHandler,
    CreateSubscriptionResult,
    HandleGatewayCallbackCommand,
    HandleGatewayCallbackHandler,
    HandleGatewayCallbackResult,
    ReconcileSubscriptionsCommand,
    ReconcileSubscriptionsHandler,
    // Reconciliation
    PassReport,
    ReconcilerSettings,
    ReconciliationStep,
    // Shared
    EmailDeliverability,
    SubscriptionUrls,
};
