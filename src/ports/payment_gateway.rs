//! Payment gateway port.
//!
//! Typed operations against the payment gateway. Implementations sign every
//! request and perform one transport call per operation. No retries happen
//! at this layer; a failed call is reported and the caller decides.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::{
    BillingError, Customer, NewCustomer, NewSubscription, Plan, SubscriptionPage,
    SubscriptionQuery,
};

/// Port for the payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a customer. The gateway assigns the customer id.
    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, GatewayError>;

    /// Look a customer up by email. `Ok(None)` when the gateway knows none.
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, GatewayError>;

    /// Create a plan. Not idempotent at the gateway.
    async fn create_plan(&self, plan: &Plan) -> Result<Plan, GatewayError>;

    /// Subscribe a customer to a plan.
    async fn create_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> Result<CreatedSubscription, GatewayError>;

    /// Fetch one page of subscriptions for a (plan, status) pair.
    async fn list_subscriptions(
        &self,
        query: &SubscriptionQuery,
    ) -> Result<SubscriptionPage, GatewayError>;
}

/// Gateway response to a subscription creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedSubscription {
    pub subscription_id: String,
    pub customer_id: String,
    pub plan_id: String,
    pub status: String,
    pub commerce_order: String,
}

/// Errors from gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayError {
    /// Error category.
    pub code: GatewayErrorCode,

    /// Operation that failed, e.g. `create_customer`.
    pub operation: String,

    /// HTTP status, when the gateway answered.
    pub status: Option<u16>,

    /// Human-readable message or response body.
    pub message: String,
}

impl GatewayError {
    pub fn new(
        code: GatewayErrorCode,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            operation: operation.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Transport failure (connect, TLS, timeout).
    pub fn network(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Network, operation, message)
    }

    /// Non-2xx response.
    pub fn http(operation: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        let code = if status == 401 || status == 403 {
            GatewayErrorCode::Authentication
        } else {
            GatewayErrorCode::Rejected
        };
        Self {
            status: Some(status),
            ..Self::new(code, operation, body)
        }
    }

    /// Response body could not be understood.
    pub fn invalid_response(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidResponse, operation, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(
                f,
                "{} {} (HTTP {}): {}",
                self.operation, self.code, status, self.message
            ),
            None => write!(f, "{} {}: {}", self.operation, self.code, self.message),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for BillingError {
    fn from(err: GatewayError) -> Self {
        BillingError::gateway(err.operation, err.status, err.message)
    }
}

/// Gateway error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    Network,
    Authentication,
    Rejected,
    InvalidResponse,
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::Network => "network_error",
            GatewayErrorCode::Authentication => "authentication_error",
            GatewayErrorCode::Rejected => "rejected",
            GatewayErrorCode::InvalidResponse => "invalid_response",
        };
        write!(f, "{}", s)
    }
}
