//! HTTP DTOs (Data Transfer Objects) for billing endpoints.
//!
//! These types define the JSON request/response structure for the billing API.
//! They serve as the boundary between HTTP and the application layer.

use serde::{Deserialize, Serialize};

use crate::application::billing::{
    CreateCustomerCommand, CreatePlanCommand, CreateSubscriptionCommand,
    CreateSubscriptionResult, ReconcileSubscriptionsCommand,
};
use crate::domain::billing::{Customer, Plan, PlanInterval};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create a gateway customer.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCustomerRequest {
    pub email: String,
    pub name: String,
    /// Generated when omitted.
    #[serde(default)]
    pub external_id: Option<String>,
    /// Chilean tax id.
    #[serde(default)]
    pub rut: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl From<CreateCustomerRequest> for CreateCustomerCommand {
    fn from(request: CreateCustomerRequest) -> Self {
        Self {
            email: request.email,
            name: request.name,
            external_id: request.external_id,
            rut: request.rut,
            country: request.country,
        }
    }
}

/// Request to subscribe an email to a plan.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub email: String,
    pub plan_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub commerce_order: Option<String>,
}

impl From<CreateSubscriptionRequest> for CreateSubscriptionCommand {
    fn from(request: CreateSubscriptionRequest) -> Self {
        Self {
            email: request.email,
            plan_id: request.plan_id,
            name: request.name,
            commerce_order: request.commerce_order,
        }
    }
}

/// Request to define a plan.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanRequest {
    pub plan_id: String,
    pub name: String,
    pub amount: i64,
    #[serde(default)]
    pub interval: PlanInterval,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub interval_count: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url_callback: Option<String>,
}

impl From<CreatePlanRequest> for CreatePlanCommand {
    fn from(request: CreatePlanRequest) -> Self {
        Self {
            plan_id: request.plan_id,
            name: request.name,
            amount: request.amount,
            interval: request.interval,
            currency: request.currency,
            interval_count: request.interval_count,
            description: request.description,
            url_callback: request.url_callback,
        }
    }
}

/// Optional overrides for a reconciliation pass.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconcileRequest {
    #[serde(default)]
    pub plans: Option<Vec<String>>,
    #[serde(default)]
    pub status_filters: Option<Vec<String>>,
}

impl From<ReconcileRequest> for ReconcileSubscriptionsCommand {
    fn from(request: ReconcileRequest) -> Self {
        Self {
            plans: request.plans,
            status_filters: request.status_filters,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct CustomerResponse {
    pub customer_id: String,
    pub external_id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rut: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            customer_id: customer.customer_id,
            external_id: customer.external_id.to_string(),
            email: customer.email,
            name: customer.name,
            rut: customer.rut,
            country: customer.country,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub subscription_id: String,
    pub customer_id: String,
    pub external_id: String,
    pub plan_id: String,
    pub status: String,
    pub commerce_order: String,
    /// The customer was created by this request.
    pub customer_created: bool,
}

impl From<CreateSubscriptionResult> for SubscriptionResponse {
    fn from(result: CreateSubscriptionResult) -> Self {
        Self {
            subscription_id: result.subscription.subscription_id,
            customer_id: result.subscription.customer_id,
            external_id: result.customer.external_id.to_string(),
            plan_id: result.subscription.plan_id,
            status: result.subscription.status,
            commerce_order: result.subscription.commerce_order,
            customer_created: result.customer_created,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub plan_id: String,
    pub name: String,
    pub amount: i64,
    pub currency: String,
    pub interval: PlanInterval,
    pub interval_count: u32,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        Self {
            plan_id: plan.plan_id,
            name: plan.name,
            amount: plan.amount,
            currency: plan.currency,
            interval: plan.interval,
            interval_count: plan.interval_count,
        }
    }
}

/// Per-plan entry of a batch creation response.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcomeResponse {
    pub plan_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

/// Standard error response format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ExternalId;

    #[test]
    fn create_customer_request_defaults_optional_fields() {
        let json = r#"{"email": "new@example.com", "name": "Test User"}"#;
        let request: CreateCustomerRequest = serde_json::from_str(json).unwrap();
        let cmd = CreateCustomerCommand::from(request);
        assert_eq!(cmd.email, "new@example.com");
        assert!(cmd.external_id.is_none());
        assert!(cmd.rut.is_none());
    }

    #[test]
    fn create_plan_request_defaults_to_monthly() {
        let json = r#"{"plan_id": "membresia_basica", "name": "Básica", "amount": 9990}"#;
        let request: CreatePlanRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.interval, PlanInterval::Month);
        assert!(request.currency.is_none());
    }

    #[test]
    fn create_plan_request_parses_interval() {
        let json = r#"{"plan_id": "anual", "name": "Anual", "amount": 99900, "interval": "year"}"#;
        let request: CreatePlanRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.interval, PlanInterval::Year);
    }

    #[test]
    fn reconcile_request_accepts_empty_object() {
        let request: ReconcileRequest = serde_json::from_str("{}").unwrap();
        let cmd = ReconcileSubscriptionsCommand::from(request);
        assert!(cmd.plans.is_none());
        assert!(cmd.status_filters.is_none());
    }

    #[test]
    fn customer_response_omits_missing_optionals() {
        let response = CustomerResponse::from(Customer {
            customer_id: "cus_1".to_string(),
            external_id: ExternalId::new("cli-1").unwrap(),
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            rut: None,
            country: None,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["external_id"], "cli-1");
        assert!(json.get("rut").is_none());
    }
}
