//! Flow payment gateway client.
//!
//! Implements the `PaymentGateway` port over Flow's REST API. Every request
//! carries `apiKey` and is signed with the configured canonical form.
//! Mutating calls POST a form body, reads use a query string.
//!
//! # Configuration
//!
//! ```ignore
//! let config = FlowConfig::new(api_key, secret_key)
//!     .with_base_url("https://sandbox.flow.cl/api")
//!     .with_timeout(Duration::from_secs(15));
//! let client = FlowGatewayClient::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::domain::billing::{
    Customer, NewCustomer, NewSubscription, Plan, PlanInterval, Subscription, SubscriptionPage,
    SubscriptionQuery,
};
use crate::domain::foundation::ExternalId;
use crate::domain::signing::{CanonicalForm, ParameterSet, Signer};
use crate::ports::{CreatedSubscription, GatewayError, PaymentGateway};

use super::wire_types::{
    as_flag, as_i64, scalar_to_string, FlowCustomer, FlowList, FlowPlan, FlowSubscription,
};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://www.flow.cl/api";

/// Flow client configuration.
#[derive(Clone)]
pub struct FlowConfig {
    api_key: SecretString,
    secret_key: SecretString,
    base_url: String,
    signing_form: CanonicalForm,
    timeout: Duration,
}

impl FlowConfig {
    pub fn new(api_key: SecretString, secret_key: SecretString) -> Self {
        Self {
            api_key,
            secret_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            signing_form: CanonicalForm::default(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Set a custom API base URL (sandbox or tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_signing_form(mut self, form: CanonicalForm) -> Self {
        self.signing_form = form;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for FlowConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowConfig")
            .field("api_key", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("signing_form", &self.signing_form)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Flow gateway client.
pub struct FlowGatewayClient {
    config: FlowConfig,
    signer: Signer,
    http_client: reqwest::Client,
}

impl FlowGatewayClient {
    /// Builds the client. The HTTP timeout applies to every call.
    pub fn new(config: FlowConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::network("client_init", e.to_string()))?;
        let signer = Signer::new(config.secret_key.clone(), config.signing_form);

        Ok(Self {
            config,
            signer,
            http_client,
        })
    }

    fn base_params(&self) -> ParameterSet {
        ParameterSet::new().with("apiKey", self.config.api_key.expose_secret().as_str())
    }

    /// Signs and sends one request.
    async fn send(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        params: ParameterSet,
    ) -> Result<reqwest::Response, GatewayError> {
        let url = format!("{}{}", self.config.base_url, path);
        let pairs = self.signer.sign_params(params).to_pairs();

        tracing::debug!(operation, %method, path, "Calling Flow");

        let request = if method == Method::GET {
            self.http_client.get(&url).query(&pairs)
        } else {
            self.http_client.request(method, &url).form(&pairs)
        };

        request.send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            };
            tracing::error!(operation, error = %message, "Flow request failed");
            GatewayError::network(operation, message)
        })
    }

    /// Maps a non-2xx response to an error and decodes the body otherwise.
    async fn read_json<T: DeserializeOwned>(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(operation, status = status.as_u16(), body = %body, "Flow returned error");
            return Err(GatewayError::http(operation, status.as_u16(), body));
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!(operation, error = %e, "Failed to parse Flow response");
            GatewayError::invalid_response(operation, format!("Failed to parse response: {}", e))
        })
    }

    fn to_customer(
        operation: &'static str,
        flow: FlowCustomer,
        fallback_external_id: Option<&ExternalId>,
    ) -> Result<Customer, GatewayError> {
        let customer_id = flow
            .customer_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GatewayError::invalid_response(operation, "missing customerId"))?;

        let external_id = match flow.external_id.as_deref().map(ExternalId::new) {
            Some(Ok(id)) => id,
            _ => fallback_external_id.cloned().ok_or_else(|| {
                GatewayError::invalid_response(operation, "missing externalId")
            })?,
        };

        Ok(Customer {
            customer_id,
            external_id,
            email: flow.email.unwrap_or_default(),
            name: flow.name.unwrap_or_default(),
            rut: flow.rut,
            country: flow.country,
        })
    }

    fn to_subscription(flow: FlowSubscription, query: &SubscriptionQuery) -> Subscription {
        Subscription {
            subscription_id: flow.subscription_id,
            customer_id: flow.customer_id.unwrap_or_default(),
            plan_id: flow.plan_id.unwrap_or_else(|| query.plan_id.clone()),
            status: flow
                .status
                .as_ref()
                .map(scalar_to_string)
                .unwrap_or_else(|| query.status.clone()),
            morose: flow.morose.as_ref().map(as_flag).unwrap_or(false),
            customer_external_id: flow.customer_external_id.filter(|id| !id.trim().is_empty()),
        }
    }
}

#[async_trait]
impl PaymentGateway for FlowGatewayClient {
    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, GatewayError> {
        const OP: &str = "create_customer";

        let params = self
            .base_params()
            .with("email", customer.email.as_str())
            .with("name", &customer.name)
            .with("externalId", customer.external_id.as_str())
            .with_optional("rut", customer.rut.as_deref())
            .with_optional("country", customer.country.as_deref());

        let response = self.send(OP, Method::POST, "/customer/create", params).await?;
        let flow: FlowCustomer = Self::read_json(OP, response).await?;
        let created = Self::to_customer(OP, flow, Some(&customer.external_id))?;

        tracing::info!(
            customer_id = %created.customer_id,
            external_id = %created.external_id,
            "Flow customer created"
        );
        Ok(created)
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, GatewayError> {
        const OP: &str = "find_customer_by_email";

        let params = self.base_params().with("email", email);
        let response = self.send(OP, Method::GET, "/customer/getByEmail", params).await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(operation = OP, status = status.as_u16(), body = %body, "Flow returned error");
            return Err(GatewayError::http(OP, status.as_u16(), body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::network(OP, e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let flow: Option<FlowCustomer> = serde_json::from_str(&body).map_err(|e| {
            GatewayError::invalid_response(OP, format!("Failed to parse response: {}", e))
        })?;
        match flow {
            Some(flow) if flow.customer_id.as_deref().is_some_and(|id| !id.is_empty()) => {
                // Customers created elsewhere may lack an externalId; key them by customerId.
                let fallback = flow
                    .customer_id
                    .as_deref()
                    .map(ExternalId::new)
                    .transpose()
                    .ok()
                    .flatten();
                Self::to_customer(OP, flow, fallback.as_ref()).map(Some)
            }
            _ => Ok(None),
        }
    }

    async fn create_plan(&self, plan: &Plan) -> Result<Plan, GatewayError> {
        const OP: &str = "create_plan";

        let params = self
            .base_params()
            .with("planId", &plan.plan_id)
            .with("name", &plan.name)
            .with("amount", plan.amount)
            .with("currency", &plan.currency)
            .with("interval", plan.interval.gateway_code())
            .with("interval_count", plan.interval_count)
            .with_optional("description", plan.description.as_deref())
            .with_optional("urlCallback", plan.url_callback.as_deref());

        let response = self.send(OP, Method::POST, "/plans/create", params).await?;
        let flow: FlowPlan = Self::read_json(OP, response).await?;

        tracing::info!(plan_id = %flow.plan_id, "Flow plan created");

        Ok(Plan {
            plan_id: flow.plan_id,
            name: flow.name.unwrap_or_else(|| plan.name.clone()),
            amount: flow.amount.as_ref().and_then(as_i64).unwrap_or(plan.amount),
            currency: flow.currency.unwrap_or_else(|| plan.currency.clone()),
            interval: flow
                .interval
                .as_ref()
                .and_then(as_i64)
                .and_then(PlanInterval::from_gateway_code)
                .unwrap_or(plan.interval),
            interval_count: flow
                .interval_count
                .as_ref()
                .and_then(as_i64)
                .and_then(|c| u32::try_from(c).ok())
                .unwrap_or(plan.interval_count),
            description: plan.description.clone(),
            url_callback: plan.url_callback.clone(),
        })
    }

    async fn create_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> Result<CreatedSubscription, GatewayError> {
        const OP: &str = "create_subscription";

        let params = self
            .base_params()
            .with("customerId", &subscription.customer_id)
            .with("planId", &subscription.plan_id)
            .with("commerceOrder", subscription.commerce_order.as_str())
            .with("urlSuccess", &subscription.url_success)
            .with("urlFailure", &subscription.url_failure)
            .with_optional("urlCallback", subscription.url_callback.as_deref());

        let response = self.send(OP, Method::POST, "/subscription/create", params).await?;
        let flow: FlowSubscription = Self::read_json(OP, response).await?;

        tracing::info!(
            subscription_id = %flow.subscription_id,
            customer_id = %subscription.customer_id,
            plan_id = %subscription.plan_id,
            "Flow subscription created"
        );

        Ok(CreatedSubscription {
            subscription_id: flow.subscription_id,
            customer_id: flow
                .customer_id
                .unwrap_or_else(|| subscription.customer_id.clone()),
            plan_id: flow.plan_id.unwrap_or_else(|| subscription.plan_id.clone()),
            status: flow.status.as_ref().map(scalar_to_string).unwrap_or_default(),
            commerce_order: subscription.commerce_order.as_str().to_string(),
        })
    }

    async fn list_subscriptions(
        &self,
        query: &SubscriptionQuery,
    ) -> Result<SubscriptionPage, GatewayError> {
        const OP: &str = "list_subscriptions";

        let params = self
            .base_params()
            .with("planId", &query.plan_id)
            .with("status", &query.status)
            .with("start", query.start)
            .with("limit", query.limit);

        let response = self.send(OP, Method::GET, "/subscription/list", params).await?;
        let list: FlowList = Self::read_json(OP, response).await?;
        let items: Vec<FlowSubscription> = list.items().map_err(|e| {
            GatewayError::invalid_response(OP, format!("Invalid subscription list: {}", e))
        })?;

        tracing::debug!(
            plan_id = %query.plan_id,
            status = %query.status,
            start = query.start,
            returned = items.len(),
            "Fetched subscription page"
        );

        Ok(SubscriptionPage {
            items: items
                .into_iter()
                .map(|flow| Self::to_subscription(flow, query))
                .collect(),
            total: list.total(),
            has_more: list.has_more(),
        })
    }
}
