//! Mock payment gateway for testing.
//!
//! Provides an in-memory implementation of `PaymentGateway` for unit and
//! integration tests. Supports:
//! - Customers keyed by email, created on demand
//! - Subscriptions whose status and morose flag can be changed between passes
//! - Paged listing honoring `start`/`limit`
//! - Error injection and call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::billing::{
    Customer, NewCustomer, NewSubscription, Plan, Subscription, SubscriptionPage,
    SubscriptionQuery,
};
use crate::ports::{CreatedSubscription, GatewayError, PaymentGateway};

/// Mock payment gateway for testing.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// gateway.add_subscription(subscription);
/// gateway.set_subscription_state("sus_1", "1", true);
/// assert_eq!(gateway.call_count("list_subscriptions"), 3);
/// ```
#[derive(Default)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Customers by email.
    customers: HashMap<String, Customer>,

    /// Subscriptions in creation order.
    subscriptions: Vec<Subscription>,

    plans: HashMap<String, Plan>,

    /// Include `customerExternalId` in listed subscriptions.
    list_external_ids: bool,

    /// Errors by method name (persist until cleared).
    method_errors: HashMap<String, GatewayError>,

    call_log: Vec<MethodCall>,

    sequence: u64,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listed subscriptions carry the customer's external id, as some
    /// gateway endpoints do.
    pub fn with_external_ids_in_listing(self) -> Self {
        self.inner.lock().unwrap().list_external_ids = true;
        self
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Add a customer to the "gateway".
    pub fn add_customer(&self, customer: Customer) {
        self.inner
            .lock()
            .unwrap()
            .customers
            .insert(customer.email.clone(), customer);
    }

    /// Add a subscription to the "gateway".
    pub fn add_subscription(&self, subscription: Subscription) {
        self.inner.lock().unwrap().subscriptions.push(subscription);
    }

    /// Change the status and morose flag of a subscription.
    pub fn set_subscription_state(&self, subscription_id: &str, status: &str, morose: bool) {
        let mut state = self.inner.lock().unwrap();
        if let Some(sub) = state
            .subscriptions
            .iter_mut()
            .find(|s| s.subscription_id == subscription_id)
        {
            sub.status = status.to_string();
            sub.morose = morose;
        }
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: GatewayError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        self.inner.lock().unwrap().method_errors.clear();
    }

    /// Snapshot of all subscriptions.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.inner.lock().unwrap().subscriptions.clone()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    /// Total number of calls to any method.
    pub fn total_calls(&self) -> usize {
        self.inner.lock().unwrap().call_log.len()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Number of list calls for one (plan, status) pair.
    pub fn list_calls_for(&self, plan_id: &str, status: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| {
                c.method == "list_subscriptions" && c.args[0] == plan_id && c.args[1] == status
            })
            .count()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().call_log.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.inner.lock().unwrap().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), GatewayError> {
        let state = self.inner.lock().unwrap();
        match state.method_errors.get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn next_id(state: &mut MockState, prefix: &str) -> String {
        state.sequence += 1;
        format!("{}_mock_{}", prefix, state.sequence)
    }
}

impl Clone for MockPaymentGateway {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, GatewayError> {
        self.record_call(
            "create_customer",
            vec![
                customer.email.as_str().to_string(),
                customer.external_id.to_string(),
            ],
        );
        self.check_error("create_customer")?;

        let mut state = self.inner.lock().unwrap();
        if state.customers.contains_key(customer.email.as_str()) {
            return Err(GatewayError::http(
                "create_customer",
                400,
                "customer with this email already exists",
            ));
        }
        let customer_id = Self::next_id(&mut state, "cus");
        let created = customer.clone().into_customer(customer_id);
        state
            .customers
            .insert(created.email.clone(), created.clone());
        Ok(created)
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, GatewayError> {
        self.record_call("find_customer_by_email", vec![email.to_string()]);
        self.check_error("find_customer_by_email")?;

        Ok(self.inner.lock().unwrap().customers.get(email).cloned())
    }

    async fn create_plan(&self, plan: &Plan) -> Result<Plan, GatewayError> {
        self.record_call("create_plan", vec![plan.plan_id.clone()]);
        self.check_error("create_plan")?;

        let mut state = self.inner.lock().unwrap();
        state.plans.insert(plan.plan_id.clone(), plan.clone());
        Ok(plan.clone())
    }

    async fn create_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> Result<CreatedSubscription, GatewayError> {
        self.record_call(
            "create_subscription",
            vec![
                subscription.customer_id.clone(),
                subscription.plan_id.clone(),
            ],
        );
        self.check_error("create_subscription")?;

        let mut state = self.inner.lock().unwrap();
        let subscription_id = Self::next_id(&mut state, "sus");
        state.subscriptions.push(Subscription {
            subscription_id: subscription_id.clone(),
            customer_id: subscription.customer_id.clone(),
            plan_id: subscription.plan_id.clone(),
            status: "1".to_string(),
            morose: false,
            customer_external_id: None,
        });

        Ok(CreatedSubscription {
            subscription_id,
            customer_id: subscription.customer_id.clone(),
            plan_id: subscription.plan_id.clone(),
            status: "1".to_string(),
            commerce_order: subscription.commerce_order.as_str().to_string(),
        })
    }

    async fn list_subscriptions(
        &self,
        query: &SubscriptionQuery,
    ) -> Result<SubscriptionPage, GatewayError> {
        self.record_call(
            "list_subscriptions",
            vec![
                query.plan_id.clone(),
                query.status.clone(),
                query.start.to_string(),
                query.limit.to_string(),
            ],
        );
        self.check_error("list_subscriptions")?;

        let state = self.inner.lock().unwrap();
        let external_ids: HashMap<&str, String> = state
            .customers
            .values()
            .map(|c| (c.customer_id.as_str(), c.external_id.to_string()))
            .collect();

        let matching: Vec<&Subscription> = state
            .subscriptions
            .iter()
            .filter(|s| s.plan_id == query.plan_id && s.status == query.status)
            .collect();

        let items = matching
            .iter()
            .skip(query.start as usize)
            .take(query.limit as usize)
            .map(|s| {
                let mut listed = (*s).clone();
                if state.list_external_ids && listed.customer_external_id.is_none() {
                    listed.customer_external_id =
                        external_ids.get(listed.customer_id.as_str()).cloned();
                }
                listed
            })
            .collect::<Vec<_>>();

        let end = query.start as usize + items.len();
        Ok(SubscriptionPage {
            total: Some(matching.len() as u64),
            has_more: Some(end < matching.len()),
            items,
        })
    }
}
