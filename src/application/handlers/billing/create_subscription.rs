//! CreateSubscriptionHandler - Command handler for subscribing an email to a plan.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Customer, NewCustomer, NewSubscription};
use crate::domain::foundation::CommerceOrder;
use crate::ports::{CreatedSubscription, CustomerMirror, PaymentGateway};

use super::create_customer::mirror_customer;
use super::{CreateCustomerHandler, EmailDeliverability};

/// Redirect and notification URLs sent with every subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionUrls {
    pub success: String,
    pub failure: String,
    pub callback: Option<String>,
}

/// Command to subscribe a customer (by email) to a plan.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionCommand {
    pub email: String,
    pub plan_id: String,
    /// Used only when the customer has to be created. Defaults to the
    /// email's local part.
    pub name: Option<String>,
    /// Caller-supplied commerce order. Generated when absent.
    pub commerce_order: Option<String>,
}

/// Result of subscription creation.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionResult {
    pub subscription: CreatedSubscription,
    pub customer: Customer,
    /// The customer did not exist at the gateway and was created.
    pub customer_created: bool,
}

/// Handler for creating subscriptions.
///
/// Finds the gateway customer by email, creating it when missing, then
/// subscribes it to the plan.
pub struct CreateSubscriptionHandler {
    gateway: Arc<dyn PaymentGateway>,
    mirror: Arc<dyn CustomerMirror>,
    customers: CreateCustomerHandler,
    deliverability: EmailDeliverability,
    urls: SubscriptionUrls,
}

impl CreateSubscriptionHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        mirror: Arc<dyn CustomerMirror>,
        deliverability: EmailDeliverability,
        urls: SubscriptionUrls,
    ) -> Self {
        let customers =
            CreateCustomerHandler::new(gateway.clone(), mirror.clone(), deliverability.clone());
        Self {
            gateway,
            mirror,
            customers,
            deliverability,
            urls,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateSubscriptionCommand,
    ) -> Result<CreateSubscriptionResult, BillingError> {
        // 1. Validate input before any gateway traffic
        let plan_id = cmd.plan_id.trim().to_string();
        if plan_id.is_empty() {
            return Err(BillingError::validation("plan_id", "must not be empty"));
        }
        let commerce_order = match cmd.commerce_order.as_deref().map(str::trim) {
            Some(order) if !order.is_empty() => CommerceOrder::new(order)?,
            _ => CommerceOrder::generate(),
        };
        let email = self.deliverability.require(&cmd.email).await?;

        // 2. Find or create the customer
        let (customer, customer_created) =
            match self.gateway.find_customer_by_email(email.as_str()).await? {
                Some(existing) => {
                    mirror_customer(self.mirror.as_ref(), &existing).await;
                    (existing, false)
                }
                None => {
                    let name = cmd
                        .name
                        .as_deref()
                        .map(str::trim)
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(|| local_part(email.as_str()));
                    let request = NewCustomer::new(email.as_str(), name, None)?;
                    (self.customers.create_checked(&request).await?, true)
                }
            };

        // 3. Subscribe
        let request = NewSubscription::new(
            customer.customer_id.as_str(),
            plan_id,
            commerce_order,
            self.urls.success.as_str(),
            self.urls.failure.as_str(),
        )?
        .with_url_callback(self.urls.callback.clone());

        let subscription = self.gateway.create_subscription(&request).await?;

        tracing::info!(
            subscription_id = %subscription.subscription_id,
            customer_id = %customer.customer_id,
            plan_id = %subscription.plan_id,
            commerce_order = %subscription.commerce_order,
            customer_created,
            "Subscription created"
        );

        Ok(CreateSubscriptionResult {
            subscription,
            customer,
            customer_created,
        })
    }
}

fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
