//! CreateCustomerHandler - Command handler for registering a customer at the gateway.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Customer, NewCustomer};
use crate::ports::{CustomerMirror, PaymentGateway};

use super::EmailDeliverability;

/// Command to create a gateway customer.
#[derive(Debug, Clone)]
pub struct CreateCustomerCommand {
    pub email: String,
    pub name: String,
    /// Commerce-side id. Generated as `cli-<uuid>` when absent.
    pub external_id: Option<String>,
    pub rut: Option<String>,
    pub country: Option<String>,
}

impl CreateCustomerCommand {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            external_id: None,
            rut: None,
            country: None,
        }
    }
}

/// Result of customer creation.
#[derive(Debug, Clone)]
pub struct CreateCustomerResult {
    pub customer: Customer,
}

/// Handler for creating customers.
///
/// The email must pass the deliverability gate before the gateway is called.
/// The created customer is mirrored locally so subscriptions listed without an
/// external id can be resolved later.
#[derive(Clone)]
pub struct CreateCustomerHandler {
    gateway: Arc<dyn PaymentGateway>,
    mirror: Arc<dyn CustomerMirror>,
    deliverability: EmailDeliverability,
}

impl CreateCustomerHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        mirror: Arc<dyn CustomerMirror>,
        deliverability: EmailDeliverability,
    ) -> Self {
        Self {
            gateway,
            mirror,
            deliverability,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCustomerCommand,
    ) -> Result<CreateCustomerResult, BillingError> {
        // 1. Validate input
        let request = NewCustomer::new(&cmd.email, &cmd.name, cmd.external_id.as_deref())?
            .with_rut(cmd.rut)
            .with_country(cmd.country);

        // 2. Deliverability gate
        self.deliverability.require(request.email.as_str()).await?;

        // 3. Create at the gateway
        let customer = self.create_checked(&request).await?;

        Ok(CreateCustomerResult { customer })
    }

    /// Creates an already validated customer and mirrors it.
    pub(crate) async fn create_checked(
        &self,
        request: &NewCustomer,
    ) -> Result<Customer, BillingError> {
        let customer = self.gateway.create_customer(request).await.map_err(|e| {
            tracing::warn!(error = %e, "Gateway rejected customer creation");
            BillingError::from(e)
        })?;

        tracing::info!(
            customer_id = %customer.customer_id,
            external_id = %customer.external_id,
            "Customer created"
        );

        mirror_customer(self.mirror.as_ref(), &customer).await;
        Ok(customer)
    }
}

/// Mirror failures are logged only; the gateway remains the source of truth.
pub(crate) async fn mirror_customer(mirror: &dyn CustomerMirror, customer: &Customer) {
    if let Err(e) = mirror.upsert(customer).await {
        tracing::warn!(
            external_id = %customer.external_id,
            error = %e,
            "Failed to mirror customer"
        );
    }
}
