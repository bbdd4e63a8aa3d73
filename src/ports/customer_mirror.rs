//! Customer mirror port.
//!
//! Local copy of gateway customers keyed by external id. Used to resolve the
//! external id of subscriptions whose payload omits it.

use async_trait::async_trait;

use crate::domain::billing::Customer;
use crate::domain::foundation::{DomainError, ExternalId};

#[async_trait]
pub trait CustomerMirror: Send + Sync {
    /// Insert or replace the customer with the same external id.
    async fn upsert(&self, customer: &Customer) -> Result<(), DomainError>;

    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<Customer>, DomainError>;

    /// Lookup by gateway customer id.
    async fn find_by_customer_id(&self, customer_id: &str)
        -> Result<Option<Customer>, DomainError>;
}
