//! In-Memory Customer Mirror Adapter
//!
//! Local copy of gateway customers held in memory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::billing::Customer;
use crate::domain::foundation::{DomainError, ExternalId};
use crate::ports::CustomerMirror;

/// In-memory customer mirror keyed by external id
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerMirror {
    customers: Arc<RwLock<HashMap<ExternalId, Customer>>>,
}

impl InMemoryCustomerMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn customer_count(&self) -> usize {
        self.customers.read().await.len()
    }
}

#[async_trait]
impl CustomerMirror for InMemoryCustomerMirror {
    async fn upsert(&self, customer: &Customer) -> Result<(), DomainError> {
        self.customers
            .write()
            .await
            .insert(customer.external_id.clone(), customer.clone());
        Ok(())
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<Customer>, DomainError> {
        Ok(self.customers.read().await.get(external_id).cloned())
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<Customer>, DomainError> {
        Ok(self
            .customers
            .read()
            .await
            .values()
            .find(|c| c.customer_id == customer_id)
            .cloned())
    }
}
