//! Observation log port.
//!
//! Append-only log of reconciliation records. The history of an external id
//! is what makes repeated passes idempotent, so implementations must never
//! update or drop records.

use async_trait::async_trait;

use crate::domain::billing::ReconciliationRecord;
use crate::domain::foundation::{DomainError, ExternalId};

#[async_trait]
pub trait ObservationLog: Send + Sync {
    /// Append one record.
    async fn append(&self, record: &ReconciliationRecord) -> Result<(), DomainError>;

    /// All records for an external id, oldest first.
    async fn history(
        &self,
        external_id: &ExternalId,
    ) -> Result<Vec<ReconciliationRecord>, DomainError>;
}
