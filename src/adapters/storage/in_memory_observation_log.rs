//! In-Memory Observation Log Adapter
//!
//! Append-only reconciliation records held in memory.
//! Useful for testing and single-process development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::billing::ReconciliationRecord;
use crate::domain::foundation::{DomainError, ExternalId};
use crate::ports::ObservationLog;

/// In-memory observation log
#[derive(Debug, Clone, Default)]
pub struct InMemoryObservationLog {
    records: Arc<RwLock<HashMap<ExternalId, Vec<ReconciliationRecord>>>>,
}

impl InMemoryObservationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all external ids
    pub async fn record_count(&self) -> usize {
        self.records.read().await.values().map(Vec::len).sum()
    }

    /// Every record, grouped by external id in key order
    pub async fn all_records(&self) -> Vec<ReconciliationRecord> {
        let records = self.records.read().await;
        let mut keys: Vec<&ExternalId> = records.keys().collect();
        keys.sort();
        keys.into_iter()
            .flat_map(|k| records[k].iter().cloned())
            .collect()
    }
}

#[async_trait]
impl ObservationLog for InMemoryObservationLog {
    async fn append(&self, record: &ReconciliationRecord) -> Result<(), DomainError> {
        self.records
            .write()
            .await
            .entry(record.external_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn history(
        &self,
        external_id: &ExternalId,
    ) -> Result<Vec<ReconciliationRecord>, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .get(external_id)
            .cloned()
            .unwrap_or_default())
    }
}
