//! PostgreSQL implementation of ObservationLog.
//!
//! Append-only: the adapter only ever INSERTs and SELECTs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::billing::{NotificationOutcome, ReconciliationRecord};
use crate::domain::foundation::{DomainError, ErrorCode, ExternalId, PassId, Timestamp};
use crate::ports::ObservationLog;

/// PostgreSQL implementation of the ObservationLog port.
pub struct PostgresObservationLog {
    pool: PgPool,
}

impl PostgresObservationLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a reconciliation record.
#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    pass_id: String,
    external_id: String,
    plan_id: String,
    subscription_id: String,
    status: String,
    morose: bool,
    degraded: bool,
    notification: String,
    observed_at: DateTime<Utc>,
}

impl TryFrom<RecordRow> for ReconciliationRecord {
    type Error = DomainError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let external_id = ExternalId::new(row.external_id).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid external_id: {}", e))
        })?;
        let notification = NotificationOutcome::parse(&row.notification).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid notification: {}", e))
        })?;

        Ok(ReconciliationRecord {
            pass_id: PassId::from_string(row.pass_id),
            external_id,
            plan_id: row.plan_id,
            subscription_id: row.subscription_id,
            status: row.status,
            morose: row.morose,
            degraded: row.degraded,
            notification,
            observed_at: Timestamp::from_datetime(row.observed_at),
        })
    }
}

#[async_trait]
impl ObservationLog for PostgresObservationLog {
    async fn append(&self, record: &ReconciliationRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO reconciliation_records (
                pass_id, external_id, plan_id, subscription_id, status,
                morose, degraded, notification, observed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.pass_id.as_str())
        .bind(record.external_id.as_str())
        .bind(&record.plan_id)
        .bind(&record.subscription_id)
        .bind(&record.status)
        .bind(record.morose)
        .bind(record.degraded)
        .bind(record.notification.as_str())
        .bind(record.observed_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::database(format!("Failed to append reconciliation record: {}", e))
                .with_detail("external_id", record.external_id.as_str())
        })?;

        Ok(())
    }

    async fn history(
        &self,
        external_id: &ExternalId,
    ) -> Result<Vec<ReconciliationRecord>, DomainError> {
        let rows: Vec<RecordRow> = sqlx::query_as(
            r#"
            SELECT pass_id, external_id, plan_id, subscription_id, status,
                   morose, degraded, notification, observed_at
            FROM reconciliation_records
            WHERE external_id = $1
            ORDER BY observed_at ASC, id ASC
            "#,
        )
        .bind(external_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load history: {}", e)))?;

        rows.into_iter().map(ReconciliationRecord::try_from).collect()
    }
}
