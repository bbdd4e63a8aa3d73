//! PostgreSQL implementation of CustomerMirror.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::billing::Customer;
use crate::domain::foundation::{DomainError, ErrorCode, ExternalId};
use crate::ports::CustomerMirror;

/// PostgreSQL implementation of the CustomerMirror port.
pub struct PostgresCustomerMirror {
    pool: PgPool,
}

impl PostgresCustomerMirror {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    external_id: String,
    customer_id: String,
    email: String,
    name: String,
    rut: Option<String>,
    country: Option<String>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = DomainError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        Ok(Customer {
            customer_id: row.customer_id,
            external_id: ExternalId::new(row.external_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid external_id: {}", e))
            })?,
            email: row.email,
            name: row.name,
            rut: row.rut,
            country: row.country,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT external_id, customer_id, email, name, rut, country FROM billing_customers";

#[async_trait]
impl CustomerMirror for PostgresCustomerMirror {
    async fn upsert(&self, customer: &Customer) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO billing_customers (external_id, customer_id, email, name, rut, country)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (external_id) DO UPDATE SET
                customer_id = EXCLUDED.customer_id,
                email = EXCLUDED.email,
                name = EXCLUDED.name,
                rut = EXCLUDED.rut,
                country = EXCLUDED.country,
                updated_at = NOW()
            "#,
        )
        .bind(customer.external_id.as_str())
        .bind(&customer.customer_id)
        .bind(&customer.email)
        .bind(&customer.name)
        .bind(&customer.rut)
        .bind(&customer.country)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to upsert customer: {}", e)))?;

        Ok(())
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<Customer>, DomainError> {
        let row: Option<CustomerRow> =
            sqlx::query_as(&format!("{} WHERE external_id = $1", SELECT_COLUMNS))
                .bind(external_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find customer: {}", e)))?;

        row.map(Customer::try_from).transpose()
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<Customer>, DomainError> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "{} WHERE customer_id = $1 ORDER BY updated_at DESC LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find customer: {}", e)))?;

        row.map(Customer::try_from).transpose()
    }
}
