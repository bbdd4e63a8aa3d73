//! PostgreSQL adapters.
//!
//! Schema lives in `migrations/` and is applied at startup when
//! `database.run_migrations` is set.

mod customer_mirror;
mod observation_log;

pub use customer_mirror::PostgresCustomerMirror;
pub use observation_log::PostgresObservationLog;
