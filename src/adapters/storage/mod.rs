//! Storage Adapters
//!
//! In-memory implementations of the storage ports.
//!
//! ## Available Adapters
//!
//! - **InMemoryObservationLog** - Append-only reconciliation records
//! - **InMemoryCustomerMirror** - Gateway customers keyed by external id
//!
//! PostgreSQL implementations live in `adapters::postgres`.

mod in_memory_customer_mirror;
mod in_memory_observation_log;

pub use in_memory_customer_mirror::InMemoryCustomerMirror;
pub use in_memory_observation_log::InMemoryObservationLog;
