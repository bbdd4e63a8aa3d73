//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `flow` - Flow payment gateway client (and a mock for tests)
//! - `membership` - Membership service notifier
//! - `dns` - MX record lookups
//! - `postgres` - PostgreSQL observation log and customer mirror
//! - `storage` - In-memory observation log and customer mirror
//! - `http` - Axum REST API

pub mod dns;
pub mod flow;
pub mod http;
pub mod membership;
pub mod postgres;
pub mod storage;

pub use dns::{HickoryMxResolver, StaticMxResolver};
pub use flow::{FlowConfig, FlowGatewayClient, MockPaymentGateway};
pub use membership::{HttpMembershipNotifier, HttpNotifierConfig, RecordingNotifier};
pub use postgres::{PostgresCustomerMirror, PostgresObservationLog};
pub use storage::{InMemoryCustomerMirror, InMemoryObservationLog};
