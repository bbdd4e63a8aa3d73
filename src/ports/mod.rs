//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Outbound
//!
//! - `PaymentGateway` - Signed calls to the payment gateway
//! - `MembershipNotifier` - Activate/downgrade membership downstream
//! - `MxResolver` - DNS MX lookups for email deliverability
//!
//! ## Storage
//!
//! - `ObservationLog` - Append-only reconciliation records
//! - `CustomerMirror` - Local copy of gateway customers

mod customer_mirror;
mod membership_notifier;
mod mx_resolver;
mod observation_log;
mod payment_gateway;

pub use customer_mirror::CustomerMirror;
pub use membership_notifier::{MembershipNotifier, NotifierError};
pub use mx_resolver::MxResolver;
pub use observation_log::ObservationLog;
pub use payment_gateway::{CreatedSubscription, GatewayError, GatewayErrorCode, PaymentGateway};
