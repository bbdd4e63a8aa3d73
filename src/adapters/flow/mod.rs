//! Flow payment gateway adapter.
//!
//! Implements the `PaymentGateway` port for Flow (https://www.flow.cl):
//! - Customer creation and lookup by email
//! - Plan creation
//! - Subscription creation and paged listing
//!
//! # Security
//!
//! - Every request is signed with HMAC-SHA256 over the canonical parameters
//! - API and secret keys are held in `secrecy::SecretString`

mod flow_client;
mod mock_gateway;
mod wire_types;

pub use flow_client::{FlowConfig, FlowGatewayClient, DEFAULT_BASE_URL};
pub use mock_gateway::{MethodCall, MockPaymentGateway};
pub use wire_types::{FlowCustomer, FlowList, FlowPlan, FlowSubscription};
