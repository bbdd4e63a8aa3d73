//! Billing domain: customers, plans, subscriptions and reconciliation rules.
//!
//! # Module Structure
//!
//! - `customer` - gateway customers
//! - `email` - syntax-validated email addresses
//! - `plan` - plans and billing intervals
//! - `subscription` - observed subscriptions and listing pages
//! - `status` - configurable status classification
//! - `reconciliation` - observation records and the notification decision
//! - `errors` - BillingError

mod customer;
mod email;
mod errors;
mod plan;
mod reconciliation;
mod status;
mod subscription;

pub use customer::{Customer, NewCustomer};
pub use email::EmailAddress;
pub use errors::BillingError;
pub use plan::{Plan, PlanInterval, DEFAULT_CURRENCY};
pub use reconciliation::{decide, decide_for_plan, Decision, NotificationOutcome, ReconciliationRecord};
pub use status::{StatusClass, StatusCodes, SubscriptionState};
pub use subscription::{NewSubscription, Subscription, SubscriptionPage, SubscriptionQuery};
