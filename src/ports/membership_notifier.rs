//! Membership notifier port.
//!
//! The downstream membership system grants or revokes access based on payment
//! state. Calls are at-least-once; receivers are expected to be idempotent.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::ExternalId;

/// Port for membership-level transitions.
#[async_trait]
pub trait MembershipNotifier: Send + Sync {
    /// Restore full membership for a customer.
    async fn activate(
        &self,
        external_id: &ExternalId,
        email: Option<&str>,
        plan_id: &str,
    ) -> Result<(), NotifierError>;

    /// Downgrade a customer's membership after a payment failure.
    async fn downgrade(&self, external_id: &ExternalId) -> Result<(), NotifierError>;
}

/// Downstream notification failures. Never propagated to HTTP callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifierError {
    #[error("membership endpoint unreachable: {0}")]
    Transport(String),

    #[error("membership endpoint timed out")]
    Timeout,

    #[error("membership endpoint returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}
