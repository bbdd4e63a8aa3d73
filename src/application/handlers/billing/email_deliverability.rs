//! EmailDeliverability - syntax plus MX gate applied before any gateway write.

use std::sync::Arc;

use crate::domain::billing::{BillingError, EmailAddress};
use crate::ports::MxResolver;

/// Checks that an email is well formed and its domain accepts mail.
#[derive(Clone)]
pub struct EmailDeliverability {
    resolver: Arc<dyn MxResolver>,
}

impl EmailDeliverability {
    pub fn new(resolver: Arc<dyn MxResolver>) -> Self {
        Self { resolver }
    }

    /// `false` on any syntax or DNS failure. Never errors.
    pub async fn is_deliverable(&self, raw: &str) -> bool {
        match EmailAddress::parse(raw) {
            Ok(email) => self.resolver.has_mx(email.domain()).await,
            Err(_) => false,
        }
    }

    /// Parses the address and requires an MX record for its domain.
    pub async fn require(&self, raw: &str) -> Result<EmailAddress, BillingError> {
        let email = EmailAddress::parse(raw)?;
        if !self.is_deliverable(email.as_str()).await {
            tracing::info!(domain = email.domain(), "Rejected email without MX records");
            return Err(BillingError::undeliverable_email(email.as_str()));
        }
        Ok(email)
    }
}
