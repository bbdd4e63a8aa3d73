//! Email address value object (syntax only).
//!
//! Deliverability (MX lookup) is checked separately before any gateway
//! write; see `application::handlers::billing::EmailDeliverability`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Syntactically valid email address with a lowercased domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses and validates an address (RFC 5322 syntax, dotted domain).
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("email"));
        }
        if !email_address::EmailAddress::is_valid(trimmed) {
            return Err(ValidationError::invalid_format("email", "not an RFC 5322 address"));
        }

        let (local, domain) = trimmed
            .rsplit_once('@')
            .ok_or_else(|| ValidationError::invalid_format("email", "missing @ symbol"))?;

        // Same as a top-level-domain requirement: bare hosts are not mailable.
        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(ValidationError::invalid_format(
                "email",
                "domain must be fully qualified",
            ));
        }

        Ok(Self(format!("{}@{}", local, domain.to_ascii_lowercase())))
    }

    /// The full address.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The domain part (lowercase).
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map(|(_, d)| d).unwrap_or_default()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_plain_address() {
        let email = EmailAddress::parse("new@example.com").unwrap();
        assert_eq!(email.as_str(), "new@example.com");
        assert_eq!(email.domain(), "example.com");
    }

    #[test]
    fn parse_lowercases_domain_only() {
        let email = EmailAddress::parse("Cliente.1@DoceMonos.CL").unwrap();
        assert_eq!(email.as_str(), "Cliente.1@docemonos.cl");
        assert_eq!(email.domain(), "docemonos.cl");
    }

    #[test]
    fn parse_trims_whitespace() {
        assert!(EmailAddress::parse("  a@b.cl ").is_ok());
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!(
            EmailAddress::parse(""),
            Err(ValidationError::empty_field("email"))
        );
    }

    #[test]
    fn parse_rejects_missing_at() {
        assert!(EmailAddress::parse("not-an-email").is_err());
    }

    #[test]
    fn parse_rejects_bare_host() {
        assert!(EmailAddress::parse("root@localhost").is_err());
    }

    #[test]
    fn parse_rejects_double_at() {
        assert!(EmailAddress::parse("a@b@c.cl").is_err());
    }
}
