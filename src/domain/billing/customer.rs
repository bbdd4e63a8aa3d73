//! Gateway customers.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ExternalId, ValidationError};

use super::email::EmailAddress;

/// Customer as known to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Gateway-assigned customer id.
    pub customer_id: String,
    pub external_id: ExternalId,
    pub email: String,
    pub name: String,
    pub rut: Option<String>,
    pub country: Option<String>,
}

/// Validated input for creating a customer at the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub external_id: ExternalId,
    pub email: EmailAddress,
    pub name: String,
    pub rut: Option<String>,
    pub country: Option<String>,
}

impl NewCustomer {
    /// Validates caller input.
    ///
    /// A missing or blank `external_id` is replaced by a generated
    /// `cli-<uuid>` identifier.
    pub fn new(
        email: &str,
        name: &str,
        external_id: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let email = EmailAddress::parse(email)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }

        let external_id = match external_id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => ExternalId::new(id)?,
            None => ExternalId::generate(),
        };

        Ok(Self {
            external_id,
            email,
            name: name.to_string(),
            rut: None,
            country: None,
        })
    }

    /// Attaches the optional Chilean tax id.
    pub fn with_rut(mut self, rut: Option<String>) -> Self {
        self.rut = rut.filter(|s| !s.trim().is_empty());
        self
    }

    /// Attaches the optional country code.
    pub fn with_country(mut self, country: Option<String>) -> Self {
        self.country = country.filter(|s| !s.trim().is_empty());
        self
    }

    /// The customer this request produces once the gateway assigns an id.
    pub fn into_customer(self, customer_id: impl Into<String>) -> Customer {
        Customer {
            customer_id: customer_id.into(),
            external_id: self.external_id,
            email: self.email.as_str().to_string(),
            name: self.name,
            rut: self.rut,
            country: self.country,
        }
    }
}
