//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::ValidationError;

/// Prefix for generated customer external identifiers.
const EXTERNAL_ID_PREFIX: &str = "cli-";

/// Prefix for generated commerce orders.
const COMMERCE_ORDER_PREFIX: &str = "sub-";

/// Commerce-side identifier of a customer, unique across the gateway account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    /// Creates an ExternalId, returning error if empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("external_id"));
        }
        Ok(Self(id))
    }

    /// Generates a fresh `cli-<uuid>` identifier.
    pub fn generate() -> Self {
        Self(format!("{}{}", EXTERNAL_ID_PREFIX, Uuid::new_v4()))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-generated identifier of one subscription-creation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommerceOrder(String);

impl CommerceOrder {
    /// Creates a CommerceOrder, returning error if empty.
    pub fn new(order: impl Into<String>) -> Result<Self, ValidationError> {
        let order = order.into();
        if order.trim().is_empty() {
            return Err(ValidationError::empty_field("commerce_order"));
        }
        Ok(Self(order))
    }

    /// Generates a unique `sub-<uuid>` order for a new attempt.
    pub fn generate() -> Self {
        Self(format!("{}{}", COMMERCE_ORDER_PREFIX, Uuid::new_v4()))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommerceOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one reconciliation pass (polling or callback driven).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassId(String);

impl PassId {
    /// New id for a polling pass.
    pub fn polling() -> Self {
        Self(format!("pass-{}", Uuid::new_v4()))
    }

    /// New id for a single callback-driven observation.
    pub fn callback() -> Self {
        Self(format!("callback-{}", Uuid::new_v4()))
    }

    /// Wraps an id read back from storage.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
