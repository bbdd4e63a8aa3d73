//! Billing error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | ValidationFailed | 400 |
//! | UndeliverableEmail | 400 |
//! | InvalidSignature | 401 |
//! | PlanAlreadyCreated | 409 |
//! | Gateway | 502 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};
use crate::domain::signing::SignatureError;

/// Errors surfaced by billing commands and callback handling.
///
/// Notifier failures are deliberately absent: they are logged and counted,
/// never returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// Input failed validation.
    ValidationFailed {
        field: String,
        message: String,
    },

    /// The email has no MX record (or failed syntax).
    UndeliverableEmail(String),

    /// Inbound signature missing or wrong.
    InvalidSignature(SignatureError),

    /// A plan with this id was already created by this process.
    PlanAlreadyCreated(String),

    /// The gateway call failed.
    Gateway {
        operation: String,
        status: Option<u16>,
        message: String,
    },

    /// Storage or other infrastructure error.
    Infrastructure(String),
}

impl BillingError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn undeliverable_email(email: impl Into<String>) -> Self {
        BillingError::UndeliverableEmail(email.into())
    }

    pub fn invalid_signature(err: SignatureError) -> Self {
        BillingError::InvalidSignature(err)
    }

    pub fn plan_already_created(plan_id: impl Into<String>) -> Self {
        BillingError::PlanAlreadyCreated(plan_id.into())
    }

    pub fn gateway(
        operation: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        BillingError::Gateway {
            operation: operation.into(),
            status,
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        BillingError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BillingError::ValidationFailed { .. } | BillingError::UndeliverableEmail(_) => {
                ErrorCode::ValidationFailed
            }
            BillingError::InvalidSignature(_) => ErrorCode::InvalidSignature,
            BillingError::PlanAlreadyCreated(_) => ErrorCode::Conflict,
            BillingError::Gateway { .. } => ErrorCode::ExternalServiceError,
            BillingError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            BillingError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            BillingError::UndeliverableEmail(email) => {
                format!("Email '{}' is not deliverable", email)
            }
            BillingError::InvalidSignature(err) => err.to_string(),
            BillingError::PlanAlreadyCreated(plan_id) => {
                format!("Plan '{}' was already created", plan_id)
            }
            BillingError::Gateway {
                operation,
                status: Some(status),
                message,
            } => format!("Gateway {} failed with HTTP {}: {}", operation, status, message),
            BillingError::Gateway {
                operation,
                status: None,
                message,
            } => format!("Gateway {} failed: {}", operation, message),
            BillingError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for BillingError {}

impl From<ValidationError> for BillingError {
    fn from(err: ValidationError) -> Self {
        BillingError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<SignatureError> for BillingError {
    fn from(err: SignatureError) -> Self {
        BillingError::InvalidSignature(err)
    }
}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => BillingError::ValidationFailed {
                field: "unknown".to_string(),
                message: err.message().to_string(),
            },
            _ => BillingError::Infrastructure(err.to_string()),
        }
    }
}

impl From<BillingError> for DomainError {
    fn from(err: BillingError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_converts_with_field() {
        let err: BillingError = ValidationError::empty_field("email").into();
        assert!(matches!(
            err,
            BillingError::ValidationFailed { ref field, .. } if field == "email"
        ));
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[test]
    fn signature_error_converts() {
        let err: BillingError = SignatureError::Mismatch.into();
        assert_eq!(err.code(), ErrorCode::InvalidSignature);
        assert_eq!(err.message(), "Invalid signature");
    }

    #[test]
    fn gateway_message_includes_status() {
        let err = BillingError::gateway("create_customer", Some(400), "email taken");
        assert_eq!(
            err.message(),
            "Gateway create_customer failed with HTTP 400: email taken"
        );
        assert_eq!(err.code(), ErrorCode::ExternalServiceError);
    }

    #[test]
    fn gateway_message_without_status() {
        let err = BillingError::gateway("list_subscriptions", None, "timed out");
        assert_eq!(err.message(), "Gateway list_subscriptions failed: timed out");
    }

    #[test]
    fn plan_already_created_is_conflict() {
        let err = BillingError::plan_already_created("membresia_basica");
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert!(err.message().contains("membresia_basica"));
    }

    #[test]
    fn database_domain_error_becomes_infrastructure() {
        let err: BillingError = DomainError::database("pool closed").into();
        assert!(matches!(err, BillingError::Infrastructure(_)));
    }

    #[test]
    fn billing_error_converts_to_domain_error() {
        let err: DomainError = BillingError::undeliverable_email("a@b.cl").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
