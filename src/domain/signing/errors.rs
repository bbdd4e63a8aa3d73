//! Signature verification errors.

use thiserror::Error;

/// Inbound signature failures. Always a hard rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// No `s` parameter was supplied.
    #[error("Missing signature")]
    Missing,

    /// The supplied signature does not match the parameters.
    #[error("Invalid signature")]
    Mismatch,
}
