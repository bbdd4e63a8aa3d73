//! Request and callback signing.
//!
//! # Module Structure
//!
//! - `parameters` - ParameterSet and scalar values
//! - `canonical` - canonical base strings per endpoint family
//! - `signer` - HMAC-SHA256 sign/verify
//! - `errors` - SignatureError

mod canonical;
mod errors;
mod parameters;
mod signer;

pub use canonical::{canonicalize, CanonicalForm};
pub use errors::SignatureError;
pub use parameters::{ParamValue, ParameterSet, SIGNATURE_KEY};
pub use signer::{sign, verify, Signature, Signer};
