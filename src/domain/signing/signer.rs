//! HMAC-SHA256 signing and verification of parameter sets.
//!
//! The gateway authenticates every request by an `s` parameter holding the
//! hex HMAC-SHA256 of the canonical base string, keyed by the shared secret.
//! Callbacks from the gateway are verified the same way.

use std::fmt;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::canonical::{canonicalize, CanonicalForm};
use super::errors::SignatureError;
use super::parameters::{ParameterSet, SIGNATURE_KEY};

type HmacSha256 = Hmac<Sha256>;

/// Lowercase hex HMAC-SHA256 digest (64 characters).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(String);

impl Signature {
    /// Returns the hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the signature, returning the hex digest.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signs a base string with the shared secret.
pub fn sign(base: &str, secret: &[u8]) -> Signature {
    Signature(hex::encode(mac_bytes(base, secret)))
}

/// Checks `signature` against the parameters, ignoring any `s` they carry.
///
/// Malformed hex and length mismatches are plain rejections.
pub fn verify(params: &ParameterSet, signature: &str, secret: &[u8], form: CanonicalForm) -> bool {
    let provided = match hex::decode(signature.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let expected = mac_bytes(&canonicalize(params, form), secret);
    constant_time_compare(&expected, &provided)
}

fn mac_bytes(base: &str, secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(base.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Signer bound to one secret and one canonical form.
///
/// Build one per endpoint family so the form can never vary between calls
/// to the same endpoint.
#[derive(Clone)]
pub struct Signer {
    secret: SecretString,
    form: CanonicalForm,
}

impl Signer {
    /// Creates a signer for an endpoint family.
    pub fn new(secret: SecretString, form: CanonicalForm) -> Self {
        Self { secret, form }
    }

    /// The canonical form this signer is fixed to.
    pub fn form(&self) -> CanonicalForm {
        self.form
    }

    /// Signature over `params` (excluding any `s`).
    pub fn signature_for(&self, params: &ParameterSet) -> Signature {
        sign(
            &canonicalize(params, self.form),
            self.secret.expose_secret().as_bytes(),
        )
    }

    /// Returns `params` with the `s` parameter attached.
    pub fn sign_params(&self, mut params: ParameterSet) -> ParameterSet {
        params.remove(SIGNATURE_KEY);
        let signature = self.signature_for(&params);
        params.insert(SIGNATURE_KEY, signature.into_string());
        params
    }

    /// Verifies the `s` parameter carried inside `params`.
    pub fn verify_params(&self, params: &ParameterSet) -> Result<(), SignatureError> {
        let signature = params.signature().ok_or(SignatureError::Missing)?;
        if verify(
            params,
            &signature,
            self.secret.expose_secret().as_bytes(),
            self.form,
        ) {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("secret", &"[REDACTED]")
            .field("form", &self.form)
            .finish()
    }
}
