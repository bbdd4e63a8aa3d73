//! Payment gateway configuration

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::adapters::flow::{FlowConfig, DEFAULT_BASE_URL};
use crate::application::billing::SubscriptionUrls;
use crate::domain::signing::{CanonicalForm, Signer};

use super::error::ValidationError;

/// Gateway credentials, endpoints and signing rules.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Merchant API key, sent as `apiKey`.
    pub api_key: SecretString,

    /// Shared HMAC secret.
    pub secret_key: SecretString,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Canonical form for outbound API calls.
    #[serde(default)]
    pub api_signing_form: CanonicalForm,

    /// Canonical form for inbound callbacks.
    #[serde(default)]
    pub callback_signing_form: CanonicalForm,

    /// Reject callbacks without a valid `s`.
    #[serde(default = "default_verify_callbacks")]
    pub verify_callbacks: bool,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Where the payer lands after a successful subscription.
    pub url_success: String,

    /// Where the payer lands after a failed subscription.
    pub url_failure: String,

    /// Callback URL registered with new subscriptions and plans.
    pub url_callback: Option<String>,
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Client settings for outbound calls.
    pub fn flow_config(&self) -> FlowConfig {
        FlowConfig::new(self.api_key.clone(), self.secret_key.clone())
            .with_base_url(self.base_url.as_str())
            .with_signing_form(self.api_signing_form)
            .with_timeout(self.timeout())
    }

    /// Callback verifier, or `None` when verification is disabled.
    pub fn callback_verifier(&self) -> Option<Signer> {
        self.verify_callbacks
            .then(|| Signer::new(self.secret_key.clone(), self.callback_signing_form))
    }

    pub fn subscription_urls(&self) -> SubscriptionUrls {
        SubscriptionUrls {
            success: self.url_success.clone(),
            failure: self.url_failure.clone(),
            callback: self.url_callback.clone(),
        }
    }

    /// Validate gateway configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__API_KEY"));
        }
        if self.secret_key.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__SECRET_KEY"));
        }
        check_url("gateway.base_url", &self.base_url, production)?;
        check_url("gateway.url_success", &self.url_success, production)?;
        check_url("gateway.url_failure", &self.url_failure, production)?;
        if let Some(url) = &self.url_callback {
            check_url("gateway.url_callback", url, production)?;
        }
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout("gateway.timeout_secs"));
        }
        Ok(())
    }
}

/// Requires an http(s) URL, https only in production.
pub(super) fn check_url(
    name: &'static str,
    url: &str,
    production: bool,
) -> Result<(), ValidationError> {
    if url.starts_with("https://") {
        return Ok(());
    }
    if url.starts_with("http://") {
        return if production {
            Err(ValidationError::UrlMustBeHttps(name))
        } else {
            Ok(())
        };
    }
    Err(ValidationError::InvalidUrl(name))
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_verify_callbacks() -> bool {
    true
}

fn default_timeout() -> u64 {
    15
}
