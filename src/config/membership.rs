//! Membership service configuration

use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use crate::adapters::membership::HttpNotifierConfig;

use super::error::ValidationError;
use super::gateway::check_url;

/// Where activation and downgrade notifications are sent.
#[derive(Debug, Clone, Deserialize)]
pub struct MembershipConfig {
    pub base_url: String,

    #[serde(default = "default_activate_path")]
    pub activate_path: String,

    #[serde(default = "default_downgrade_path")]
    pub downgrade_path: String,

    /// Sent as `Authorization: Bearer ...` when set.
    pub bearer_token: Option<SecretString>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl MembershipConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn notifier_config(&self) -> HttpNotifierConfig {
        HttpNotifierConfig {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            activate_path: self.activate_path.clone(),
            downgrade_path: self.downgrade_path.clone(),
            bearer_token: self.bearer_token.clone(),
            timeout: self.timeout(),
        }
    }

    /// Validate membership configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.base_url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("MEMBERSHIP__BASE_URL"));
        }
        check_url("membership.base_url", &self.base_url, production)?;
        if !self.activate_path.starts_with('/') {
            return Err(ValidationError::InvalidUrl("membership.activate_path"));
        }
        if !self.downgrade_path.starts_with('/') {
            return Err(ValidationError::InvalidUrl("membership.downgrade_path"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 60 {
            return Err(ValidationError::InvalidTimeout("membership.timeout_secs"));
        }
        Ok(())
    }
}

fn default_activate_path() -> String {
    "/api/membership/activate".to_string()
}

fn default_downgrade_path() -> String {
    "/api/membership/downgrade".to_string()
}

fn default_timeout() -> u64 {
    5
}
