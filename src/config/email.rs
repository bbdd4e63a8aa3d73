//! Email deliverability configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// MX lookup settings for the deliverability gate.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Look up MX records. When off, every syntactically valid email passes.
    #[serde(default = "default_mx_check_enabled")]
    pub mx_check_enabled: bool,

    /// DNS lookup timeout in seconds
    #[serde(default = "default_dns_timeout")]
    pub dns_timeout_secs: u64,
}

impl EmailConfig {
    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    /// Validate email configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.dns_timeout_secs == 0 || self.dns_timeout_secs > 30 {
            return Err(ValidationError::InvalidTimeout("email.dns_timeout_secs"));
        }
        Ok(())
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            mx_check_enabled: default_mx_check_enabled(),
            dns_timeout_secs: default_dns_timeout(),
        }
    }
}

fn default_mx_check_enabled() -> bool {
    true
}

fn default_dns_timeout() -> u64 {
    5
}
