//! HTTP listener settings for the callback and admin API

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use super::error::ValidationError;

/// Longest accepted request timeout. Manual reconcile passes run inside it.
const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Listener and logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// IP address to bind; hostnames are not resolved
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub environment: Environment,

    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// JSON log lines. Unset means JSON in production only.
    #[serde(default)]
    pub log_json: Option<bool>,

    /// Upper bound on one HTTP request, reconcile passes included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Comma-separated browser origins allowed to call the API
    pub cors_origins: Option<String>,
}

/// Deployment environment. Production tightens URL checks.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ValidationError::InvalidBindAddress(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn json_logs(&self) -> bool {
        self.log_json.unwrap_or_else(|| self.is_production())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured origins, trimmed, blanks dropped.
    pub fn allowed_origins(&self) -> Vec<String> {
        let Some(raw) = &self.cors_origins else {
            return Vec::new();
        };
        raw.split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        self.socket_addr()?;
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ValidationError::InvalidTimeout("server.request_timeout_secs"));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            log_level: default_log_level(),
            log_json: None,
            request_timeout_secs: default_request_timeout(),
            cors_origins: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info,flow_membership=debug,sqlx=warn".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(host: &str, port: u16) -> ServerConfig {
        ServerConfig {
            host: host.to_string(),
            port,
            ..Default::default()
        }
    }

    #[test]
    fn binds_ipv4_and_ipv6() {
        assert_eq!(
            server("127.0.0.1", 3000).socket_addr().unwrap().to_string(),
            "127.0.0.1:3000"
        );
        assert_eq!(
            server("::1", 8080).socket_addr().unwrap().to_string(),
            "[::1]:8080"
        );
    }

    #[test]
    fn hostnames_are_rejected() {
        assert_eq!(
            server("localhost", 8080).validate(),
            Err(ValidationError::InvalidBindAddress("localhost".to_string()))
        );
    }

    #[test]
    fn port_zero_is_rejected() {
        assert_eq!(server("0.0.0.0", 0).validate(), Err(ValidationError::InvalidPort));
    }

    #[test]
    fn request_timeout_bounds() {
        for (secs, ok) in [(0, false), (1, true), (300, true), (301, false)] {
            let config = ServerConfig {
                request_timeout_secs: secs,
                ..Default::default()
            };
            assert_eq!(config.validate().is_ok(), ok, "timeout {}", secs);
        }
    }

    #[test]
    fn json_logs_follow_environment_unless_set() {
        let mut config = ServerConfig::default();
        assert!(!config.json_logs());

        config.environment = Environment::Production;
        assert!(config.json_logs());

        config.log_json = Some(false);
        assert!(!config.json_logs());
    }

    #[test]
    fn allowed_origins_skip_blanks() {
        let config = ServerConfig {
            cors_origins: Some(" https://shop.example.com, ,https://admin.example.com,".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.allowed_origins(),
            vec!["https://shop.example.com", "https://admin.example.com"]
        );
        assert!(ServerConfig::default().allowed_origins().is_empty());
    }
}
