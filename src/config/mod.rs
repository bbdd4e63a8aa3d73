//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `FLOW_MEMBERSHIP` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use flow_membership::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod database;
mod email;
mod error;
mod gateway;
mod membership;
mod reconciler;
mod server;

pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use gateway::GatewayConfig;
pub use membership::MembershipConfig;
pub use reconciler::ReconcilerConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL storage. In-memory storage when absent.
    pub database: Option<DatabaseConfig>,

    /// Payment gateway credentials and signing
    pub gateway: GatewayConfig,

    /// Membership service endpoints
    pub membership: MembershipConfig,

    /// Reconciliation passes
    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    /// Email deliverability checks
    #[serde(default)]
    pub email: EmailConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `FLOW_MEMBERSHIP` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `FLOW_MEMBERSHIP__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `FLOW_MEMBERSHIP__GATEWAY__SECRET_KEY=...` -> `gateway.secret_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("FLOW_MEMBERSHIP")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid value found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let production = self.is_production();
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.gateway.validate(production)?;
        self.membership.validate(production)?;
        self.reconciler.validate()?;
        self.email.validate()?;
        // A notify call must finish before the request carrying it is dropped
        if self.membership.timeout_secs >= self.server.request_timeout_secs {
            return Err(ValidationError::NotifierTimeoutExceedsRequestTimeout);
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
