//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid timeout for {0}")]
    InvalidTimeout(&'static str),

    #[error("membership.timeout_secs must be shorter than server.request_timeout_secs")]
    NotifierTimeoutExceedsRequestTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid URL for {0}")]
    InvalidUrl(&'static str),

    #[error("{0} must use HTTPS in production")]
    UrlMustBeHttps(&'static str),

    #[error("Page size must be between 1 and 100")]
    InvalidPageSize,

    #[error("Max concurrency must be between 1 and 32")]
    InvalidConcurrency,

    #[error("No status filters configured")]
    NoStatusFilters,

    #[error("Status code {0} is mapped as both active and degraded")]
    AmbiguousStatusCode(String),
}
