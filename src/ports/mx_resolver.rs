//! MX lookup port.

use async_trait::async_trait;

/// Answers whether a domain can receive mail.
///
/// Implementations swallow resolver failures: NXDOMAIN, timeouts and empty
/// answers all mean `false`.
#[async_trait]
pub trait MxResolver: Send + Sync {
    async fn has_mx(&self, domain: &str) -> bool;
}
