//! DNS MX lookups via hickory-resolver.

use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

use crate::ports::MxResolver;

/// MX resolver backed by the system (or default public) DNS configuration.
pub struct HickoryMxResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryMxResolver {
    /// Uses `/etc/resolv.conf` when readable, public resolvers otherwise.
    pub fn from_system(timeout: Duration) -> Self {
        let (config, mut opts) = hickory_resolver::system_conf::read_system_conf()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "System DNS config unavailable, using defaults");
                (ResolverConfig::default(), ResolverOpts::default())
            });
        opts.timeout = timeout;
        opts.attempts = 1;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
        }
    }
}

#[async_trait]
impl MxResolver for HickoryMxResolver {
    async fn has_mx(&self, domain: &str) -> bool {
        // Fully qualified so search domains are never appended.
        let fqdn = format!("{}.", domain.trim_end_matches('.'));

        match self.resolver.mx_lookup(fqdn.as_str()).await {
            Ok(lookup) => {
                let found = lookup.iter().next().is_some();
                tracing::debug!(domain, found, "MX lookup finished");
                found
            }
            Err(e) => {
                tracing::debug!(domain, error = %e, "MX lookup failed");
                false
            }
        }
    }
}
