//! Fixed MX answers for tests and offline development.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::ports::MxResolver;

/// Resolver answering from an allow-list of domains.
#[derive(Debug, Clone, Default)]
pub struct StaticMxResolver {
    domains: HashSet<String>,
    allow_all: bool,
}

impl StaticMxResolver {
    /// Only the given domains have MX records.
    pub fn with_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            domains: domains
                .into_iter()
                .map(|d| d.as_ref().trim().to_ascii_lowercase())
                .collect(),
            allow_all: false,
        }
    }

    /// Every domain has MX records.
    pub fn allow_all() -> Self {
        Self {
            domains: HashSet::new(),
            allow_all: true,
        }
    }
}

#[async_trait]
impl MxResolver for StaticMxResolver {
    async fn has_mx(&self, domain: &str) -> bool {
        self.allow_all || self.domains.contains(&domain.to_ascii_lowercase())
    }
}
