//! Subscription status classification.
//!
//! The gateway's status domain is not fixed, so the mapping from raw codes to
//! classes comes from configuration. Unmapped codes are treated as pending.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Class of a raw gateway status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Active,
    Pending,
    Degraded,
}

/// Reconciliation state of one observed subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    Active,
    Pending,
    /// Failed or canceled payment, or a morose (overdue) subscription.
    Degraded,
    /// No external id could be resolved for the subscription.
    Unknown,
}

impl SubscriptionState {
    /// Combines the status class with the morose flag.
    pub fn classify(class: StatusClass, morose: bool) -> Self {
        match (class, morose) {
            (_, true) | (StatusClass::Degraded, _) => SubscriptionState::Degraded,
            (StatusClass::Active, false) => SubscriptionState::Active,
            (StatusClass::Pending, false) => SubscriptionState::Pending,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SubscriptionState::Degraded)
    }
}

/// Configured mapping of raw status codes to classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCodes {
    active: HashSet<String>,
    degraded: HashSet<String>,
}

impl StatusCodes {
    /// Builds the table. Codes are compared trimmed and case-insensitively.
    /// A code listed in both sets is degraded.
    pub fn new<A, D, S>(active: A, degraded: D) -> Self
    where
        A: IntoIterator<Item = S>,
        D: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            active: active.into_iter().map(|c| normalize(c.as_ref())).collect(),
            degraded: degraded.into_iter().map(|c| normalize(c.as_ref())).collect(),
        }
    }

    /// Classifies a raw code.
    pub fn classify(&self, raw: &str) -> StatusClass {
        let code = normalize(raw);
        if self.degraded.contains(&code) {
            StatusClass::Degraded
        } else if self.active.contains(&code) {
            StatusClass::Active
        } else {
            StatusClass::Pending
        }
    }
}

impl Default for StatusCodes {
    /// Documented gateway codes: 1 active, 2 trial, 4 canceled, plus the
    /// textual forms some endpoints return.
    fn default() -> Self {
        Self::new(["1", "2", "active"], ["4", "canceled", "cancelled", "failed"])
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}
