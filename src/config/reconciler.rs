//! Reconciler configuration
//!
//! Lists are comma-separated so they fit a single environment variable,
//! e.g. `FLOW_MEMBERSHIP__RECONCILER__PLANS=membresia_basica,membresia_premium`.

use serde::Deserialize;

use crate::application::billing::ReconcilerSettings;
use crate::domain::billing::StatusCodes;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct ReconcilerConfig {
    /// Plan ids walked by each pass.
    #[serde(default)]
    pub plans: String,

    /// Raw status codes listed per plan.
    #[serde(default = "default_status_filters")]
    pub status_filters: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Raw codes classified as active.
    #[serde(default = "default_active_codes")]
    pub active_codes: String,

    /// Raw codes classified as degraded (failed or canceled).
    #[serde(default = "default_degraded_codes")]
    pub degraded_codes: String,
}

impl ReconcilerConfig {
    pub fn plan_list(&self) -> Vec<String> {
        split_list(&self.plans)
    }

    pub fn status_filter_list(&self) -> Vec<String> {
        split_list(&self.status_filters)
    }

    pub fn status_codes(&self) -> StatusCodes {
        StatusCodes::new(split_list(&self.active_codes), split_list(&self.degraded_codes))
    }

    pub fn settings(&self) -> ReconcilerSettings {
        ReconcilerSettings {
            plans: self.plan_list(),
            status_filters: self.status_filter_list(),
            page_size: self.page_size,
            max_concurrency: self.max_concurrency,
        }
    }

    /// Validate reconciler configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page_size == 0 || self.page_size > 100 {
            return Err(ValidationError::InvalidPageSize);
        }
        if self.max_concurrency == 0 || self.max_concurrency > 32 {
            return Err(ValidationError::InvalidConcurrency);
        }
        if self.status_filter_list().is_empty() {
            return Err(ValidationError::NoStatusFilters);
        }
        let active = split_list(&self.active_codes);
        let degraded = split_list(&self.degraded_codes);
        if let Some(code) = active
            .iter()
            .find(|a| degraded.iter().any(|d| d.eq_ignore_ascii_case(a)))
        {
            return Err(ValidationError::AmbiguousStatusCode(code.clone()));
        }
        Ok(())
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            plans: String::new(),
            status_filters: default_status_filters(),
            page_size: default_page_size(),
            max_concurrency: default_max_concurrency(),
            active_codes: default_active_codes(),
            degraded_codes: default_degraded_codes(),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn default_status_filters() -> String {
    "1,4".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_max_concurrency() -> usize {
    4
}

fn default_active_codes() -> String {
    "1,2,active".to_string()
}

fn default_degraded_codes() -> String {
    "4,canceled,cancelled,failed".to_string()
}
