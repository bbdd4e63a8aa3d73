//! Subscription plans.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Default billing currency.
pub const DEFAULT_CURRENCY: &str = "CLP";

/// Billing interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanInterval {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl PlanInterval {
    /// Numeric code the gateway uses for this interval.
    pub fn gateway_code(&self) -> i64 {
        match self {
            PlanInterval::Day => 1,
            PlanInterval::Week => 2,
            PlanInterval::Month => 3,
            PlanInterval::Year => 4,
        }
    }

    /// Parses a gateway interval code.
    pub fn from_gateway_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(PlanInterval::Day),
            2 => Some(PlanInterval::Week),
            3 => Some(PlanInterval::Month),
            4 => Some(PlanInterval::Year),
            _ => None,
        }
    }
}

impl fmt::Display for PlanInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlanInterval::Day => "day",
            PlanInterval::Week => "week",
            PlanInterval::Month => "month",
            PlanInterval::Year => "year",
        };
        write!(f, "{}", s)
    }
}

/// A plan as defined at the gateway. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: String,
    pub name: String,
    /// Integer amount in the currency's minor unit (CLP has none).
    pub amount: i64,
    pub currency: String,
    pub interval: PlanInterval,
    pub interval_count: u32,
    pub description: Option<String>,
    pub url_callback: Option<String>,
}

impl Plan {
    /// Validates a plan definition.
    pub fn new(
        plan_id: impl Into<String>,
        name: impl Into<String>,
        amount: i64,
        interval: PlanInterval,
    ) -> Result<Self, ValidationError> {
        let plan_id = plan_id.into().trim().to_string();
        if plan_id.is_empty() {
            return Err(ValidationError::empty_field("plan_id"));
        }
        if !plan_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ValidationError::invalid_format(
                "plan_id",
                "only letters, digits, '_' and '-' are allowed",
            ));
        }

        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }

        if amount <= 0 {
            return Err(ValidationError::out_of_range("amount", 1, i64::MAX, amount));
        }

        Ok(Self {
            plan_id,
            name,
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
            interval,
            interval_count: 1,
            description: None,
            url_callback: None,
        })
    }

    /// Overrides the currency (three-letter ISO code).
    pub fn with_currency(mut self, currency: &str) -> Result<Self, ValidationError> {
        let currency = currency.trim().to_ascii_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid_format(
                "currency",
                "expected a three-letter ISO code",
            ));
        }
        self.currency = currency;
        Ok(self)
    }

    /// Sets how many intervals make one billing period.
    pub fn with_interval_count(mut self, count: u32) -> Result<Self, ValidationError> {
        if count == 0 || count > 12 {
            return Err(ValidationError::out_of_range(
                "interval_count",
                1,
                12,
                i64::from(count),
            ));
        }
        self.interval_count = count;
        Ok(self)
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_url_callback(mut self, url: Option<String>) -> Self {
        self.url_callback = url.filter(|u| !u.trim().is_empty());
        self
    }
}
