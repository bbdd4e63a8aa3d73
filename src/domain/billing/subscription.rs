//! Subscriptions as reported by the gateway.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CommerceOrder, ValidationError};

/// Observed subscription. `status` is the raw gateway code, classified later
/// against the configured status table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub subscription_id: String,
    pub customer_id: String,
    pub plan_id: String,
    pub status: String,
    pub morose: bool,
    pub customer_external_id: Option<String>,
}

/// Validated request to subscribe a gateway customer to a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub customer_id: String,
    pub plan_id: String,
    pub commerce_order: CommerceOrder,
    pub url_success: String,
    pub url_failure: String,
    pub url_callback: Option<String>,
}

impl NewSubscription {
    pub fn new(
        customer_id: impl Into<String>,
        plan_id: impl Into<String>,
        commerce_order: CommerceOrder,
        url_success: impl Into<String>,
        url_failure: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let customer_id = customer_id.into();
        if customer_id.trim().is_empty() {
            return Err(ValidationError::empty_field("customer_id"));
        }
        let plan_id = plan_id.into();
        if plan_id.trim().is_empty() {
            return Err(ValidationError::empty_field("plan_id"));
        }

        Ok(Self {
            customer_id,
            plan_id,
            commerce_order,
            url_success: url_success.into(),
            url_failure: url_failure.into(),
            url_callback: None,
        })
    }

    pub fn with_url_callback(mut self, url: Option<String>) -> Self {
        self.url_callback = url.filter(|u| !u.trim().is_empty());
        self
    }
}

/// Query for one page of the subscription listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionQuery {
    pub plan_id: String,
    pub status: String,
    pub start: u32,
    pub limit: u32,
}

impl SubscriptionQuery {
    /// First page for a (plan, status) pair.
    pub fn first(plan_id: impl Into<String>, status: impl Into<String>, limit: u32) -> Self {
        Self {
            plan_id: plan_id.into(),
            status: status.into(),
            start: 0,
            limit,
        }
    }

    /// The following page, given how many items the current one returned.
    pub fn next(&self, returned: usize) -> Self {
        let advance = u32::try_from(returned).unwrap_or(u32::MAX);
        Self {
            start: self.start.saturating_add(advance),
            ..self.clone()
        }
    }
}

/// One page of the subscription listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionPage {
    pub items: Vec<Subscription>,
    pub total: Option<u64>,
    pub has_more: Option<bool>,
}

impl SubscriptionPage {
    /// A page is the last one when it is shorter than the requested limit.
    pub fn is_last(&self, limit: u32) -> bool {
        self.items.len() < limit as usize
    }
}
