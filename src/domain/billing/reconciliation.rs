//! Reconciliation records and the notification decision.
//!
//! The observation log is append-only. Whether a membership transition is
//! due is derived from the last transition that was actually delivered
//! downstream, so repeated observations of the same state never notify
//! twice and a failed delivery is attempted again on the next observation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ExternalId, PassId, Timestamp, ValidationError};

use super::status::SubscriptionState;
use super::subscription::Subscription;

/// What happened downstream for one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationOutcome {
    None,
    DowngradeSent,
    DowngradeFailed,
    ActivateSent,
    ActivateFailed,
    /// Degraded again, but the downgrade was already delivered.
    Suppressed,
}

impl NotificationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationOutcome::None => "none",
            NotificationOutcome::DowngradeSent => "downgrade_sent",
            NotificationOutcome::DowngradeFailed => "downgrade_failed",
            NotificationOutcome::ActivateSent => "activate_sent",
            NotificationOutcome::ActivateFailed => "activate_failed",
            NotificationOutcome::Suppressed => "suppressed",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw {
            "none" => Ok(NotificationOutcome::None),
            "downgrade_sent" => Ok(NotificationOutcome::DowngradeSent),
            "downgrade_failed" => Ok(NotificationOutcome::DowngradeFailed),
            "activate_sent" => Ok(NotificationOutcome::ActivateSent),
            "activate_failed" => Ok(NotificationOutcome::ActivateFailed),
            "suppressed" => Ok(NotificationOutcome::Suppressed),
            other => Err(ValidationError::invalid_format(
                "notification",
                format!("unknown outcome '{}'", other),
            )),
        }
    }

    /// The transition this outcome delivered, if any.
    fn delivered(&self) -> Option<Transition> {
        match self {
            NotificationOutcome::DowngradeSent => Some(Transition::Downgrade),
            NotificationOutcome::ActivateSent => Some(Transition::Activate),
            _ => None,
        }
    }
}

impl fmt::Display for NotificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Downgrade,
    Activate,
}

/// One observation of one subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    pub pass_id: PassId,
    pub external_id: ExternalId,
    pub plan_id: String,
    pub subscription_id: String,
    pub status: String,
    pub morose: bool,
    pub degraded: bool,
    pub notification: NotificationOutcome,
    pub observed_at: Timestamp,
}

impl ReconciliationRecord {
    /// Builds the record for an observation made now.
    pub fn observe(
        pass_id: &PassId,
        external_id: &ExternalId,
        subscription: &Subscription,
        state: SubscriptionState,
        notification: NotificationOutcome,
    ) -> Self {
        Self {
            pass_id: pass_id.clone(),
            external_id: external_id.clone(),
            plan_id: subscription.plan_id.clone(),
            subscription_id: subscription.subscription_id.clone(),
            status: subscription.status.clone(),
            morose: subscription.morose,
            degraded: state.is_degraded(),
            notification,
            observed_at: Timestamp::now(),
        }
    }
}

/// Downstream action for an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Nothing to do.
    None,
    Downgrade,
    Activate,
    /// Degraded, already downgraded downstream.
    Suppressed,
}

impl Decision {
    /// Outcome to record once the notifier has been called (or not).
    pub fn outcome(&self, delivered: bool) -> NotificationOutcome {
        match (self, delivered) {
            (Decision::None, _) => NotificationOutcome::None,
            (Decision::Suppressed, _) => NotificationOutcome::Suppressed,
            (Decision::Downgrade, true) => NotificationOutcome::DowngradeSent,
            (Decision::Downgrade, false) => NotificationOutcome::DowngradeFailed,
            (Decision::Activate, true) => NotificationOutcome::ActivateSent,
            (Decision::Activate, false) => NotificationOutcome::ActivateFailed,
        }
    }

    pub fn notifies(&self) -> bool {
        matches!(self, Decision::Downgrade | Decision::Activate)
    }
}

/// Decides the downstream action for `state` given the prior history of the
/// same external id, ordered oldest first.
///
/// - Degraded: downgrade unless the last delivered transition already was a
///   downgrade.
/// - Active: activate only when the last delivered transition was a
///   downgrade (recovery).
/// - Pending and Unknown never notify.
pub fn decide<'a, I>(state: SubscriptionState, history: I) -> Decision
where
    I: IntoIterator<Item = &'a ReconciliationRecord>,
    I::IntoIter: DoubleEndedIterator,
{
    let last_delivered = history
        .into_iter()
        .rev()
        .find_map(|record| record.notification.delivered());

    match state {
        SubscriptionState::Degraded => match last_delivered {
            Some(Transition::Downgrade) => Decision::Suppressed,
            _ => Decision::Downgrade,
        },
        SubscriptionState::Active => match last_delivered {
            Some(Transition::Downgrade) => Decision::Activate,
            _ => Decision::None,
        },
        SubscriptionState::Pending | SubscriptionState::Unknown => Decision::None,
    }
}

/// Like [`decide`], but only records for `plan_id` count. A customer holding
/// subscriptions on several plans has one membership transition per plan.
pub fn decide_for_plan(
    state: SubscriptionState,
    plan_id: &str,
    history: &[ReconciliationRecord],
) -> Decision {
    decide(state, history.iter().filter(|r| r.plan_id == plan_id))
}
