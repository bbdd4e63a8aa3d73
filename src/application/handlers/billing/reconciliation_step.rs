//! Per-subscription reconciliation step shared by polling passes and
//! gateway callbacks.
//!
//! The sequence check-history → notify → append runs under a lock keyed by
//! external id, so two observers of the same customer never both notify.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::billing::{
    decide_for_plan, Decision, NotificationOutcome, ReconciliationRecord, StatusCodes, Subscription,
    SubscriptionState,
};
use crate::domain::foundation::{DomainError, ExternalId, PassId};
use crate::ports::{CustomerMirror, MembershipNotifier, NotifierError, ObservationLog};

/// Async locks keyed by external id.
#[derive(Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<ExternalId, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the lock of `key`. Released when the guard drops.
    pub async fn lock(&self, key: &ExternalId) -> OwnedMutexGuard<()> {
        let entry = {
            let mut locks = self.locks.lock().await;
            locks.entry(key.clone()).or_default().clone()
        };
        entry.lock_owned().await
    }

    /// Drops entries nobody holds or waits on.
    pub async fn prune(&self) {
        self.locks
            .lock()
            .await
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

/// What happened to one observed subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub subscription_id: String,
    pub external_id: Option<String>,
    pub state: SubscriptionState,
    pub decision: Decision,
    pub notification: NotificationOutcome,
    /// Storage failure that prevented a complete step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Observation {
    fn unknown(subscription: &Subscription) -> Self {
        Self {
            subscription_id: subscription.subscription_id.clone(),
            external_id: None,
            state: SubscriptionState::Unknown,
            decision: Decision::None,
            notification: NotificationOutcome::None,
            error: None,
        }
    }

    pub fn notification_sent(&self) -> bool {
        matches!(
            self.notification,
            NotificationOutcome::DowngradeSent | NotificationOutcome::ActivateSent
        )
    }

    pub fn notification_failed(&self) -> bool {
        matches!(
            self.notification,
            NotificationOutcome::DowngradeFailed | NotificationOutcome::ActivateFailed
        )
    }
}

/// Classifies, decides, notifies and records one subscription.
pub struct ReconciliationStep {
    log: Arc<dyn ObservationLog>,
    mirror: Arc<dyn CustomerMirror>,
    notifier: Arc<dyn MembershipNotifier>,
    status_codes: StatusCodes,
    notifier_timeout: Duration,
    locks: KeyedLocks,
}

impl ReconciliationStep {
    pub fn new(
        log: Arc<dyn ObservationLog>,
        mirror: Arc<dyn CustomerMirror>,
        notifier: Arc<dyn MembershipNotifier>,
        status_codes: StatusCodes,
        notifier_timeout: Duration,
    ) -> Self {
        Self {
            log,
            mirror,
            notifier,
            status_codes,
            notifier_timeout,
            locks: KeyedLocks::new(),
        }
    }

    pub fn locks(&self) -> &KeyedLocks {
        &self.locks
    }

    #[tracing::instrument(
        skip(self, pass_id, subscription),
        fields(
            pass_id = %pass_id.as_str(),
            subscription_id = %subscription.subscription_id,
            plan_id = %subscription.plan_id
        )
    )]
    pub async fn process(&self, pass_id: &PassId, subscription: &Subscription) -> Observation {
        let external_id = match self.resolve_external_id(subscription).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                tracing::warn!(
                    customer_id = %subscription.customer_id,
                    "No external id for subscription; skipping"
                );
                return Observation::unknown(subscription);
            }
            Err(e) => {
                tracing::error!(error = %e, "Customer mirror lookup failed");
                return Observation {
                    error: Some(e.to_string()),
                    ..Observation::unknown(subscription)
                };
            }
        };

        let class = self.status_codes.classify(&subscription.status);
        let state = SubscriptionState::classify(class, subscription.morose);

        let _guard = self.locks.lock(&external_id).await;

        let mut observation = Observation {
            subscription_id: subscription.subscription_id.clone(),
            external_id: Some(external_id.to_string()),
            state,
            decision: Decision::None,
            notification: NotificationOutcome::None,
            error: None,
        };

        let history = match self.log.history(&external_id).await {
            Ok(history) => history,
            Err(e) => {
                tracing::error!(external_id = %external_id, error = %e, "History lookup failed");
                observation.error = Some(e.to_string());
                return observation;
            }
        };

        let decision = decide_for_plan(state, &subscription.plan_id, &history);
        let delivered = match decision {
            Decision::Downgrade => self.send_downgrade(&external_id).await,
            Decision::Activate => self.send_activate(&external_id, subscription).await,
            Decision::None | Decision::Suppressed => true,
        };
        let notification = decision.outcome(delivered);
        observation.decision = decision;
        observation.notification = notification;

        let record =
            ReconciliationRecord::observe(pass_id, &external_id, subscription, state, notification);
        if let Err(e) = self.log.append(&record).await {
            tracing::error!(external_id = %external_id, error = %e, "Failed to append record");
            observation.error = Some(e.to_string());
        }

        tracing::debug!(
            external_id = %external_id,
            state = ?state,
            notification = %notification,
            "Subscription reconciled"
        );
        observation
    }

    async fn resolve_external_id(
        &self,
        subscription: &Subscription,
    ) -> Result<Option<ExternalId>, DomainError> {
        if let Some(id) = subscription
            .customer_external_id
            .as_deref()
            .and_then(|id| ExternalId::new(id).ok())
        {
            return Ok(Some(id));
        }
        if subscription.customer_id.trim().is_empty() {
            return Ok(None);
        }
        Ok(self
            .mirror
            .find_by_customer_id(&subscription.customer_id)
            .await?
            .map(|customer| customer.external_id))
    }

    async fn send_downgrade(&self, external_id: &ExternalId) -> bool {
        let result = self.bounded(self.notifier.downgrade(external_id)).await;
        report("downgrade", external_id, result)
    }

    async fn send_activate(&self, external_id: &ExternalId, subscription: &Subscription) -> bool {
        let email = match self.mirror.find_by_external_id(external_id).await {
            Ok(customer) => customer.map(|c| c.email),
            Err(e) => {
                tracing::warn!(error = %e, "Mirror lookup for activation email failed");
                None
            }
        };
        let result = self
            .bounded(
                self.notifier
                    .activate(external_id, email.as_deref(), &subscription.plan_id),
            )
            .await;
        report("activate", external_id, result)
    }

    async fn bounded<F>(&self, call: F) -> Result<(), NotifierError>
    where
        F: std::future::Future<Output = Result<(), NotifierError>>,
    {
        match tokio::time::timeout(self.notifier_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(NotifierError::Timeout),
        }
    }
}

fn report(action: &str, external_id: &ExternalId, result: Result<(), NotifierError>) -> bool {
    match result {
        Ok(()) => {
            tracing::info!(external_id = %external_id, action, "Membership notified");
            true
        }
        Err(e) => {
            tracing::warn!(
                external_id = %external_id,
                action,
                error = %e,
                "Membership notification failed; will retry next pass"
            );
            false
        }
    }
}
