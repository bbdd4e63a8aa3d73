//! ReconcileSubscriptionsHandler - One reconciliation pass over the gateway's
//! subscription listings.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::domain::billing::{BillingError, SubscriptionQuery, SubscriptionState};
use crate::domain::foundation::{PassId, Timestamp};
use crate::ports::PaymentGateway;

use super::{Observation, ReconciliationStep};

/// Fixed inputs of every pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerSettings {
    /// Plan ids to walk.
    pub plans: Vec<String>,
    /// Raw status codes to list per plan.
    pub status_filters: Vec<String>,
    pub page_size: u32,
    /// Upper bound on (plan, status) pairs listed at once.
    pub max_concurrency: usize,
}

/// Command to run one pass. Empty overrides fall back to the settings.
#[derive(Debug, Clone, Default)]
pub struct ReconcileSubscriptionsCommand {
    pub plans: Option<Vec<String>>,
    pub status_filters: Option<Vec<String>>,
}

/// A listing page that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedPage {
    pub plan_id: String,
    pub status: String,
    pub start: u32,
    pub error: String,
}

/// Totals for one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub pass_id: PassId,
    pub examined: u64,
    pub active: u64,
    pub degraded: u64,
    pub pending: u64,
    pub unknown: u64,
    pub notifications_sent: u64,
    pub notification_failures: u64,
    pub storage_failures: u64,
    pub list_calls: u64,
    pub failed_pages: Vec<FailedPage>,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl PassReport {
    fn start(pass_id: PassId) -> Self {
        let now = Timestamp::now();
        Self {
            pass_id,
            examined: 0,
            active: 0,
            degraded: 0,
            pending: 0,
            unknown: 0,
            notifications_sent: 0,
            notification_failures: 0,
            storage_failures: 0,
            list_calls: 0,
            failed_pages: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    fn record(&mut self, observation: &Observation) {
        self.examined += 1;
        match observation.state {
            SubscriptionState::Active => self.active += 1,
            SubscriptionState::Degraded => self.degraded += 1,
            SubscriptionState::Pending => self.pending += 1,
            SubscriptionState::Unknown => self.unknown += 1,
        }
        if observation.notification_sent() {
            self.notifications_sent += 1;
        }
        if observation.notification_failed() {
            self.notification_failures += 1;
        }
        if observation.error.is_some() {
            self.storage_failures += 1;
        }
    }

    /// True when every page was fetched.
    pub fn is_complete(&self) -> bool {
        self.failed_pages.is_empty()
    }
}

/// Result of walking one (plan, status) pair.
struct PairOutcome {
    observations: Vec<Observation>,
    list_calls: u64,
    failed_page: Option<FailedPage>,
}

/// Handler for reconciliation passes.
///
/// Pairs are listed concurrently up to `max_concurrency`; pages within a pair
/// are fetched in order until a short page marks the end.
pub struct ReconcileSubscriptionsHandler {
    gateway: Arc<dyn PaymentGateway>,
    step: Arc<ReconciliationStep>,
    settings: ReconcilerSettings,
}

impl ReconcileSubscriptionsHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        step: Arc<ReconciliationStep>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            gateway,
            step,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: ReconcileSubscriptionsCommand,
    ) -> Result<PassReport, BillingError> {
        let plans = cmd
            .plans
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.settings.plans.clone());
        let statuses = cmd
            .status_filters
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.settings.status_filters.clone());

        if plans.is_empty() {
            return Err(BillingError::validation("plans", "no plans to reconcile"));
        }
        if statuses.is_empty() {
            return Err(BillingError::validation(
                "status_filters",
                "no status filters to reconcile",
            ));
        }
        if self.settings.page_size == 0 {
            return Err(BillingError::validation("page_size", "must be at least 1"));
        }

        let mut report = PassReport::start(PassId::polling());
        tracing::info!(
            pass_id = %report.pass_id.as_str(),
            plans = plans.len(),
            statuses = statuses.len(),
            "Reconciliation pass started"
        );

        let pairs: Vec<(String, String)> = plans
            .iter()
            .flat_map(|plan| statuses.iter().map(move |status| (plan.clone(), status.clone())))
            .collect();

        let pass_id = report.pass_id.clone();
        let outcomes: Vec<PairOutcome> = stream::iter(pairs)
            .map(|(plan_id, status)| self.reconcile_pair(&pass_id, plan_id, status))
            .buffer_unordered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        for outcome in outcomes {
            report.list_calls += outcome.list_calls;
            for observation in &outcome.observations {
                report.record(observation);
            }
            if let Some(failed) = outcome.failed_page {
                report.failed_pages.push(failed);
            }
        }
        report.finished_at = Timestamp::now();
        self.step.locks().prune().await;

        tracing::info!(
            pass_id = %report.pass_id.as_str(),
            examined = report.examined,
            degraded = report.degraded,
            unknown = report.unknown,
            notifications_sent = report.notifications_sent,
            notification_failures = report.notification_failures,
            failed_pages = report.failed_pages.len(),
            "Reconciliation pass finished"
        );
        Ok(report)
    }

    async fn reconcile_pair(
        &self,
        pass_id: &PassId,
        plan_id: String,
        status: String,
    ) -> PairOutcome {
        let mut outcome = PairOutcome {
            observations: Vec::new(),
            list_calls: 0,
            failed_page: None,
        };
        let mut query = SubscriptionQuery::first(plan_id, status, self.settings.page_size);

        loop {
            outcome.list_calls += 1;
            let page = match self.gateway.list_subscriptions(&query).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(
                        plan_id = %query.plan_id,
                        status = %query.status,
                        start = query.start,
                        error = %e,
                        "Listing failed; skipping rest of pair"
                    );
                    outcome.failed_page = Some(FailedPage {
                        plan_id: query.plan_id.clone(),
                        status: query.status.clone(),
                        start: query.start,
                        error: e.to_string(),
                    });
                    break;
                }
            };

            for subscription in &page.items {
                let observation = self.step.process(pass_id, subscription).await;
                outcome.observations.push(observation);
            }

            if page.is_last(query.limit) {
                break;
            }
            query = query.next(page.items.len());
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::adapters::flow::MockPaymentGateway;
    use crate::adapters::membership::RecordingNotifier;
    use crate::adapters::storage::{InMemoryCustomerMirror, InMemoryObservationLog};
    use crate::domain::billing::{StatusCodes, Subscription};
    use crate::ports::{GatewayError, NotifierError};

    struct Fixture {
        gateway: MockPaymentGateway,
        log: Arc<InMemoryObservationLog>,
        notifier: RecordingNotifier,
        handler: ReconcileSubscriptionsHandler,
    }

    fn fixture(plans: &[&str], statuses: &[&str], page_size: u32) -> Fixture {
        let gateway = MockPaymentGateway::new();
        let log = Arc::new(InMemoryObservationLog::new());
        let notifier = RecordingNotifier::new();
        let step = Arc::new(ReconciliationStep::new(
            log.clone(),
            Arc::new(InMemoryCustomerMirror::new()),
            Arc::new(notifier.clone()),
            StatusCodes::default(),
            Duration::from_millis(200),
        ));
        let handler = ReconcileSubscriptionsHandler::new(
            Arc::new(gateway.clone()),
            step,
            ReconcilerSettings {
                plans: plans.iter().map(|p| p.to_string()).collect(),
                status_filters: statuses.iter().map(|s| s.to_string()).collect(),
                page_size,
                max_concurrency: 4,
            },
        );
        Fixture {
            gateway,
            log,
            notifier,
            handler,
        }
    }

    fn subscription(i: usize, plan: &str, status: &str) -> Subscription {
        Subscription {
            subscription_id: format!("sus_{}", i),
            customer_id: format!("cus_{}", i),
            plan_id: plan.to_string(),
            status: status.to_string(),
            morose: false,
            customer_external_id: Some(format!("cli-{}", i)),
        }
    }

    #[tokio::test]
    async fn walks_every_page_of_every_pair() {
        let f = fixture(&["plan_a", "plan_b"], &["1", "4"], 10);
        for i in 0..25 {
            f.gateway.add_subscription(subscription(i, "plan_a", "1"));
        }
        for i in 25..30 {
            f.gateway.add_subscription(subscription(i, "plan_b", "4"));
        }

        let report = f
            .handler
            .handle(ReconcileSubscriptionsCommand::default())
            .await
            .unwrap();

        assert_eq!(report.examined, 30);
        assert_eq!(report.active, 25);
        assert_eq!(report.degraded, 5);
        assert_eq!(f.gateway.list_calls_for("plan_a", "1"), 3);
        assert_eq!(f.gateway.list_calls_for("plan_a", "4"), 1);
        assert_eq!(f.gateway.list_calls_for("plan_b", "4"), 1);
        assert_eq!(report.list_calls, 6);
        assert_eq!(f.log.record_count().await, 30);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn exact_multiple_of_page_size_needs_one_empty_page() {
        let f = fixture(&["plan_a"], &["1"], 10);
        for i in 0..20 {
            f.gateway.add_subscription(subscription(i, "plan_a", "1"));
        }

        let report = f
            .handler
            .handle(ReconcileSubscriptionsCommand::default())
            .await
            .unwrap();

        assert_eq!(report.examined, 20);
        assert_eq!(report.list_calls, 3);
    }

    #[tokio::test]
    async fn repeated_passes_notify_once() {
        let f = fixture(&["plan_a"], &["4"], 10);
        f.gateway.add_subscription(subscription(1, "plan_a", "4"));

        for _ in 0..3 {
            f.handler
                .handle(ReconcileSubscriptionsCommand::default())
                .await
                .unwrap();
        }

        assert_eq!(f.notifier.downgrades_for("cli-1"), 1);
        assert_eq!(f.log.record_count().await, 3);
    }

    #[tokio::test]
    async fn listing_failure_is_reported_and_pass_continues() {
        let f = fixture(&["plan_a"], &["1"], 10);
        f.gateway.set_method_error(
            "list_subscriptions",
            GatewayError::http("list_subscriptions", 500, "boom"),
        );

        let report = f
            .handler
            .handle(ReconcileSubscriptionsCommand::default())
            .await
            .unwrap();

        assert_eq!(report.failed_pages.len(), 1);
        assert_eq!(report.failed_pages[0].plan_id, "plan_a");
        assert_eq!(report.failed_pages[0].start, 0);
        assert_eq!(report.examined, 0);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn notifier_failures_are_counted_not_fatal() {
        let f = fixture(&["plan_a"], &["4"], 10);
        f.gateway.add_subscription(subscription(1, "plan_a", "4"));
        f.gateway.add_subscription(subscription(2, "plan_a", "4"));
        f.notifier.fail_all(NotifierError::Timeout);

        let report = f
            .handler
            .handle(ReconcileSubscriptionsCommand::default())
            .await
            .unwrap();

        assert_eq!(report.notification_failures, 2);
        assert_eq!(report.notifications_sent, 0);
        assert_eq!(f.log.record_count().await, 2);
    }

    #[tokio::test]
    async fn unknown_subscriptions_are_counted() {
        let f = fixture(&["plan_a"], &["1"], 10);
        f.gateway.add_subscription(Subscription {
            customer_external_id: None,
            ..subscription(1, "plan_a", "1")
        });

        let report = f
            .handler
            .handle(ReconcileSubscriptionsCommand::default())
            .await
            .unwrap();

        assert_eq!(report.unknown, 1);
        assert_eq!(f.log.record_count().await, 0);
    }

    #[tokio::test]
    async fn command_overrides_plans() {
        let f = fixture(&["plan_a"], &["1"], 10);

        f.handler
            .handle(ReconcileSubscriptionsCommand {
                plans: Some(vec!["plan_z".to_string()]),
                status_filters: None,
            })
            .await
            .unwrap();

        assert_eq!(f.gateway.list_calls_for("plan_z", "1"), 1);
        assert_eq!(f.gateway.list_calls_for("plan_a", "1"), 0);
    }

    #[tokio::test]
    async fn no_plans_is_validation_error() {
        let f = fixture(&[], &["1"], 10);

        let err = f
            .handler
            .handle(ReconcileSubscriptionsCommand::default())
            .await
            .unwrap_err();

        assert!(matches!(err, BillingError::ValidationFailed { .. }));
        assert_eq!(f.gateway.total_calls(), 0);
    }
}
