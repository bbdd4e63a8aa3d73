//! Integration tests for the subscription-to-membership flow.
//!
//! These tests wire the billing application state on in-memory adapters and
//! verify, across several reconciliation passes:
//! 1. Subscriptions created through the API are reconciled from the gateway
//! 2. Degradation notifies exactly once, recovery activates again
//! 3. Pagination fetches every page of every (plan, status) pair
//! 4. Notifier failures are retried on the next observation

use std::sync::Arc;
use std::time::Duration;

use flow_membership::adapters::http::{BillingAppState, BillingPorts, BillingSettings};
use flow_membership::adapters::membership::NotifierCall;
use flow_membership::adapters::{
    InMemoryCustomerMirror, InMemoryObservationLog, MockPaymentGateway, RecordingNotifier,
    StaticMxResolver,
};
use flow_membership::application::billing::{
    CreateCustomerCommand, CreateSubscriptionCommand, HandleGatewayCallbackCommand,
    ReconcileSubscriptionsCommand, ReconcilerSettings, SubscriptionUrls,
};
use flow_membership::domain::billing::{BillingError, NotificationOutcome, StatusCodes, Subscription};
use flow_membership::domain::foundation::ExternalId;
use flow_membership::domain::signing::ParameterSet;
use flow_membership::ports::{NotifierError, ObservationLog};

const PLAN: &str = "membresia_basica";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Harness {
    gateway: MockPaymentGateway,
    notifier: RecordingNotifier,
    log: Arc<InMemoryObservationLog>,
    mirror: Arc<InMemoryCustomerMirror>,
    state: BillingAppState,
}

fn harness(page_size: u32) -> Harness {
    harness_for(page_size, &[PLAN])
}

fn harness_for(page_size: u32, plans: &[&str]) -> Harness {
    let gateway = MockPaymentGateway::new();
    let notifier = RecordingNotifier::new();
    let log = Arc::new(InMemoryObservationLog::new());
    let mirror = Arc::new(InMemoryCustomerMirror::new());

    let ports = BillingPorts {
        gateway: Arc::new(gateway.clone()),
        mirror: mirror.clone(),
        observation_log: log.clone(),
        notifier: Arc::new(notifier.clone()),
        mx_resolver: Arc::new(StaticMxResolver::with_domains(["example.com"])),
    };
    let settings = BillingSettings {
        subscription_urls: SubscriptionUrls {
            success: "https://shop.example.com/ok".to_string(),
            failure: "https://shop.example.com/fail".to_string(),
            callback: None,
        },
        reconciler: ReconcilerSettings {
            plans: plans.iter().map(|p| p.to_string()).collect(),
            status_filters: vec!["1".to_string(), "4".to_string()],
            page_size,
            max_concurrency: 4,
        },
        status_codes: StatusCodes::new(["1", "2", "active"], ["4", "canceled", "cancelled"]),
        notifier_timeout: Duration::from_secs(1),
        callback_verifier: None,
    };

    Harness {
        gateway,
        notifier,
        log,
        mirror,
        state: BillingAppState::new(ports, settings),
    }
}

impl Harness {
    async fn pass(&self) -> flow_membership::application::billing::PassReport {
        self.state
            .reconcile
            .handle(ReconcileSubscriptionsCommand::default())
            .await
            .unwrap()
    }

    async fn subscribe(&self, email: &str) -> (String, ExternalId) {
        let result = self
            .state
            .create_subscription
            .handle(CreateSubscriptionCommand {
                email: email.to_string(),
                plan_id: PLAN.to_string(),
                name: Some("Test User".to_string()),
                commerce_order: None,
            })
            .await
            .unwrap();
        (
            result.subscription.subscription_id,
            result.customer.external_id,
        )
    }

    async fn notifications(&self, external_id: &ExternalId) -> Vec<NotificationOutcome> {
        self.log
            .history(external_id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.notification)
            .collect()
    }
}

fn listed(i: usize, status: &str) -> Subscription {
    Subscription {
        subscription_id: format!("sus_{}", i),
        customer_id: format!("cus_{}", i),
        plan_id: PLAN.to_string(),
        status: status.to_string(),
        morose: false,
        customer_external_id: Some(format!("cli-{}", i)),
    }
}

// =============================================================================
// End to end
// =============================================================================

#[tokio::test]
async fn subscription_lifecycle_notifies_once_per_transition() {
    let h = harness(100);
    let (subscription_id, external_id) = h.subscribe("new@example.com").await;
    assert_eq!(h.mirror.customer_count().await, 1);

    // Active and never downgraded: observed, nothing sent
    let report = h.pass().await;
    assert_eq!(report.examined, 1);
    assert_eq!(report.active, 1);
    assert!(h.notifier.calls().is_empty());

    // Canceled: one downgrade
    h.gateway.set_subscription_state(&subscription_id, "4", false);
    let report = h.pass().await;
    assert_eq!(report.degraded, 1);
    assert_eq!(report.notifications_sent, 1);

    // Still canceled: suppressed
    h.pass().await;
    h.pass().await;
    assert_eq!(h.notifier.downgrades_for(external_id.as_str()), 1);

    // Reactivated: one activation carrying the mirrored email
    h.gateway.set_subscription_state(&subscription_id, "1", false);
    h.pass().await;
    h.pass().await;
    assert_eq!(h.notifier.activations_for(external_id.as_str()), 1);
    assert!(h.notifier.calls().contains(&NotifierCall::Activate {
        external_id: external_id.to_string(),
        email: Some("new@example.com".to_string()),
        plan_id: PLAN.to_string(),
    }));

    assert_eq!(
        h.notifications(&external_id).await,
        vec![
            NotificationOutcome::None,
            NotificationOutcome::DowngradeSent,
            NotificationOutcome::Suppressed,
            NotificationOutcome::Suppressed,
            NotificationOutcome::ActivateSent,
            NotificationOutcome::None,
        ]
    );
}

#[tokio::test]
async fn new_customer_downgraded_once_for_morose_subscription() {
    let h = harness(100);
    let (subscription_id, external_id) = h.subscribe("new@example.com").await;

    let suffix = external_id
        .as_str()
        .strip_prefix("cli-")
        .expect("generated external id carries the cli- prefix");
    assert!(uuid::Uuid::parse_str(suffix).is_ok());

    h.gateway.set_subscription_state(&subscription_id, "1", true);
    let report = h.pass().await;
    assert_eq!(report.degraded, 1);
    assert_eq!(h.notifier.downgrades_for(external_id.as_str()), 1);

    // Still morose on later passes: nothing further is sent
    let second = h.pass().await;
    let third = h.pass().await;
    assert_eq!(second.notifications_sent, 0);
    assert_eq!(third.notifications_sent, 0);
    assert_eq!(h.notifier.downgrades_for(external_id.as_str()), 1);
    assert_eq!(h.notifier.activations_for(external_id.as_str()), 0);
}

#[tokio::test]
async fn existing_gateway_customer_is_reused() {
    let h = harness(100);
    h.state
        .create_customer
        .handle(CreateCustomerCommand::new("again@example.com", "Test User"))
        .await
        .unwrap();

    let result = h
        .state
        .create_subscription
        .handle(CreateSubscriptionCommand {
            email: "again@example.com".to_string(),
            plan_id: PLAN.to_string(),
            name: None,
            commerce_order: Some("order-42".to_string()),
        })
        .await
        .unwrap();

    assert!(!result.customer_created);
    assert_eq!(result.subscription.commerce_order, "order-42");
    assert_eq!(h.gateway.call_count("create_customer"), 1);
}

// =============================================================================
// Deliverability
// =============================================================================

#[tokio::test]
async fn undeliverable_email_never_reaches_gateway() {
    let h = harness(100);

    let err = h
        .state
        .create_subscription
        .handle(CreateSubscriptionCommand {
            email: "someone@no-mx.invalid".to_string(),
            plan_id: PLAN.to_string(),
            name: None,
            commerce_order: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, BillingError::UndeliverableEmail(_)));
    assert_eq!(h.gateway.total_calls(), 0);
    assert_eq!(h.mirror.customer_count().await, 0);
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn pass_fetches_every_page() {
    let h = harness(100);
    for i in 0..250 {
        h.gateway.add_subscription(listed(i, "1"));
    }

    let report = h.pass().await;

    assert_eq!(report.examined, 250);
    assert!(report.is_complete());
    assert_eq!(h.log.record_count().await, 250);
    assert_eq!(h.gateway.list_calls_for(PLAN, "1"), 3);
    // Empty status still costs one call
    assert_eq!(h.gateway.list_calls_for(PLAN, "4"), 1);
}

#[tokio::test]
async fn repeated_passes_send_each_downgrade_once() {
    let h = harness(10);
    for i in 0..35 {
        h.gateway.add_subscription(listed(i, if i % 5 == 0 { "4" } else { "1" }));
    }

    for _ in 0..4 {
        h.pass().await;
    }

    let downgrades = h
        .notifier
        .calls()
        .iter()
        .filter(|c| matches!(c, NotifierCall::Downgrade { .. }))
        .count();
    assert_eq!(downgrades, 7);
    assert_eq!(h.log.record_count().await, 35 * 4);
}

#[tokio::test]
async fn customer_on_two_plans_settles_after_one_downgrade() {
    let h = harness_for(100, &[PLAN, "membresia_premium"]);
    h.gateway.add_subscription(Subscription {
        subscription_id: "sus_a".to_string(),
        ..listed(1, "4")
    });
    h.gateway.add_subscription(Subscription {
        subscription_id: "sus_b".to_string(),
        plan_id: "membresia_premium".to_string(),
        ..listed(1, "1")
    });

    for _ in 0..4 {
        h.pass().await;
    }

    assert_eq!(h.notifier.downgrades_for("cli-1"), 1);
    assert_eq!(h.notifier.activations_for("cli-1"), 0);
    assert_eq!(h.log.record_count().await, 8);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn failed_downgrade_is_retried_next_pass() {
    let h = harness(100);
    h.gateway.add_subscription(listed(1, "4"));
    h.notifier.fail_next(NotifierError::Rejected {
        status: 503,
        body: "unavailable".to_string(),
    });

    let first = h.pass().await;
    let second = h.pass().await;
    let third = h.pass().await;

    assert_eq!(first.notification_failures, 1);
    assert_eq!(second.notifications_sent, 1);
    assert_eq!(third.notifications_sent, 0);
    assert_eq!(h.notifier.downgrades_for("cli-1"), 2);
    assert_eq!(
        h.notifications(&ExternalId::new("cli-1").unwrap()).await,
        vec![
            NotificationOutcome::DowngradeFailed,
            NotificationOutcome::DowngradeSent,
            NotificationOutcome::Suppressed,
        ]
    );
}

#[tokio::test]
async fn listing_failure_is_reported_not_raised() {
    let h = harness(100);
    h.gateway.add_subscription(listed(1, "4"));
    h.gateway.set_method_error(
        "list_subscriptions",
        flow_membership::ports::GatewayError::network("list_subscriptions", "connection reset"),
    );

    let report = h.pass().await;

    assert!(!report.is_complete());
    assert_eq!(report.failed_pages.len(), 2);
    assert!(h.notifier.calls().is_empty());

    h.gateway.clear_errors();
    let report = h.pass().await;
    assert!(report.is_complete());
    assert_eq!(h.notifier.downgrades_for("cli-1"), 1);
}

// =============================================================================
// Callbacks share history with passes
// =============================================================================

#[tokio::test]
async fn callback_after_pass_is_suppressed() {
    let h = harness(100);
    h.gateway.add_subscription(listed(7, "4"));
    h.pass().await;

    let params = ParameterSet::new()
        .with("subscriptionId", "sus_7")
        .with("customerId", "cus_7")
        .with("planId", PLAN)
        .with("status", "4")
        .with("customerExternalId", "cli-7");
    let result = h
        .state
        .gateway_callback
        .handle(HandleGatewayCallbackCommand { params })
        .await
        .unwrap();

    assert_eq!(result.observation.notification, NotificationOutcome::Suppressed);
    assert_eq!(h.notifier.downgrades_for("cli-7"), 1);
}
