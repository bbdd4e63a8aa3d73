//! HandleGatewayCallbackHandler - Command handler for signed gateway callbacks.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::billing::{BillingError, Subscription};
use crate::domain::foundation::PassId;
use crate::domain::signing::{ParameterSet, Signer};

use super::{Observation, ReconciliationStep};

/// Command carrying the callback's flat parameter map, `s` included.
#[derive(Debug, Clone)]
pub struct HandleGatewayCallbackCommand {
    pub params: ParameterSet,
}

/// Result of callback processing.
#[derive(Debug, Clone, Serialize)]
pub struct HandleGatewayCallbackResult {
    pub pass_id: PassId,
    pub observation: Observation,
}

/// Handler for gateway callbacks.
///
/// Authentic callbacks go through the same reconciliation step as polling
/// passes. A notifier failure still yields `Ok`; the outcome says what
/// happened.
pub struct HandleGatewayCallbackHandler {
    /// `None` when verification is disabled.
    verifier: Option<Signer>,
    step: Arc<ReconciliationStep>,
}

impl HandleGatewayCallbackHandler {
    pub fn new(verifier: Option<Signer>, step: Arc<ReconciliationStep>) -> Self {
        Self { verifier, step }
    }

    pub async fn handle(
        &self,
        cmd: HandleGatewayCallbackCommand,
    ) -> Result<HandleGatewayCallbackResult, BillingError> {
        // 1. Authenticate
        if let Some(verifier) = &self.verifier {
            verifier.verify_params(&cmd.params).map_err(|e| {
                tracing::warn!(
                    error = %e,
                    subscription_id = ?cmd.params.get_text("subscriptionId"),
                    "Rejected gateway callback"
                );
                BillingError::invalid_signature(e)
            })?;
        }

        // 2. Extract the observation
        let subscription = subscription_from_params(&cmd.params)?;

        // 3. Reconcile
        let pass_id = PassId::callback();
        let observation = self.step.process(&pass_id, &subscription).await;
        self.step.locks().prune().await;

        tracing::info!(
            pass_id = %pass_id.as_str(),
            subscription_id = %subscription.subscription_id,
            notification = %observation.notification,
            "Gateway callback processed"
        );

        Ok(HandleGatewayCallbackResult {
            pass_id,
            observation,
        })
    }
}

fn subscription_from_params(params: &ParameterSet) -> Result<Subscription, BillingError> {
    let text = |key: &str| {
        params
            .get_text(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let status = text("status").ok_or_else(|| BillingError::validation("status", "is required"))?;

    Ok(Subscription {
        subscription_id: text("subscriptionId").unwrap_or_default(),
        customer_id: text("customerId").unwrap_or_default(),
        plan_id: text("planId").unwrap_or_default(),
        status,
        morose: text("morose")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true"))
            .unwrap_or(false),
        customer_external_id: text("customerExternalId").or_else(|| text("externalId")),
    })
}
