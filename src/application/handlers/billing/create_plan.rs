//! CreatePlanHandler - Command handler for defining plans at the gateway.
//!
//! Plan creation is not idempotent at the gateway, so the handler refuses to
//! create the same plan id twice within one process.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::billing::{BillingError, Plan, PlanInterval};
use crate::ports::PaymentGateway;

/// Command to create a plan.
#[derive(Debug, Clone)]
pub struct CreatePlanCommand {
    pub plan_id: String,
    pub name: String,
    pub amount: i64,
    pub interval: PlanInterval,
    pub currency: Option<String>,
    pub interval_count: Option<u32>,
    pub description: Option<String>,
    pub url_callback: Option<String>,
}

impl CreatePlanCommand {
    pub fn new(
        plan_id: impl Into<String>,
        name: impl Into<String>,
        amount: i64,
        interval: PlanInterval,
    ) -> Self {
        Self {
            plan_id: plan_id.into(),
            name: name.into(),
            amount,
            interval,
            currency: None,
            interval_count: None,
            description: None,
            url_callback: None,
        }
    }

    fn into_plan(self) -> Result<Plan, BillingError> {
        let mut plan = Plan::new(self.plan_id, self.name, self.amount, self.interval)?
            .with_description(self.description)
            .with_url_callback(self.url_callback);
        if let Some(currency) = self.currency.as_deref() {
            plan = plan.with_currency(currency)?;
        }
        if let Some(count) = self.interval_count {
            plan = plan.with_interval_count(count)?;
        }
        Ok(plan)
    }
}

/// Outcome for one plan of a batch.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan_id: String,
    pub result: Result<Plan, BillingError>,
}

/// Handler for creating plans.
pub struct CreatePlanHandler {
    gateway: Arc<dyn PaymentGateway>,
    /// Plan ids created (or being created) by this process.
    created: Mutex<HashSet<String>>,
}

impl CreatePlanHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            gateway,
            created: Mutex::new(HashSet::new()),
        }
    }

    pub async fn handle(&self, cmd: CreatePlanCommand) -> Result<Plan, BillingError> {
        let plan = cmd.into_plan()?;

        // Reserve the id so a concurrent request for the same plan fails fast.
        if !self.created.lock().await.insert(plan.plan_id.clone()) {
            return Err(BillingError::plan_already_created(&plan.plan_id));
        }

        match self.gateway.create_plan(&plan).await {
            Ok(created) => {
                tracing::info!(
                    plan_id = %created.plan_id,
                    amount = created.amount,
                    currency = %created.currency,
                    interval = %created.interval,
                    "Plan created"
                );
                Ok(created)
            }
            Err(e) => {
                self.created.lock().await.remove(&plan.plan_id);
                tracing::warn!(plan_id = %plan.plan_id, error = %e, "Plan creation failed");
                Err(e.into())
            }
        }
    }

    /// Creates several plans in order. One failure does not stop the batch.
    pub async fn create_plans(&self, commands: Vec<CreatePlanCommand>) -> Vec<PlanOutcome> {
        let mut outcomes = Vec::with_capacity(commands.len());
        for cmd in commands {
            let plan_id = cmd.plan_id.clone();
            let result = self.handle(cmd).await;
            outcomes.push(PlanOutcome { plan_id, result });
        }
        outcomes
    }
}
