//! Recording membership notifier for testing.
//!
//! Records every call and can be told to fail, so tests can assert exactly
//! which transitions were attempted.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::foundation::ExternalId;
use crate::ports::{MembershipNotifier, NotifierError};

/// A recorded notifier call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    Activate {
        external_id: String,
        email: Option<String>,
        plan_id: String,
    },
    Downgrade {
        external_id: String,
    },
}

#[derive(Default)]
struct RecordingState {
    calls: Vec<NotifierCall>,
    /// Failures consumed one per call, before `fail_all` is checked.
    queued_failures: VecDeque<NotifierError>,
    fail_all: Option<NotifierError>,
}

/// Notifier that records calls instead of sending them.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    inner: Arc<Mutex<RecordingState>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: NotifierError) {
        self.inner.lock().unwrap().queued_failures.push_back(error);
    }

    /// Make every call fail until `recover` is called.
    pub fn fail_all(&self, error: NotifierError) {
        self.inner.lock().unwrap().fail_all = Some(error);
    }

    pub fn recover(&self) {
        let mut state = self.inner.lock().unwrap();
        state.fail_all = None;
        state.queued_failures.clear();
    }

    pub fn calls(&self) -> Vec<NotifierCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Downgrade calls for an external id.
    pub fn downgrades_for(&self, external_id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, NotifierCall::Downgrade { external_id: id } if id == external_id))
            .count()
    }

    /// Activate calls for an external id.
    pub fn activations_for(&self, external_id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, NotifierCall::Activate { external_id: id, .. } if id == external_id))
            .count()
    }

    fn record(&self, call: NotifierCall) -> Result<(), NotifierError> {
        let mut state = self.inner.lock().unwrap();
        state.calls.push(call);
        if let Some(error) = state.queued_failures.pop_front() {
            return Err(error);
        }
        match &state.fail_all {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MembershipNotifier for RecordingNotifier {
    async fn activate(
        &self,
        external_id: &ExternalId,
        email: Option<&str>,
        plan_id: &str,
    ) -> Result<(), NotifierError> {
        self.record(NotifierCall::Activate {
            external_id: external_id.to_string(),
            email: email.map(str::to_string),
            plan_id: plan_id.to_string(),
        })
    }

    async fn downgrade(&self, external_id: &ExternalId) -> Result<(), NotifierError> {
        self.record(NotifierCall::Downgrade {
            external_id: external_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_in_order() {
        let notifier = RecordingNotifier::new();
        let id = ExternalId::new("cli-1").unwrap();

        notifier.downgrade(&id).await.unwrap();
        notifier.activate(&id, Some("a@b.cl"), "plan_a").await.unwrap();

        assert_eq!(notifier.downgrades_for("cli-1"), 1);
        assert_eq!(notifier.activations_for("cli-1"), 1);
        assert!(matches!(notifier.calls()[0], NotifierCall::Downgrade { .. }));
    }

    #[tokio::test]
    async fn fail_next_fails_once() {
        let notifier = RecordingNotifier::new();
        let id = ExternalId::new("cli-1").unwrap();
        notifier.fail_next(NotifierError::Timeout);

        assert_eq!(notifier.downgrade(&id).await, Err(NotifierError::Timeout));
        assert!(notifier.downgrade(&id).await.is_ok());
        assert_eq!(notifier.downgrades_for("cli-1"), 2);
    }

    #[tokio::test]
    async fn fail_all_until_recovered() {
        let notifier = RecordingNotifier::new();
        let id = ExternalId::new("cli-1").unwrap();
        notifier.fail_all(NotifierError::Transport("refused".to_string()));

        assert!(notifier.downgrade(&id).await.is_err());
        assert!(notifier.downgrade(&id).await.is_err());

        notifier.recover();
        assert!(notifier.downgrade(&id).await.is_ok());
    }
}
