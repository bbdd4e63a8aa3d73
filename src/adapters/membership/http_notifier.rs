//! HTTP membership notifier.
//!
//! Posts JSON to the membership-management service. One call per transition,
//! no retries: a failed call is recorded and picked up by the next pass.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::domain::foundation::ExternalId;
use crate::ports::{MembershipNotifier, NotifierError};

/// Endpoint settings for the membership service.
#[derive(Clone)]
pub struct HttpNotifierConfig {
    pub base_url: String,
    pub activate_path: String,
    pub downgrade_path: String,
    pub bearer_token: Option<SecretString>,
    pub timeout: Duration,
}

impl std::fmt::Debug for HttpNotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpNotifierConfig")
            .field("base_url", &self.base_url)
            .field("activate_path", &self.activate_path)
            .field("downgrade_path", &self.downgrade_path)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivatePayload<'a> {
    external_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    plan_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DowngradePayload<'a> {
    external_id: &'a str,
}

/// Membership notifier over HTTP.
pub struct HttpMembershipNotifier {
    config: HttpNotifierConfig,
    http_client: reqwest::Client,
}

impl HttpMembershipNotifier {
    pub fn new(config: HttpNotifierConfig) -> Result<Self, NotifierError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotifierError::Transport(e.to_string()))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post<T: Serialize + Sync>(&self, path: &str, payload: &T) -> Result<(), NotifierError> {
        let mut request = self.http_client.post(self.url(path)).json(payload);
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NotifierError::Timeout
            } else {
                NotifierError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipNotifier for HttpMembershipNotifier {
    async fn activate(
        &self,
        external_id: &ExternalId,
        email: Option<&str>,
        plan_id: &str,
    ) -> Result<(), NotifierError> {
        let payload = ActivatePayload {
            external_id: external_id.as_str(),
            email,
            plan_id,
        };
        self.post(&self.config.activate_path, &payload).await?;
        tracing::info!(external_id = %external_id, plan_id, "Membership activated");
        Ok(())
    }

    async fn downgrade(&self, external_id: &ExternalId) -> Result<(), NotifierError> {
        let payload = DowngradePayload {
            external_id: external_id.as_str(),
        };
        self.post(&self.config.downgrade_path, &payload).await?;
        tracing::info!(external_id = %external_id, "Membership downgraded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> HttpMembershipNotifier {
        HttpMembershipNotifier::new(HttpNotifierConfig {
            base_url: "http://membership.local/".to_string(),
            activate_path: "/hooks/activate".to_string(),
            downgrade_path: "hooks/downgrade".to_string(),
            bearer_token: Some(SecretString::new("token-123".to_string())),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn url_joins_without_double_slashes() {
        let notifier = notifier();
        assert_eq!(
            notifier.url(&notifier.config.activate_path),
            "http://membership.local/hooks/activate"
        );
        assert_eq!(
            notifier.url(&notifier.config.downgrade_path),
            "http://membership.local/hooks/downgrade"
        );
    }

    #[test]
    fn activate_payload_omits_missing_email() {
        let payload = ActivatePayload {
            external_id: "cli-1",
            email: None,
            plan_id: "plan_a",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({ "externalId": "cli-1", "planId": "plan_a" }));
    }

    #[test]
    fn config_debug_redacts_token() {
        let rendered = format!("{:?}", notifier().config);
        assert!(!rendered.contains("token-123"));
    }
}
