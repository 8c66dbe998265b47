//! Best-effort delivery to the external automation webhooks.
//!
//! Delivery never fails the caller: every attempt resolves to a
//! [`DeliveryOutcome`] that is logged and counted, and the handler decides
//! what to echo back.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use strum::IntoStaticStr;

#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryOutcome {
    /// 2xx from the webhook, with its JSON body when it sent one.
    Delivered { status: u16, body: Option<Value> },
    /// The webhook answered with a non-success status.
    Rejected { status: u16, body: String },
    /// The request never completed.
    Failed { reason: String },
}

impl DeliveryOutcome {
    pub fn label(&self) -> &'static str {
        self.into()
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, payload: &Value) -> DeliveryOutcome;
}

pub struct WebhookClient {
    http: Client,
    url: String,
    target: &'static str,
}

impl WebhookClient {
    /// `target` names the webhook in logs and metrics.
    pub fn new(url: impl Into<String>, target: &'static str) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
            target,
        }
    }

    async fn send(&self, payload: &Value) -> DeliveryOutcome {
        let response = match self.http.post(&self.url).json(payload).send().await {
            Ok(response) => response,
            Err(e) => {
                return DeliveryOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                return DeliveryOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        if status.is_success() {
            DeliveryOutcome::Delivered {
                status: status.as_u16(),
                body: serde_json::from_str(&text).ok(),
            }
        } else {
            DeliveryOutcome::Rejected {
                status: status.as_u16(),
                body: text,
            }
        }
    }
}

#[async_trait]
impl Notifier for WebhookClient {
    async fn notify(&self, payload: &Value) -> DeliveryOutcome {
        let outcome = self.send(payload).await;

        match &outcome {
            DeliveryOutcome::Delivered { status, .. } => {
                tracing::info!(target_hook = self.target, status, "Webhook delivered");
            }
            DeliveryOutcome::Rejected { status, body } => {
                tracing::warn!(target_hook = self.target, status, body = %body, "Webhook rejected payload");
            }
            DeliveryOutcome::Failed { reason } => {
                tracing::warn!(target_hook = self.target, reason = %reason, "Webhook delivery failed");
            }
        }
        metrics::counter!(
            "webhook_deliveries_total",
            "target" => self.target,
            "outcome" => outcome.label()
        )
        .increment(1);

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_labels() {
        let delivered = DeliveryOutcome::Delivered { status: 200, body: None };
        let rejected = DeliveryOutcome::Rejected { status: 404, body: String::new() };
        let failed = DeliveryOutcome::Failed { reason: "refused".into() };
        assert_eq!(delivered.label(), "delivered");
        assert_eq!(rejected.label(), "rejected");
        assert_eq!(failed.label(), "failed");
        assert!(delivered.is_delivered());
        assert!(!failed.is_delivered());
    }

    #[tokio::test]
    async fn unreachable_webhook_resolves_to_failed() {
        // port 9 (discard) on localhost is closed in test environments
        let client = WebhookClient::new("http://127.0.0.1:9/hook", "test");
        let outcome = client.notify(&serde_json::json!({ "x": 1 })).await;
        assert!(matches!(outcome, DeliveryOutcome::Failed { .. }));
    }
}
