//! Out-of-band code delivery
//!
//! The outbound-message channel (mail/SMS) is a collaborator service; this
//! port posts the code to it best-effort. A failed send is logged and never
//! fails the issuing operation — the customer can always read the code from
//! the status event or the next order fetch.

use async_trait::async_trait;

/// Outbound code delivery port
#[async_trait]
pub trait CodeSender: Send + Sync {
    async fn send_code(
        &self,
        customer_id: &str,
        customer_name: &str,
        code: &str,
        expires_at: i64,
    ) -> anyhow::Result<()>;
}

/// Dev/default sender: logs instead of sending
#[derive(Debug, Default)]
pub struct LogCodeSender;

#[async_trait]
impl CodeSender for LogCodeSender {
    async fn send_code(
        &self,
        customer_id: &str,
        customer_name: &str,
        code: &str,
        _expires_at: i64,
    ) -> anyhow::Result<()> {
        tracing::info!(
            customer = %customer_id,
            name = %customer_name,
            code = %code,
            "Skipping outbound send, code logged for dev"
        );
        Ok(())
    }
}

/// Webhook sender: posts the code to a notification service endpoint
#[derive(Debug)]
pub struct WebhookCodeSender {
    client: reqwest::Client,
    url: String,
}

impl WebhookCodeSender {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl CodeSender for WebhookCodeSender {
    async fn send_code(
        &self,
        customer_id: &str,
        customer_name: &str,
        code: &str,
        expires_at: i64,
    ) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "customer_id": customer_id,
            "customer_name": customer_name,
            "code": code,
            "expires_at": expires_at,
        });
        self.client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Best-effort send: failures are logged, never propagated.
pub async fn send_best_effort(
    sender: &dyn CodeSender,
    customer_id: &str,
    customer_name: &str,
    code: &str,
    expires_at: i64,
) {
    if let Err(e) = sender
        .send_code(customer_id, customer_name, code, expires_at)
        .await
    {
        tracing::warn!(customer = %customer_id, error = %e, "Outbound code delivery failed");
    }
}
