use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::config::MailConfig;

/// Notification dispatcher. Delivery is best-effort and happens off the
/// request path; a failed send never fails the operation that queued it.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Production dispatcher posting to an HTTP mail API.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "html": body,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("mail API returned {}", response.status());
        }
        debug!(%to, %subject, "mail dispatched");
        Ok(())
    }
}

/// No-op dispatcher for local development and fake app state.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> anyhow::Result<()> {
        debug!(%to, %subject, "mail suppressed (noop mailer)");
        Ok(())
    }
}
