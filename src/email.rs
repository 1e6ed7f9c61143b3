use async_trait::async_trait;
use serde_json::json;

use crate::config::MailConfig;

/// Outbound mail seam. OTP and welcome messages only; delivery failure
/// is reported to the caller, who decides whether it matters.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_otp(&self, to: &str, otp: &str) -> anyhow::Result<()>;
    async fn send_welcome(&self, to: &str, name: &str) -> anyhow::Result<()>;
}

/// Mailer backed by an HTTP transactional-mail relay.
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

    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "html": html,
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            anyhow::bail!("mail relay returned {}", resp.status());
        }
        Ok(())
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_otp(&self, to: &str, otp: &str) -> anyhow::Result<()> {
        let html = format!(
            "<p>Your Finsight verification code is <b>{}</b>. It expires in 10 minutes.</p>",
            otp
        );
        self.send(to, "Your Finsight verification code", &html).await
    }

    async fn send_welcome(&self, to: &str, name: &str) -> anyhow::Result<()> {
        let html = format!("<p>Welcome to Finsight, {}!</p>", name);
        self.send(to, "Welcome to Finsight", &html).await
    }
}
