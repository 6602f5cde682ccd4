//! Transactional email delivery over the MailerSend REST API.
//!
//! Message bodies are composed upstream (safari-core's `notify` module);
//! this crate only carries them to the relay. [`NullMailer`] stands in when
//! no API key is configured, so keyless runs stay fully functional minus
//! delivery.

use anyhow::anyhow;
use async_trait::async_trait;
use tracing::{debug, info};

use safari_core::{EmailMessage, Mailer, PlannerError, Result};

const API_URL: &str = "https://api.mailersend.com/v1/email";
const DEFAULT_FROM_EMAIL: &str = "noreply@greatriftsafari.com";
const DEFAULT_FROM_NAME: &str = "Great Rift Safari";

/// MailerSend API client.
#[derive(Clone)]
pub struct MailerSendClient {
    api_key: String,
    client: reqwest::Client,
    from_email: String,
    from_name: String,
}

impl MailerSendClient {
    /// Create a new client with the given API key and the default sender.
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            from_email: DEFAULT_FROM_EMAIL.to_string(),
            from_name: DEFAULT_FROM_NAME.to_string(),
        }
    }

    /// Create from environment variables. MAIL_FROM_EMAIL and MAIL_FROM_NAME
    /// override the sender identity.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("MAILERSEND_API_KEY")
            .map_err(|_| anyhow!("MAILERSEND_API_KEY environment variable not set"))?;
        let mut client = Self::new(api_key);
        if let Ok(from_email) = std::env::var("MAIL_FROM_EMAIL") {
            client.from_email = from_email;
        }
        if let Ok(from_name) = std::env::var("MAIL_FROM_NAME") {
            client.from_name = from_name;
        }
        Ok(client)
    }

    fn api_body(&self, message: &EmailMessage) -> serde_json::Value {
        serde_json::json!({
            "from": {
                "email": &self.from_email,
                "name": &self.from_name
            },
            "to": [{"email": &message.to}],
            "subject": &message.subject,
            "html": &message.html_body
        })
    }
}

#[async_trait]
impl Mailer for MailerSendClient {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let response = self
            .client
            .post(API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.api_body(message))
            .send()
            .await
            .map_err(|e| PlannerError::Notification(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // 422 usually means the sending domain is not verified yet.
            let detail = if status.as_u16() == 422 && body.to_lowercase().contains("verified") {
                "email service configuration error: sending domain not verified".to_string()
            } else {
                format!("MailerSend API error {status}: {body}")
            };
            return Err(PlannerError::Notification(detail));
        }

        info!(to = %message.to, subject = %message.subject, "email accepted by relay");
        Ok(())
    }
}

/// Drops every message after logging it. Used when MAILERSEND_API_KEY is
/// absent.
pub struct NullMailer;

#[async_trait]
impl Mailer for NullMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        debug!(to = %message.to, subject = %message.subject, "mail delivery disabled, dropping");
        Ok(())
    }
}
