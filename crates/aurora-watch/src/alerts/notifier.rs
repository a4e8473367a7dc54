use async_trait::async_trait;
use serde::Serialize;

use crate::config::AlertConfig;

pub const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// One outbound message to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Delivery transport for alert notifications (e-mail, push, ...).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Checked once before a run touches any subscription.
    fn ready(&self) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("{0} is not set")]
    MissingCredentials(&'static str),
    #[error("transport unavailable: {0}")]
    Transport(String),
    #[error("rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },
}

/// E-mail delivery through the Resend HTTP API.
#[derive(Debug, Clone)]
pub struct ResendEmailSink {
    http: reqwest::Client,
    api_key: Option<String>,
    from: String,
    endpoint: String,
}

#[derive(Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

impl ResendEmailSink {
    pub fn new(http: reqwest::Client, api_key: Option<String>, from: impl Into<String>) -> Self {
        Self {
            http,
            api_key,
            from: from.into(),
            endpoint: RESEND_ENDPOINT.to_string(),
        }
    }

    /// Every request is bounded by `send_timeout` so a stalled upstream cannot hold a run open.
    pub fn from_config(config: &AlertConfig) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(config.send_timeout)
            .build()
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        Ok(Self::new(
            http,
            config.resend_api_key.clone(),
            config.from_address.clone(),
        ))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn api_key(&self) -> Result<&str, NotifyError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(NotifyError::MissingCredentials("RESEND_API_KEY"))
    }
}

#[async_trait]
impl NotificationSink for ResendEmailSink {
    fn ready(&self) -> Result<(), NotifyError> {
        self.api_key().map(|_| ())
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let api_key = self.api_key()?;
        let payload = ResendEmail {
            from: &self.from,
            to: [notification.recipient.as_str()],
            subject: &notification.subject,
            text: &notification.body,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }
}
