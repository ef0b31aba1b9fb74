//! Outbound mail delivery for alert digests.

use std::time::Duration;

use async_trait::async_trait;
use rankwatch_core::{DispatchError, MailConfig, MailSender, OutboundEmail};
use reqwest::{Client, Url};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailerError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The mail API answered with a non-2xx status.
    #[error("mail API rejected the message (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid mail API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl From<MailerError> for DispatchError {
    fn from(err: MailerError) -> Self {
        match err {
            MailerError::Rejected { status, body } => DispatchError::Rejected { status, body },
            other => DispatchError::Transport(Box::new(other)),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// Sends mail through an HTTP mail API (`POST {base}/emails`, bearer auth).
pub struct HttpMailer {
    client: Client,
    api_key: String,
    from: String,
    endpoint: Url,
}

impl HttpMailer {
    /// # Errors
    ///
    /// Returns [`MailerError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`MailerError::InvalidBaseUrl`] if the configured URL is invalid.
    pub fn new(config: &MailConfig, timeout_secs: u64) -> Result<Self, MailerError> {
        Self::with_base_url(&config.api_key, &config.from, timeout_secs, &config.api_url)
    }

    /// # Errors
    ///
    /// Returns [`MailerError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`MailerError::InvalidBaseUrl`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        from: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, MailerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("rankwatch/0.1 (alert-digest)")
            .build()?;

        let invalid = |reason: String| MailerError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join("emails"))
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            from: from.to_owned(),
            endpoint,
        })
    }

    /// Send one message. No retries; the caller decides whether to try again.
    ///
    /// # Errors
    ///
    /// Returns [`MailerError::Rejected`] on a non-2xx response or
    /// [`MailerError::Http`] on network failure.
    pub async fn send_email(&self, email: &OutboundEmail) -> Result<(), MailerError> {
        let body = SendEmailRequest {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(
            recipients = email.to.len(),
            subject = %email.subject,
            "alert digest accepted by mail API"
        );
        Ok(())
    }
}

#[async_trait]
impl MailSender for HttpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), DispatchError> {
        Ok(self.send_email(email).await?)
    }
}

/// Logs digests instead of delivering them. Used when no mail API is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailSender;

#[async_trait]
impl MailSender for LogMailSender {
    async fn send(&self, email: &OutboundEmail) -> Result<(), DispatchError> {
        tracing::info!(
            to = ?email.to,
            subject = %email.subject,
            "mail API not configured; logging alert digest instead of sending"
        );
        tracing::debug!(body = %email.text, "alert digest body");
        Ok(())
    }
}
