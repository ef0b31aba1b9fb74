use async_trait::async_trait;
use serde::Serialize;

use crate::digest::render_digest;
use crate::{Alert, DispatchError};

/// A fully rendered message ready for the mail collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Outbound mail collaborator. Implementations send exactly once per call;
/// retries belong to whoever invokes [`dispatch`].
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), DispatchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// There were no alerts, so nothing was sent.
    Skipped,
    Sent { alerts: usize, recipients: usize },
}

impl DispatchOutcome {
    #[must_use]
    pub fn alerts_sent(self) -> usize {
        match self {
            DispatchOutcome::Skipped => 0,
            DispatchOutcome::Sent { alerts, .. } => alerts,
        }
    }
}

/// Send one digest covering `alerts` to every recipient.
///
/// An empty alert list is a successful no-op and never touches `sender`.
///
/// # Errors
///
/// Returns [`DispatchError::NoRecipients`] when there is something to send but
/// nobody to send it to, or the sender's error if delivery fails.
pub async fn dispatch<M>(
    sender: &M,
    alerts: &[Alert],
    recipients: &[String],
) -> Result<DispatchOutcome, DispatchError>
where
    M: MailSender + ?Sized,
{
    if alerts.is_empty() {
        tracing::info!("no keyword alerts; skipping digest");
        return Ok(DispatchOutcome::Skipped);
    }
    if recipients.is_empty() {
        return Err(DispatchError::NoRecipients);
    }

    let digest = render_digest(alerts);
    let email = OutboundEmail {
        to: recipients.to_vec(),
        subject: digest.subject,
        html: digest.html,
        text: digest.text,
    };
    sender.send(&email).await?;

    tracing::info!(
        alerts = alerts.len(),
        recipients = recipients.len(),
        "keyword alert digest sent"
    );
    Ok(DispatchOutcome::Sent {
        alerts: alerts.len(),
        recipients: recipients.len(),
    })
}
