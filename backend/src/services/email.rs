//! Outgoing email: automations enqueue messages, one background task relays
//! them over HTTP.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("invalid recipient address: {0}")]
    InvalidRecipient(String),
    #[error("email outbox is closed")]
    Closed,
    #[error("relay request failed: {0}")]
    Relay(#[from] reqwest::Error),
    #[error("relay responded with status {0}")]
    Status(u16),
}

/// Sending half of the outbox. Cheap to clone.
#[derive(Clone)]
pub struct EmailOutbox {
    tx: UnboundedSender<OutgoingEmail>,
}

impl EmailOutbox {
    pub fn channel() -> (Self, UnboundedReceiver<OutgoingEmail>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        if !email.to.contains('@') {
            return Err(EmailError::InvalidRecipient(email.to));
        }
        self.tx.send(email).map_err(|_| EmailError::Closed)
    }
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Posts queued emails as JSON to `EMAIL_RELAY_URL`.
pub struct EmailRelay {
    client: reqwest::Client,
    url: Option<String>,
    from: String,
}

impl EmailRelay {
    pub fn new(url: Option<String>, from: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            from: from.into(),
        }
    }

    pub async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let Some(url) = &self.url else {
            log::info!(
                "No email relay configured, dropping email to {} ({})",
                email.to,
                email.subject
            );
            return Ok(());
        };

        let response = self
            .client
            .post(url)
            .json(&RelayRequest {
                from: &self.from,
                to: &email.to,
                subject: &email.subject,
                body: &email.body,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EmailError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    /// Drain the outbox until every sender is dropped.
    pub async fn run(self, mut rx: UnboundedReceiver<OutgoingEmail>) {
        log::info!("Email relay worker started");
        while let Some(email) = rx.recv().await {
            match self.send(&email).await {
                Ok(()) => log::debug!("Email to {} relayed", email.to),
                Err(e) => log::error!("Failed to relay email to {}: {}", email.to, e),
            }
        }
        log::info!("Email outbox closed, relay worker stopping");
    }
}
