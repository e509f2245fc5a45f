//! Side-effect notifiers
//!
//! Best-effort calls made after an assistant turn completes: the chat log
//! store and the ticket system. Failures are logged and swallowed here so a
//! downstream outage never reaches the chat stream.

pub mod chat_log;
pub mod ticket;

pub use chat_log::ChatLogNotifier;
pub use ticket::TicketNotifier;

use crate::chat::{Identity, Message};
use crate::config::NotifyConfig;
use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Everything a notifier needs to know about a finished turn
#[derive(Debug, Clone)]
pub struct CompletedTurn {
    /// Session identity
    pub identity: Identity,
    /// The user's question for this turn
    pub question: String,
    /// The scrubbed assistant answer
    pub answer: String,
    /// Transcript after the answer was appended
    pub transcript: Vec<Message>,
}

/// Errors returned by a notifier
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The request could not be sent or timed out
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status
    #[error("Endpoint returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
}

/// A best-effort consumer of completed turns
#[async_trait]
pub trait TurnNotifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Report a completed turn
    async fn notify(&self, turn: &CompletedTurn) -> Result<(), NotifyError>;
}

/// Fans a completed turn out to every registered notifier
#[derive(Clone, Default)]
pub struct Notifiers {
    notifiers: Vec<Arc<dyn TurnNotifier>>,
}

impl Notifiers {
    /// Dispatcher with no notifiers
    pub fn none() -> Self {
        Self::default()
    }

    /// Build the chat log and ticket notifiers from configuration
    pub fn from_config(config: &NotifyConfig) -> Result<Self, reqwest::Error> {
        if !config.enabled {
            return Ok(Self::none());
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::none()
            .with(ChatLogNotifier::new(client.clone(), config.chat_log_url.clone()))
            .with(TicketNotifier::new(client, config.ticket_url.clone())))
    }

    /// Register a notifier
    pub fn with(mut self, notifier: impl TurnNotifier + 'static) -> Self {
        self.notifiers.push(Arc::new(notifier));
        self
    }

    /// Number of registered notifiers
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Whether no notifiers are registered
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Run every notifier concurrently, logging failures
    ///
    /// Never fails; each notifier is isolated from the others.
    pub async fn dispatch(&self, turn: &CompletedTurn) {
        let calls = self.notifiers.iter().map(|notifier| async move {
            match notifier.notify(turn).await {
                Ok(()) => debug!(notifier = notifier.name(), "Notification delivered"),
                Err(NotifyError::Status { status, body }) => warn!(
                    notifier = notifier.name(),
                    status = status,
                    body = %body,
                    "Notification rejected"
                ),
                Err(e) => error!(
                    notifier = notifier.name(),
                    error = %e,
                    "Notification failed"
                ),
            }
        });
        join_all(calls).await;
    }
}

/// POST a JSON body and require a 2xx answer
pub(crate) async fn post_json<T: Serialize + ?Sized>(
    client: &reqwest::Client,
    url: &str,
    body: &T,
) -> Result<(), NotifyError> {
    let response = client.post(url).json(body).send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error body".to_string());
    Err(NotifyError::Status {
        status: status.as_u16(),
        body,
    })
}
