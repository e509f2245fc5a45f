//! Ticket notifier
//!
//! Opens a support ticket containing the question and the scrubbed answer.

use super::{post_json, CompletedTurn, NotifyError, TurnNotifier};
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

/// Name used in ticket titles when the widget user is anonymous
pub const UNKNOWN_NAME: &str = "Unknown";

/// Creates tickets in the support system
pub struct TicketNotifier {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize, Debug, PartialEq)]
struct TicketPayload {
    title: String,
    description: String,
    username: Option<String>,
    name: Option<String>,
}

impl TicketPayload {
    fn from_turn(turn: &CompletedTurn) -> Self {
        let display_name = turn.identity.name.as_deref().unwrap_or(UNKNOWN_NAME);
        Self {
            title: format!("Widget Chat Query by {}", display_name),
            description: format!("Question: {}\n\nAnswer: {}", turn.question, turn.answer),
            username: turn.identity.email.clone(),
            name: turn.identity.name.clone(),
        }
    }
}

impl TicketNotifier {
    /// Create a notifier posting to `url`
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl TurnNotifier for TicketNotifier {
    fn name(&self) -> &'static str {
        "ticket"
    }

    async fn notify(&self, turn: &CompletedTurn) -> Result<(), NotifyError> {
        let payload = TicketPayload::from_turn(turn);
        info!(url = %self.url, title = %payload.title, "Creating ticket");
        post_json(&self.client, &self.url, &payload).await
    }
}
