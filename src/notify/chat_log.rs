//! Chat log notifier
//!
//! Stores the full transcript of a session after each completed turn.

use super::{post_json, CompletedTurn, NotifyError, TurnNotifier};
use crate::chat::Message;
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

/// Posts transcripts to the chat log store
pub struct ChatLogNotifier {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize, Debug)]
struct ChatLogUser<'a> {
    email: Option<&'a str>,
    name: Option<&'a str>,
}

#[derive(Serialize, Debug)]
struct ChatLogPayload<'a> {
    user: ChatLogUser<'a>,
    messages: &'a [Message],
}

impl ChatLogNotifier {
    /// Create a notifier posting to `url`
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl TurnNotifier for ChatLogNotifier {
    fn name(&self) -> &'static str {
        "chat_log"
    }

    async fn notify(&self, turn: &CompletedTurn) -> Result<(), NotifyError> {
        let payload = ChatLogPayload {
            user: ChatLogUser {
                email: turn.identity.email.as_deref(),
                name: turn.identity.name.as_deref(),
            },
            messages: &turn.transcript,
        };

        info!(
            url = %self.url,
            email = ?payload.user.email,
            message_count = payload.messages.len(),
            "Storing chat log"
        );

        post_json(&self.client, &self.url, &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Identity, MessageRole};
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn turn() -> CompletedTurn {
        CompletedTurn {
            identity: Identity::new(Some("ana@example.org".to_string()), Some("Ana".to_string())),
            question: "q".to_string(),
            answer: "a".to_string(),
            transcript: vec![
                Message::new(MessageRole::User, "q"),
                Message::new(MessageRole::Assistant, "a"),
            ],
        }
    }

    #[tokio::test]
    async fn test_posts_transcript_and_identity() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/store_chat")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "user": {"email": "ana@example.org", "name": "Ana"},
                "messages": [
                    {"content": "q", "role": "user"},
                    {"content": "a", "role": "assistant"}
                ]
            })))
            .with_status(200)
            .create_async()
            .await;

        let notifier =
            ChatLogNotifier::new(reqwest::Client::new(), format!("{}/store_chat", server.url()));
        let result = notifier.notify(&turn()).await;

        mock.assert_async().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/store_chat")
            .with_status(500)
            .with_body("db down")
            .create_async()
            .await;

        let notifier =
            ChatLogNotifier::new(reqwest::Client::new(), format!("{}/store_chat", server.url()));
        let result = notifier.notify(&turn()).await;

        mock.assert_async().await;
        match result {
            Err(NotifyError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "db down");
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }
}
