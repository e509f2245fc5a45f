//! Conversation transcript
//!
//! Append-only, ordered record of the messages exchanged in one session.

use crate::chat::models::{Message, MessageRole};
use crate::citations;
use chrono::Utc;
use tracing::info;

/// Number of characters of content shown in audit records
pub const AUDIT_PREVIEW_CHARS: usize = 50;

/// Ordered user/assistant messages for a single session
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
    /// Correlation id, regenerated whenever the transcript is cleared
    conversation_id: String,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            conversation_id: new_conversation_id(),
        }
    }

    /// Append a message
    ///
    /// Assistant content is scrubbed of citations before storage; user
    /// content is stored verbatim.
    pub fn append(&mut self, content: &str, role: MessageRole) {
        let content = match role {
            MessageRole::Assistant => citations::scrub(content),
            MessageRole::User => content.to_string(),
        };

        info!(
            target: "audit",
            conversation_id = %self.conversation_id,
            role = %role,
            preview = %preview(&content),
            "Added message"
        );

        self.messages.push(Message::new(role, content));
    }

    /// Ordered copy of the messages, ready to send upstream
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Drop every message and start a new correlation id
    pub fn clear(&mut self) {
        self.messages.clear();
        self.conversation_id = new_conversation_id();
        info!(target: "audit", conversation_id = %self.conversation_id, "Chat history cleared");
    }

    /// Number of stored messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript holds no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Current correlation id
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }
}

fn new_conversation_id() -> String {
    Utc::now().format("%Y%m%d%H%M%S").to_string()
}

fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(AUDIT_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
