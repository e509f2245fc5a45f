//! Chat data models
//!
//! Defines transcript messages and the upstream stream chunk shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user
    User,
    /// Message from the assistant/AI
    Assistant,
}

impl MessageRole {
    /// Convert the role to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a transcript
///
/// This is also the shape sent upstream and returned by `/history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Content of the message
    pub content: String,
    /// Role of the message sender
    pub role: MessageRole,
}

impl Message {
    /// Create a new message
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role,
        }
    }
}

/// One newline-delimited JSON object from the upstream stream
///
/// Fields the relay does not look at are kept in `extra` so the chunk is
/// re-emitted to the widget unchanged apart from scrubbed delta content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Candidate choices carrying incremental content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
    /// Set when no further content will arrive for this turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_turn: Option<bool>,
    /// Any other top-level fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A choice within a stream chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Incremental content for this choice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<Delta>,
    /// Any other choice fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Incremental content of a choice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// Text fragment, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Any other delta fields (role, context, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StreamChunk {
    /// Build a chunk carrying a single content fragment
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            choices: Some(vec![Choice {
                delta: Some(Delta {
                    content: Some(content.into()),
                    extra: Map::new(),
                }),
                extra: Map::new(),
            }]),
            ..Default::default()
        }
    }

    /// Content fragment of the first choice
    pub fn content(&self) -> Option<&str> {
        self.choices
            .as_ref()?
            .first()?
            .delta
            .as_ref()?
            .content
            .as_deref()
    }

    /// Whether the chunk marks the end of the assistant turn
    pub fn is_end_turn(&self) -> bool {
        self.end_turn.unwrap_or(false)
    }

    /// Rewrite every delta content fragment in place
    pub fn map_content<F>(&mut self, mut f: F)
    where
        F: FnMut(&str) -> String,
    {
        let Some(choices) = self.choices.as_mut() else {
            return;
        };
        for delta in choices.iter_mut().filter_map(|c| c.delta.as_mut()) {
            if let Some(content) = delta.content.as_mut() {
                *content = f(content);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_role_lowercase() {
        let msg = Message::new(MessageRole::Assistant, "hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"content": "hi", "role": "assistant"}));
    }

    #[test]
    fn test_chunk_preserves_unknown_fields() {
        let line = r#"{"choices":[{"delta":{"content":"x","role":"assistant"},"index":0}],"end_turn":false,"session_state":null}"#;
        let chunk: StreamChunk = serde_json::from_str(line).unwrap();
        let back = serde_json::to_value(&chunk).unwrap();
        assert_eq!(back, serde_json::from_str::<Value>(line).unwrap());
    }

    #[test]
    fn test_chunk_content_and_end_turn() {
        let chunk: StreamChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"abc"}}],"end_turn":true}"#)
                .unwrap();
        assert_eq!(chunk.content(), Some("abc"));
        assert!(chunk.is_end_turn());

        let empty: StreamChunk = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(empty.content(), None);
        assert!(!empty.is_end_turn());
    }

    #[test]
    fn test_chunk_rejects_non_object_lines() {
        assert!(serde_json::from_str::<StreamChunk>("42").is_err());
        assert!(serde_json::from_str::<StreamChunk>(r#"{"choices": "nope"}"#).is_err());
        assert!(serde_json::from_str::<StreamChunk>("not json").is_err());
    }

    #[test]
    fn test_map_content_touches_every_choice() {
        let mut chunk: StreamChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"content":"a"}},{"delta":{}},{"delta":{"content":"b"}}]}"#,
        )
        .unwrap();
        chunk.map_content(|s| s.to_uppercase());
        let choices = chunk.choices.unwrap();
        assert_eq!(choices[0].delta.as_ref().unwrap().content.as_deref(), Some("A"));
        assert_eq!(choices[1].delta.as_ref().unwrap().content, None);
        assert_eq!(choices[2].delta.as_ref().unwrap().content.as_deref(), Some("B"));
    }
}
