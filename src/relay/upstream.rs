//! Upstream chat service request types
//!
//! Structs that mirror the JSON body expected by the streaming chat endpoint.

use crate::chat::Message;
use serde::Serialize;
use serde_json::Value;

/// Fixed generation parameters sent with every request
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GenerationOverrides {
    /// Sampling temperature
    pub temperature: f64,
    /// Number of retrieved documents
    pub top: u32,
    /// Retrieval mode ("hybrid", "text" or "vectors")
    pub retrieval_mode: String,
    /// Whether semantic ranking is applied to retrieval results
    pub semantic_ranker: bool,
    /// Whether the service should propose follow-up questions
    pub suggest_followup_questions: bool,
}

impl Default for GenerationOverrides {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top: 3,
            retrieval_mode: "hybrid".to_string(),
            semantic_ranker: true,
            suggest_followup_questions: true,
        }
    }
}

/// Claims identifying the widget user to the chat service
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AuthClaims {
    /// User email
    pub email: String,
}

/// Request context
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RequestContext {
    /// Generation parameters
    pub overrides: GenerationOverrides,
    /// Present only when the session has a known email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_claims: Option<AuthClaims>,
}

/// Body of the streaming chat request
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatStreamRequest {
    /// Full transcript, oldest first
    pub messages: Vec<Message>,
    /// Generation context
    pub context: RequestContext,
    /// Always sent as `null`
    pub session_state: Option<Value>,
}

impl ChatStreamRequest {
    /// Build a request from a transcript snapshot
    pub fn new(
        messages: Vec<Message>,
        overrides: GenerationOverrides,
        email: Option<&str>,
    ) -> Self {
        Self {
            messages,
            context: RequestContext {
                overrides,
                auth_claims: email.map(|email| AuthClaims {
                    email: email.to_string(),
                }),
            },
            session_state: None,
        }
    }
}
