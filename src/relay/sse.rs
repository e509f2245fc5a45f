//! Server-Sent Events framing
//!
//! Every frame is `data: <json>` followed by a blank line.

use crate::chat::StreamChunk;
use crate::relay::error::RelayError;
use futures_util::{Stream, StreamExt};
use serde_json::json;

/// SSE data prefix
pub const SSE_DATA_PREFIX: &str = "data: ";

/// Frame carrying one chunk
pub fn chunk_frame(chunk: &StreamChunk) -> String {
    match serde_json::to_string(chunk) {
        Ok(data) => format!("{}{}\n\n", SSE_DATA_PREFIX, data),
        Err(e) => error_frame(&format!("Failed to encode chunk: {}", e)),
    }
}

/// Terminal frame carrying an error message
pub fn error_frame(message: &str) -> String {
    format!("{}{}\n\n", SSE_DATA_PREFIX, json!({ "error": message }))
}

/// Encode relay events as SSE frames
pub fn encode<S>(events: S) -> impl Stream<Item = String>
where
    S: Stream<Item = Result<StreamChunk, RelayError>>,
{
    events.map(|event| match event {
        Ok(chunk) => chunk_frame(&chunk),
        Err(e) => error_frame(&e.to_string()),
    })
}
