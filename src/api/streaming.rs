//! Streaming utilities for Server-Sent Events (SSE)
//!
//! Wraps a stream of pre-encoded SSE frames in an HTTP response.

use crate::error::AppError;
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use futures_util::{Stream, StreamExt};

/// Build a `text/event-stream` response from SSE frames
///
/// The body pulls frames lazily; when the client goes away the body is
/// dropped, and with it the frame stream and its upstream connection.
pub fn create_sse_response<S>(frames: S) -> Result<Response, AppError>
where
    S: Stream<Item = String> + Send + 'static,
{
    let body = frames.map(Ok::<_, std::io::Error>);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(body))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build SSE response: {}", e)))
}
