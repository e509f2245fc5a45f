//! Relay-specific error types
//!
//! Errors that end a relay stream. Each one is surfaced to the widget as a
//! single in-band error frame.

use thiserror::Error;

/// Errors that can occur while relaying an upstream stream
#[derive(Error, Debug)]
pub enum RelayError {
    /// The request could not be sent (connection refused, DNS, TLS, ...)
    #[error("Failed to reach chat service: {0}")]
    Request(#[from] reqwest::Error),

    /// The upstream answered with a non-2xx status
    ///
    /// The body is kept for logs only; it never reaches the widget.
    #[error("Chat service returned error status {status}")]
    UpstreamStatus {
        /// HTTP status code
        status: u16,
        /// Truncated response body, for diagnostics
        body: String,
    },

    /// The connection failed while the stream was being read
    #[error("Failed to read chat stream: {0}")]
    Read(String),

    /// No response or line arrived within the read timeout
    #[error("Chat stream timed out after {0} seconds")]
    Timeout(u64),
}
