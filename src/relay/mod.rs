//! Stream relay
//!
//! Forwards a session transcript to the upstream chat service and re-emits
//! its newline-delimited JSON response as a lazy stream of scrubbed chunks.
//!
//! The only suspension point while producing chunks is reading the next
//! upstream line. The upstream response is owned by the stream, so dropping
//! the stream (for example when the widget disconnects) closes the
//! connection.

pub mod error;
pub mod lines;
pub mod sse;
pub mod upstream;

pub use error::RelayError;
pub use upstream::{ChatStreamRequest, GenerationOverrides};

use crate::chat::{MessageRole, Session, StreamChunk};
use crate::citations;
use crate::config::UpstreamConfig;
use crate::notify::{CompletedTurn, Notifiers};
use async_stream::stream;
use futures_util::{Stream, StreamExt};
use lines::LineReader;
use reqwest::header;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::io::StreamReader;
use tracing::{debug, error, info, warn};

/// Longest upstream error body kept for logging
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Relays chat turns between sessions and the upstream chat service
#[derive(Clone)]
pub struct Relay {
    client: reqwest::Client,
    endpoint: String,
    overrides: GenerationOverrides,
    read_timeout: Duration,
    notifiers: Arc<Notifiers>,
}

impl Relay {
    /// Create a relay with its own HTTP client
    pub fn new(config: &UpstreamConfig, notifiers: Notifiers) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config, notifiers))
    }

    /// Create a relay around an existing client (shares its connection pool)
    pub fn with_client(
        client: reqwest::Client,
        config: &UpstreamConfig,
        notifiers: Notifiers,
    ) -> Self {
        Self {
            client,
            endpoint: config.chat_url.clone(),
            overrides: GenerationOverrides::default(),
            read_timeout: Duration::from_secs(config.read_timeout_secs),
            notifiers: Arc::new(notifiers),
        }
    }

    /// Replace the generation parameters sent upstream
    pub fn with_overrides(mut self, overrides: GenerationOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Relay one user query as SSE frames
    pub fn frames(
        &self,
        query: String,
        session: Arc<Session>,
    ) -> impl Stream<Item = String> + Send + 'static {
        sse::encode(self.relay(query, session))
    }

    /// Relay one user query
    ///
    /// Yields each upstream chunk with citation markup scrubbed from its
    /// delta content. Any failure is yielded once as `Err` and ends the
    /// stream. Messages already appended to the transcript stay there.
    pub fn relay(
        &self,
        query: String,
        session: Arc<Session>,
    ) -> impl Stream<Item = Result<StreamChunk, RelayError>> + Send + 'static {
        let relay = self.clone();

        stream! {
            session.append(&query, MessageRole::User).await;

            let request = ChatStreamRequest::new(
                session.snapshot().await,
                relay.overrides.clone(),
                session.identity().email.as_deref(),
            );

            info!(
                session_id = %session.id(),
                message_count = request.messages.len(),
                email = ?session.identity().email,
                "Sending chat request"
            );

            let response = match relay.open(&request).await {
                Ok(response) => response,
                Err(e) => {
                    error!(
                        session_id = %session.id(),
                        endpoint = %relay.endpoint,
                        error = %e,
                        "Stream error"
                    );
                    yield Err(e);
                    return;
                }
            };

            let body = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(|e| io::Error::new(io::ErrorKind::Other, e)));
            let mut lines = LineReader::new(StreamReader::new(Box::pin(body)));
            // Raw fragments; scrubbed once at end of turn so a citation split
            // across chunks is still removed.
            let mut accumulated = String::new();

            loop {
                let line = match timeout(relay.read_timeout, lines.next_line()).await {
                    Ok(Ok(Some(line))) => line,
                    Ok(Ok(None)) => break,
                    Ok(Err(e)) => {
                        error!(session_id = %session.id(), error = %e, "Stream error");
                        yield Err(e);
                        return;
                    }
                    Err(_) => {
                        let e = RelayError::Timeout(relay.read_timeout.as_secs());
                        error!(session_id = %session.id(), error = %e, "Stream error");
                        yield Err(e);
                        return;
                    }
                };

                if line.trim().is_empty() {
                    continue;
                }

                let mut chunk: StreamChunk = match serde_json::from_str(&line) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        debug!(error = %e, line_len = line.len(), "Skipping malformed stream line");
                        continue;
                    }
                };

                if let Some(content) = chunk.content() {
                    accumulated.push_str(content);
                }
                chunk.map_content(citations::scrub_fragment);
                let end_turn = chunk.is_end_turn();

                yield Ok(chunk);

                if end_turn && !accumulated.is_empty() {
                    let answer = citations::scrub(&accumulated);
                    accumulated.clear();
                    session.append(&answer, MessageRole::Assistant).await;

                    let turn = CompletedTurn {
                        identity: session.identity().clone(),
                        question: query.clone(),
                        answer,
                        transcript: session.snapshot().await,
                    };
                    relay.notify(turn).await;
                }
            }

            debug!(session_id = %session.id(), "Upstream stream closed");
        }
    }

    /// Send the request and wait for a successful response head
    ///
    /// Both the response head and an error body are bounded by the read
    /// timeout so a stalled upstream still ends the stream.
    async fn open(&self, request: &ChatStreamRequest) -> Result<reqwest::Response, RelayError> {
        let send = self
            .client
            .post(&self.endpoint)
            .header(header::ACCEPT, "*/*")
            .json(request)
            .send();
        let response = timeout(self.read_timeout, send)
            .await
            .map_err(|_| RelayError::Timeout(self.read_timeout.as_secs()))??;

        let status = response.status();
        if !status.is_success() {
            let body = match timeout(self.read_timeout, response.text()).await {
                Ok(Ok(body)) => body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
                _ => "Unable to read error body".to_string(),
            };
            warn!(
                endpoint = %self.endpoint,
                status = status.as_u16(),
                body = %body,
                "Chat service returned error status"
            );
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Run the notifiers in their own task so a disconnecting widget does
    /// not cancel them
    async fn notify(&self, turn: CompletedTurn) {
        if self.notifiers.is_empty() {
            return;
        }
        let notifiers = self.notifiers.clone();
        let task = tokio::spawn(async move { notifiers.dispatch(&turn).await });
        if let Err(e) = task.await {
            error!(error = %e, "Notifier task failed");
        }
    }
}
