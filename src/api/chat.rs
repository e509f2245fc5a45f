//! Chat widget API endpoints
//!
//! Page load, chat streaming, history and clear. Every endpoint works on the
//! session named by the caller's session cookie.

use crate::api::session::{resolve_session, session_id_from_headers, with_session_cookie};
use crate::api::streaming::create_sse_response;
use crate::chat::{Identity, Message, SessionStore};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Maximum chat message length in characters
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// Identity passed by the host page on load
#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    /// User email
    pub email: Option<String>,
    /// Display name
    pub name: Option<String>,
}

/// Page load response
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    /// Always "ok"
    pub status: String,
    /// The newly started session
    pub session_id: String,
}

/// Chat request body
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    /// The user's message
    #[serde(default)]
    pub message: Option<String>,
}

/// Transcript response
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// Messages, oldest first
    pub messages: Vec<Message>,
}

/// Generic status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Operation status
    pub status: String,
}

/// Validate a chat message
///
/// # Returns
/// * `Ok(&str)` - The message, unchanged
/// * `Err(AppError)` - Message is absent, empty or too long
pub fn validate_message(message: Option<&str>) -> Result<&str, AppError> {
    let message = message
        .filter(|m| !m.is_empty())
        .ok_or(AppError::MissingMessage)?;
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(AppError::MessageTooLong(MAX_MESSAGE_LENGTH));
    }
    Ok(message)
}

/// GET / - Start a new widget session
///
/// Captures the optional `email` and `name` query parameters as the
/// session identity; they cannot change for the life of the session.
pub async fn index(State(state): State<AppState>, Query(params): Query<IndexParams>) -> Response {
    let identity = Identity::new(params.email, params.name);
    if identity.email.is_none() {
        info!("No email parameter received");
    }

    let session = state.sessions.create(identity).await;
    let body = Json(IndexResponse {
        status: "ok".to_string(),
        session_id: session.id().to_string(),
    });
    with_session_cookie(body.into_response(), &session)
}

/// POST /chat - Stream the assistant's answer as Server-Sent Events
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection, "Rejected chat body");
            ChatRequest::default()
        }
    };
    let message = validate_message(request.message.as_deref())?.to_string();

    let session = resolve_session(state.sessions.as_ref(), &headers).await;
    info!(
        session_id = %session.id(),
        message_len = message.len(),
        "Chat request received"
    );

    let frames = state.relay.frames(message, session.clone());
    let response = create_sse_response(frames)?;
    Ok(with_session_cookie(response, &session))
}

/// GET /history - Return the session transcript
pub async fn history(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = resolve_session(state.sessions.as_ref(), &headers).await;
    let body = Json(HistoryResponse {
        messages: session.snapshot().await,
    });
    with_session_cookie(body.into_response(), &session)
}

/// POST /clear - Clear the session transcript
///
/// Succeeds even when the caller has no session.
pub async fn clear(State(state): State<AppState>, headers: HeaderMap) -> Json<StatusResponse> {
    if let Some(id) = session_id_from_headers(&headers) {
        if let Some(session) = state.sessions.get(&id).await {
            session.clear().await;
        }
    }
    Json(StatusResponse {
        status: "success".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::session::SESSION_COOKIE;
    use crate::chat::{InMemorySessionStore, MessageRole};
    use crate::config::UpstreamConfig;
    use crate::notify::Notifiers;
    use crate::relay::Relay;
    use axum::http::{header, HeaderValue, StatusCode};
    use mockito::Server;
    use std::sync::Arc;

    fn create_test_state(chat_url: &str) -> AppState {
        let config = UpstreamConfig {
            chat_url: chat_url.to_string(),
            connect_timeout_secs: 5,
            read_timeout_secs: 5,
        };
        let relay = Relay::with_client(reqwest::Client::new(), &config, Notifiers::none());
        AppState::new(Arc::new(InMemorySessionStore::new()), relay)
    }

    fn cookie_headers(session_id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, session_id)).unwrap(),
        );
        headers
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_validate_message() {
        assert!(matches!(validate_message(None), Err(AppError::MissingMessage)));
        assert!(matches!(validate_message(Some("")), Err(AppError::MissingMessage)));
        assert_eq!(validate_message(Some("hi")).unwrap(), "hi");

        let long = "a".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(matches!(
            validate_message(Some(&long)),
            Err(AppError::MessageTooLong(_))
        ));
    }

    #[tokio::test]
    async fn test_chat_without_message_is_bad_request() {
        let state = create_test_state("http://127.0.0.1:9/chat/stream");
        let result = chat(
            State(state.clone()),
            HeaderMap::new(),
            Ok(Json(ChatRequest { message: None })),
        )
        .await;

        let Err(err) = result else {
            panic!("Expected MissingMessage error");
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "No message provided");
        assert_eq!(state.sessions.len().await, 0);
    }

    #[tokio::test]
    async fn test_index_captures_identity() {
        let state = create_test_state("http://127.0.0.1:9/chat/stream");
        let params = IndexParams {
            email: Some("ana@example.org".to_string()),
            name: Some("Ana".to_string()),
        };
        let response = index(State(state.clone()), Query(params)).await;
        assert!(response.headers().get(header::SET_COOKIE).is_some());

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        let session_id = body["session_id"].as_str().unwrap();
        let session = state.sessions.get(session_id).await.unwrap();
        assert_eq!(session.identity().email.as_deref(), Some("ana@example.org"));
        assert_eq!(session.identity().name.as_deref(), Some("Ana"));
    }

    #[tokio::test]
    async fn test_history_and_clear() {
        let state = create_test_state("http://127.0.0.1:9/chat/stream");
        let session = state.sessions.create(Identity::default()).await;
        session.append("hello", MessageRole::User).await;
        session.append("hi there [1]", MessageRole::Assistant).await;

        let response = history(State(state.clone()), cookie_headers(session.id())).await;
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "messages": [
                    {"content": "hello", "role": "user"},
                    {"content": "hi there", "role": "assistant"}
                ]
            })
        );

        let cleared = clear(State(state.clone()), cookie_headers(session.id())).await;
        assert_eq!(cleared.0.status, "success");
        assert!(session.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_without_session_succeeds() {
        let state = create_test_state("http://127.0.0.1:9/chat/stream");
        let cleared = clear(State(state.clone()), HeaderMap::new()).await;
        assert_eq!(cleared.0.status, "success");
        assert_eq!(state.sessions.len().await, 0);
    }

    #[tokio::test]
    async fn test_chat_streams_scrubbed_frames() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/stream")
            .with_status(200)
            .with_header("content-type", "application/x-ndjson")
            .with_body(concat!(
                "{\"choices\":[{\"delta\":{\"content\":\"Drink water \"}}]}\n",
                "{\"choices\":[{\"delta\":{\"content\":\"[guide.pdf#page=1]\"}}],\"end_turn\":true}\n",
            ))
            .create_async()
            .await;

        let state = create_test_state(&format!("{}/chat/stream", server.url()));
        let session = state.sessions.create(Identity::default()).await;

        let response = chat(
            State(state.clone()),
            cookie_headers(session.id()),
            Ok(Json(ChatRequest {
                message: Some("What helps?".to_string()),
            })),
        )
        .await
        .unwrap();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );

        let body = body_string(response).await;
        mock.assert_async().await;
        assert_eq!(
            body,
            concat!(
                "data: {\"choices\":[{\"delta\":{\"content\":\"Drink water \"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"\"}}],\"end_turn\":true}\n\n",
            )
        );

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1].content, "Drink water");
    }
}
