//! Session cookie handling
//!
//! The widget is identified by a session id carried in a cookie. Handlers
//! read it from the request and echo it back on every response.

use crate::chat::{Session, SessionStore};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use std::sync::Arc;
use tracing::warn;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "relay_session";

/// Extract the session id from the `Cookie` headers, if any
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Resolve the caller's session, creating an anonymous one when unknown
pub async fn resolve_session(store: &dyn SessionStore, headers: &HeaderMap) -> Arc<Session> {
    let id = session_id_from_headers(headers);
    store.get_or_create(id.as_deref()).await
}

/// Attach the session cookie to a response
pub fn with_session_cookie(mut response: Response, session: &Session) -> Response {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE,
        session.id()
    );
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => warn!(session_id = %session.id(), error = %e, "Invalid session cookie value"),
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Identity, InMemorySessionStore};
    use axum::response::IntoResponse;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_session_id_from_cookie_header() {
        let h = headers("theme=dark; relay_session=20240409101500-abcd1234; other=1");
        assert_eq!(
            session_id_from_headers(&h).as_deref(),
            Some("20240409101500-abcd1234")
        );
    }

    #[test]
    fn test_missing_or_empty_cookie() {
        assert_eq!(session_id_from_headers(&HeaderMap::new()), None);
        assert_eq!(session_id_from_headers(&headers("relay_session=")), None);
        assert_eq!(session_id_from_headers(&headers("relay_sessionx=1")), None);
    }

    #[tokio::test]
    async fn test_resolve_session_reuses_cookie() {
        let store = InMemorySessionStore::new();
        let session = store.create(Identity::default()).await;
        let cookie = format!("{}={}", SESSION_COOKIE, session.id());

        let resolved = resolve_session(&store, &headers(&cookie)).await;
        assert_eq!(resolved.id(), session.id());

        let fresh = resolve_session(&store, &HeaderMap::new()).await;
        assert_ne!(fresh.id(), session.id());
    }

    #[test]
    fn test_with_session_cookie_sets_header() {
        let session = Session::new(Identity::default());
        let response = with_session_cookie(().into_response(), &session);
        let cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(cookie
            .to_str()
            .unwrap()
            .starts_with(&format!("relay_session={};", session.id())));
    }
}
