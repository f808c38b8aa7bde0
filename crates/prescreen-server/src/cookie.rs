//! Cookie boundary adapter for the session handle.
//!
//! The `chatSession` cookie carries the JSON-encoded conversation session and
//! is the only session store this proxy has; the server itself is stateless
//! across requests. Serialization to and from the cookie happens here so the
//! services only ever see a [`SessionHandle`].

use axum::http::{header, HeaderMap, HeaderValue};
use prescreen_core::{ConversationSession, SessionHandle};
use serde::Deserialize;

/// Name of the HTTP-only session cookie.
pub const SESSION_COOKIE: &str = "chatSession";

#[derive(Deserialize)]
struct CookieSession {
    #[serde(rename = "sessionId", default)]
    session_id: String,
}

/// Extract the session handle from the request's Cookie header, if any.
/// Malformed cookie values are treated the same as an absent cookie.
pub fn session_from_headers(headers: &HeaderMap) -> Option<SessionHandle> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    let value = raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then_some(value)
    })?;
    let decoded = urlencoding::decode(value).ok()?;
    let session: CookieSession = serde_json::from_str(&decoded).ok()?;
    if session.session_id.is_empty() {
        None
    } else {
        Some(SessionHandle {
            session_id: session.session_id,
        })
    }
}

/// Build the Set-Cookie header persisting a freshly created session.
pub fn set_session_cookie(session: &ConversationSession, secure: bool) -> HeaderValue {
    let json = serde_json::to_string(session).unwrap_or_default();
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax",
        SESSION_COOKIE,
        urlencoding::encode(&json)
    );
    if secure {
        cookie.push_str("; Secure");
    }
    // Percent-encoded ASCII, always a valid header value
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Build the Set-Cookie header that clears the session cookie.
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("chatSession=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}
