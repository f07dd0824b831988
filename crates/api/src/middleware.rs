//! The authorization gate.
//!
//! The single place that decides whether a request may proceed and what
//! identity context it carries forward. Requests to paths outside the
//! configured protected set bypass the gate entirely; everything else must
//! present a verifiable session cookie or is redirected to sign-in. Every
//! failure path (missing cookie, malformed token, expired token, signature
//! mismatch) produces the same redirect: the client never learns which one
//! it was.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use boltline_auth::SessionCodec;

use crate::context::SessionContext;

/// Cookie holding the signed session token.
pub const SESSION_COOKIE: &str = "access_token";

/// Route clients are sent to when no valid session is found.
pub const SIGN_IN_PATH: &str = "/sign-in";

/// The configured protected surface.
///
/// Matching is exact for the root pattern `/` and exact-or-prefix (on `/`
/// boundaries) for everything else; no wildcard algebra.
#[derive(Debug, Clone)]
pub struct ProtectedPaths {
    patterns: Vec<String>,
}

impl ProtectedPaths {
    pub fn new(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern_matches(pattern, path))
    }
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    if pattern == "/" {
        return path == "/";
    }
    path == pattern
        || path
            .strip_prefix(pattern)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[derive(Clone)]
pub struct GateState {
    pub codec: Arc<SessionCodec>,
    pub protected: Arc<ProtectedPaths>,
}

pub async fn session_gate(
    State(state): State<GateState>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if !state.protected.matches(&path) {
        return next.run(req).await;
    }

    let Some(token) = extract_session_cookie(req.headers()).map(str::to_string) else {
        tracing::debug!(path = %path, "protected request without session cookie");
        return redirect_to_sign_in(&path);
    };

    let session = match state.codec.verify(&token, Utc::now()) {
        Ok(session) => session,
        Err(e) => {
            // The reason stays in the logs; the client only sees the redirect.
            tracing::debug!(path = %path, error = %e, "session verification failed");
            return redirect_to_sign_in(&path);
        }
    };

    let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {token}")) else {
        return redirect_to_sign_in(&path);
    };

    let headers = req.headers_mut();
    headers.insert(header::AUTHORIZATION, bearer);
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    req.extensions_mut().insert(SessionContext::new(session));

    next.run(req).await
}

fn extract_session_cookie(headers: &HeaderMap) -> Option<&str> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;

    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then_some(value)
    })
}

fn redirect_to_sign_in(from: &str) -> Response {
    let target = format!("{SIGN_IN_PATH}?from={}", urlencoding::encode(from));
    Redirect::temporary(&target).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protected() -> ProtectedPaths {
        ProtectedPaths::new(["/", "/customers", "/imports"])
    }

    #[test]
    fn root_pattern_matches_only_the_root() {
        let paths = protected();
        assert!(paths.matches("/"));
        assert!(!paths.matches("/health"));
        assert!(!paths.matches("/sign-in"));
    }

    #[test]
    fn patterns_match_exact_and_nested_paths() {
        let paths = protected();
        assert!(paths.matches("/customers"));
        assert!(paths.matches("/customers/42"));
        assert!(paths.matches("/imports/templates/3"));
        assert!(!paths.matches("/customersarchive"));
        assert!(!paths.matches("/screws"));
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=abc.def.ghi; lang=de"),
        );
        assert_eq!(extract_session_cookie(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_or_foreign_cookies_yield_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_session_cookie(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(extract_session_cookie(&headers), None);
    }
}
