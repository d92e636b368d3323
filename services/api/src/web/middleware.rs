//! services/api/src/web/middleware.rs
//!
//! Request authentication and per-request logging.

use axum::{
    body::Body,
    extract::{FromRequestParts, MatchedPath},
    http::{header, request::Parts, Request, Response},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::OnResponse;
use tracing::{info, info_span, Span};

use crate::auth::Identity;
use crate::web::error::RequestError;
use crate::web::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "jwt";

/// Log target of the one-line-per-request access log.
pub const REQUEST_LOG_TARGET: &str = "mesto::request";

//=========================================================================================
// Authentication
//=========================================================================================

/// Finds the session token: the `jwt` cookie first, then an
/// `Authorization: Bearer` header.
fn session_token(parts: &Parts) -> Option<&str> {
    let prefix = format!("{SESSION_COOKIE}=");
    let from_cookie = parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| pair.trim().strip_prefix(prefix.as_str()))
        .filter(|token| !token.is_empty());

    from_cookie.or_else(|| {
        parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    })
}

/// Authenticates the request from its session token alone; the store is never
/// consulted, so a token outlives a deleted account until it expires.
impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = RequestError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts)
            .ok_or_else(|| RequestError::unauthorized("authorization required"))?;

        let subject = state.tokens.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
            RequestError::unauthorized("invalid authorization token")
        })?;

        Ok(Identity::new(subject))
    }
}

//=========================================================================================
// Request Logging
//=========================================================================================

/// Opens the span every log line of a request is recorded under.
pub fn make_span(request: &Request<Body>) -> Span {
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        http.target = %request.uri(),
    )
}

/// Writes one access-log line per completed request.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogResponse;

impl<B> OnResponse<B> for LogResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
        info!(
            target: REQUEST_LOG_TARGET,
            status = response.status().as_u16(),
            latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            "request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(headers: &[(header::HeaderName, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/users/me");
        for (name, value) in headers {
            builder = builder.header(name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn token_is_read_from_the_session_cookie() {
        let parts = parts(&[(header::COOKIE, "theme=dark; jwt=abc.def.ghi; lang=en")]);
        assert_eq!(session_token(&parts), Some("abc.def.ghi"));
    }

    #[test]
    fn cookie_wins_over_bearer_header() {
        let parts = parts(&[
            (header::COOKIE, "jwt=from-cookie"),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(session_token(&parts), Some("from-cookie"));
    }

    #[test]
    fn bearer_header_is_the_fallback() {
        let parts = parts(&[(header::AUTHORIZATION, "Bearer from-header")]);
        assert_eq!(session_token(&parts), Some("from-header"));
    }

    #[test]
    fn missing_or_empty_tokens_are_absent() {
        assert_eq!(session_token(&parts(&[])), None);
        assert_eq!(session_token(&parts(&[(header::COOKIE, "jwt=")])), None);
        assert_eq!(session_token(&parts(&[(header::AUTHORIZATION, "Basic abc")])), None);
        assert_eq!(session_token(&parts(&[(header::COOKIE, "notjwt=abc")])), None);
    }
}
