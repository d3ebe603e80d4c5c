//! Access gate: one middleware in front of every route.
//!
//! Classifies the request into an access tier, verifies the token (bearer
//! header first, then the session cookie), and either attaches the caller or
//! rejects the request. Browser navigations get redirects; API calls get
//! JSON errors.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tracing::debug;

use shopfront_auth::{AccessDenied, Identity, TokenService, authorize, classify};

use crate::app::errors;
use crate::context::{CallerContext, SessionSettings};

pub const SESSION_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn TokenService>,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenSource {
    Bearer,
    Cookie,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let tier = classify(req.method().as_str(), req.uri().path());

    let presented = extract_token(req.headers());
    let identity = presented.and_then(|(token, source)| match state.tokens.verify(token, Utc::now()) {
        Ok(claims) => Some(Identity::from(claims)),
        Err(err) => {
            debug!(?source, error = %err, "token rejected");
            None
        }
    });
    // Any token that failed verification ends the browser session too.
    let stale_session = identity.is_none() && presented.is_some();
    let browser = wants_html(req.headers());

    let mut response = match authorize(tier, identity.as_ref()) {
        Ok(()) => {
            if let Some(identity) = identity {
                req.extensions_mut().insert(CallerContext::new(identity));
            }
            next.run(req).await
        }
        Err(AccessDenied::Unauthenticated) if browser => {
            let callback = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            Redirect::to(&format!("/auth/signin?callbackUrl={}", urlencoding::encode(callback))).into_response()
        }
        Err(AccessDenied::Unauthenticated) => {
            errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized")
        }
        Err(AccessDenied::Forbidden) if browser => Redirect::to("/").into_response(),
        Err(AccessDenied::Forbidden) => errors::json_error(StatusCode::FORBIDDEN, "forbidden", "Forbidden"),
    };

    if stale_session && !sets_session_cookie(&response) {
        append_cookie(&mut response, &clear_session_cookie(state.session));
    }
    response
}

fn sets_session_cookie(response: &Response) -> bool {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.strip_prefix(SESSION_COOKIE).is_some_and(|rest| rest.starts_with('=')))
}

fn extract_token(headers: &HeaderMap) -> Option<(&str, TokenSource)> {
    extract_bearer(headers)
        .map(|t| (t, TokenSource::Bearer))
        .or_else(|| extract_cookie(headers, SESSION_COOKIE).map(|t| (t, TokenSource::Cookie)))
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

fn extract_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v)
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// `Set-Cookie` value carrying a freshly issued session token.
pub fn session_cookie(token: &str, settings: SessionSettings) -> String {
    let secure = if settings.secure { "; Secure" } else { "" };
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{secure}",
        settings.max_age_secs
    )
}

/// `Set-Cookie` value that expires the session cookie.
pub fn clear_session_cookie(settings: SessionSettings) -> String {
    let secure = if settings.secure { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{secure}")
}

pub fn append_cookie(response: &mut Response, cookie: &str) {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}
