//! Session cookies and the per-request current user.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use cookie::time::Duration;
use cookie::{Cookie, SameSite};
use mf_core::models::{Session, User};
use tracing::warn;

use crate::error::ErrorPage;
use crate::state::{AppState, SharedState};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

const ACCESS_TOKEN_TTL_DAYS: i64 = 7;
const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

fn session_cookie(name: &'static str, value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(max_age)
        .build()
}

pub fn session_cookies(session: &Session, secure: bool) -> [Cookie<'static>; 2] {
    [
        session_cookie(
            ACCESS_TOKEN_COOKIE,
            session.access_token.clone(),
            Duration::days(ACCESS_TOKEN_TTL_DAYS),
            secure,
        ),
        session_cookie(
            REFRESH_TOKEN_COOKIE,
            session.refresh_token.clone(),
            Duration::days(REFRESH_TOKEN_TTL_DAYS),
            secure,
        ),
    ]
}

/// Expired, empty replacements for both session cookies.
pub fn cleared_cookies(secure: bool) -> [Cookie<'static>; 2] {
    [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE]
        .map(|name| session_cookie(name, String::new(), Duration::ZERO, secure))
}

/// Sets `cookies` and sends the browser to `location`.
pub fn redirect_with_cookies(cookies: [Cookie<'static>; 2], location: &str) -> Response {
    let headers = cookies.map(|cookie| (SET_COOKIE, cookie.to_string()));
    (AppendHeaders(headers), Redirect::to(location)).into_response()
}

/// Value of the named cookie from any `Cookie` header.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}

/// The signed-in user, if the access-token cookie verifies.
///
/// Never rejects: a missing, stale or unverifiable token simply yields an
/// anonymous visitor.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(user_from_headers(state, &parts.headers).await))
    }
}

async fn user_from_headers(state: &AppState, headers: &HeaderMap) -> Option<User> {
    let token = read_cookie(headers, ACCESS_TOKEN_COOKIE).filter(|token| !token.is_empty())?;
    verify_token(state, &token).await
}

async fn verify_token(state: &AppState, token: &str) -> Option<User> {
    match state.identity.verify(token).await {
        Ok(user) => user,
        Err(err) => {
            warn!(error = %err, "could not verify access token, treating visitor as anonymous");
            None
        }
    }
}

/// Re-renders error pages (404, 400, 429, 500) for a signed-in visitor so
/// the header still shows who they are. Responses without an `ErrorPage`
/// pass through untouched.
pub async fn personalize_error_pages(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Response {
    let token = read_cookie(req.headers(), ACCESS_TOKEN_COOKIE).filter(|token| !token.is_empty());
    let response = next.run(req).await;

    let page = response.extensions().get::<ErrorPage>().cloned();
    let (Some(token), Some(page)) = (token, page) else {
        return response;
    };
    let Some(user) = verify_token(&state, &token).await else {
        return response;
    };

    let (parts, _) = response.into_parts();
    let rendered = page.render(parts.status, Some(user));
    if rendered.status() != parts.status {
        return rendered;
    }
    let (_, body) = rendered.into_parts();
    Response::from_parts(parts, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_cookie_attributes() {
        let session = Session {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
        };
        let [access, refresh] = session_cookies(&session, false);

        let access = access.to_string();
        assert!(access.starts_with("access_token=a"));
        assert!(access.contains("HttpOnly"));
        assert!(access.contains("SameSite=Lax"));
        assert!(access.contains("Path=/"));
        assert!(access.contains("Max-Age=604800"));
        assert!(!access.contains("Secure"));

        let refresh = refresh.to_string();
        assert!(refresh.contains("Max-Age=2592000"));
    }

    #[test]
    fn test_secure_flag_and_clearing() {
        let [access, _] = cleared_cookies(true);
        let access = access.to_string();
        assert!(access.starts_with("access_token=;"));
        assert!(access.contains("Secure"));
        assert!(access.contains("Max-Age=0"));
    }

    #[test]
    fn test_read_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; lang=he"));
        headers.append(COOKIE, HeaderValue::from_static("access_token=tok-1"));

        assert_eq!(read_cookie(&headers, "access_token").as_deref(), Some("tok-1"));
        assert_eq!(read_cookie(&headers, "lang").as_deref(), Some("he"));
        assert_eq!(read_cookie(&headers, "refresh_token"), None);
    }
}
