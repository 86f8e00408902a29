//! Per-IP rate limiting middleware.
//!
//! Three fixed-window limiters guard the router: `global` on every route,
//! `post` shared by thread and reply creation, and `search` on `/search`.
//! A rejected request never reaches its handler.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use mf_core::error::AppError;
use mf_core::rate_limit::{Decision, FixedWindowLimiter};
use tracing::warn;

use crate::error::ApiError;
use crate::state::{AppState, SharedState};

/// A limiter together with the message shown when it rejects a request.
#[derive(Debug)]
pub struct RateLimitGuard {
    limiter: FixedWindowLimiter,
    message: String,
}

impl RateLimitGuard {
    pub fn new(limiter: FixedWindowLimiter, message: impl Into<String>) -> Self {
        Self {
            limiter,
            message: message.into(),
        }
    }

    pub fn limiter(&self) -> &FixedWindowLimiter {
        &self.limiter
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug)]
pub struct RateLimits {
    pub global: RateLimitGuard,
    pub post: RateLimitGuard,
    pub search: RateLimitGuard,
}

impl RateLimits {
    pub fn new(global: RateLimitGuard, post: RateLimitGuard, search: RateLimitGuard) -> Self {
        Self {
            global,
            post,
            search,
        }
    }

    /// Drops elapsed windows from every limiter.
    pub fn purge_expired(&self) -> usize {
        [&self.global, &self.post, &self.search]
            .iter()
            .map(|guard| guard.limiter.purge_expired())
            .sum()
    }
}

pub async fn limit_global(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    enforce(&state, &state.limits.global, req, next).await
}

pub async fn limit_posts(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    enforce(&state, &state.limits.post, req, next).await
}

pub async fn limit_search(State(state): State<SharedState>, req: Request, next: Next) -> Response {
    enforce(&state, &state.limits.search, req, next).await
}

async fn enforce(state: &AppState, guard: &RateLimitGuard, req: Request, next: Next) -> Response {
    let name = guard.limiter.name();

    let Some(ip) = client_ip(&req, state.trust_proxy_headers) else {
        // Unknown senders are denied rather than sharing an unlimited bucket.
        warn!(limiter = name, "could not determine client IP, rejecting request");
        state.metrics.record_rate_limited(name);
        return rejection(guard, guard.limiter.quota().window);
    };

    match guard.limiter.check(ip) {
        Decision::Allowed => next.run(req).await,
        Decision::Limited { retry_after } => {
            warn!(limiter = name, %ip, "rate limit exceeded");
            state.metrics.record_rate_limited(name);
            rejection(guard, retry_after)
        }
    }
}

fn rejection(guard: &RateLimitGuard, retry_after: Duration) -> Response {
    let mut response =
        ApiError(AppError::RateLimitExceeded(guard.message().to_string())).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, retry_after_secs(retry_after).into());
    response
}

/// Whole seconds, rounded up, never zero.
fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}

/// Resolves the client address.
///
/// `X-Forwarded-For` (first hop) and `X-Real-IP` are consulted only when the
/// server sits behind a trusted proxy; otherwise they could be forged.
pub fn client_ip(req: &Request, trust_proxy_headers: bool) -> Option<IpAddr> {
    if trust_proxy_headers {
        if let Some(ip) = forwarded_ip(req.headers()) {
            return Some(ip);
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let from_forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok());

    from_forwarded_for.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
    })
}
