#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, Response};
use axum::Router;
use mf_api::rate_limit::{RateLimitGuard, RateLimits};
use mf_api::{build_router, AppState, SharedState};
use mf_core::models::{Forum, NewForum, Thread, ThreadDraft};
use mf_core::rate_limit::{FixedWindowLimiter, Quota};
use mf_core::service::ForumService;
use mf_core::traits::{ForumRepo, MockIdentityProvider};
use mf_db_sqlite::SqliteForumRepo;
use tower::ServiceExt;

pub const CLIENT: &str = "127.0.0.1:40000";

pub struct TestApp {
    pub router: Router,
    pub state: SharedState,
    pub repo: Arc<SqliteForumRepo>,
}

fn guard(name: &str, max_requests: u32, message: &str) -> RateLimitGuard {
    RateLimitGuard::new(
        FixedWindowLimiter::new(name, Quota::new(max_requests, Duration::from_secs(600))),
        message,
    )
}

/// Limits high enough that only the limiter under test ever trips.
pub fn relaxed_limits() -> RateLimits {
    RateLimits::new(
        guard("global", 1_000, "Too many requests"),
        guard("post", 1_000, "Slow down"),
        guard("search", 1_000, "Slow down"),
    )
}

pub fn limits(global: u32, post: u32, search: u32) -> RateLimits {
    RateLimits::new(
        guard("global", global, "Too many requests, slow down."),
        guard("post", post, "Please wait 10 seconds before posting again."),
        guard("search", search, "Please wait 10 seconds before searching again."),
    )
}

pub async fn app_with(identity: MockIdentityProvider, limits: RateLimits) -> TestApp {
    let repo = Arc::new(SqliteForumRepo::new("sqlite::memory:").await.unwrap());
    let service = ForumService::new(repo.clone());
    let state = AppState::new(service, Arc::new(identity), limits).shared();
    TestApp {
        router: build_router(state.clone()),
        state,
        repo,
    }
}

pub async fn app() -> TestApp {
    app_with(MockIdentityProvider::new(), relaxed_limits()).await
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn forum(&self, name: &str) -> Forum {
        self.repo
            .create_forum(NewForum {
                name: name.to_string(),
                slug: None,
                description: None,
            })
            .await
            .unwrap()
    }

    pub async fn thread(&self, forum: &Forum, title: &str) -> Thread {
        self.state
            .service
            .create_thread(
                forum.id,
                ThreadDraft {
                    title: title.to_string(),
                    author: String::new(),
                    content: format!("{title} body"),
                },
            )
            .await
            .unwrap()
    }
}

fn with_client(mut req: Request<Body>) -> Request<Body> {
    req.extensions_mut()
        .insert(ConnectInfo(CLIENT.parse::<SocketAddr>().unwrap()));
    req
}

pub fn get(uri: &str) -> Request<Body> {
    with_client(Request::builder().uri(uri).body(Body::empty()).unwrap())
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    with_client(
        Request::builder()
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap(),
    )
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    with_client(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
}

pub fn post_form_with_cookie(uri: &str, body: &str, cookie: &str) -> Request<Body> {
    let mut req = post_form(uri, body);
    req.headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    req
}

pub async fn body_string(res: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(res: &Response<Body>) -> &str {
    res.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

pub fn set_cookies(res: &Response<Body>) -> Vec<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}
