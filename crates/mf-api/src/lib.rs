//! # mf-api
//!
//! The web routing and orchestration layer for the forum.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod rate_limit;
pub mod session;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;

pub use error::{ApiError, ApiResult};
pub use state::{AppState, SharedState};

/// Builds the complete application router.
///
/// Thread and reply creation share the posting limiter; `/search` has its
/// own. The global limiter wraps everything, including static files and the
/// not-found fallback, and error pages are personalized outside of it.
pub fn build_router(state: SharedState) -> Router {
    let posting = Router::new()
        .route("/f/{id}/threads", post(handlers::create_thread))
        .route("/thread/{id}/replies", post(handlers::create_reply))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_posts,
        ));

    let searching = Router::new()
        .route("/search", get(handlers::search))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_search,
        ));

    let pages = Router::new()
        .route("/", get(handlers::home))
        .route("/f/{id}", get(handlers::forum_page))
        .route("/f/{id}/new", get(handlers::new_thread_form))
        .route("/thread/{id}", get(handlers::thread_page))
        .route("/thread/{id}/delete", post(handlers::delete_thread))
        .route(
            "/thread/{id}/replies/{reply_id}/delete",
            post(handlers::delete_reply),
        )
        .route("/new-posts", get(handlers::new_posts))
        .route("/metrics", get(handlers::metrics))
        .route("/auth/login", get(auth::login_form).post(auth::login))
        .route("/auth/signup", get(auth::signup_form).post(auth::signup))
        .route("/auth/logout", post(auth::logout));

    let router = Router::new()
        .merge(pages)
        .merge(posting)
        .merge(searching)
        .nest_service("/static", ServeDir::new(&state.static_dir))
        .fallback(handlers::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_global,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session::personalize_error_pages,
        ))
        .with_state(state);

    middleware::standard_layers(router)
}
