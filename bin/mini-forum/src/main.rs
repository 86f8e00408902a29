//! # Mini-Forum Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use mf_api::rate_limit::{RateLimitGuard, RateLimits};
use mf_api::{build_router, AppState, SharedState};
use mf_config::{LimitSettings, LogFormat, LogSettings, Settings};
use mf_core::rate_limit::{FixedWindowLimiter, Quota};
use mf_core::service::ForumService;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "db-sqlite")]
use mf_db_sqlite::SqliteForumRepo;

#[cfg(feature = "auth-remote")]
use mf_auth_remote::RemoteIdentityProvider;

#[cfg(not(feature = "db-sqlite"))]
compile_error!("mini-forum needs a storage backend; enable the `db-sqlite` feature");

#[cfg(not(feature = "auth-remote"))]
compile_error!("mini-forum needs an identity provider; enable the `auth-remote` feature");

fn init_tracing(log: &LogSettings) {
    // RUST_LOG wins over the configured filter.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn guard(name: &str, limit: &LimitSettings) -> RateLimitGuard {
    RateLimitGuard::new(
        FixedWindowLimiter::new(name, Quota::new(limit.max_requests, limit.window())),
        limit.message.as_str(),
    )
}

/// Periodically drops elapsed rate-limit windows so idle clients do not
/// accumulate in memory.
fn spawn_purge_task(state: SharedState, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = state.limits.purge_expired();
            debug!(removed, "rate limit windows purged");
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received, draining connections");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings.log);

    let Settings {
        server,
        database,
        identity,
        session,
        rate_limit,
        ..
    } = settings;

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let repo = SqliteForumRepo::connect(&database.url, database.max_connections)
        .await
        .with_context(|| format!("opening database {}", database.url))?;

    // 2. Initialize Identity Implementation
    #[cfg(feature = "auth-remote")]
    let identity_provider = {
        let timeout = identity.timeout();
        RemoteIdentityProvider::new(&identity.url, identity.api_key, timeout)
            .context("building identity provider client")?
    };

    // 3. Wrap in AppState (dynamic dispatch keeps handlers backend-agnostic)
    let limits = RateLimits::new(
        guard("global", &rate_limit.global),
        guard("post", &rate_limit.post),
        guard("search", &rate_limit.search),
    );
    let state = AppState::new(
        ForumService::new(Arc::new(repo)),
        Arc::new(identity_provider),
        limits,
    )
    .with_secure_cookies(session.secure_cookies)
    .with_trust_proxy_headers(server.trust_proxy_headers)
    .with_static_dir(&server.static_dir)
    .shared();

    spawn_purge_task(state.clone(), rate_limit.purge_interval());

    let addr = server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, identity_url = %identity.url, "mini-forum listening");

    axum::serve(
        listener,
        build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}
