use std::path::PathBuf;
use std::sync::Arc;

use mf_core::service::ForumService;
use mf_core::traits::IdentityProvider;

use crate::metrics::Metrics;
use crate::rate_limit::RateLimits;

/// State shared across all request handlers.
pub struct AppState {
    pub service: ForumService,
    pub identity: Arc<dyn IdentityProvider>,
    pub limits: RateLimits,
    pub metrics: Metrics,
    /// Adds `Secure` to session cookies.
    pub secure_cookies: bool,
    /// Honour `X-Forwarded-For` / `X-Real-IP` when resolving client addresses.
    pub trust_proxy_headers: bool,
    pub static_dir: PathBuf,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        service: ForumService,
        identity: Arc<dyn IdentityProvider>,
        limits: RateLimits,
    ) -> Self {
        Self {
            service,
            identity,
            limits,
            metrics: Metrics::new(),
            secure_cookies: false,
            trust_proxy_headers: false,
            static_dir: PathBuf::from("static"),
        }
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    pub fn with_trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }
}
