//! # mf-config
//!
//! Layered settings for the forum binaries.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. `config/local.toml` (optional, untracked)
//! 4. environment variables such as `FORUM__SERVER__PORT=8080`
//!
//! A `.env` file in the working directory is loaded into the environment first.

use std::time::Duration;

use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "FORUM";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub identity: IdentitySettings,
    pub session: SessionSettings,
    pub rate_limit: RateLimitSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Honour `X-Forwarded-For` / `X-Real-IP`. Only enable behind a proxy
    /// that overwrites these headers.
    pub trust_proxy_headers: bool,
    pub static_dir: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3333,
            trust_proxy_headers: false,
            static_dir: "static".to_string(),
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://forum.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Location of the GoTrue-compatible identity service.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    pub url: String,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9999".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl IdentitySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Mark session cookies `Secure`. Enable whenever served over HTTPS.
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitSettings {
    pub max_requests: u32,
    pub window_secs: u64,
    /// Body of the 429 response; set per deployment language.
    pub message: String,
}

impl LimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Applied to every route.
    pub global: LimitSettings,
    /// Thread and reply creation, sharing one counter.
    pub post: LimitSettings,
    pub search: LimitSettings,
    pub purge_interval_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            global: LimitSettings {
                max_requests: 60,
                window_secs: 10 * 60,
                message: "Too many requests, slow down.".to_string(),
            },
            post: LimitSettings {
                max_requests: 1,
                window_secs: 10,
                message: "Please wait 10 seconds before posting again.".to_string(),
            },
            search: LimitSettings {
                max_requests: 1,
                window_secs: 10,
                message: "Please wait 10 seconds before searching again.".to_string(),
            },
            purge_interval_secs: 300,
        }
    }
}

impl RateLimitSettings {
    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info,tower_http=info,sqlx=warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Settings {
    /// Loads `.env`, then the layered sources rooted at `config/`.
    pub fn load() -> Result<Self, SettingsError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!(error = %err, "ignoring unreadable .env file");
            }
        }
        Self::load_from("config")
    }

    pub fn load_from(dir: &str) -> Result<Self, SettingsError> {
        let builder = Config::builder()
            .add_source(File::with_name(&format!("{dir}/default")).required(false))
            .add_source(File::with_name(&format!("{dir}/local")).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::build(builder)
    }

    /// Seeds per-limiter defaults so a source may override a single field
    /// (e.g. only `rate_limit.post.max_requests`), then deserializes.
    pub fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let defaults = RateLimitSettings::default();
        let mut builder = builder;
        for (name, limit) in [
            ("global", &defaults.global),
            ("post", &defaults.post),
            ("search", &defaults.search),
        ] {
            builder = builder
                .set_default(
                    format!("rate_limit.{name}.max_requests"),
                    i64::from(limit.max_requests),
                )?
                .set_default(
                    format!("rate_limit.{name}.window_secs"),
                    i64::try_from(limit.window_secs).unwrap_or(i64::MAX),
                )?
                .set_default(format!("rate_limit.{name}.message"), limit.message.as_str())?;
        }

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use secrecy::ExposeSecret;

    fn from_toml(toml: &str) -> Settings {
        Settings::build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml))).unwrap()
    }

    #[test]
    fn test_defaults_match_documented_limits() {
        let settings = from_toml("");
        assert_eq!(settings.server.port, 3333);
        assert_eq!(settings.rate_limit.global.max_requests, 60);
        assert_eq!(settings.rate_limit.global.window(), Duration::from_secs(600));
        assert_eq!(settings.rate_limit.post.max_requests, 1);
        assert_eq!(settings.rate_limit.search.window(), Duration::from_secs(10));
        assert_eq!(settings.log.format, LogFormat::Pretty);
        assert!(settings.identity.api_key.is_none());
    }

    #[test]
    fn test_file_values_override_defaults() {
        let settings = from_toml(
            r#"
            [server]
            port = 8080
            trust_proxy_headers = true

            [identity]
            url = "https://id.example.com"
            api_key = "anon-key"

            [rate_limit.search]
            max_requests = 5
            message = "המתן 10 שניות"

            [log]
            format = "json"
            "#,
        );

        assert_eq!(settings.server.bind_address(), "0.0.0.0:8080");
        assert!(settings.server.trust_proxy_headers);
        assert_eq!(settings.identity.url, "https://id.example.com");
        assert_eq!(
            settings.identity.api_key.as_ref().map(|k| k.expose_secret()),
            Some("anon-key")
        );
        assert_eq!(settings.rate_limit.search.max_requests, 5);
        assert_eq!(settings.rate_limit.search.window(), Duration::from_secs(10));
        assert_eq!(settings.rate_limit.search.message, "המתן 10 שניות");
        assert_eq!(settings.rate_limit.post.max_requests, 1);
        assert_eq!(settings.log.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_directory_yields_defaults() {
        let settings = Settings::load_from("/nonexistent/forum-config").unwrap();
        assert_eq!(settings.database.max_connections, 5);
    }
}
