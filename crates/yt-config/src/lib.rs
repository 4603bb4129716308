//! # yt-config
//!
//! Layered settings for the Yatube binaries.
//!
//! Sources, later ones winning:
//! 1. built-in defaults
//! 2. `yatube.toml` in the working directory (optional)
//! 3. environment variables `YATUBE__<SECTION>__<KEY>`, with `.env` loaded first

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigBuilder, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

/// Session secret used when none is configured. Fine for development only.
const DEV_SESSION_SECRET: &str = "yatube-dev-secret-change-me";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// sqlx connection string, e.g. `sqlite://yatube.db`
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    pub root: PathBuf,
    pub url_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    /// Posts per page on every feed.
    pub page_size: u64,
    /// How long a rendered index page is served from cache.
    pub index_cache_ttl_secs: u64,
}

impl FeedSettings {
    pub fn index_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.index_cache_ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub session_secret: SecretString,
    /// Mark the session cookie `Secure`; turn on behind HTTPS.
    pub secure_cookie: bool,
    /// Lifetime of a session token and its cookie.
    pub session_ttl_secs: u64,
}

impl AuthSettings {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub media: MediaSettings,
    pub feed: FeedSettings,
    pub auth: AuthSettings,
}

impl Settings {
    /// Loads `.env`, `yatube.toml` and the environment on top of the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("loaded environment from {}", path.display());
        }
        let builder = Self::defaults()?
            .add_source(File::with_name("yatube").required(false))
            .add_source(Environment::with_prefix("YATUBE").separator("__"));
        Self::from_builder(builder)
    }

    /// Built-in defaults; the base layer of [`Settings::load`].
    pub fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("database.url", "sqlite://yatube.db")?
            .set_default("media.root", "./media")?
            .set_default("media.url_prefix", "/media")?
            .set_default("feed.page_size", 10)?
            .set_default("feed.index_cache_ttl_secs", 20)?
            .set_default("auth.session_secret", DEV_SESSION_SECRET)?
            .set_default("auth.secure_cookie", false)?
            .set_default("auth.session_ttl_secs", 14 * 24 * 60 * 60)?)
    }

    pub fn from_builder(
        builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.page_size == 0 {
            return Err(ConfigError::Invalid("feed.page_size must be at least 1".into()));
        }
        if !self.media.url_prefix.starts_with('/') {
            return Err(ConfigError::Invalid("media.url_prefix must start with '/'".into()));
        }
        if self.auth.session_ttl_secs == 0 {
            return Err(ConfigError::Invalid("auth.session_ttl_secs must be at least 1".into()));
        }
        Ok(())
    }

    pub fn uses_dev_secret(&self) -> bool {
        use secrecy::ExposeSecret;
        self.auth.session_secret.expose_secret() == DEV_SESSION_SECRET
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}
