use std::path::PathBuf;

use chapterlog_core::CatalogConfig;
use serde::{Deserialize, Serialize};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SESSION_IDLE_MINUTES: u64 = 60;
/// One year
const MAX_SESSION_IDLE_MINUTES: i64 = 525_600;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite database holding every owner's list
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Directory served for everything outside `/api`
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Sessions unseen for this long are ended by the sweeper
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: u64,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

const fn default_session_idle_minutes() -> u64 {
    DEFAULT_SESSION_IDLE_MINUTES
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chapterlog")
        .join("chapterlog.db")
        .to_string_lossy()
        .to_string()
}

fn default_static_dir() -> String {
    concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            db_path: default_db_path(),
            static_dir: default_static_dir(),
            session_idle_minutes: default_session_idle_minutes(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// | Variable                  | Default                     |
    /// |---------------------------|-----------------------------|
    /// | `CHAPTERLOG_PORT`         | `3000`                      |
    /// | `CHAPTERLOG_DB`           | `<data dir>/chapterlog/chapterlog.db` |
    /// | `CHAPTERLOG_STATIC`       | `<crate>/static`            |
    /// | `CHAPTERLOG_CATALOG_URL`  | `https://api.jikan.moe/v4`  |
    /// | `CHAPTERLOG_SEARCH_LIMIT` | `10`                        |
    /// | `CHAPTERLOG_USER_AGENT`   | `chapterlog/<version>`      |
    /// | `CHAPTERLOG_SESSION_IDLE_MINUTES` | `60`                |
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(port) = lookup("CHAPTERLOG_PORT") {
            match port.trim().parse() {
                Ok(port) => config.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid CHAPTERLOG_PORT"),
            }
        }
        if let Some(db_path) = lookup("CHAPTERLOG_DB").filter(|v| !v.is_empty()) {
            config.db_path = db_path;
        }
        if let Some(static_dir) = lookup("CHAPTERLOG_STATIC").filter(|v| !v.is_empty()) {
            config.static_dir = static_dir;
        }
        if let Some(url) = lookup("CHAPTERLOG_CATALOG_URL").filter(|v| !v.is_empty()) {
            config.catalog = config.catalog.with_base_url(url);
        }
        if let Some(limit) = lookup("CHAPTERLOG_SEARCH_LIMIT") {
            match limit.trim().parse() {
                Ok(limit) => config.catalog = config.catalog.with_search_limit(limit),
                Err(_) => {
                    tracing::warn!(value = %limit, "Ignoring invalid CHAPTERLOG_SEARCH_LIMIT");
                }
            }
        }
        if let Some(agent) = lookup("CHAPTERLOG_USER_AGENT").filter(|v| !v.is_empty()) {
            config.catalog.user_agent = Some(agent);
        }
        if let Some(minutes) = lookup("CHAPTERLOG_SESSION_IDLE_MINUTES") {
            match minutes.trim().parse() {
                Ok(minutes) if minutes > 0 => config.session_idle_minutes = minutes,
                _ => {
                    tracing::warn!(
                        value = %minutes,
                        "Ignoring invalid CHAPTERLOG_SESSION_IDLE_MINUTES"
                    );
                }
            }
        }

        config
    }

    pub fn session_idle(&self) -> chrono::Duration {
        let minutes = i64::try_from(self.session_idle_minutes)
            .unwrap_or(MAX_SESSION_IDLE_MINUTES)
            .min(MAX_SESSION_IDLE_MINUTES);
        chrono::Duration::minutes(minutes)
    }
}
