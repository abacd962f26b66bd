use serde::{Deserialize, Serialize};

pub const DEFAULT_CATALOG_URL: &str = "https://api.jikan.moe/v4";

/// Settings for the external catalog lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of a Jikan v4 compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum number of candidates requested per search
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

const fn default_search_limit() -> u32 {
    10
}

const fn default_connect_timeout() -> u64 {
    10
}

const fn default_request_timeout() -> u64 {
    20
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_limit: default_search_limit(),
            connect_timeout_seconds: default_connect_timeout(),
            request_timeout_seconds: default_request_timeout(),
            user_agent: None,
        }
    }
}

impl CatalogConfig {
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_search_limit(mut self, limit: u32) -> Self {
        self.search_limit = limit.max(1);
        self
    }
}
