use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::config::CatalogConfig;
use crate::{Error, Result};

const DEFAULT_USER_AGENT: &str = concat!("chapterlog/", env!("CARGO_PKG_VERSION"));

/// Read-only title lookup against an external catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Raw candidate records for `text`, at most `limit` of them.
    async fn search(&self, text: &str, limit: u32) -> Result<Vec<Value>>;
}

/// HTTP client for a Jikan v4 compatible catalog
pub struct CatalogClient {
    config: CatalogConfig,
    inner: Client,
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(user_agent)
            .build()?;

        Ok(Self { config, inner })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    fn search_url(&self, text: &str, limit: u32) -> Result<Url> {
        let base = self.config.base_url.trim_end_matches('/');
        let limit = limit.to_string();
        let url = Url::parse_with_params(
            &format!("{base}/manga"),
            &[("q", text), ("limit", limit.as_str())],
        )?;
        Ok(url)
    }
}

#[async_trait]
impl Catalog for CatalogClient {
    async fn search(&self, text: &str, limit: u32) -> Result<Vec<Value>> {
        let url = self.search_url(text, limit)?;
        tracing::debug!(%url, "Searching catalog");

        let response = self.inner.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Catalog search failed");
            return Err(Error::CatalogStatus(status.as_u16()));
        }

        let body: Value = response.json().await?;
        Ok(records_from_body(body))
    }
}

/// The result records of a catalog response body.
///
/// Jikan wraps results in `data`; a bare array is accepted as well.
fn records_from_body(body: Value) -> Vec<Value> {
    match body {
        Value::Array(records) => records,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(records)) => records,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
