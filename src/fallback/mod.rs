//! Fallback Fetcher
//!
//! When the browser is served a challenge page, the article is fetched once
//! more through a third-party rendering proxy (premium residential exit,
//! no JavaScript). There is no retry here; a failure is terminal.

use anyhow::Context;
use scraper::{Html, Selector};
use tracing::{info, warn};
use url::Url;

use crate::config::FetchConfig;
use crate::error::FetchError;

/// Title and outer HTML of a proxied page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxiedDocument {
    pub title: String,
    pub content: String,
}

pub struct ProxyFetcher {
    http: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
    country_code: String,
}

impl ProxyFetcher {
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| FetchError::Config(format!("Failed to build proxy HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.proxy_endpoint().clone(),
            api_key: config.proxy_api_key().map(str::to_string),
            country_code: config.proxy_country_code().to_string(),
        })
    }

    /// Fetch `url` through the rendering proxy
    ///
    /// # Errors
    ///
    /// `FetchError::FetchFailure` when no API key is configured, the proxy
    /// call fails or returns a non-success status.
    pub async fn fetch(&self, url: &Url) -> Result<ProxiedDocument, FetchError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            FetchError::FetchFailure("rendering proxy API key is not configured".to_string())
        })?;

        info!("Fetching {} through rendering proxy", url);
        let body = self
            .http
            .get(self.endpoint.clone())
            .query(&[
                ("api_key", api_key),
                ("url", url.as_str()),
                ("render_js", "false"),
                ("premium_proxy", "true"),
                ("country_code", self.country_code.as_str()),
            ])
            .send()
            .await
            .context("Rendering proxy request failed")?
            .error_for_status()
            .context("Rendering proxy returned an error status")?
            .text()
            .await
            .context("Rendering proxy body could not be read")?;

        let document = parse_document(&body);
        if document.title.is_empty() {
            warn!("Rendering proxy returned a document without a title for {}", url);
        }
        Ok(document)
    }
}

fn parse_document(html: &str) -> ProxiedDocument {
    let document = Html::parse_document(html);
    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    ProxiedDocument {
        title,
        content: document.root_element().html(),
    }
}
