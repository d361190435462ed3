use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use futures::future::BoxFuture;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use url::Url;

use super::Handler;
use crate::utils::DESKTOP_USER_AGENT;

/// Expands `t.co` short links by reading a single `Location` header
pub struct TDotCoHandler {
    http: reqwest::Client,
}

impl TDotCoHandler {
    /// Builds its own client because redirects must not be followed
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .user_agent(DESKTOP_USER_AGENT)
            .build()
            .context("Failed to build t.co HTTP client")?;
        Ok(Self { http })
    }
}

impl Handler for TDotCoHandler {
    fn name(&self) -> &'static str {
        "t-dot-co"
    }

    fn should_resolve(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|h| h.eq_ignore_ascii_case("t.co"))
    }

    fn resolve<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Url>> {
        Box::pin(async move {
            let response = self
                .http
                .get(url.clone())
                .send()
                .await
                .with_context(|| format!("t.co lookup failed for {url}"))?;

            let location = response
                .headers()
                .get(LOCATION)
                .ok_or_else(|| anyhow!("t.co returned {} without a Location header", response.status()))?
                .to_str()
                .context("Location header is not valid UTF-8")?;

            // Relative locations are resolved against the short link
            url.join(location)
                .with_context(|| format!("Invalid redirect target '{location}'"))
        })
    }
}
