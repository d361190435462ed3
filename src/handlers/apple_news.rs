use anyhow::{Context, Result, anyhow};
use futures::future::BoxFuture;
use reqwest::header::USER_AGENT;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{Handler, PartialResult};
use crate::utils::{MOBILE_USER_AGENT, host_matches_any};

/// Follows Apple News share links to the publisher's article
///
/// The share page is a stub whose "click here" link carries the real URL.
pub struct AppleNewsHandler {
    http: reqwest::Client,
}

impl AppleNewsHandler {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Handler for AppleNewsHandler {
    fn name(&self) -> &'static str {
        "apple-news"
    }

    fn should_prehandle(&self, url: &Url) -> bool {
        host_matches_any(url, &["apple.news"])
    }

    fn prehandle<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<PartialResult>> {
        Box::pin(async move {
            let body = self
                .http
                .get(url.clone())
                .header(USER_AGENT, MOBILE_USER_AGENT)
                .send()
                .await
                .context("Apple News request failed")?
                .text()
                .await
                .context("Apple News body could not be read")?;

            let target = article_link(&body)
                .ok_or_else(|| anyhow!("No article link on Apple News page {url}"))?;
            let target = url
                .join(&target)
                .with_context(|| format!("Invalid Apple News article link '{target}'"))?;

            Ok(PartialResult {
                url: Some(target),
                ..PartialResult::default()
            })
        })
    }
}

/// `href` of the anchor wrapping `span.click-here`
fn article_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("span.click-here").ok()?;
    let span = document.select(&selector).next()?;

    span.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}
