use anyhow::{Context, Result, anyhow};
use futures::future::BoxFuture;
use kuchiki::traits::TendrilSink;
use reqwest::header::COOKIE;
use url::Url;

use super::{Handler, PartialResult};
use crate::utils::host_matches_any;

/// Pre-accepted GDPR consent; without it the site serves only the consent wall
const CONSENT_COOKIE: &str = "DSGVO_ZUSAGE_V1=true";

pub struct DerStandardHandler {
    http: reqwest::Client,
}

impl DerStandardHandler {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Handler for DerStandardHandler {
    fn name(&self) -> &'static str {
        "derstandard"
    }

    fn should_prehandle(&self, url: &Url) -> bool {
        host_matches_any(url, &["derstandard.at"])
    }

    fn prehandle<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<PartialResult>> {
        Box::pin(async move {
            let html = self
                .http
                .get(url.clone())
                .header(COOKIE, CONSENT_COOKIE)
                .send()
                .await
                .context("derStandard request failed")?
                .error_for_status()
                .context("derStandard returned an error status")?
                .text()
                .await
                .context("derStandard body could not be read")?;

            let (title, content) = split_title(&html)?;
            Ok(PartialResult {
                title: Some(title),
                content: Some(content),
                ..PartialResult::default()
            })
        })
    }
}

/// Pull `.article-title` out of the document and return it with the remaining body
fn split_title(html: &str) -> Result<(String, String)> {
    let document = kuchiki::parse_html().one(html.to_string());

    let title_node = document
        .select_first(".article-title")
        .map_err(|()| anyhow!("No .article-title element"))?;
    let title = title_node.text_contents().trim().to_string();
    title_node.as_node().detach();

    let body = document
        .select_first("body")
        .map_err(|()| anyhow!("Document has no body"))?;

    let mut output = Vec::new();
    body.as_node()
        .serialize(&mut output)
        .context("Failed to serialize derStandard body")?;
    let content = String::from_utf8(output).context("derStandard body is not UTF-8")?;

    Ok((title, content))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"<html><head><title>ignored</title></head><body>
        <article><h1 class="article-title"> Budget talks stall </h1>
        <p>Negotiations continued late into the night.</p></article>
    </body></html>"#;

    #[test]
    fn title_is_removed_from_body() {
        let (title, content) = split_title(ARTICLE).expect("split");
        assert_eq!(title, "Budget talks stall");
        assert!(content.starts_with("<body>"), "outer html expected: {content}");
        assert!(!content.contains("article-title"));
        assert!(content.contains("Negotiations continued"));
    }

    #[tokio::test]
    async fn prehandle_sends_consent_cookie() {
        let mut server = mockito::Server::new_async().await;
        let page = server
            .mock("GET", "/story/2000123")
            .match_header("cookie", CONSENT_COOKIE)
            .with_header("content-type", "text/html")
            .with_body(ARTICLE)
            .create_async()
            .await;

        let handler = DerStandardHandler::new(reqwest::Client::new());
        let url = Url::parse(&format!("{}/story/2000123", server.url())).expect("url");
        let partial = handler.prehandle(&url).await.expect("prehandle");

        page.assert_async().await;
        assert_eq!(partial.title.as_deref(), Some("Budget talks stall"));
        assert!(partial.has_document());
    }
}
