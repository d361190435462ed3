use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use futures::future::BoxFuture;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

use super::{Handler, PartialResult};
use crate::utils::host_matches_any;

const OEMBED_ENDPOINT: &str = "https://publish.twitter.com/oembed";

static STATUS_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(twitter|x)\.com/(?:#!/)?(\w+)/status(?:es)?/(\d+)(?:/.*)?")
        .expect("STATUS_PATH: hardcoded regex is valid")
});

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+").expect("LINK: hardcoded regex is valid"));

#[derive(Debug, Deserialize)]
struct OEmbed {
    #[serde(default)]
    author_name: String,
    html: String,
}

/// Tweets rendered from the publish oEmbed endpoint
pub struct TwitterHandler {
    http: reqwest::Client,
    endpoint: String,
}

impl TwitterHandler {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: OEMBED_ENDPOINT.to_string(),
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Handler for TwitterHandler {
    fn name(&self) -> &'static str {
        "twitter"
    }

    fn should_prehandle(&self, url: &Url) -> bool {
        host_matches_any(url, &["twitter.com", "x.com"]) && STATUS_PATH.is_match(url.as_str())
    }

    fn prehandle<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<PartialResult>> {
        Box::pin(async move {
            let oembed: OEmbed = self
                .http
                .get(&self.endpoint)
                .query(&[
                    ("url", url.as_str()),
                    ("omit_script", "true"),
                    ("dnt", "true"),
                ])
                .send()
                .await
                .context("Tweet oEmbed request failed")?
                .error_for_status()
                .context("Tweet oEmbed returned an error status")?
                .json()
                .await
                .context("Tweet oEmbed response is not valid JSON")?;

            let embed = parse_embed(&oembed.html);
            let description = LINK.replace(&embed.text, "").trim().to_string();
            let title = format!("{} on X: {description}", oembed.author_name);

            let content = render_document(&oembed, &description, embed.published.as_deref());
            Ok(PartialResult {
                title: Some(title),
                content: Some(content),
                ..PartialResult::default()
            })
        })
    }
}

struct EmbedParts {
    text: String,
    published: Option<String>,
}

/// Tweet text and publication date out of the oEmbed blockquote
fn parse_embed(html: &str) -> EmbedParts {
    let fragment = Html::parse_fragment(html);

    let text = Selector::parse("blockquote p")
        .ok()
        .and_then(|sel| fragment.select(&sel).next())
        .map(|p| p.text().collect::<String>())
        .unwrap_or_default();

    // The date is the text of the trailing status link
    let published = Selector::parse("blockquote > a")
        .ok()
        .and_then(|sel| fragment.select(&sel).last())
        .map(|a| a.text().collect::<String>())
        .map(|raw| {
            NaiveDate::parse_from_str(raw.trim(), "%B %d, %Y")
                .map_or_else(|_| raw.trim().to_string(), |d| d.to_string())
        });

    EmbedParts { text, published }
}

fn render_document(oembed: &OEmbed, description: &str, published: Option<&str>) -> String {
    use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

    let published_meta = published
        .map(|p| {
            format!(
                r#"
    <meta property="article:published_time" content="{}" />"#,
                attr(p)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<html>
  <head>
    <title>{author} on X</title>
    <meta property="og:site_name" content="X (formerly Twitter)" />
    <meta property="og:type" content="tweet" />
    <meta property="dc:creator" content="{author_attr}" />
    <meta property="twitter:description" content="{description}" />{published_meta}
  </head>
  <body>
    {embed}
  </body>
</html>"#,
        author = text(&oembed.author_name),
        author_attr = attr(&oembed.author_name),
        description = attr(description),
        embed = oembed.html,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_status_urls_on_both_hosts() {
        let handler = TwitterHandler::new(reqwest::Client::new());
        for (input, expected) in [
            ("https://twitter.com/rustlang/status/1234567890", true),
            ("https://x.com/rustlang/status/1234567890/photo/1", true),
            ("https://mobile.twitter.com/rustlang/statuses/42", true),
            ("https://x.com/rustlang", false),
            ("https://box.com/a/status/1", false),
        ] {
            let url = Url::parse(input).expect("url");
            assert_eq!(handler.should_prehandle(&url), expected, "{input}");
        }
    }

    #[tokio::test]
    async fn prehandle_titles_tweet_without_links() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "author_name": "Rust Language",
            "html": "<blockquote class=\"twitter-tweet\"><p lang=\"en\" dir=\"ltr\">Rust 2.0 is out https://t.co/abc</p>&mdash; Rust Language (@rustlang) <a href=\"https://twitter.com/rustlang/status/1\">March 5, 2024</a></blockquote>\n"
        });
        server
            .mock("GET", "/oembed")
            .match_query(mockito::Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let handler = TwitterHandler::new(reqwest::Client::new())
            .with_endpoint(format!("{}/oembed", server.url()));
        let url = Url::parse("https://x.com/rustlang/status/1").expect("url");
        let partial = handler.prehandle(&url).await.expect("prehandle");

        assert_eq!(
            partial.title.as_deref(),
            Some("Rust Language on X: Rust 2.0 is out")
        );
        let content = partial.content.expect("content");
        assert!(content.contains(r#"content="2024-03-05""#), "{content}");
        assert!(content.contains(r#"<blockquote class="twitter-tweet">"#));
    }
}
