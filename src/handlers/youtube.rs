//! YouTube videos via the public oEmbed endpoint
//!
//! The video id is pulled out of the common URL shapes (`watch?v=`,
//! `youtu.be/`, `embed/`, `v/`), then the oEmbed response supplies
//! title, author and thumbnail for a small embeddable document.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use regex::Regex;
use serde::Deserialize;
use url::Url;

use super::{Handler, PartialResult};
use crate::utils::host_matches_any;

const OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";
const EMBED_HEIGHT: f64 = 350.0;

static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#,
    )
    .expect("VIDEO_ID: hardcoded regex is valid")
});

/// Extract the 11-character video id from a YouTube URL
#[must_use]
pub fn video_id(url: &str) -> Option<&str> {
    VIDEO_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

#[derive(Debug, Deserialize)]
struct OEmbed {
    title: String,
    #[serde(default)]
    author_name: String,
    #[serde(default)]
    author_url: String,
    #[serde(default)]
    thumbnail_url: String,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
}

pub struct YoutubeHandler {
    http: reqwest::Client,
    endpoint: String,
}

impl YoutubeHandler {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: OEMBED_ENDPOINT.to_string(),
        }
    }

    /// Point at a different oEmbed endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Handler for YoutubeHandler {
    fn name(&self) -> &'static str {
        "youtube"
    }

    fn should_prehandle(&self, url: &Url) -> bool {
        host_matches_any(url, &["youtube.com", "youtu.be"]) && video_id(url.as_str()).is_some()
    }

    fn prehandle<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<PartialResult>> {
        Box::pin(async move {
            let id = video_id(url.as_str())
                .with_context(|| format!("No video id in {url}"))?
                .to_string();
            let watch_url = format!("https://www.youtube.com/watch?v={id}");

            let oembed: OEmbed = self
                .http
                .get(&self.endpoint)
                .query(&[("format", "json"), ("url", watch_url.as_str())])
                .send()
                .await
                .context("YouTube oEmbed request failed")?
                .error_for_status()
                .context("YouTube oEmbed returned an error status")?
                .json()
                .await
                .context("YouTube oEmbed response is not valid JSON")?;

            let content = render_document(&id, url, &oembed);
            Ok(PartialResult {
                title: Some(oembed.title),
                content: Some(content),
                ..PartialResult::default()
            })
        })
    }
}

fn render_document(id: &str, url: &Url, oembed: &OEmbed) -> String {
    use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

    let width = match (oembed.width, oembed.height) {
        (Some(w), Some(h)) if h > 0.0 => (EMBED_HEIGHT * w / h).round(),
        _ => (EMBED_HEIGHT * 16.0 / 9.0).round(),
    };

    format!(
        r#"<html>
  <head>
    <title>{title}</title>
    <meta property="og:image" content="{thumb}" />
    <meta property="og:image:secure_url" content="{thumb}" />
    <meta property="og:title" content="{title_attr}" />
    <meta property="og:description" content="" />
    <meta property="article:author" content="{author_attr}" />
    <meta property="og:site_name" content="YouTube" />
    <meta property="og:type" content="video" />
  </head>
  <body>
    <iframe width="{width}" height="{height}" src="https://www.youtube.com/embed/{id}" title="{title_attr}" frameborder="0" allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture" allowfullscreen></iframe>
    <p><a href="{link}" target="_blank">{title}</a></p>
    <p itemscope="" itemprop="author" itemtype="http://schema.org/Person">By <a href="{author_url}" target="_blank">{author}</a></p>
  </body>
</html>"#,
        title = text(&oembed.title),
        title_attr = attr(&oembed.title),
        thumb = attr(&oembed.thumbnail_url),
        author = text(&oembed.author_name),
        author_attr = attr(&oembed.author_name),
        author_url = attr(&oembed.author_url),
        link = attr(url.as_str()),
        height = EMBED_HEIGHT,
        id = attr(id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_prehandle_requires_a_video() {
        let handler = YoutubeHandler::new(reqwest::Client::new());
        let watch = Url::parse("https://www.youtube.com/watch?v=BnSUk0je6oo").expect("url");
        let channel = Url::parse("https://www.youtube.com/@somechannel").expect("url");
        let other = Url::parse("https://example.com/watch?v=BnSUk0je6oo").expect("url");

        assert!(handler.should_prehandle(&watch));
        assert!(!handler.should_prehandle(&channel));
        assert!(!handler.should_prehandle(&other));
    }

    #[test]
    fn extracts_ids_from_embed_urls() {
        assert_eq!(
            video_id("https://www.youtube.com/embed/dQw4w9WgXcQ?start=3"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            video_id("https://youtube.com/shorts/abcdefghijk"),
            None,
            "shorts path has no trailing segment after the id"
        );
        assert_eq!(video_id("https://www.youtube.com/feed/trending"), None);
    }

    #[tokio::test]
    async fn prehandle_builds_embed_document() {
        let mut server = mockito::Server::new_async().await;
        let oembed = server
            .mock("GET", "/oembed")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("format".into(), "json".into()),
                mockito::Matcher::UrlEncoded(
                    "url".into(),
                    "https://www.youtube.com/watch?v=vFD2gu007dc".into(),
                ),
            ]))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"title":"Rust & Friends","author_name":"Ferris","author_url":"https://www.youtube.com/@ferris","thumbnail_url":"https://i.ytimg.com/vi/vFD2gu007dc/hqdefault.jpg","width":200,"height":100}"#,
            )
            .create_async()
            .await;

        let handler = YoutubeHandler::new(reqwest::Client::new())
            .with_endpoint(format!("{}/oembed", server.url()));
        let url = Url::parse("https://youtu.be/vFD2gu007dc").expect("url");
        let partial = handler.prehandle(&url).await.expect("prehandle");

        oembed.assert_async().await;
        assert_eq!(partial.title.as_deref(), Some("Rust & Friends"));
        let content = partial.content.expect("content");
        assert!(content.contains(r#"src="https://www.youtube.com/embed/vFD2gu007dc""#));
        assert!(content.contains(r#"width="700" height="350""#), "aspect ratio kept: {content}");
        assert!(content.contains("<title>Rust &amp; Friends</title>"));
        assert!(content.contains(r#">Ferris</a>"#));
    }
}
