//! Registry ordering and dispatch failure policy

use anyhow::anyhow;
use article_fetch::config::FetchConfig;
use article_fetch::handlers::{Handler, HandlerRegistry, PartialResult, PdfHandler};
use article_fetch::FetchRequest;
use futures::future::BoxFuture;
use serde_json::json;
use url::Url;

mod common;
use common::{FakeRenderer, fetcher_with, mock_create_article};

fn config() -> FetchConfig {
    FetchConfig::builder()
        .jwt_secret("secret")
        .api_base("https://api.example.com")
        .build()
        .expect("config")
}

fn url(raw: &str) -> Url {
    Url::parse(raw).expect("url")
}

#[test]
fn default_handlers_are_registered_in_dispatch_order() {
    let registry = HandlerRegistry::with_default_handlers(&config()).expect("registry");
    assert_eq!(
        registry.names(),
        vec![
            "pdf",
            "apple-news",
            "twitter",
            "youtube",
            "t-dot-co",
            "medium",
            "derstandard",
            "image"
        ]
    );
}

#[test]
fn each_site_reaches_its_prehandler() {
    let registry = HandlerRegistry::with_default_handlers(&config()).expect("registry");
    let cases = [
        ("https://example.com/paper.pdf", Some("pdf")),
        ("https://apple.news/AbCdEf", Some("apple-news")),
        ("https://x.com/someone/status/1234567890", Some("twitter")),
        ("https://youtu.be/vFD2gu007dc", Some("youtube")),
        ("https://medium.com/@writer/a-post-123?source=rss", Some("medium")),
        ("https://www.derstandard.at/story/2000/artikel", Some("derstandard")),
        ("https://example.com/photo.JPG", Some("image")),
        ("https://t.co/abc123", None),
        ("https://example.com/article", None),
    ];

    for (raw, expected) in cases {
        let found = registry.find_prehandler(&url(raw)).map(|h| h.name());
        assert_eq!(found, expected, "{raw}");
    }
}

#[test]
fn only_shortener_resolves() {
    let registry = HandlerRegistry::with_default_handlers(&config()).expect("registry");
    assert_eq!(
        registry.find_resolver(&url("https://t.co/abc123")).map(|h| h.name()),
        Some("t-dot-co")
    );
    assert!(registry.find_resolver(&url("https://example.com/a")).is_none());
}

#[test]
fn pdf_wins_over_later_handlers() {
    // `.pdf` under a medium host still goes to the PDF path
    let registry = HandlerRegistry::with_default_handlers(&config()).expect("registry");
    let found = registry
        .find_prehandler(&url("https://medium.com/files/whitepaper.pdf"))
        .map(|h| h.name());
    assert_eq!(found, Some("pdf"));
}

struct Exploding;

impl Handler for Exploding {
    fn name(&self) -> &'static str {
        "exploding"
    }

    fn should_prehandle(&self, _url: &Url) -> bool {
        true
    }

    fn prehandle<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, anyhow::Result<PartialResult>> {
        Box::pin(async { Err(anyhow!("oEmbed endpoint returned 503")) })
    }
}

#[tokio::test]
async fn failing_prehandler_falls_through_to_rendering() {
    let mut server = mockito::Server::new_async().await;
    let create = mock_create_article(
        &mut server,
        json!({
            "url": "https://example.com/story",
            "preparedDocument": { "pageInfo": { "title": "Rendered" } }
        }),
    )
    .await;

    let renderer = FakeRenderer::serving("Rendered", "<html><body>r</body></html>");
    let registry = HandlerRegistry::new().register(Exploding).register(PdfHandler);
    let fetcher = fetcher_with(&server, registry, renderer.clone());

    fetcher
        .fetch(FetchRequest::new("https://example.com/story"))
        .await
        .expect("request survives handler failure");

    create.assert_async().await;
    assert_eq!(renderer.calls(), 1);
}

/// Supplies a complete document, so the browser is skipped
struct Complete;

impl Handler for Complete {
    fn name(&self) -> &'static str {
        "complete"
    }

    fn should_prehandle(&self, _url: &Url) -> bool {
        true
    }

    fn prehandle<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, anyhow::Result<PartialResult>> {
        Box::pin(async {
            Ok(PartialResult {
                title: Some("From oEmbed".into()),
                content: Some("<html><body>embed</body></html>".into()),
                ..PartialResult::default()
            })
        })
    }
}

#[tokio::test]
async fn complete_prehandle_skips_rendering() {
    let mut server = mockito::Server::new_async().await;
    let create = mock_create_article(
        &mut server,
        json!({
            "skipParsing": false,
            "preparedDocument": {
                "document": "<html><body>embed</body></html>",
                "pageInfo": { "title": "From oEmbed" }
            }
        }),
    )
    .await;

    let renderer = FakeRenderer::unreachable();
    let registry = HandlerRegistry::new().register(Complete);
    fetcher_with(&server, registry, renderer.clone())
        .fetch(FetchRequest::new("https://video.example.com/watch/1"))
        .await
        .expect("submitted");

    create.assert_async().await;
    assert_eq!(renderer.calls(), 0);
}
