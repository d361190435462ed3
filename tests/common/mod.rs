//! Test utilities shared by the integration suites

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use article_fetch::{
    ContentFetcher, FetchConfig, FetchError, HandlerRegistry, Normalized, RenderOutcome,
    Renderer, RequestLog,
};
use futures::future::BoxFuture;
use mockito::{Matcher, Mock, Server};
use serde_json::json;
use url::Url;

type RenderFn = dyn Fn(&Url) -> Result<RenderOutcome, FetchError> + Send + Sync;

/// Renderer that answers from a closure and counts its calls
pub struct FakeRenderer {
    respond: Box<RenderFn>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeRenderer {
    pub fn new(
        respond: impl Fn(&Url) -> Result<RenderOutcome, FetchError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            calls: AtomicUsize::new(0),
        })
    }

    /// Renders every URL as the given document
    pub fn serving(title: &'static str, html: &'static str) -> Arc<Self> {
        Self::new(move |url| {
            Ok(RenderOutcome::Document {
                final_url: url.clone(),
                content_type: Some("text/html; charset=utf-8".to_string()),
                title: Some(title.to_string()),
                normalized: Some(Normalized::Content(html.to_string())),
            })
        })
    }

    /// Fails the test if rendering is ever attempted
    pub fn unreachable() -> Arc<Self> {
        Self::new(|url| panic!("renderer must not be called for {url}"))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Renderer for FakeRenderer {
    fn render<'a>(
        &'a self,
        url: &'a Url,
        log: &'a mut RequestLog,
    ) -> BoxFuture<'a, Result<RenderOutcome, FetchError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            log.mark("render");
            (self.respond)(url)
        })
    }
}

/// Config pointing the ingestion API and the rendering proxy at `server`
#[allow(dead_code)]
pub fn test_config(server: &Server) -> FetchConfig {
    FetchConfig::builder()
        .jwt_secret("test-secret")
        .api_base(server.url())
        .proxy_endpoint(format!("{}/api/v1", server.url()))
        .proxy_api_key(Some("proxy-key".to_string()))
        .http_timeout_secs(5)
        .build()
        .expect("test config is valid")
}

#[allow(dead_code)]
pub fn fetcher_with(
    server: &Server,
    registry: HandlerRegistry,
    renderer: Arc<FakeRenderer>,
) -> ContentFetcher {
    ContentFetcher::new(test_config(server), registry, renderer as Arc<dyn Renderer>)
        .expect("fetcher builds")
}

/// Fetcher with the production handler set
#[allow(dead_code)]
pub fn default_fetcher(server: &Server, renderer: Arc<FakeRenderer>) -> ContentFetcher {
    let config = test_config(server);
    let registry = HandlerRegistry::with_default_handlers(&config).expect("handlers build");
    ContentFetcher::new(config, registry, renderer as Arc<dyn Renderer>).expect("fetcher builds")
}

/// Successful `createArticle` for requests whose input contains `input`
#[allow(dead_code)]
pub async fn mock_create_article(server: &mut Server, input: serde_json::Value) -> Mock {
    server
        .mock("POST", "/graphql")
        .match_header("cookie", Matcher::Regex("^auth=[^;]+;$".to_string()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("CreateArticle".to_string()),
            Matcher::PartialJson(json!({ "variables": { "input": input } })),
        ]))
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":{"createArticle":{"createdArticle":{"id":"article-1"}}}}"#)
        .create_async()
        .await
}

/// Any `createArticle` carrying a prepared document
#[allow(dead_code)]
pub async fn mock_prepared_document(server: &mut Server) -> Mock {
    server
        .mock("POST", "/graphql")
        .match_body(Matcher::Regex("preparedDocument".to_string()))
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":{"createArticle":{"createdArticle":{"id":"article-1"}}}}"#)
        .create_async()
        .await
}

/// `uploadFileRequest` granting a slot at `/upload/<id>` on `server`
#[allow(dead_code)]
pub async fn mock_upload_slot(server: &mut Server, id: &str) -> Mock {
    let body = json!({
        "data": {
            "uploadFileRequest": {
                "id": id,
                "uploadSignedUrl": format!("{}/upload/{id}", server.url()),
            }
        }
    });
    server
        .mock("POST", "/graphql")
        .match_body(Matcher::Regex("uploadFileRequest".to_string()))
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

/// Creates a test HTML document with specified content
#[allow(dead_code)]
pub fn create_test_html(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{}</title>
</head>
<body>
    {}
</body>
</html>"#,
        html_escape::encode_text(title),
        body
    )
}

/// Cloudflare-style interstitial
#[allow(dead_code)]
pub fn create_block_page() -> String {
    create_test_html(
        "Just a moment...",
        r#"<div id="challenge"><span data-translate="managed_checking_msg">Checking your browser before accessing</span></div>"#,
    )
}
