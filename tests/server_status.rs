//! Status codes returned by the inbound trigger

use std::sync::Arc;

use article_fetch::{FetchError, server};
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{FakeRenderer, default_fetcher, mock_create_article};

async fn status_of(app: axum::Router, request: Request<Body>) -> StatusCode {
    app.oneshot(request).await.expect("router responds").status()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn missing_or_invalid_url_is_bad_request() {
    let server_mock = mockito::Server::new_async().await;
    let renderer = FakeRenderer::unreachable();
    let app = server::router(Arc::new(default_fetcher(&server_mock, renderer.clone())));

    assert_eq!(status_of(app.clone(), get("/")).await, StatusCode::BAD_REQUEST);
    assert_eq!(
        status_of(app.clone(), get("/?url=http%3A%2F%2Flocalhost%2Fadmin")).await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(app, get("/?url=not%20a%20url")).await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn successful_fetch_returns_empty_ok() {
    let mut server_mock = mockito::Server::new_async().await;
    let create = mock_create_article(
        &mut server_mock,
        json!({ "url": "https://example.com/post", "articleSavingRequestId": "save-9" }),
    )
    .await;

    let renderer = FakeRenderer::serving("Post", "<html><body>p</body></html>");
    let app = server::router(Arc::new(default_fetcher(&server_mock, renderer)));

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "url": "https://example.com/post",
                "userId": "user-9",
                "saveRequestId": "save-9"
            })
            .to_string(),
        ))
        .expect("request");

    let response = app.oneshot(request).await.expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert!(body.is_empty());
    create.assert_async().await;
}

#[tokio::test]
async fn terminal_failure_is_server_error() {
    let server_mock = mockito::Server::new_async().await;
    let renderer =
        FakeRenderer::new(|url| Err(FetchError::FetchFailure(format!("navigation to {url} failed"))));
    let app = server::router(Arc::new(default_fetcher(&server_mock, renderer)));

    assert_eq!(
        status_of(app, get("/?url=https%3A%2F%2Fexample.com%2Fdown")).await,
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
