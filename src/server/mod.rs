//! Inbound HTTP trigger
//!
//! `GET /` and `POST /` accept `url`, `userId` and `saveRequestId` from the
//! query string or a JSON body (body wins). Success is an empty 200; the real
//! output is the submission to the ingestion API.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, warn};

use crate::error::FetchError;
use crate::pipeline::{ContentFetcher, FetchRequest};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchParams {
    pub url: Option<String>,
    pub user_id: Option<String>,
    pub save_request_id: Option<String>,
    pub source: Option<String>,
}

impl FetchParams {
    /// Fields set in `self` win over `fallback`
    fn or(self, fallback: FetchParams) -> FetchParams {
        FetchParams {
            url: self.url.or(fallback.url),
            user_id: self.user_id.or(fallback.user_id),
            save_request_id: self.save_request_id.or(fallback.save_request_id),
            source: self.source.or(fallback.source),
        }
    }

    fn into_request(self) -> Result<FetchRequest, FetchError> {
        let url = self
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| FetchError::InvalidUrl("url parameter is required".to_string()))?;
        Ok(FetchRequest {
            url,
            user_id: self.user_id,
            save_request_id: self.save_request_id,
            source: self.source,
        })
    }
}

impl IntoResponse for FetchError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            warn!("Rejected request: {}", self);
            StatusCode::BAD_REQUEST
        } else {
            error!("Request failed: {}", self);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}

pub fn router(fetcher: Arc<ContentFetcher>) -> Router {
    Router::new()
        .route("/", get(fetch_article).post(fetch_article))
        .with_state(fetcher)
}

async fn fetch_article(
    State(fetcher): State<Arc<ContentFetcher>>,
    Query(query): Query<FetchParams>,
    body: Option<Json<FetchParams>>,
) -> Result<StatusCode, FetchError> {
    let params = match body {
        Some(Json(body)) => body.or(query),
        None => query,
    };
    fetcher.fetch(params.into_request()?).await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_fields_override_query() {
        let body = FetchParams {
            url: Some("https://example.com/body".into()),
            ..FetchParams::default()
        };
        let query = FetchParams {
            url: Some("https://example.com/query".into()),
            user_id: Some("u1".into()),
            ..FetchParams::default()
        };
        let request = body.or(query).into_request().expect("request");
        assert_eq!(request.url, "https://example.com/body");
        assert_eq!(request.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn blank_url_is_a_client_error() {
        let params = FetchParams {
            url: Some("  ".into()),
            ..FetchParams::default()
        };
        let err = params.into_request().expect_err("blank url");
        assert!(err.is_client_error());
    }

    #[test]
    fn error_status_mapping() {
        let bad = FetchError::InvalidUrl("nope".into()).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let failed = FetchError::Submission("rejected".into()).into_response();
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
