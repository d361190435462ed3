//! Acquisition pipeline
//!
//! Stages run strictly in order for each request:
//! validate -> resolve -> prehandle -> render (or skip) -> fallback (if
//! blocked) -> submit. Nothing is shared between requests except the
//! handler registry, the renderer and the outbound clients.

pub mod dispatch;
pub mod request_log;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::browser::{RenderOutcome, Renderer};
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::fallback::ProxyFetcher;
use crate::handlers::{HandlerRegistry, PartialResult};
use crate::normalizer::{Normalized, normalize_html};
use crate::submission::{DocumentSubmission, IngestionClient};
use crate::utils::PDF_CONTENT_TYPE;
use crate::validation::parse_request_url;

pub use dispatch::{prehandle_stage, resolve_stage};
pub use request_log::RequestLog;

/// Content type assumed for rendered documents whose response carried none
const DEFAULT_DOCUMENT_TYPE: &str = "text/html";

/// Inbound request; `url` is raw user input and may carry surrounding text
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    pub url: String,
    pub user_id: Option<String>,
    pub save_request_id: Option<String>,
    pub source: Option<String>,
}

impl FetchRequest {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// What was handed to the ingestion API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    pub success: bool,
    pub url: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub content_type: Option<String>,
    pub error: Option<String>,
}

pub struct ContentFetcher {
    registry: HandlerRegistry,
    renderer: Arc<dyn Renderer>,
    fallback: ProxyFetcher,
    submitter: IngestionClient,
    config: FetchConfig,
}

impl ContentFetcher {
    /// # Errors
    ///
    /// `FetchError::Config` if the outbound HTTP clients cannot be built.
    pub fn new(
        config: FetchConfig,
        registry: HandlerRegistry,
        renderer: Arc<dyn Renderer>,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            fallback: ProxyFetcher::new(&config)?,
            submitter: IngestionClient::new(&config)?,
            registry,
            renderer,
            config,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Run one request through every stage and submit the result
    ///
    /// The request's [`RequestLog`] is emitted whether or not it succeeds.
    ///
    /// # Errors
    ///
    /// `InvalidUrl` before any I/O; `FetchFailure`, `Browser` or
    /// `Submission` for terminal failures further on.
    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchResult, FetchError> {
        let mut log = RequestLog::new(
            request.url.clone(),
            request.user_id.clone(),
            request.save_request_id.clone(),
            request.source.clone(),
        );

        let result = self.run(&request, &mut log).await;
        match &result {
            Ok(_) => log.success = true,
            Err(e) => log.error = Some(e.to_string()),
        }
        log.emit();
        result
    }

    async fn run(
        &self,
        request: &FetchRequest,
        log: &mut RequestLog,
    ) -> Result<FetchResult, FetchError> {
        let url = parse_request_url(&request.url)?;
        log.mark("validate");

        let url = resolve_stage(&self.registry, url, log).await;
        log.mark("resolve");

        let mut partial = prehandle_stage(&self.registry, &url, log).await;
        log.mark("prehandle");
        let mut url = partial.url.take().unwrap_or(url);

        if partial.is_pdf() {
            return self.submit_pdf(request, &url, log).await;
        }

        if !partial.has_document() {
            match self.renderer.render(&url, log).await? {
                RenderOutcome::Pdf { final_url } => {
                    return self.submit_pdf(request, &final_url, log).await;
                }
                RenderOutcome::Document {
                    final_url,
                    content_type,
                    title,
                    normalized,
                } => {
                    url = final_url;
                    partial.fill_missing(PartialResult {
                        title,
                        content_type,
                        ..PartialResult::default()
                    });
                    match normalized {
                        Some(Normalized::Content(html)) => partial.fill_missing(PartialResult {
                            content: Some(html),
                            ..PartialResult::default()
                        }),
                        Some(Normalized::Blocked) => {
                            info!("Block page served for {}, using fallback proxy", url);
                            log.blocked = true;
                            self.apply_fallback(&url, &mut partial, log).await?;
                        }
                        None => {}
                    }
                }
            }
        }

        let content_type = partial
            .content_type
            .take()
            .unwrap_or_else(|| DEFAULT_DOCUMENT_TYPE.to_string());
        if !self.config.is_allowed_content_type(&content_type) {
            return Err(FetchError::FetchFailure(format!(
                "content type {content_type} is not accepted"
            )));
        }

        log.final_url = Some(url.to_string());
        log.content_type = Some(content_type.clone());
        log.title.clone_from(&partial.title);

        self.submitter
            .submit_document(
                request.user_id.as_deref(),
                DocumentSubmission {
                    url: &url,
                    save_request_id: request.save_request_id.as_deref(),
                    title: partial.title.as_deref(),
                    content: partial.content.as_deref(),
                },
            )
            .await?;
        log.mark("submit");

        Ok(FetchResult {
            success: true,
            url: url.to_string(),
            title: partial.title,
            content: partial.content,
            content_type: Some(content_type),
            error: None,
        })
    }

    /// Replace title and content with what the rendering proxy returns
    async fn apply_fallback(
        &self,
        url: &Url,
        partial: &mut PartialResult,
        log: &mut RequestLog,
    ) -> Result<(), FetchError> {
        log.fallback_used = true;
        let document = self.fallback.fetch(url).await?;
        log.mark("fallback");

        let content = match normalize_html(&document.content, &BTreeMap::new()) {
            Ok(Normalized::Content(html)) => html,
            Ok(Normalized::Blocked) => {
                warn!("Fallback proxy also returned a block page for {}", url);
                log.fallback_blocked = true;
                document.content
            }
            Err(e) => {
                warn!("Could not normalize fallback document for {}: {:#}", url, e);
                document.content
            }
        };

        if !document.title.is_empty() {
            partial.title = Some(document.title);
        }
        partial.content = Some(content);
        Ok(())
    }

    async fn submit_pdf(
        &self,
        request: &FetchRequest,
        url: &Url,
        log: &mut RequestLog,
    ) -> Result<FetchResult, FetchError> {
        if !self.config.is_allowed_content_type(PDF_CONTENT_TYPE) {
            return Err(FetchError::FetchFailure(
                "PDF documents are not accepted".to_string(),
            ));
        }

        log.final_url = Some(url.to_string());
        log.content_type = Some(PDF_CONTENT_TYPE.to_string());

        self.submitter
            .submit_pdf(
                request.user_id.as_deref(),
                url,
                request.save_request_id.as_deref(),
            )
            .await?;
        log.mark("submit");

        Ok(FetchResult {
            success: true,
            url: url.to_string(),
            title: None,
            content: None,
            content_type: Some(PDF_CONTENT_TYPE.to_string()),
            error: None,
        })
    }
}
