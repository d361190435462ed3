//! Per-site handlers and the ordered registry that dispatches to them
//!
//! A handler participates in one or both of two independent capabilities:
//!
//! - **resolve**: rewrite the URL before anything else happens (link
//!   shorteners).
//! - **prehandle**: produce some or all of the result cheaply, usually via
//!   an oEmbed-style API, so the browser can be skipped.
//!
//! The registry keeps registration order; the first handler whose predicate
//! matches wins for each capability.

pub mod apple_news;
pub mod derstandard;
pub mod image;
pub mod medium;
pub mod pdf;
pub mod t_dot_co;
pub mod twitter;
pub mod youtube;

use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use serde::Serialize;
use url::Url;

use crate::config::FetchConfig;
use crate::utils::{DESKTOP_USER_AGENT, PDF_CONTENT_TYPE};
use crate::validation::guarded_redirect_policy;

pub use apple_news::AppleNewsHandler;
pub use derstandard::DerStandardHandler;
pub use image::ImageHandler;
pub use medium::MediumHandler;
pub use pdf::PdfHandler;
pub use t_dot_co::TDotCoHandler;
pub use twitter::TwitterHandler;
pub use youtube::YoutubeHandler;

/// Fields gathered before and during rendering
///
/// Stages only fill fields that are still empty, so the first stage to
/// provide a value keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartialResult {
    pub url: Option<Url>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub content_type: Option<String>,
}

impl PartialResult {
    /// Copy every field of `other` that is still missing here
    pub fn fill_missing(&mut self, other: PartialResult) {
        if self.url.is_none() {
            self.url = other.url;
        }
        if self.title.is_none() {
            self.title = other.title;
        }
        if self.content.is_none() {
            self.content = other.content;
        }
        if self.content_type.is_none() {
            self.content_type = other.content_type;
        }
    }

    #[must_use]
    pub fn is_pdf(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(PDF_CONTENT_TYPE))
    }

    /// Both title and content present, so rendering can be skipped
    #[must_use]
    pub fn has_document(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.is_empty())
            && self.content.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// A named strategy for one family of URLs
///
/// Predicates are cheap and synchronous; the async operations may do
/// network I/O and are allowed to fail. A failure is logged by the
/// dispatcher and treated as "no match".
pub trait Handler: Send + Sync {
    fn name(&self) -> &'static str;

    fn should_resolve(&self, _url: &Url) -> bool {
        false
    }

    fn resolve<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Url>> {
        Box::pin(async move { Ok(url.clone()) })
    }

    fn should_prehandle(&self, _url: &Url) -> bool {
        false
    }

    fn prehandle<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, Result<PartialResult>> {
        Box::pin(async { Ok(PartialResult::default()) })
    }
}

/// Ordered collection of handlers
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn Handler>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler; it is consulted after every handler registered before it
    #[must_use]
    pub fn register(mut self, handler: impl Handler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// The production handler set, in dispatch order
    ///
    /// # Errors
    ///
    /// Fails if the shared HTTP clients cannot be built.
    pub fn with_default_handlers(config: &FetchConfig) -> Result<Self> {
        let http = handler_http_client(config.http_timeout())?;

        Ok(Self::new()
            .register(PdfHandler)
            .register(AppleNewsHandler::new(http.clone()))
            .register(TwitterHandler::new(http.clone()))
            .register(YoutubeHandler::new(http.clone()))
            .register(TDotCoHandler::new(config.http_timeout())?)
            .register(MediumHandler)
            .register(DerStandardHandler::new(http))
            .register(ImageHandler))
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// First handler, in registration order, willing to resolve `url`
    #[must_use]
    pub fn find_resolver(&self, url: &Url) -> Option<&dyn Handler> {
        self.handlers
            .iter()
            .find(|h| h.should_resolve(url))
            .map(|h| &**h)
    }

    /// First handler, in registration order, willing to prehandle `url`
    #[must_use]
    pub fn find_prehandler(&self, url: &Url) -> Option<&dyn Handler> {
        self.handlers
            .iter()
            .find(|h| h.should_prehandle(url))
            .map(|h| &**h)
    }
}

/// HTTP client shared by handlers that call oEmbed endpoints or fetch pages
pub(crate) fn handler_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(DESKTOP_USER_AGENT)
        .redirect(guarded_redirect_policy())
        .build()
        .context("Failed to build handler HTTP client")
}
