pub mod browser;
pub mod config;
pub mod error;
pub mod fallback;
pub mod handlers;
pub mod normalizer;
pub mod pipeline;
pub mod server;
pub mod submission;
pub mod utils;
pub mod validation;

use std::sync::Arc;

pub use browser::{BrowserManager, BrowserRenderer, RenderOutcome, Renderer};
pub use config::{FetchConfig, FetchConfigBuilder};
pub use error::{FetchError, FetchResultOf};
pub use fallback::{ProxiedDocument, ProxyFetcher};
pub use handlers::{Handler, HandlerRegistry, PartialResult};
pub use normalizer::{Normalized, is_blocked, normalize_html};
pub use pipeline::{ContentFetcher, FetchRequest, FetchResult, RequestLog};
pub use submission::{DocumentSubmission, IngestionClient, TokenSigner};
pub use validation::{ensure_allowed, parse_request_url, validate_url};

/// Production pipeline: default handlers rendering through the shared browser
///
/// # Errors
///
/// `FetchError::Config` if an HTTP client cannot be built.
pub fn browser_pipeline(
    config: FetchConfig,
    manager: BrowserManager,
) -> Result<ContentFetcher, FetchError> {
    let registry = HandlerRegistry::with_default_handlers(&config)
        .map_err(|e| FetchError::Config(format!("{e:#}")))?;
    let renderer = Arc::new(BrowserRenderer::new(manager, config.clone()));
    ContentFetcher::new(config, registry, renderer)
}
