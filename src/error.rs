//! Error taxonomy for the acquisition pipeline
//!
//! Only `Handler` failures and blocked content are recovered locally; every
//! other variant is terminal and surfaces to the inbound trigger.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type FetchResultOf<T> = Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Malformed URL, disallowed scheme or private/local target.
    /// Raised before any network I/O and never retried.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A resolve or prehandle handler failed. Logged and treated as no match.
    #[error("Handler '{handler}' failed: {message}")]
    Handler {
        handler: &'static str,
        message: String,
    },

    /// Navigation failed, or the fallback proxy could not deliver the page
    #[error("Fetch failed: {0}")]
    FetchFailure(String),

    /// The ingestion API rejected or failed to accept the result
    #[error("Submission failed: {0}")]
    Submission(String),

    /// Browser could not be launched or a page session could not be opened
    #[error("Browser error: {0}")]
    Browser(String),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<anyhow::Error> for FetchError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the context chain
        Self::FetchFailure(format!("{err:#}"))
    }
}

impl FetchError {
    /// Whether the caller sent bad input (4xx) rather than hitting a terminal failure (5xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, FetchError::InvalidUrl(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_invalid_url_is_a_client_error() {
        assert!(FetchError::InvalidUrl("ftp://x".into()).is_client_error());
        assert!(!FetchError::FetchFailure("boom".into()).is_client_error());
        assert!(!FetchError::Submission("rejected".into()).is_client_error());
        assert!(!FetchError::Browser("no chrome".into()).is_client_error());
    }

    #[test]
    fn anyhow_conversion_keeps_context_chain() {
        let err = anyhow::anyhow!("connection reset").context("proxy request failed");
        let converted: FetchError = err.into();
        let text = converted.to_string();
        assert!(text.contains("proxy request failed"), "missing outer context: {text}");
        assert!(text.contains("connection reset"), "missing root cause: {text}");
    }
}
