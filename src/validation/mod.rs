//! URL guard applied before any URL is dereferenced
//!
//! Every URL the pipeline is about to fetch passes through here: the
//! caller's input, the result of redirect resolution and any rewrite a
//! prehandler returns.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::redirect::Policy;
use url::Url;

use crate::error::FetchError;
use crate::utils::extract_url;

static PRIVATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(10|172\.16|192\.168)\.").expect("PRIVATE_RANGE: hardcoded regex is valid")
});

const LOCAL_HOSTS: &[&str] = &["localhost", "0.0.0.0"];

/// Hops an outbound HTTP client follows before giving up
pub const MAX_REDIRECTS: usize = 10;

/// Parse and validate a URL string
///
/// # Errors
///
/// `FetchError::InvalidUrl` when the string does not parse, the scheme is not
/// `http`/`https`, or the host is local or in a private range.
pub fn validate_url(input: &str) -> Result<Url, FetchError> {
    let url = Url::parse(input.trim())
        .map_err(|e| FetchError::InvalidUrl(format!("{input}: {e}")))?;
    ensure_allowed(&url)?;
    Ok(url)
}

/// Validate an already parsed URL
///
/// # Errors
///
/// Same rules as [`validate_url`].
pub fn ensure_allowed(url: &Url) -> Result<(), FetchError> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(format!(
            "{url}: protocol check failed"
        )));
    }

    let host = url
        .host_str()
        .ok_or_else(|| FetchError::InvalidUrl(format!("{url}: missing host")))?
        .to_ascii_lowercase();

    if LOCAL_HOSTS.contains(&host.as_str()) {
        return Err(FetchError::InvalidUrl(format!("{url}: host is localhost")));
    }

    if PRIVATE_RANGE.is_match(&host) {
        return Err(FetchError::InvalidUrl(format!("{url}: host is a private ip")));
    }

    Ok(())
}

/// Take the first URL out of user-supplied text and validate it
///
/// # Errors
///
/// `FetchError::InvalidUrl` for empty input or a URL failing [`validate_url`].
pub fn parse_request_url(raw: &str) -> Result<Url, FetchError> {
    let candidate = extract_url(raw);
    log::debug!("Validating request URL {candidate:?}");
    if candidate.is_empty() {
        return Err(FetchError::InvalidUrl("no URL specified".to_string()));
    }
    validate_url(candidate)
}

/// Redirect policy for every client that dereferences user-controlled URLs
///
/// Each hop's target goes through [`ensure_allowed`]; a disallowed target or
/// more than [`MAX_REDIRECTS`] hops fails the request.
#[must_use]
pub fn guarded_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error(format!("more than {MAX_REDIRECTS} redirects"));
        }
        match ensure_allowed(attempt.url()) {
            Ok(()) => attempt.follow(),
            Err(e) => {
                log::warn!("Refusing redirect to {}: {}", attempt.url(), e);
                attempt.error(e)
            }
        }
    })
}
