use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static EMBEDDED_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://\S+").expect("EMBEDDED_URL: hardcoded regex is valid")
});

/// Pull the first `http(s)://` token out of free text
///
/// Share sheets often submit "Some headline https://site/path" instead of a
/// bare URL. Returns the input unchanged when no such token exists so the
/// validator can report on what the user actually sent.
#[must_use]
pub fn extract_url(input: &str) -> &str {
    let trimmed = input.trim();
    EMBEDDED_URL
        .find(trimmed)
        .map_or(trimmed, |m| m.as_str())
}

/// Whether `url`'s host is one of `suffixes` or a subdomain of one
///
/// Matching stops at label boundaries (`box.com` is not under `x.com`). A
/// leading `*.` on an entry is ignored, so `*.optimizely.com` and
/// `optimizely.com` behave the same.
#[must_use]
pub fn host_matches_any(url: &Url, suffixes: &[impl AsRef<str>]) -> bool {
    url.host_str()
        .is_some_and(|host| host_ends_with_any(host, suffixes))
}

#[must_use]
pub fn host_ends_with_any(host: &str, suffixes: &[impl AsRef<str>]) -> bool {
    let host = host.to_ascii_lowercase();
    suffixes.iter().any(|suffix| {
        let suffix = suffix.as_ref().trim_start_matches("*.");
        host == suffix
            || host
                .strip_suffix(suffix)
                .is_some_and(|rest| rest.ends_with('.'))
    })
}

/// Last non-empty path segment, percent-decoded
#[must_use]
pub fn file_name(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?;
    let decoded = urlencoding::decode(segment).map_or_else(|_| segment.to_string(), |d| d.into_owned());
    Some(decoded)
}
