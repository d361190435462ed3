//! Getter methods for `FetchConfig`

use regex::Regex;
use std::path::Path;
use std::time::Duration;
use url::Url;

use super::types::FetchConfig;

impl FetchConfig {
    #[must_use]
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    #[must_use]
    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    #[must_use]
    pub fn proxy_api_key(&self) -> Option<&str> {
        self.proxy_api_key.as_deref()
    }

    #[must_use]
    pub fn proxy_endpoint(&self) -> &Url {
        &self.proxy_endpoint
    }

    #[must_use]
    pub fn proxy_country_code(&self) -> &str {
        &self.proxy_country_code
    }

    #[must_use]
    pub fn chrome_executable(&self) -> Option<&Path> {
        self.chrome_executable.as_deref()
    }

    #[must_use]
    pub fn egress_proxy(&self) -> Option<&str> {
        self.egress_proxy.as_deref()
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    #[must_use]
    pub fn scroll_timeout(&self) -> Duration {
        Duration::from_secs(self.scroll_timeout_secs)
    }

    #[must_use]
    pub fn launch_timeout(&self) -> Duration {
        Duration::from_secs(self.launch_timeout_secs)
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    #[must_use]
    pub fn subrequest_ceiling(&self) -> usize {
        self.subrequest_ceiling
    }

    #[must_use]
    pub fn allowed_content_types(&self) -> &[String] {
        &self.allowed_content_types
    }

    /// Whether a content type (parameters such as `charset` ignored) is allowed
    #[must_use]
    pub fn is_allowed_content_type(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.allowed_content_types.iter().any(|t| *t == essence)
    }

    #[must_use]
    pub fn non_bot_hosts(&self) -> &[String] {
        &self.non_bot_hosts
    }

    #[must_use]
    pub fn no_script_hosts(&self) -> &[String] {
        &self.no_script_hosts
    }

    #[must_use]
    pub fn embed_frame_pattern(&self) -> &str {
        &self.embed_frame_pattern
    }

    #[must_use]
    pub fn embed_frame_regex(&self) -> &Regex {
        &self.embed_frame_regex
    }
}
