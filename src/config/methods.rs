//! Builder methods available for all states
//!
//! Optional settings can be applied before or after the required fields.

use std::path::PathBuf;

use super::builder::FetchConfigBuilder;

impl<State> FetchConfigBuilder<State> {
    #[must_use]
    pub fn proxy_api_key(mut self, key: Option<String>) -> Self {
        self.proxy_api_key = key;
        self
    }

    #[must_use]
    pub fn proxy_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.proxy_endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn proxy_country_code(mut self, code: impl Into<String>) -> Self {
        self.proxy_country_code = code.into();
        self
    }

    /// Use a specific Chrome/Chromium binary instead of discovering one
    #[must_use]
    pub fn chrome_executable(mut self, path: Option<PathBuf>) -> Self {
        self.chrome_executable = path;
        self
    }

    /// Route browser traffic through an egress proxy (`--proxy-server`)
    #[must_use]
    pub fn egress_proxy(mut self, proxy: Option<String>) -> Self {
        self.egress_proxy = proxy;
        self
    }

    /// Set browser headless mode
    ///
    /// Headed mode needs a display server and is only useful when debugging
    /// a page locally.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.navigation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn scroll_timeout_secs(mut self, secs: u64) -> Self {
        self.scroll_timeout_secs = secs;
        self
    }

    /// Deadline for starting the shared browser process
    #[must_use]
    pub fn launch_timeout_secs(mut self, secs: u64) -> Self {
        self.launch_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.http_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn subrequest_ceiling(mut self, ceiling: usize) -> Self {
        self.subrequest_ceiling = ceiling;
        self
    }

    #[must_use]
    pub fn allowed_content_types(mut self, types: Vec<String>) -> Self {
        self.allowed_content_types = types;
        self
    }

    #[must_use]
    pub fn non_bot_hosts(mut self, hosts: Vec<String>) -> Self {
        self.non_bot_hosts = hosts;
        self
    }

    #[must_use]
    pub fn no_script_hosts(mut self, hosts: Vec<String>) -> Self {
        self.no_script_hosts = hosts;
        self
    }

    /// Regex (case-insensitive) selecting child frames to capture for embedding
    #[must_use]
    pub fn embed_frame_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.embed_frame_pattern = pattern.into();
        self
    }
}
