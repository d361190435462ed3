//! Type-safe builder for `FetchConfig` using the typestate pattern
//!
//! The signing secret and the ingestion API base are required; `build()`
//! only exists once both have been supplied.

use anyhow::{Context, Result, anyhow};
use regex::RegexBuilder;
use std::marker::PhantomData;
use std::path::PathBuf;
use url::Url;

use super::types::FetchConfig;
use crate::utils::{
    ALLOWED_CONTENT_TYPES, DEFAULT_EMBED_FRAME_PATTERN, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_LAUNCH_TIMEOUT_SECS, DEFAULT_NAVIGATION_TIMEOUT_SECS, DEFAULT_PROXY_COUNTRY_CODE,
    DEFAULT_PROXY_ENDPOINT, DEFAULT_SCROLL_TIMEOUT_SECS, DEFAULT_SUBREQUEST_CEILING,
    NO_SCRIPT_HOSTS, NON_BOT_HOSTS,
};

// Type states for the builder
pub struct WithSecret;
pub struct WithApiBase;

pub struct FetchConfigBuilder<State = ()> {
    pub(crate) jwt_secret: Option<String>,
    pub(crate) api_base: Option<String>,
    pub(crate) proxy_api_key: Option<String>,
    pub(crate) proxy_endpoint: String,
    pub(crate) proxy_country_code: String,
    pub(crate) chrome_executable: Option<PathBuf>,
    pub(crate) egress_proxy: Option<String>,
    pub(crate) headless: bool,
    pub(crate) navigation_timeout_secs: u64,
    pub(crate) scroll_timeout_secs: u64,
    pub(crate) launch_timeout_secs: u64,
    pub(crate) http_timeout_secs: u64,
    pub(crate) subrequest_ceiling: usize,
    pub(crate) allowed_content_types: Vec<String>,
    pub(crate) non_bot_hosts: Vec<String>,
    pub(crate) no_script_hosts: Vec<String>,
    pub(crate) embed_frame_pattern: String,
    pub(crate) _phantom: PhantomData<State>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

impl Default for FetchConfigBuilder<()> {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            api_base: None,
            proxy_api_key: None,
            proxy_endpoint: DEFAULT_PROXY_ENDPOINT.to_string(),
            proxy_country_code: DEFAULT_PROXY_COUNTRY_CODE.to_string(),
            chrome_executable: None,
            egress_proxy: None,
            headless: true,
            navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
            scroll_timeout_secs: DEFAULT_SCROLL_TIMEOUT_SECS,
            launch_timeout_secs: DEFAULT_LAUNCH_TIMEOUT_SECS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            subrequest_ceiling: DEFAULT_SUBREQUEST_CEILING,
            allowed_content_types: owned(ALLOWED_CONTENT_TYPES),
            non_bot_hosts: owned(NON_BOT_HOSTS),
            no_script_hosts: owned(NO_SCRIPT_HOSTS),
            embed_frame_pattern: DEFAULT_EMBED_FRAME_PATTERN.to_string(),
            _phantom: PhantomData,
        }
    }
}

impl FetchConfig {
    /// Create a builder for configuring a `FetchConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> FetchConfigBuilder<()> {
        FetchConfigBuilder::default()
    }
}

impl<State> FetchConfigBuilder<State> {
    fn transition<Next>(self) -> FetchConfigBuilder<Next> {
        FetchConfigBuilder {
            jwt_secret: self.jwt_secret,
            api_base: self.api_base,
            proxy_api_key: self.proxy_api_key,
            proxy_endpoint: self.proxy_endpoint,
            proxy_country_code: self.proxy_country_code,
            chrome_executable: self.chrome_executable,
            egress_proxy: self.egress_proxy,
            headless: self.headless,
            navigation_timeout_secs: self.navigation_timeout_secs,
            scroll_timeout_secs: self.scroll_timeout_secs,
            launch_timeout_secs: self.launch_timeout_secs,
            http_timeout_secs: self.http_timeout_secs,
            subrequest_ceiling: self.subrequest_ceiling,
            allowed_content_types: self.allowed_content_types,
            non_bot_hosts: self.non_bot_hosts,
            no_script_hosts: self.no_script_hosts,
            embed_frame_pattern: self.embed_frame_pattern,
            _phantom: PhantomData,
        }
    }
}

impl FetchConfigBuilder<()> {
    pub fn jwt_secret(mut self, secret: impl Into<String>) -> FetchConfigBuilder<WithSecret> {
        self.jwt_secret = Some(secret.into());
        self.transition()
    }
}

impl FetchConfigBuilder<WithSecret> {
    pub fn api_base(mut self, base: impl Into<String>) -> FetchConfigBuilder<WithApiBase> {
        self.api_base = Some(base.into());
        self.transition()
    }
}

// Build method only available when all required fields are set
impl FetchConfigBuilder<WithApiBase> {
    pub fn build(self) -> Result<FetchConfig> {
        let jwt_secret = self.jwt_secret.unwrap_or_default();
        if jwt_secret.trim().is_empty() {
            return Err(anyhow!("JWT secret must not be empty"));
        }

        let api_base_raw = self.api_base.unwrap_or_default();
        let api_base = Url::parse(api_base_raw.trim())
            .with_context(|| format!("Invalid ingestion API base URL '{api_base_raw}'"))?;
        let proxy_endpoint = Url::parse(self.proxy_endpoint.trim()).with_context(|| {
            format!("Invalid rendering proxy endpoint '{}'", self.proxy_endpoint)
        })?;

        for (name, value) in [
            ("navigation", self.navigation_timeout_secs),
            ("scroll", self.scroll_timeout_secs),
            ("launch", self.launch_timeout_secs),
            ("http", self.http_timeout_secs),
        ] {
            if value == 0 {
                return Err(anyhow!("{name} timeout must be greater than zero"));
            }
        }

        let embed_frame_regex = RegexBuilder::new(&self.embed_frame_pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| anyhow!("Invalid embed frame pattern '{}': {e}", self.embed_frame_pattern))?;

        let allowed_content_types = self
            .allowed_content_types
            .into_iter()
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        // Blank values from the environment mean "not configured"
        let proxy_api_key = self.proxy_api_key.filter(|k| !k.trim().is_empty());
        let egress_proxy = self.egress_proxy.filter(|p| !p.trim().is_empty());

        Ok(FetchConfig {
            jwt_secret,
            api_base,
            proxy_api_key,
            proxy_endpoint,
            proxy_country_code: self.proxy_country_code,
            chrome_executable: self.chrome_executable,
            egress_proxy,
            headless: self.headless,
            navigation_timeout_secs: self.navigation_timeout_secs,
            scroll_timeout_secs: self.scroll_timeout_secs,
            launch_timeout_secs: self.launch_timeout_secs,
            http_timeout_secs: self.http_timeout_secs,
            subrequest_ceiling: self.subrequest_ceiling,
            allowed_content_types,
            non_bot_hosts: self.non_bot_hosts,
            no_script_hosts: self.no_script_hosts,
            embed_frame_pattern: self.embed_frame_pattern,
            embed_frame_regex,
        })
    }
}
