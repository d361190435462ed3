//! Core configuration type for article acquisition
//!
//! `FetchConfig` carries the externally supplied configuration surface
//! (secrets, endpoints, browser location) together with the tunables the
//! renderer and handlers use.

use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use url::Url;

/// Main configuration struct for the acquisition pipeline
///
/// Built through [`FetchConfig::builder`]; secrets are never serialized so
/// the config can be logged at startup.
#[derive(Debug, Clone, Serialize)]
pub struct FetchConfig {
    /// Shared secret the ingestion API token is signed with
    #[serde(skip)]
    pub(crate) jwt_secret: String,

    /// Base URL of the ingestion API; GraphQL calls go to `<api_base>/graphql`
    pub(crate) api_base: Url,

    /// Rendering proxy credentials. Without a key the fallback stage fails.
    #[serde(skip)]
    pub(crate) proxy_api_key: Option<String>,
    pub(crate) proxy_endpoint: Url,
    pub(crate) proxy_country_code: String,

    /// Explicit Chrome/Chromium binary; discovered when `None`
    pub(crate) chrome_executable: Option<PathBuf>,

    /// Egress proxy handed to the browser as `--proxy-server`
    pub(crate) egress_proxy: Option<String>,
    pub(crate) headless: bool,

    pub(crate) navigation_timeout_secs: u64,
    pub(crate) scroll_timeout_secs: u64,
    /// Deadline for launching the shared browser process
    pub(crate) launch_timeout_secs: u64,
    pub(crate) http_timeout_secs: u64,

    /// Sub-requests a page may issue before the rest are aborted
    pub(crate) subrequest_ceiling: usize,

    pub(crate) allowed_content_types: Vec<String>,
    pub(crate) non_bot_hosts: Vec<String>,
    pub(crate) no_script_hosts: Vec<String>,

    pub(crate) embed_frame_pattern: String,

    /// Compiled `embed_frame_pattern`, built once in the builder
    #[serde(skip)]
    pub(crate) embed_frame_regex: Regex,
}
