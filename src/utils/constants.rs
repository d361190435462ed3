//! Shared constants for article acquisition
//!
//! Default values and host/content-type lists used across the pipeline,
//! kept in one place so the handlers, the renderer and the config builder
//! agree on them.

/// Default desktop user agent presented to ordinary sites
///
/// Matches the identity the headless browser is launched with so that
/// header and `navigator.userAgent` stay consistent.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_6_0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Desktop identity for hosts that serve crawlers a degraded page
pub const NON_BOT_DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_6_0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Mobile crawler identity, used by handlers that fetch pages outside the browser
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 6.0.1; Nexus 5X Build/MMB29P) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/93.0.4577.62 Mobile Safari/537.36 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

/// Hosts that receive [`NON_BOT_DESKTOP_USER_AGENT`] (suffix match)
pub const NON_BOT_HOSTS: &[&str] = &["bloomberg.com", "forbes.com"];

/// Hosts rendered with JavaScript disabled (suffix match)
pub const NO_SCRIPT_HOSTS: &[&str] = &["medium.com", "fastcompany.com", "fortelabs.com"];

/// Document content types the renderer lets through and the submitter accepts
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "text/html",
    "application/octet-stream",
    "text/plain",
    "application/pdf",
];

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Analytics and ad domains whose requests are aborted
///
/// Entries match on host suffix; a leading `*.` is accepted and ignored.
pub const TRACKER_HOSTS: &[&str] = &[
    "*.optimizely.com",
    "everesttech.net",
    "userzoom.com",
    "doubleclick.net",
    "googleadservices.com",
    "adservice.google.com",
    "connect.facebook.com",
    "connect.facebook.net",
    "sp.analytics.yahoo.com",
];

/// Maximum sub-requests a single page may issue before the rest are aborted
pub const DEFAULT_SUBREQUEST_CEILING: usize = 100;

/// Navigation deadline, including the network-idle wait
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 30;

/// Upper bound for the auto-scroll routine
///
/// Lazy-loaded images rarely need more; pages with infinite scroll would
/// otherwise never finish.
pub const DEFAULT_SCROLL_TIMEOUT_SECS: u64 = 5;

/// Upper bound for launching the shared browser process
pub const DEFAULT_LAUNCH_TIMEOUT_SECS: u64 = 60;

/// Timeout for every outbound HTTP call (oEmbed, proxy, ingestion API)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Lifetime of the signed token attached to ingestion API calls
pub const AUTH_TOKEN_TTL_SECS: i64 = 300;

/// Child frames whose body is captured before normalization
pub const DEFAULT_EMBED_FRAME_PATTERN: &str = r"instagram\.com";

/// Class given to the `div` that replaces a captured embed frame
pub const EMBED_REPLACEMENT_CLASS: &str = "article-fetch-instagram-embed";

pub const DEFAULT_PROXY_ENDPOINT: &str = "https://app.scrapingbee.com/api/v1";

pub const DEFAULT_PROXY_COUNTRY_CODE: &str = "us";

/// Value of the `source` field on every create-article call
pub const SUBMISSION_SOURCE: &str = "article-fetch";

/// Elements with less inner markup than this are turned into `<img>` when
/// they only carry a background image
pub const BACKGROUND_IMAGE_CONTENT_THRESHOLD: usize = 25;
