//! Content Normalizer
//!
//! Cleans a captured document before submission:
//!
//! - drops blurred `<img>` placeholders left behind by lazy loaders
//! - turns near-empty elements that only paint a `background-image` into `<img>`
//! - swaps allow-listed embed iframes for the markup captured from their frames
//!
//! and reports [`Normalized::Blocked`] when a bot-challenge sentinel is present.
//! The live variant runs inside the page ([`js_scripts::normalize_script`]);
//! [`static_html::normalize_html`] applies the same rules to serialized HTML.

pub mod block_detection;
pub mod js_scripts;
pub mod static_html;

use serde::Deserialize;

pub use block_detection::is_blocked;
pub use static_html::normalize_html;

/// Markup that only appears on anti-bot challenge pages
pub const BLOCK_SENTINELS: &[&str] = &[
    r#"[data-translate="managed_checking_msg"]"#,
    "#px-block-form-wrapper",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Normalized document HTML
    Content(String),
    /// A challenge page was served instead of the article
    Blocked,
}

/// Raw value returned by the in-page normalize script
#[derive(Debug, Deserialize)]
pub struct ScriptOutcome {
    pub blocked: bool,
    #[serde(default)]
    pub html: Option<String>,
}

impl From<ScriptOutcome> for Normalized {
    fn from(outcome: ScriptOutcome) -> Self {
        match outcome {
            ScriptOutcome { blocked: true, .. } => Normalized::Blocked,
            ScriptOutcome { html, .. } => Normalized::Content(html.unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_outcome_maps_to_normalized() {
        let blocked: ScriptOutcome =
            serde_json::from_str(r#"{"blocked":true,"html":null}"#).expect("json");
        assert_eq!(Normalized::from(blocked), Normalized::Blocked);

        let content: ScriptOutcome =
            serde_json::from_str(r#"{"blocked":false,"html":"<html></html>"}"#).expect("json");
        assert_eq!(
            Normalized::from(content),
            Normalized::Content("<html></html>".into())
        );
    }
}
