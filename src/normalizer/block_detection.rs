use scraper::{Html, Selector};

use super::BLOCK_SENTINELS;

/// Whether the document carries a known bot-challenge marker
#[must_use]
pub fn is_blocked(html: &str) -> bool {
    let document = Html::parse_document(html);
    contains_sentinel(&document)
}

pub(crate) fn contains_sentinel(document: &Html) -> bool {
    BLOCK_SENTINELS.iter().any(|raw| match Selector::parse(raw) {
        Ok(selector) => document.select(&selector).next().is_some(),
        Err(e) => {
            log::warn!("Invalid block sentinel selector {raw}: {e:?}");
            false
        }
    })
}
