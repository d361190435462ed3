use anyhow::Result;
use futures::future::BoxFuture;
use url::Url;

use super::{Handler, PartialResult};
use crate::utils::host_matches_any;

/// Drops Medium's `source` tracking parameter, which triggers a paywall
/// interstitial when present
pub struct MediumHandler;

impl Handler for MediumHandler {
    fn name(&self) -> &'static str {
        "medium"
    }

    fn should_prehandle(&self, url: &Url) -> bool {
        host_matches_any(url, &["medium.com"])
    }

    fn prehandle<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<PartialResult>> {
        Box::pin(async move {
            Ok(PartialResult {
                url: Some(strip_query_param(url, "source")),
                ..PartialResult::default()
            })
        })
    }
}

fn strip_query_param(url: &Url, name: &str) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != name)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut rewritten = url.clone();
    if kept.is_empty() {
        rewritten.set_query(None);
    } else {
        rewritten.query_pairs_mut().clear().extend_pairs(kept);
    }
    rewritten
}
