//! Resolve and prehandle stages
//!
//! Each stage asks the registry for the first matching handler, runs it, and
//! re-validates any URL it hands back. A failing handler (or one returning an
//! unsafe URL) is logged and treated as if nothing matched.

use tracing::{debug, warn};
use url::Url;

use super::RequestLog;
use crate::error::FetchError;
use crate::handlers::{HandlerRegistry, PartialResult};
use crate::validation::ensure_allowed;

/// Rewrite `url` through the first willing resolver (single hop)
pub async fn resolve_stage(registry: &HandlerRegistry, url: Url, log: &mut RequestLog) -> Url {
    let Some(handler) = registry.find_resolver(&url) else {
        return url;
    };
    let name = handler.name();

    let resolved = match handler.resolve(&url).await {
        Ok(resolved) => resolved,
        Err(e) => {
            record_failure(log, name, format!("{e:#}"));
            return url;
        }
    };

    if let Err(e) = ensure_allowed(&resolved) {
        record_failure(log, name, format!("resolved to a disallowed URL: {e}"));
        return url;
    }

    debug!("{} resolved {} -> {}", name, url, resolved);
    log.resolved_by = Some(name);
    resolved
}

/// Run the first willing prehandler and return what it produced
///
/// A returned `url` has already passed validation.
pub async fn prehandle_stage(
    registry: &HandlerRegistry,
    url: &Url,
    log: &mut RequestLog,
) -> PartialResult {
    let Some(handler) = registry.find_prehandler(url) else {
        return PartialResult::default();
    };
    let name = handler.name();

    let partial = match handler.prehandle(url).await {
        Ok(partial) => partial,
        Err(e) => {
            record_failure(log, name, format!("{e:#}"));
            return PartialResult::default();
        }
    };

    if let Some(rewritten) = &partial.url
        && let Err(e) = ensure_allowed(rewritten)
    {
        record_failure(log, name, format!("rewrote to a disallowed URL: {e}"));
        return PartialResult::default();
    }

    debug!(
        "{} prehandled {} (title: {}, content: {})",
        name,
        url,
        partial.title.is_some(),
        partial.content.is_some()
    );
    log.prehandled_by = Some(name);
    partial
}

fn record_failure(log: &mut RequestLog, handler: &'static str, message: String) {
    let err = FetchError::Handler { handler, message };
    warn!("{} (continuing without it)", err);
    log.handler_errors.push(err.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::Handler;
    use anyhow::anyhow;
    use futures::future::BoxFuture;

    struct Rewrite {
        name: &'static str,
        target: &'static str,
    }

    impl Handler for Rewrite {
        fn name(&self) -> &'static str {
            self.name
        }

        fn should_resolve(&self, _url: &Url) -> bool {
            true
        }

        fn resolve<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, anyhow::Result<Url>> {
            Box::pin(async move { Ok(Url::parse(self.target)?) })
        }

        fn should_prehandle(&self, _url: &Url) -> bool {
            true
        }

        fn prehandle<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, anyhow::Result<PartialResult>> {
            Box::pin(async move {
                Ok(PartialResult {
                    url: Some(Url::parse(self.target)?),
                    title: Some(self.name.to_string()),
                    ..PartialResult::default()
                })
            })
        }
    }

    struct Failing;

    impl Handler for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn should_resolve(&self, _url: &Url) -> bool {
            true
        }

        fn resolve<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, anyhow::Result<Url>> {
            Box::pin(async { Err(anyhow!("upstream down")) })
        }

        fn should_prehandle(&self, _url: &Url) -> bool {
            true
        }

        fn prehandle<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, anyhow::Result<PartialResult>> {
            Box::pin(async { Err(anyhow!("upstream down")) })
        }
    }

    fn start() -> (Url, RequestLog) {
        let url = Url::parse("https://example.com/start").expect("url");
        let log = RequestLog::new(url.as_str(), None, None, None);
        (url, log)
    }

    #[tokio::test]
    async fn first_registered_resolver_wins() {
        let registry = HandlerRegistry::new()
            .register(Rewrite {
                name: "first",
                target: "https://first.example.com/",
            })
            .register(Rewrite {
                name: "second",
                target: "https://second.example.com/",
            });
        let (url, mut log) = start();

        let resolved = resolve_stage(&registry, url, &mut log).await;
        assert_eq!(resolved.as_str(), "https://first.example.com/");
        assert_eq!(log.resolved_by, Some("first"));
    }

    #[tokio::test]
    async fn failing_handler_is_no_match() {
        let registry = HandlerRegistry::new().register(Failing);
        let (url, mut log) = start();

        let resolved = resolve_stage(&registry, url.clone(), &mut log).await;
        assert_eq!(resolved, url);
        assert!(log.resolved_by.is_none());

        let partial = prehandle_stage(&registry, &url, &mut log).await;
        assert_eq!(partial, PartialResult::default());
        assert_eq!(log.handler_errors.len(), 2);
    }

    #[tokio::test]
    async fn private_targets_are_rejected_after_resolve_and_rewrite() {
        let registry = HandlerRegistry::new().register(Rewrite {
            name: "sneaky",
            target: "http://192.168.1.10/admin",
        });
        let (url, mut log) = start();

        let resolved = resolve_stage(&registry, url.clone(), &mut log).await;
        assert_eq!(resolved, url);

        let partial = prehandle_stage(&registry, &url, &mut log).await;
        assert!(partial.url.is_none());
        assert!(partial.title.is_none(), "whole result discarded");
        assert!(log.prehandled_by.is_none());
    }
}
