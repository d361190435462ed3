//! Page rendering
//!
//! [`Renderer`] is the seam the pipeline depends on; [`BrowserRenderer`] is
//! the headless Chrome implementation.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::emulation::SetScriptExecutionDisabledParams;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use futures::future::BoxFuture;
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};
use url::Url;

use super::interception::{InterceptionPolicy, SessionEvent, spawn_interception};
use super::manager::BrowserManager;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::normalizer::js_scripts::{
    READINESS_SCRIPT, SCROLL_SCRIPT, STOP_SCROLL_SCRIPT, TITLE_SCRIPT, frame_capture_script,
    normalize_script,
};
use crate::normalizer::{Normalized, ScriptOutcome};
use crate::pipeline::RequestLog;
use crate::utils::{
    DESKTOP_USER_AGENT, NON_BOT_DESKTOP_USER_AGENT, PDF_CONTENT_TYPE, host_matches_any,
    run_until_timeout, with_timeout,
};

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// An HTML (or otherwise allowed) document was loaded
    Document {
        final_url: Url,
        content_type: Option<String>,
        title: Option<String>,
        /// `None` when in-page capture failed after navigation succeeded
        normalized: Option<Normalized>,
    },
    /// The navigation turned out to be a PDF download
    Pdf { final_url: Url },
}

pub trait Renderer: Send + Sync {
    fn render<'a>(
        &'a self,
        url: &'a Url,
        log: &'a mut RequestLog,
    ) -> BoxFuture<'a, Result<RenderOutcome, FetchError>>;
}

pub struct BrowserRenderer {
    manager: BrowserManager,
    config: FetchConfig,
}

impl BrowserRenderer {
    #[must_use]
    pub fn new(manager: BrowserManager, config: FetchConfig) -> Self {
        Self { manager, config }
    }

    async fn render_page(
        &self,
        page: &Page,
        url: &Url,
        log: &mut RequestLog,
    ) -> Result<RenderOutcome, FetchError> {
        let user_agent = if host_matches_any(url, self.config.non_bot_hosts()) {
            NON_BOT_DESKTOP_USER_AGENT
        } else {
            DESKTOP_USER_AGENT
        };
        page.execute(SetUserAgentOverrideParams::new(user_agent))
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to set user agent: {e}")))?;

        if host_matches_any(url, self.config.no_script_hosts()) {
            debug!("Disabling JavaScript for {}", url);
            page.execute(SetScriptExecutionDisabledParams::new(true))
                .await
                .map_err(|e| FetchError::Browser(format!("Failed to disable scripts: {e}")))?;
        }

        let (interceptor, mut events) =
            spawn_interception(page, InterceptionPolicy::from_config(&self.config))
                .await
                .map_err(|e| FetchError::Browser(format!("{e:#}")))?;

        let outcome = self.navigate_and_capture(page, url, &mut events, log).await;
        interceptor.abort();
        outcome
    }

    async fn navigate_and_capture(
        &self,
        page: &Page,
        url: &Url,
        events: &mut UnboundedReceiver<SessionEvent>,
        log: &mut RequestLog,
    ) -> Result<RenderOutcome, FetchError> {
        let navigation = with_timeout(
            async {
                page.goto(url.as_str())
                    .await
                    .with_context(|| format!("Navigation to {url} failed"))?;
                Ok::<(), anyhow::Error>(())
            },
            self.config.navigation_timeout(),
            "Navigation",
        )
        .await;

        let mut observed = ObservedResponses::default();
        observed.drain(events);

        if let Err(e) = navigation {
            // Chrome aborts navigations that end in a download
            if let Some(pdf_url) = observed.pdf_url() {
                info!("Navigation failed after a PDF response; treating {} as PDF", pdf_url);
                log.mark("navigation");
                return Ok(RenderOutcome::Pdf { final_url: pdf_url });
            }
            return Err(FetchError::FetchFailure(format!("{e:#}")));
        }

        wait_for_network_idle(page, self.config.navigation_timeout()).await;
        log.mark("navigation");
        observed.drain(events);

        let final_url = match page.url().await {
            Ok(Some(current)) => Url::parse(&current).unwrap_or_else(|_| url.clone()),
            _ => url.clone(),
        };
        let main_frame = page.mainframe().await.ok().flatten().map(|f| f.inner().clone());
        let content_type = observed.main_document_type(main_frame.as_deref());

        if content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with(PDF_CONTENT_TYPE))
        {
            log.blocked_requests = observed.blocked;
            return Ok(RenderOutcome::Pdf { final_url });
        }

        match run_until_timeout(page.evaluate(SCROLL_SCRIPT), self.config.scroll_timeout()).await {
            Some(Ok(_)) => debug!("Scrolled to bottom of {}", final_url),
            Some(Err(e)) => {
                warn!("Scrolling {} failed: {}", final_url, e);
                log.scroll_error = Some(e.to_string());
            }
            None => {
                debug!("Scroll timed out for {}, continuing", final_url);
                if let Err(e) = page.evaluate(STOP_SCROLL_SCRIPT).await {
                    warn!("Failed to stop scrolling {}: {}", final_url, e);
                }
            }
        }
        log.mark("scroll");

        let title = page
            .evaluate(TITLE_SCRIPT)
            .await
            .ok()
            .and_then(|result| result.into_value::<String>().ok())
            .filter(|t| !t.trim().is_empty());

        let normalized = match self.capture(page).await {
            Ok(normalized) => Some(normalized),
            Err(e) => {
                warn!("Content capture failed for {}: {:#}", final_url, e);
                log.capture_error = Some(format!("{e:#}"));
                None
            }
        };
        log.mark("capture");

        observed.drain(events);
        log.blocked_requests = observed.blocked;

        Ok(RenderOutcome::Document {
            final_url,
            content_type,
            title,
            normalized,
        })
    }

    /// Capture embed frames, then normalize the live DOM with them
    async fn capture(&self, page: &Page) -> Result<Normalized> {
        let frames: BTreeMap<String, String> = page
            .evaluate(frame_capture_script(self.config.embed_frame_pattern()))
            .await
            .context("Frame capture script failed")?
            .into_value()
            .context("Frame capture returned an unexpected value")?;
        if !frames.is_empty() {
            debug!("Captured {} embed frame(s)", frames.len());
        }

        let outcome: ScriptOutcome = page
            .evaluate(normalize_script(&frames))
            .await
            .context("Normalize script failed")?
            .into_value()
            .context("Normalize script returned an unexpected value")?;
        Ok(outcome.into())
    }
}

impl Renderer for BrowserRenderer {
    fn render<'a>(
        &'a self,
        url: &'a Url,
        log: &'a mut RequestLog,
    ) -> BoxFuture<'a, Result<RenderOutcome, FetchError>> {
        Box::pin(async move {
            let session = self.manager.open_session().await?;
            let outcome = self.render_page(session.page(), url, log).await;
            session.close().await;
            outcome
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Readiness {
    ready_state: String,
    resources: usize,
    body_exists: bool,
}

/// Idle once the document is complete and no new resources appeared since
/// the previous poll
fn is_idle(previous_resources: Option<usize>, snapshot: &Readiness) -> bool {
    snapshot.ready_state == "complete"
        && snapshot.body_exists
        && previous_resources == Some(snapshot.resources)
}

/// Approximate network idle by polling the resource timing buffer
///
/// Gives up after `max_wait` and proceeds with whatever has loaded.
async fn wait_for_network_idle(page: &Page, max_wait: Duration) {
    let start = Instant::now();
    let mut previous = None;

    while start.elapsed() < max_wait {
        match page.evaluate(READINESS_SCRIPT).await {
            Ok(result) => match result.into_value::<Readiness>() {
                Ok(snapshot) => {
                    if is_idle(previous, &snapshot) {
                        debug!(
                            "Network idle after {:.2}s ({} resources)",
                            start.elapsed().as_secs_f64(),
                            snapshot.resources
                        );
                        return;
                    }
                    previous = Some(snapshot.resources);
                }
                Err(e) => debug!("Unexpected readiness value: {}", e),
            },
            Err(e) => debug!("Readiness check failed: {}, retrying", e),
        }
        tokio::time::sleep(IDLE_POLL_INTERVAL).await;
    }
    warn!("Network did not go idle within {}s, proceeding", max_wait.as_secs());
}

/// Document responses and block counts seen by the interception task
#[derive(Debug, Default)]
struct ObservedResponses {
    documents: Vec<(String, String, Option<String>)>,
    blocked: usize,
}

impl ObservedResponses {
    fn drain(&mut self, events: &mut UnboundedReceiver<SessionEvent>) {
        while let Ok(event) = events.try_recv() {
            self.record(event);
        }
    }

    fn record(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Blocked { .. } => self.blocked += 1,
            SessionEvent::DocumentResponse {
                url,
                frame_id,
                content_type,
                ..
            } => self.documents.push((url, frame_id, content_type)),
        }
    }

    /// Most recent response that carried a PDF
    fn pdf_url(&self) -> Option<Url> {
        self.documents
            .iter()
            .rev()
            .find(|(_, _, ct)| {
                ct.as_deref()
                    .is_some_and(|ct| ct.to_ascii_lowercase().starts_with(PDF_CONTENT_TYPE))
            })
            .and_then(|(url, _, _)| Url::parse(url).ok())
    }

    /// Content type of the last document loaded into the main frame
    fn main_document_type(&self, main_frame: Option<&str>) -> Option<String> {
        self.documents
            .iter()
            .rev()
            .find(|(_, frame, _)| main_frame.is_none_or(|main| main == frame))
            .and_then(|(_, _, ct)| ct.clone())
    }
}
