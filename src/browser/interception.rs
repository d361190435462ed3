//! Network interception
//!
//! Decisions are made by [`InterceptionState`], which is plain data and can be
//! driven without a browser. [`spawn_interception`] wires it to the page's
//! `Fetch.requestPaused` events and reports what happened over a channel.

use std::sync::Arc;

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
    RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use futures::StreamExt;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{debug, trace};
use url::Url;

use crate::config::FetchConfig;
use crate::utils::{TRACKER_HOSTS, host_ends_with_any};
use crate::validation::ensure_allowed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Document,
    Script,
    Font,
    Image,
    Media,
    Other,
}

impl From<&ResourceType> for ResourceKind {
    fn from(resource_type: &ResourceType) -> Self {
        match resource_type {
            ResourceType::Document => ResourceKind::Document,
            ResourceType::Script => ResourceKind::Script,
            ResourceType::Font => ResourceKind::Font,
            ResourceType::Image => ResourceKind::Image,
            ResourceType::Media => ResourceKind::Media,
            _ => ResourceKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Before the request is sent
    Request,
    /// Response headers received, body not yet downloaded
    Response {
        status: i64,
        content_type: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedRequest {
    pub url: String,
    pub frame_id: String,
    pub kind: ResourceKind,
    pub stage: Stage,
}

impl InterceptedRequest {
    fn from_event(event: &EventRequestPaused) -> Self {
        let stage = match event.response_status_code {
            Some(status) => Stage::Response {
                status,
                content_type: event.response_headers.as_ref().and_then(|headers| {
                    headers
                        .iter()
                        .find(|h| h.name.eq_ignore_ascii_case("content-type"))
                        .map(|h| h.value.clone())
                }),
            },
            None => Stage::Request,
        };
        Self {
            url: event.request.url.clone(),
            frame_id: event.frame_id.inner().clone(),
            kind: ResourceKind::from(&event.resource_type),
            stage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// Font, image or media sub-resource
    ResourceKind,
    Tracker,
    MathJax,
    /// Page exceeded its sub-request ceiling
    Ceiling,
    /// Document response with a content type outside the allow-list
    ContentType,
    /// Local or private-range target, including redirect hops
    DisallowedUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Abort(BlockReason),
}

/// What a page may load
#[derive(Debug, Clone)]
pub struct InterceptionPolicy {
    allowed_content_types: Vec<String>,
    tracker_hosts: Vec<String>,
    subrequest_ceiling: usize,
}

impl InterceptionPolicy {
    #[must_use]
    pub fn new(allowed_content_types: Vec<String>, subrequest_ceiling: usize) -> Self {
        Self {
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|t| t.to_ascii_lowercase())
                .collect(),
            tracker_hosts: TRACKER_HOSTS.iter().map(|h| (*h).to_string()).collect(),
            subrequest_ceiling,
        }
    }

    #[must_use]
    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            config.allowed_content_types().to_vec(),
            config.subrequest_ceiling(),
        )
    }

    fn is_tracker(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| host_ends_with_any(h, &self.tracker_hosts)))
            .unwrap_or(false)
    }

    /// http(s) targets only; `data:` and `blob:` requests never leave the browser
    fn is_disallowed_target(url: &str) -> bool {
        Url::parse(url).is_ok_and(|u| {
            matches!(u.scheme(), "http" | "https") && ensure_allowed(&u).is_err()
        })
    }

    fn is_allowed_content_type(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.allowed_content_types.iter().any(|t| *t == essence)
    }
}

/// Per-page interception state: the policy plus the sub-request count
#[derive(Debug)]
pub struct InterceptionState {
    policy: InterceptionPolicy,
    requests_allowed: usize,
}

impl InterceptionState {
    #[must_use]
    pub fn new(policy: InterceptionPolicy) -> Self {
        Self {
            policy,
            requests_allowed: 0,
        }
    }

    pub fn decide(&mut self, request: &InterceptedRequest) -> Decision {
        match &request.stage {
            Stage::Response {
                status,
                content_type,
            } => {
                let is_success = (200..300).contains(status);
                match content_type {
                    Some(ct) if is_success && !self.policy.is_allowed_content_type(ct) => {
                        Decision::Abort(BlockReason::ContentType)
                    }
                    _ => Decision::Continue,
                }
            }
            Stage::Request => {
                if matches!(
                    request.kind,
                    ResourceKind::Font | ResourceKind::Image | ResourceKind::Media
                ) {
                    return Decision::Abort(BlockReason::ResourceKind);
                }
                if InterceptionPolicy::is_disallowed_target(&request.url) {
                    return Decision::Abort(BlockReason::DisallowedUrl);
                }
                if self.policy.is_tracker(&request.url) {
                    return Decision::Abort(BlockReason::Tracker);
                }
                if request.kind == ResourceKind::Script
                    && request.url.to_ascii_lowercase().contains("mathjax")
                {
                    return Decision::Abort(BlockReason::MathJax);
                }
                if self.requests_allowed >= self.policy.subrequest_ceiling {
                    return Decision::Abort(BlockReason::Ceiling);
                }
                self.requests_allowed += 1;
                Decision::Continue
            }
        }
    }
}

/// What the interception task observed, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Blocked {
        url: String,
        reason: BlockReason,
    },
    DocumentResponse {
        url: String,
        frame_id: String,
        status: i64,
        content_type: Option<String>,
    },
}

/// Enable request interception on `page` and start the decision task
///
/// The task runs until the page's event stream ends; abort the returned
/// handle once the page is done with.
pub async fn spawn_interception(
    page: &Page,
    policy: InterceptionPolicy,
) -> Result<(JoinHandle<()>, UnboundedReceiver<SessionEvent>)> {
    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .context("Failed to subscribe to paused requests")?;

    page.execute(EnableParams {
        patterns: Some(vec![
            RequestPattern {
                url_pattern: Some("*".to_string()),
                resource_type: None,
                request_stage: Some(RequestStage::Request),
            },
            RequestPattern {
                url_pattern: Some("*".to_string()),
                resource_type: Some(ResourceType::Document),
                request_stage: Some(RequestStage::Response),
            },
        ]),
        handle_auth_requests: None,
    })
    .await
    .context("Failed to enable request interception")?;

    let (tx, rx) = unbounded_channel();
    let page = page.clone();
    let mut state = InterceptionState::new(policy);

    let task = tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let event: Arc<EventRequestPaused> = event;
            let request = InterceptedRequest::from_event(&event);
            let decision = state.decide(&request);

            let sent = match decision {
                Decision::Continue => page
                    .execute(ContinueRequestParams::new(event.request_id.clone()))
                    .await
                    .map(|_| ()),
                Decision::Abort(reason) => {
                    trace!("Aborting {} ({:?})", request.url, reason);
                    page.execute(FailRequestParams::new(
                        event.request_id.clone(),
                        ErrorReason::BlockedByClient,
                    ))
                    .await
                    .map(|_| ())
                }
            };
            if let Err(e) = sent {
                debug!("Interception command for {} failed: {}", request.url, e);
            }

            // Receiver goes away when rendering ends; keep unpausing requests regardless
            if let Decision::Abort(reason) = decision {
                let _ = tx.send(SessionEvent::Blocked {
                    url: request.url.clone(),
                    reason,
                });
            }
            if let Stage::Response {
                status,
                content_type,
            } = request.stage
                && request.kind == ResourceKind::Document
            {
                let _ = tx.send(SessionEvent::DocumentResponse {
                    url: request.url,
                    frame_id: request.frame_id,
                    status,
                    content_type,
                });
            }
        }
        debug!("Interception task finished");
    });

    Ok((task, rx))
}
