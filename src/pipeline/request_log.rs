//! Per-request diagnostic record
//!
//! Built fresh for every request, passed by `&mut` through each stage and
//! emitted once as a single structured event when the request ends.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Elapsed milliseconds at the end of a named stage
#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: &'static str,
    pub elapsed_ms: u128,
}

#[derive(Debug, Serialize)]
pub struct RequestLog {
    pub request_id: Uuid,
    pub started_at: DateTime<Utc>,
    #[serde(skip)]
    started: Instant,

    pub url: String,
    pub user_id: Option<String>,
    pub save_request_id: Option<String>,
    pub source: Option<String>,

    pub timings: Vec<StageTiming>,
    pub resolved_by: Option<&'static str>,
    pub prehandled_by: Option<&'static str>,
    pub final_url: Option<String>,
    pub content_type: Option<String>,
    pub title: Option<String>,

    pub blocked: bool,
    pub fallback_used: bool,
    pub fallback_blocked: bool,
    pub blocked_requests: usize,
    pub scroll_error: Option<String>,
    pub capture_error: Option<String>,
    pub handler_errors: Vec<String>,

    pub error: Option<String>,
    pub success: bool,
}

impl RequestLog {
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        user_id: Option<String>,
        save_request_id: Option<String>,
        source: Option<String>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            started_at: Utc::now(),
            started: Instant::now(),
            url: url.into(),
            user_id,
            save_request_id,
            source,
            timings: Vec::new(),
            resolved_by: None,
            prehandled_by: None,
            final_url: None,
            content_type: None,
            title: None,
            blocked: false,
            fallback_used: false,
            fallback_blocked: false,
            blocked_requests: 0,
            scroll_error: None,
            capture_error: None,
            handler_errors: Vec::new(),
            error: None,
            success: false,
        }
    }

    /// Record that `stage` has finished
    pub fn mark(&mut self, stage: &'static str) {
        self.timings.push(StageTiming {
            stage,
            elapsed_ms: self.started.elapsed().as_millis(),
        });
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    /// Emit the record as one `info` event
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(json) => info!(
                request_id = %self.request_id,
                success = self.success,
                elapsed_ms = self.elapsed_ms() as u64,
                "request log {}",
                json
            ),
            Err(e) => info!(request_id = %self.request_id, "request log unavailable: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_accumulate_in_order() {
        let mut log = RequestLog::new("https://example.com", None, None, None);
        log.mark("resolve");
        log.mark("prehandle");

        let stages: Vec<_> = log.timings.iter().map(|t| t.stage).collect();
        assert_eq!(stages, vec!["resolve", "prehandle"]);
        assert!(log.timings[0].elapsed_ms <= log.timings[1].elapsed_ms);
    }

    #[test]
    fn serializes_without_clock() {
        let log = RequestLog::new("https://example.com", Some("u1".into()), None, None);
        let value = serde_json::to_value(&log).expect("json");
        assert_eq!(value["url"], "https://example.com");
        assert_eq!(value["user_id"], "u1");
        assert!(value.get("started").is_none());
    }

    #[test]
    fn each_log_gets_its_own_id() {
        let a = RequestLog::new("https://example.com", None, None, None);
        let b = RequestLog::new("https://example.com", None, None, None);
        assert_ne!(a.request_id, b.request_id);
    }
}
