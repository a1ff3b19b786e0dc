//! Per-user event queue that stands in for a chat transport.
//!
//! Batches push status text, progress and their final delivery; clients
//! collect them with `GET /sessions/{user}/events`, which drains the queue.
//! Each queue holds at most [`MAX_EVENTS_PER_USER`] events, dropping the
//! oldest first, and is cleared when the user starts a new session.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use quizsift_core::formatters::json::{JsonOutput, to_json_output};
use quizsift_core::{BatchOutcome, BatchReport, BatchState, MAIN_FILE_NAME, Progress, Transport, UNDETECTED_FILE_NAME};
use serde::Serialize;
use tokio::sync::Mutex;

/// Events kept per user before the oldest are dropped.
pub const MAX_EVENTS_PER_USER: usize = 256;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Message { text: String },
    Progress(Progress),
    Delivery(Delivery),
}

/// The output of a finished or cancelled batch.
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub state: BatchState,
    pub outcome: BatchOutcome,
    pub summary: String,
    /// One entry per non-empty export.
    pub files: Vec<DeliveredFile>,
    /// `Failed URLs:` message, when any URL failed.
    pub failures: Option<String>,
    pub questions: JsonOutput,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveredFile {
    pub name: &'static str,
    pub caption: String,
    pub content: String,
}

impl From<&BatchReport> for Delivery {
    fn from(report: &BatchReport) -> Self {
        let mut files = Vec::new();
        if !report.main.is_empty() {
            files.push(DeliveredFile {
                name: MAIN_FILE_NAME,
                caption: report.main_caption(),
                content: report.main_document(),
            });
        }
        if !report.undetected.is_empty() {
            files.push(DeliveredFile {
                name: UNDETECTED_FILE_NAME,
                caption: report.undetected_caption(),
                content: report.undetected_document(),
            });
        }

        Self {
            state: report.state,
            outcome: report.outcome(),
            summary: report.summary(),
            files,
            failures: report.failure_message(),
            questions: to_json_output(&report.questions),
        }
    }
}

#[derive(Debug)]
pub struct Outbox {
    events: Mutex<HashMap<String, VecDeque<Event>>>,
    capacity: usize,
}

impl Default for Outbox {
    fn default() -> Self {
        Self::with_capacity(MAX_EVENTS_PER_USER)
    }
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outbox keeping at most `capacity` events per user.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { events: Mutex::new(HashMap::new()), capacity: capacity.max(1) }
    }

    pub async fn push(&self, user: &str, event: Event) {
        let mut events = self.events.lock().await;
        let queue = events.entry(user.to_string()).or_default();
        if queue.len() >= self.capacity {
            queue.pop_front();
            tracing::debug!(user = %user, "outbox full, dropped oldest event");
        }
        queue.push_back(event);
    }

    /// Removes and returns everything queued for `user`, oldest first.
    pub async fn drain(&self, user: &str) -> Vec<Event> {
        self.events.lock().await.remove(user).map(Vec::from).unwrap_or_default()
    }

    /// Drops whatever is still queued for `user`.
    pub async fn clear(&self, user: &str) {
        self.events.lock().await.remove(user);
    }
}

#[async_trait]
impl Transport for Outbox {
    async fn notify(&self, user: &str, message: &str) {
        self.push(user, Event::Message { text: message.to_string() }).await;
    }

    async fn report_progress(&self, user: &str, progress: &Progress) {
        self.push(user, Event::Progress(progress.clone())).await;
    }

    async fn deliver(&self, user: &str, report: &BatchReport) {
        tracing::info!(user = %user, outcome = ?report.outcome(), "batch delivered to outbox");
        self.push(user, Event::Delivery(Delivery::from(report))).await;
    }
}
