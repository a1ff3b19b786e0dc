//! Per-user batch sessions and the registry that holds them.
//!
//! A [`Session`] lives from an explicit start until its batch completes, is
//! cancelled or is aborted; it is never reused. The [`SessionStore`] is the
//! only state shared between users. Each entry sits behind its own mutex so
//! one user's batch never waits on another's, and no lock is held while a
//! document is being fetched.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::error::SessionError;
use crate::formatters::text::TextFormatter;
use crate::model::{Bucket, ClassifiedResult, ExtractedQuestion};
use crate::report::{FailedUrl, Progress};

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No session exists for the user.
    Idle,
    CollectingUrls,
    AwaitingConfirmation,
    Processing,
    Completed,
    Cancelled,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Cancelled)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::CollectingUrls => "collecting URLs",
            Phase::AwaitingConfirmation => "awaiting confirmation",
            Phase::Processing => "processing",
            Phase::Completed => "completed",
            Phase::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// One user's batch.
#[derive(Debug)]
pub struct Session {
    user: String,
    phase: Phase,
    urls: Vec<String>,
    cancel: CancellationToken,
    results: ClassifiedResult,
    questions: Vec<ExtractedQuestion>,
    failed: Vec<FailedUrl>,
    processed: usize,
}

impl Session {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            phase: Phase::CollectingUrls,
            urls: Vec::new(),
            cancel: CancellationToken::new(),
            results: ClassifiedResult::new(),
            questions: Vec::new(),
            failed: Vec::new(),
            processed: 0,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        tracing::debug!(user = %self.user, from = %self.phase, to = %phase, "session phase change");
        self.phase = phase;
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub(crate) fn add_urls(&mut self, urls: impl IntoIterator<Item = String>) {
        self.urls.extend(urls);
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn results(&self) -> &ClassifiedResult {
        &self.results
    }

    pub fn questions(&self) -> &[ExtractedQuestion] {
        &self.questions
    }

    pub fn failed(&self) -> &[FailedUrl] {
        &self.failed
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Renders `question` into its bucket.
    pub(crate) fn record_question(&mut self, question: ExtractedQuestion, formatter: &TextFormatter) -> Bucket {
        let bucket = self.results.push(&question, formatter);
        self.questions.push(question);
        bucket
    }

    pub(crate) fn record_failure(&mut self, url: impl Into<String>, reason: impl Into<String>) {
        self.failed.push(FailedUrl { url: url.into(), reason: reason.into() });
    }

    pub(crate) fn mark_processed(&mut self, count: usize) {
        self.processed = count;
    }

    /// Counts so far against the batch size.
    pub fn progress(&self, url: &str) -> Progress {
        Progress {
            processed: self.processed,
            total: self.urls.len(),
            main: self.results.main.len(),
            undetected: self.results.undetected.len(),
            failed: self.failed.len(),
            url: url.to_string(),
        }
    }

    /// Moves the accumulated output out of the session.
    pub(crate) fn take_output(&mut self) -> (ClassifiedResult, Vec<ExtractedQuestion>, Vec<FailedUrl>) {
        (
            std::mem::take(&mut self.results),
            std::mem::take(&mut self.questions),
            std::mem::take(&mut self.failed),
        )
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user.clone(),
            phase: self.phase,
            pending_urls: self.urls.len(),
            processed: self.processed,
            main: self.results.main.len(),
            undetected: self.results.undetected.len(),
            failed: self.failed.len(),
        }
    }
}

/// Read-only view of a session for status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub user: String,
    pub phase: Phase,
    pub pending_urls: usize,
    pub processed: usize,
    pub main: usize,
    pub undetected: usize,
    pub failed: usize,
}

impl SessionSnapshot {
    /// Snapshot reported for a user without a session.
    pub fn idle(user: impl Into<String>) -> Self {
        Self { user: user.into(), phase: Phase::Idle, pending_urls: 0, processed: 0, main: 0, undetected: 0, failed: 0 }
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// Registry of live sessions keyed by user identity.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh session for `user`, discarding an idle previous one.
    ///
    /// A session that is processing a batch is never replaced; the registry
    /// lock is held across the phase check so a concurrent confirm cannot
    /// slip in between.
    pub async fn create(&self, user: &str) -> Result<SessionHandle, SessionError> {
        let mut sessions = self.sessions.write().await;
        if let Some(current) = sessions.get(user)
            && current.lock().await.phase() == Phase::Processing
        {
            return Err(SessionError::AlreadyProcessing);
        }

        let handle = Arc::new(Mutex::new(Session::new(user)));
        sessions.insert(user.to_string(), handle.clone());
        Ok(handle)
    }

    pub async fn get(&self, user: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(user).cloned()
    }

    pub async fn remove(&self, user: &str) -> Option<SessionHandle> {
        self.sessions.write().await.remove(user)
    }

    /// Removes `user`'s entry only if it is still `handle`. A batch finishing
    /// after the user already started a new session leaves the new one alone.
    pub async fn remove_if_current(&self, user: &str, handle: &SessionHandle) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(user) {
            Some(current) if Arc::ptr_eq(current, handle) => {
                sessions.remove(user);
                true
            }
            _ => false,
        }
    }

    pub async fn contains(&self, user: &str) -> bool {
        self.sessions.read().await.contains_key(user)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
