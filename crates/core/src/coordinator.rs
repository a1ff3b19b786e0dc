//! Session lifecycle and sequential batch processing.
//!
//! ```text
//! Idle -> CollectingUrls -> AwaitingConfirmation -> Processing -> Completed | Cancelled
//! ```
//!
//! [`BatchCoordinator`] is the only thing that mutates sessions. Protocol
//! calls ([`start`](BatchCoordinator::start),
//! [`submit_urls`](BatchCoordinator::submit_urls),
//! [`confirm`](BatchCoordinator::confirm), ...) are cheap and return at once;
//! [`confirm`](BatchCoordinator::confirm) hands out a [`BatchJob`] that the
//! caller drives with [`run`](BatchCoordinator::run), usually on its own task.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use quizsift_core::coordinator::{BatchCoordinator, CoordinatorConfig};
//! use quizsift_core::fetch::{FetchConfig, HttpFetcher};
//! use quizsift_core::transport::NullTransport;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Arc::new(HttpFetcher::new(FetchConfig::default())?);
//! let coordinator = BatchCoordinator::new(fetcher, CoordinatorConfig::default());
//!
//! coordinator.start("alice").await?;
//! coordinator.submit_urls("alice", "https://example.com/quiz").await?;
//! let job = coordinator.confirm("alice").await?;
//! let report = coordinator.run(job, &NullTransport).await;
//! println!("{}", report.main_document());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error::{QuizError, SessionError};
use crate::fetch::{Fetcher, parse_url};
use crate::formatters::text::{TextConfig, TextFormatter};
use crate::model::ExtractedQuestion;
use crate::question::{ParserConfig, QuestionParser};
use crate::report::{BatchReport, BatchState, fetching_message};
use crate::session::{Phase, SessionHandle, SessionSnapshot, SessionStore};
use crate::transport::Transport;

/// Reply to the start trigger.
pub const WELCOME_MESSAGE: &str = "Send me one or more URLs (one per line) containing quiz questions.\n\
I'll extract all questions and return two files:\n\
• questions_main.txt – questions with detected correct answers.\n\
• questions_undetected.txt – questions where the correct answer could not be detected.";

/// Reason recorded for submitted entries that are not usable URLs.
pub const INVALID_ENTRY_REASON: &str = "invalid";

/// Configuration for the batch coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// URL schemes accepted on submission (default: http, https)
    pub allowed_schemes: Vec<String>,
    pub parser: ParserConfig,
    pub text: TextConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            allowed_schemes: vec!["http".to_string(), "https".to_string()],
            parser: ParserConfig::default(),
            text: TextConfig::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Creates a new builder for CoordinatorConfig.
    ///
    /// # Example
    ///
    /// ```rust
    /// use quizsift_core::coordinator::CoordinatorConfig;
    ///
    /// let config = CoordinatorConfig::builder()
    ///     .allowed_schemes(["http", "https", "file"])
    ///     .max_options(4)
    ///     .build();
    /// assert_eq!(config.text.max_options, Some(4));
    /// ```
    pub fn builder() -> CoordinatorConfigBuilder {
        CoordinatorConfigBuilder::new()
    }
}

/// Builder for CoordinatorConfig.
pub struct CoordinatorConfigBuilder {
    config: CoordinatorConfig,
}

impl CoordinatorConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: CoordinatorConfig::default() }
    }

    /// Replaces the accepted URL schemes.
    pub fn allowed_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_schemes = schemes.into_iter().map(Into::into).collect();
        self
    }

    pub fn parser(mut self, config: ParserConfig) -> Self {
        self.config.parser = config;
        self
    }

    pub fn text(mut self, config: TextConfig) -> Self {
        self.config.text = config;
        self
    }

    /// Caps rendered options per question.
    pub fn max_options(mut self, value: usize) -> Self {
        self.config.text.max_options = Some(value);
        self
    }

    /// Builds the config.
    pub fn build(self) -> CoordinatorConfig {
        self.config
    }
}

impl Default for CoordinatorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a URL submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlSubmission {
    pub accepted: Vec<String>,
    /// Entries that are not URLs with an allowed scheme.
    pub rejected: Vec<String>,
    /// URLs waiting for confirmation, this submission included.
    pub pending: usize,
}

impl UrlSubmission {
    /// Reply text for the user.
    pub fn message(&self) -> String {
        let mut msg = format!(
            "Received {} URL(s), {} pending. Confirm to start processing or reject to discard.",
            self.accepted.len(),
            self.pending
        );
        if !self.rejected.is_empty() {
            msg.push_str(&format!("\nRejected: {}", self.rejected.join(", ")));
        }
        msg
    }
}

/// What an explicit abort did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortOutcome {
    /// The batch is running; it stops at the next URL boundary.
    CancelRequested,
    /// The session was removed.
    Discarded,
}

/// A confirmed batch, ready to be processed exactly once.
#[derive(Debug)]
pub struct BatchJob {
    user: String,
    handle: SessionHandle,
    urls: Vec<String>,
    cancel: CancellationToken,
}

impl BatchJob {
    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Token that stops the batch at the next URL boundary.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Drives sessions through their lifecycle and processes confirmed batches.
pub struct BatchCoordinator {
    store: SessionStore,
    fetcher: Arc<dyn Fetcher>,
    parser: QuestionParser,
    formatter: TextFormatter,
    config: CoordinatorConfig,
}

impl BatchCoordinator {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: CoordinatorConfig) -> Self {
        Self {
            store: SessionStore::new(),
            fetcher,
            parser: QuestionParser::new(config.parser.clone()),
            formatter: TextFormatter::new(config.text.clone()),
            config,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Opens a fresh session for `user`, discarding any previous one that
    /// is not processing. Restarting while a batch runs is refused and the
    /// batch keeps going.
    pub async fn start(&self, user: &str) -> Result<&'static str, SessionError> {
        self.store.create(user).await?;
        tracing::debug!(user = %user, "session started");
        Ok(WELCOME_MESSAGE)
    }

    /// Adds the URLs in `text`, one per line. Entries that are not URLs with
    /// an allowed scheme are reported back and recorded as failed.
    pub async fn submit_urls(&self, user: &str, text: &str) -> Result<UrlSubmission, SessionError> {
        let handle = self.session(user).await?;
        let mut session = handle.lock().await;

        match session.phase() {
            Phase::CollectingUrls | Phase::AwaitingConfirmation => {}
            Phase::Processing => return Err(SessionError::AlreadyProcessing),
            phase => return Err(SessionError::InvalidPhase { phase, action: "submit URLs" }),
        }

        let entries: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if entries.is_empty() {
            return Err(SessionError::EmptySubmission);
        }

        let schemes: Vec<&str> = self.config.allowed_schemes.iter().map(String::as_str).collect();
        let (accepted, rejected): (Vec<String>, Vec<String>) = entries
            .into_iter()
            .map(String::from)
            .partition(|entry| parse_url(entry, &schemes).is_ok());

        if accepted.is_empty() {
            return Err(SessionError::NoValidUrls { rejected });
        }

        for entry in &rejected {
            session.record_failure(entry.clone(), INVALID_ENTRY_REASON);
        }
        session.add_urls(accepted.iter().cloned());
        session.set_phase(Phase::AwaitingConfirmation);

        Ok(UrlSubmission { accepted, rejected, pending: session.urls().len() })
    }

    /// Moves the session to processing and returns the job to run.
    pub async fn confirm(&self, user: &str) -> Result<BatchJob, SessionError> {
        let handle = self.session(user).await?;
        let mut session = handle.lock().await;

        match session.phase() {
            Phase::AwaitingConfirmation => {}
            Phase::CollectingUrls => return Err(SessionError::NoPendingUrls),
            Phase::Processing => return Err(SessionError::AlreadyProcessing),
            phase => return Err(SessionError::InvalidPhase { phase, action: "confirm" }),
        }

        session.set_phase(Phase::Processing);
        let job = BatchJob {
            user: user.to_string(),
            handle: handle.clone(),
            urls: session.urls().to_vec(),
            cancel: session.cancel_token(),
        };
        Ok(job)
    }

    /// Discards the pending URLs together with the session.
    pub async fn reject(&self, user: &str) -> Result<(), SessionError> {
        let handle = self.session(user).await?;
        let phase = handle.lock().await.phase();

        match phase {
            Phase::AwaitingConfirmation => {
                self.store.remove_if_current(user, &handle).await;
                tracing::debug!(user = %user, "pending URLs rejected");
                Ok(())
            }
            Phase::CollectingUrls => Err(SessionError::NoPendingUrls),
            Phase::Processing => Err(SessionError::AlreadyProcessing),
            phase => Err(SessionError::InvalidPhase { phase, action: "reject" }),
        }
    }

    /// Asks a running batch to stop at the next URL boundary.
    pub async fn cancel(&self, user: &str) -> Result<(), SessionError> {
        let handle = self.session(user).await?;
        let session = handle.lock().await;

        if session.phase() != Phase::Processing {
            return Err(SessionError::NotProcessing);
        }
        session.cancel_token().cancel();
        tracing::info!(user = %user, "cancellation requested");
        Ok(())
    }

    /// Cancels a running batch, or removes the session in any other phase.
    pub async fn abort(&self, user: &str) -> Result<AbortOutcome, SessionError> {
        let handle = self.session(user).await?;
        let session = handle.lock().await;

        if session.phase() == Phase::Processing {
            session.cancel_token().cancel();
            return Ok(AbortOutcome::CancelRequested);
        }
        drop(session);

        self.store.remove_if_current(user, &handle).await;
        Ok(AbortOutcome::Discarded)
    }

    pub async fn snapshot(&self, user: &str) -> SessionSnapshot {
        match self.store.get(user).await {
            Some(handle) => handle.lock().await.snapshot(),
            None => SessionSnapshot::idle(user),
        }
    }

    pub async fn phase(&self, user: &str) -> Phase {
        match self.store.get(user).await {
            Some(handle) => handle.lock().await.phase(),
            None => Phase::Idle,
        }
    }

    /// Processes a confirmed batch, one URL after another.
    ///
    /// Cancellation is checked before every URL. A URL that cannot be
    /// fetched or parsed is recorded as failed and the batch moves on. When
    /// the batch ends, however it ends, the accumulated output is delivered
    /// through `transport`, the session is removed and the report returned.
    pub async fn run(&self, job: BatchJob, transport: &dyn Transport) -> BatchReport {
        let BatchJob { user, handle, urls, cancel } = job;
        let total = urls.len();
        let mut state = BatchState::Completed;

        tracing::info!(user = %user, total, "batch started");

        for (i, url) in urls.iter().enumerate() {
            if cancel.is_cancelled() {
                state = BatchState::Cancelled { completed: i };
                break;
            }

            transport.notify(&user, &fetching_message(i + 1, total, url)).await;

            let span = tracing::info_span!("url", user = %user, url = %url);
            let outcome = self.process_url(url, &cancel).instrument(span).await;

            let progress = {
                let mut session = handle.lock().await;
                match outcome {
                    Ok(questions) => {
                        for question in questions {
                            session.record_question(question, &self.formatter);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(user = %user, url = %url, error = %e, "URL failed");
                        session.record_failure(url.clone(), e.to_string());
                    }
                }
                session.mark_processed(i + 1);
                session.progress(url)
            };

            transport.report_progress(&user, &progress).await;
        }

        let report = {
            let mut session = handle.lock().await;
            session.set_phase(match state {
                BatchState::Completed => Phase::Completed,
                BatchState::Cancelled { .. } => Phase::Cancelled,
            });
            let (results, questions, failed) = session.take_output();
            BatchReport {
                user: user.clone(),
                state,
                total,
                main: results.main,
                undetected: results.undetected,
                failed,
                questions,
            }
        };

        tracing::info!(
            user = %user,
            state = ?report.state,
            main = report.main.len(),
            undetected = report.undetected.len(),
            failed = report.failed.len(),
            "batch finished"
        );

        transport.deliver(&user, &report).await;
        self.store.remove_if_current(&user, &handle).await;
        report
    }

    /// Fetches one URL and classifies every quiz item on it.
    pub async fn process_url(&self, url: &str, cancel: &CancellationToken) -> Result<Vec<ExtractedQuestion>, QuizError> {
        let document = self.fetcher.fetch(url, cancel).await?;
        self.extract(&document.html)
    }

    /// Parses and matches a fetched page. The parsed tree never outlives this call.
    pub fn extract(&self, html: &str) -> Result<Vec<ExtractedQuestion>, QuizError> {
        let candidates = self.parser.parse(html)?;
        tracing::debug!(candidates = candidates.len(), "page parsed");
        Ok(candidates.into_iter().map(ExtractedQuestion::from_candidate).collect())
    }

    async fn session(&self, user: &str) -> Result<SessionHandle, SessionError> {
        self.store.get(user).await.ok_or(SessionError::NoSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::FetchedDocument;
    use crate::report::{BatchOutcome, Progress};
    use crate::transport::NullTransport;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const SCENARIO_A: &str = r#"
        <div class="question">
            <h3>Q1. What is the capital of France?</h3>
            <ul>
                <li>(a) Paris</li>
                <li>(b) London</li>
                <li>(c) Berlin</li>
                <li>(d) Rome</li>
            </ul>
            <button>Show answer</button>
            <div class="panel">Answer: Paris Explanation: It is the seat of government.</div>
        </div>
    "#;

    const SCENARIO_B: &str = r#"
        <div class="question">
            <p class="question-text">Which planet is the largest?</p>
            <ul><li>Mars</li><li>Jupiter</li><li>Venus</li></ul>
        </div>
    "#;

    /// Serves canned pages; anything else answers with a 500.
    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn with_page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for FakeFetcher {
        async fn fetch(&self, url: &str, _cancel: &CancellationToken) -> Result<FetchedDocument, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(html) => Ok(FetchedDocument { url: url.to_string(), html: html.clone() }),
                None => Err(FetchError::Exhausted { attempts: 3, last: Box::new(FetchError::Status { status: 500 }) }),
            }
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        messages: Mutex<Vec<String>>,
        progress: Mutex<Vec<Progress>>,
        delivered: Mutex<Vec<BatchReport>>,
        cancel_after: Option<usize>,
        cancel: Mutex<Option<CancellationToken>>,
    }

    impl RecordingTransport {
        fn cancelling_after(processed: usize, token: CancellationToken) -> Self {
            Self { cancel_after: Some(processed), cancel: Mutex::new(Some(token)), ..Default::default() }
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn notify(&self, _user: &str, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }

        async fn report_progress(&self, _user: &str, progress: &Progress) {
            self.progress.lock().unwrap().push(progress.clone());
            if self.cancel_after == Some(progress.processed)
                && let Some(token) = self.cancel.lock().unwrap().as_ref()
            {
                token.cancel();
            }
        }

        async fn deliver(&self, _user: &str, report: &BatchReport) {
            self.delivered.lock().unwrap().push(report.clone());
        }
    }

    fn coordinator(fetcher: FakeFetcher) -> (BatchCoordinator, Arc<FakeFetcher>) {
        let fetcher = Arc::new(fetcher);
        (BatchCoordinator::new(fetcher.clone(), CoordinatorConfig::default()), fetcher)
    }

    async fn confirmed(coordinator: &BatchCoordinator, user: &str, urls: &[&str]) -> BatchJob {
        coordinator.start(user).await.unwrap();
        coordinator.submit_urls(user, &urls.join("\n")).await.unwrap();
        coordinator.confirm(user).await.unwrap()
    }

    #[tokio::test]
    async fn test_scenario_a_answer_goes_to_main() {
        let (coordinator, _) = coordinator(FakeFetcher::default().with_page("https://quiz.example/a", SCENARIO_A));
        let transport = RecordingTransport::default();

        let job = confirmed(&coordinator, "alice", &["https://quiz.example/a"]).await;
        let report = coordinator.run(job, &transport).await;

        assert_eq!(report.state, BatchState::Completed);
        assert_eq!(report.main.len(), 1);
        assert!(report.undetected.is_empty());

        let block = &report.main[0];
        assert!(block.starts_with("What is the capital of France?"));
        assert!(block.contains("(a) Paris *"));
        assert!(block.ends_with("Ex: It is the seat of government."));
    }

    #[tokio::test]
    async fn test_scenario_b_no_answer_goes_to_undetected() {
        let (coordinator, _) = coordinator(FakeFetcher::default().with_page("https://quiz.example/b", SCENARIO_B));

        let job = confirmed(&coordinator, "alice", &["https://quiz.example/b"]).await;
        let report = coordinator.run(job, &RecordingTransport::default()).await;

        assert!(report.main.is_empty());
        assert_eq!(report.undetected.len(), 1);
        assert!(!report.undetected[0].contains("Ex:"));
        assert!(!report.undetected[0].contains('*'));
    }

    #[tokio::test]
    async fn test_scenario_c_failed_url_does_not_stop_batch() {
        let fetcher = FakeFetcher::default()
            .with_page("https://quiz.example/a", SCENARIO_A)
            .with_page("https://quiz.example/b", SCENARIO_B);
        let (coordinator, fetcher) = coordinator(fetcher);
        let transport = RecordingTransport::default();

        let urls = ["https://quiz.example/a", "https://down.example/", "https://quiz.example/b"];
        let job = confirmed(&coordinator, "alice", &urls).await;
        let report = coordinator.run(job, &transport).await;

        assert_eq!(fetcher.calls(), urls);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].url, "https://down.example/");
        assert!(report.failed[0].reason.contains("3 attempts"));
        assert_eq!((report.main.len(), report.undetected.len()), (1, 1));
        assert_eq!(report.outcome(), BatchOutcome::Extracted);
    }

    #[tokio::test]
    async fn test_scenario_d_cancel_after_second_url() {
        let mut fetcher = FakeFetcher::default();
        for i in 1..=5 {
            fetcher = fetcher.with_page(&format!("https://quiz.example/{}", i), SCENARIO_A);
        }
        let (coordinator, fetcher) = coordinator(fetcher);

        let urls: Vec<String> = (1..=5).map(|i| format!("https://quiz.example/{}", i)).collect();
        let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
        let job = confirmed(&coordinator, "alice", &url_refs).await;
        let transport = RecordingTransport::cancelling_after(2, job.cancel_token());

        let report = coordinator.run(job, &transport).await;

        assert_eq!(report.state, BatchState::Cancelled { completed: 2 });
        assert_eq!(report.main.len(), 2);
        assert_eq!(fetcher.calls(), &urls[..2]);
        assert_eq!(transport.delivered.lock().unwrap().len(), 1);
        assert!(!coordinator.store().contains("alice").await);
    }

    #[tokio::test]
    async fn test_blank_page_is_recorded_as_failure() {
        let fetcher = FakeFetcher::default()
            .with_page("https://quiz.example/a", SCENARIO_A)
            .with_page("https://quiz.example/blank", "  \n ");
        let (coordinator, _) = coordinator(fetcher);

        let job = confirmed(&coordinator, "alice", &["https://quiz.example/blank", "https://quiz.example/a"]).await;
        let report = coordinator.run(job, &NullTransport).await;

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].url, "https://quiz.example/blank");
        assert!(report.failed[0].reason.contains("empty document"));
        assert_eq!(report.main.len(), 1);
    }

    #[tokio::test]
    async fn test_progress_reported_after_each_url() {
        let (coordinator, _) = coordinator(FakeFetcher::default().with_page("https://quiz.example/a", SCENARIO_A));
        let transport = RecordingTransport::default();

        let job = confirmed(&coordinator, "alice", &["https://quiz.example/a", "https://down.example/"]).await;
        coordinator.run(job, &transport).await;

        let progress = transport.progress.lock().unwrap().clone();
        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].counts(), (1, 2, 1, 0));
        assert_eq!(progress[1].counts(), (2, 2, 1, 0));
        assert_eq!(progress[1].failed, 1);

        let messages = transport.messages.lock().unwrap().clone();
        assert_eq!(messages[0], "Fetching URL 1/2: https://quiz.example/a...");
    }

    #[tokio::test]
    async fn test_finished_batch_removes_session() {
        let (coordinator, _) = coordinator(FakeFetcher::default());

        let job = confirmed(&coordinator, "alice", &["https://down.example/"]).await;
        let report = coordinator.run(job, &RecordingTransport::default()).await;

        assert_eq!(report.outcome(), BatchOutcome::OnlyFailures);
        assert_eq!(coordinator.phase("alice").await, Phase::Idle);
    }

    #[tokio::test]
    async fn test_submit_reports_invalid_entries() {
        let (coordinator, _) = coordinator(FakeFetcher::default());
        coordinator.start("alice").await.unwrap();

        let submission = coordinator
            .submit_urls("alice", "https://quiz.example/a\n\n  not a url  \nftp://files.example/q")
            .await
            .unwrap();

        assert_eq!(submission.accepted, ["https://quiz.example/a"]);
        assert_eq!(submission.rejected, ["not a url", "ftp://files.example/q"]);
        assert!(submission.message().contains("Rejected: not a url"));
        assert_eq!(coordinator.phase("alice").await, Phase::AwaitingConfirmation);

        let job = coordinator.confirm("alice").await.unwrap();
        let report = coordinator.run(job, &NullTransport).await;
        let failures = report.failure_message().unwrap();
        assert!(failures.contains("not a url (invalid)"));
    }

    #[tokio::test]
    async fn test_submit_without_valid_urls() {
        let (coordinator, _) = coordinator(FakeFetcher::default());
        coordinator.start("alice").await.unwrap();

        let err = coordinator.submit_urls("alice", "foo\nbar").await.unwrap_err();
        assert_eq!(err, SessionError::NoValidUrls { rejected: vec!["foo".into(), "bar".into()] });
        assert_eq!(coordinator.phase("alice").await, Phase::CollectingUrls);

        let err = coordinator.submit_urls("alice", "  \n ").await.unwrap_err();
        assert_eq!(err, SessionError::EmptySubmission);
    }

    #[tokio::test]
    async fn test_submissions_append_while_awaiting_confirmation() {
        let (coordinator, _) = coordinator(FakeFetcher::default());
        coordinator.start("alice").await.unwrap();

        coordinator.submit_urls("alice", "https://a.example").await.unwrap();
        let second = coordinator.submit_urls("alice", "https://b.example").await.unwrap();

        assert_eq!(second.pending, 2);
        let job = coordinator.confirm("alice").await.unwrap();
        assert_eq!(job.urls(), ["https://a.example", "https://b.example"]);
    }

    #[tokio::test]
    async fn test_protocol_misuse() {
        let (coordinator, _) = coordinator(FakeFetcher::default());

        assert_eq!(coordinator.submit_urls("bob", "https://a.example").await.unwrap_err(), SessionError::NoSession);
        assert_eq!(coordinator.cancel("bob").await.unwrap_err(), SessionError::NoSession);

        coordinator.start("bob").await.unwrap();
        assert_eq!(coordinator.confirm("bob").await.unwrap_err(), SessionError::NoPendingUrls);
        assert_eq!(coordinator.reject("bob").await.unwrap_err(), SessionError::NoPendingUrls);
        assert_eq!(coordinator.cancel("bob").await.unwrap_err(), SessionError::NotProcessing);

        coordinator.submit_urls("bob", "https://a.example").await.unwrap();
        let _job = coordinator.confirm("bob").await.unwrap();
        assert_eq!(coordinator.confirm("bob").await.unwrap_err(), SessionError::AlreadyProcessing);
        assert_eq!(
            coordinator.submit_urls("bob", "https://b.example").await.unwrap_err(),
            SessionError::AlreadyProcessing
        );
    }

    #[tokio::test]
    async fn test_reject_discards_session() {
        let (coordinator, _) = coordinator(FakeFetcher::default());
        coordinator.start("carol").await.unwrap();
        coordinator.submit_urls("carol", "https://a.example").await.unwrap();

        coordinator.reject("carol").await.unwrap();
        assert_eq!(coordinator.snapshot("carol").await, SessionSnapshot::idle("carol"));
    }

    #[tokio::test]
    async fn test_abort_cancels_running_batch() {
        let (coordinator, _) = coordinator(FakeFetcher::default());

        coordinator.start("dave").await.unwrap();
        assert_eq!(coordinator.abort("dave").await.unwrap(), AbortOutcome::Discarded);
        assert!(!coordinator.store().contains("dave").await);

        let job = confirmed(&coordinator, "dave", &["https://a.example"]).await;
        assert_eq!(coordinator.abort("dave").await.unwrap(), AbortOutcome::CancelRequested);

        let report = coordinator.run(job, &RecordingTransport::default()).await;
        assert_eq!(report.state, BatchState::Cancelled { completed: 0 });
    }

    #[tokio::test]
    async fn test_restart_during_batch_is_refused() {
        let fetcher = FakeFetcher::default()
            .with_page("https://quiz.example/a", SCENARIO_A)
            .with_page("https://quiz.example/b", SCENARIO_B);
        let (coordinator, fetcher) = coordinator(fetcher);

        let job = confirmed(&coordinator, "erin", &["https://quiz.example/a", "https://quiz.example/b"]).await;
        let token = job.cancel_token();

        assert_eq!(coordinator.start("erin").await.unwrap_err(), SessionError::AlreadyProcessing);
        assert!(!token.is_cancelled());
        assert_eq!(coordinator.phase("erin").await, Phase::Processing);

        let report = coordinator.run(job, &RecordingTransport::default()).await;
        assert_eq!(report.state, BatchState::Completed);
        assert_eq!(fetcher.calls().len(), 2);
        assert_eq!((report.main.len(), report.undetected.len()), (1, 1));

        // Once the batch is over a new session can be started.
        assert_eq!(coordinator.start("erin").await.unwrap(), WELCOME_MESSAGE);
        assert_eq!(coordinator.phase("erin").await, Phase::CollectingUrls);
    }

    #[tokio::test]
    async fn test_restart_discards_pending_urls() {
        let (coordinator, _) = coordinator(FakeFetcher::default());
        coordinator.start("erin").await.unwrap();
        coordinator.submit_urls("erin", "https://a.example").await.unwrap();

        coordinator.start("erin").await.unwrap();
        assert_eq!(coordinator.phase("erin").await, Phase::CollectingUrls);
        assert_eq!(coordinator.confirm("erin").await.unwrap_err(), SessionError::NoPendingUrls);
    }

    #[tokio::test]
    async fn test_sessions_progress_independently() {
        let fetcher = FakeFetcher::default()
            .with_page("https://quiz.example/a", SCENARIO_A)
            .with_page("https://quiz.example/b", SCENARIO_B);
        let (coordinator, _) = coordinator(fetcher);

        let alice = confirmed(&coordinator, "alice", &["https://quiz.example/a"]).await;
        let bob = confirmed(&coordinator, "bob", &["https://quiz.example/b"]).await;

        let transport = RecordingTransport::default();
        let (a, b) = tokio::join!(coordinator.run(alice, &transport), coordinator.run(bob, &transport));

        assert_eq!((a.main.len(), a.undetected.len()), (1, 0));
        assert_eq!((b.main.len(), b.undetected.len()), (0, 1));
        assert!(coordinator.store().is_empty().await);
    }
}
