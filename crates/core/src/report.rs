//! Progress updates and the final batch report handed to transports.

use serde::Serialize;

use crate::formatters::text::join_blocks;
use crate::model::ExtractedQuestion;

/// File name of the main export.
pub const MAIN_FILE_NAME: &str = "questions_main.txt";
/// File name of the undetected export.
pub const UNDETECTED_FILE_NAME: &str = "questions_undetected.txt";
/// Longest failure message a chat transport accepts.
pub const FAILURE_REPORT_LIMIT: usize = 4096;

/// Counts after a URL was handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    pub main: usize,
    pub undetected: usize,
    pub failed: usize,
    /// The URL just handled.
    pub url: String,
}

impl Progress {
    /// `(processed, total, main, undetected)`
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        (self.processed, self.total, self.main, self.undetected)
    }
}

/// A URL that produced no document, with a readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUrl {
    pub url: String,
    pub reason: String,
}

/// How a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchState {
    Completed,
    /// Stopped at the URL boundary after `completed` URLs.
    Cancelled { completed: usize },
}

/// What a batch produced, independent of how it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    /// At least one question was extracted.
    Extracted,
    /// No questions and no failures.
    NothingFound,
    /// No questions, but at least one URL failed.
    OnlyFailures,
}

/// Everything a terminated batch accumulated.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub user: String,
    pub state: BatchState,
    pub total: usize,
    pub main: Vec<String>,
    pub undetected: Vec<String>,
    pub failed: Vec<FailedUrl>,
    #[serde(skip)]
    pub questions: Vec<ExtractedQuestion>,
}

impl BatchReport {
    pub fn outcome(&self) -> BatchOutcome {
        if !self.main.is_empty() || !self.undetected.is_empty() {
            BatchOutcome::Extracted
        } else if self.failed.is_empty() {
            BatchOutcome::NothingFound
        } else {
            BatchOutcome::OnlyFailures
        }
    }

    pub fn main_document(&self) -> String {
        join_blocks(&self.main)
    }

    pub fn undetected_document(&self) -> String {
        join_blocks(&self.undetected)
    }

    pub fn main_caption(&self) -> String {
        format!("Main questions ({} total)", self.main.len())
    }

    pub fn undetected_caption(&self) -> String {
        format!("Undetected questions ({} total)", self.undetected.len())
    }

    /// `Failed URLs:` followed by one `url (reason)` line per failure,
    /// truncated to [`FAILURE_REPORT_LIMIT`] characters. `None` without failures.
    pub fn failure_message(&self) -> Option<String> {
        if self.failed.is_empty() {
            return None;
        }
        let lines: Vec<String> = self.failed.iter().map(|f| format!("{} ({})", f.url, f.reason)).collect();
        let message = format!("Failed URLs:\n{}", lines.join("\n"));
        Some(truncate_chars(&message, FAILURE_REPORT_LIMIT))
    }

    /// One-line status for the end of the batch.
    pub fn summary(&self) -> String {
        let prefix = match self.state {
            BatchState::Completed => String::new(),
            BatchState::Cancelled { completed } => {
                format!("Cancelled after {}/{} URL(s). ", completed, self.total)
            }
        };

        let body = match self.outcome() {
            BatchOutcome::NothingFound => "No questions found on any URL.".to_string(),
            BatchOutcome::OnlyFailures => "No questions extracted, but some URLs failed.".to_string(),
            BatchOutcome::Extracted => format!(
                "{} main, {} undetected, {} failed URL(s).",
                self.main.len(),
                self.undetected.len(),
                self.failed.len()
            ),
        };

        format!("{}{}", prefix, body)
    }
}

/// Progress line shown before a URL is fetched.
pub fn fetching_message(index: usize, total: usize, url: &str) -> String {
    format!("Fetching URL {}/{}: {}...", index, total, truncate_chars(url, 50))
}

/// Cuts `text` to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
