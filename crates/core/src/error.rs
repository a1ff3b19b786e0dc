//! Error types for quizsift operations.
//!
//! [`QuizError`] is the crate-level error. [`FetchError`] describes why a
//! single document could not be retrieved; the batch coordinator records it
//! against the URL and moves on. [`SessionError`] covers session-protocol
//! misuse and doubles as the user-visible reply for the no-op.
//!
//! # Example
//!
//! ```rust
//! use quizsift_core::{QuizError, Result};
//!
//! fn require_html(html: &str) -> Result<&str> {
//!     if html.trim().is_empty() {
//!         return Err(QuizError::HtmlParseError("empty document".to_string()));
//!     }
//!     Ok(html)
//! }
//! ```

use thiserror::Error;

use crate::session::Phase;

/// Main error type for quizsift operations.
#[derive(Error, Debug)]
pub enum QuizError {
    /// A document could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// HTML parsing errors.
    ///
    /// Returned when HTML cannot be parsed, usually because of an invalid
    /// CSS selector.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// File I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a single document could not be retrieved.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The URL cannot be parsed or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A single attempt exceeded the configured timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// The server answered with a non-success status.
    #[error("HTTP status {status}")]
    Status { status: u16 },

    /// Network, DNS, TLS or body decoding failure from reqwest.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Local file could not be read (`file://` sources).
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The batch was cancelled while waiting to retry.
    #[error("Cancelled before the next attempt")]
    Cancelled,

    /// Every attempt failed; carries the last underlying cause.
    #[error("Gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<FetchError> },
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Status { .. } => true,
            #[cfg(feature = "fetch")]
            FetchError::Transport(_) => true,
            FetchError::InvalidUrl(_) | FetchError::Io(_) | FetchError::Cancelled | FetchError::Exhausted { .. } => {
                false
            }
        }
    }
}

/// Session-protocol misuse.
///
/// None of these are faults: the message is shown to the user and the
/// session is left as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No active session. Send /start to begin.")]
    NoSession,

    #[error("Please send at least one URL.")]
    EmptySubmission,

    #[error("There are no pending URLs to confirm.")]
    NoPendingUrls,

    #[error("No valid URLs found. Rejected: {}", rejected.join(", "))]
    NoValidUrls { rejected: Vec<String> },

    #[error("A batch is already being processed. Cancel it first.")]
    AlreadyProcessing,

    #[error("No batch is being processed.")]
    NotProcessing,

    #[error("Cannot {action} while {phase}.")]
    InvalidPhase { phase: Phase, action: &'static str },
}

/// Result type alias for QuizError.
pub type Result<T> = std::result::Result<T, QuizError>;
