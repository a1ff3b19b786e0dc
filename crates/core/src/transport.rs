//! The outbound side of a batch: whatever carries messages back to the user.

use async_trait::async_trait;

use crate::report::{BatchReport, Progress};

/// Receives status text, progress and the final report of a batch.
///
/// Implementations must not fail the batch: delivery problems are theirs to
/// log or retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Free-form status text, e.g. the per-URL fetching line.
    async fn notify(&self, user: &str, message: &str);

    /// Counts after each URL.
    async fn report_progress(&self, user: &str, progress: &Progress);

    /// The accumulated output of a finished or cancelled batch.
    async fn deliver(&self, user: &str, report: &BatchReport);
}

/// Drops everything. Useful when only the returned [`BatchReport`] matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransport;

#[async_trait]
impl Transport for NullTransport {
    async fn notify(&self, _user: &str, _message: &str) {}

    async fn report_progress(&self, _user: &str, _progress: &Progress) {}

    async fn deliver(&self, _user: &str, _report: &BatchReport) {}
}
