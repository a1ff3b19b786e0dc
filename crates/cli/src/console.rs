use async_trait::async_trait;
use quizsift_core::{BatchReport, Progress, Transport};

use crate::echo;

/// Reports batch progress on stderr.
pub struct ConsoleTransport {
    verbose: bool,
}

impl ConsoleTransport {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn notify(&self, _user: &str, message: &str) {
        echo::print_info(message);
    }

    async fn report_progress(&self, _user: &str, progress: &Progress) {
        if self.verbose {
            echo::print_progress(progress);
        }
    }

    async fn deliver(&self, _user: &str, report: &BatchReport) {
        echo::print_report(report);
    }
}
