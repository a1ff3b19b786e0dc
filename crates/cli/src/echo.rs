use owo_colors::OwoColorize;
use quizsift_core::{BatchReport, Progress};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Quizsift".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Extract quiz questions from web pages\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print running counts after a URL
pub fn print_progress(progress: &Progress) {
    eprintln!(
        "  {} {}/{}  {} {}  {} {}  {} {}",
        "Processed:".dimmed(),
        progress.processed.to_string().bright_white(),
        progress.total,
        "Main:".dimmed(),
        progress.main.to_string().bright_green(),
        "Undetected:".dimmed(),
        progress.undetected.to_string().bright_yellow(),
        "Failed:".dimmed(),
        progress.failed.to_string().bright_red()
    );
}

/// Print the batch summary and the failure list
pub fn print_report(report: &BatchReport) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Batch Summary".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("  {} {}", "Main:".dimmed(), report.main.len().to_string().bright_white());
    eprintln!(
        "  {} {}",
        "Undetected:".dimmed(),
        report.undetected.len().to_string().bright_white()
    );
    eprintln!(
        "  {} {}\n",
        "Failed:".dimmed(),
        report.failed.len().to_string().bright_white()
    );

    if let Some(failures) = report.failure_message() {
        for line in failures.lines() {
            eprintln!("  {}", line.bright_red());
        }
        eprintln!();
    }
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
