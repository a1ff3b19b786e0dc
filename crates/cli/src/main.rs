use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use quizsift_core::{
    BatchCoordinator, BatchOutcome, BatchReport, BatchState, CoordinatorConfig, FetchConfig, JsonConfig,
    MAIN_FILE_NAME, SourceFetcher, UNDETECTED_FILE_NAME, convert_to_json,
};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;
use url::Url;

mod console;
mod echo;

use console::ConsoleTransport;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Session identity of the local user; the CLI only ever runs one batch.
const LOCAL_USER: &str = "local";

/// Extract quiz questions from web pages into classified text files
#[derive(Parser, Debug)]
#[command(name = "quizsift")]
#[command(author = "Quizsift Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Extract quiz questions from web pages", long_about = None)]
struct Args {
    /// URLs or local HTML files to process, or "-" to read a URL list from stdin
    #[arg(value_name = "SOURCE")]
    sources: Vec<String>,

    /// File with one URL per line
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Directory for questions_main.txt and questions_undetected.txt
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    out_dir: PathBuf,

    /// Print the JSON export to stdout instead of writing text files
    #[arg(long)]
    json: bool,

    /// HTTP timeout in seconds, per attempt
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Attempts per URL before giving up
    #[arg(long, default_value = "3", value_name = "NUM")]
    attempts: u32,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Render at most this many options per question
    #[arg(long, value_name = "NUM")]
    max_options: Option<usize>,

    /// Start processing without asking for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    if args.verbose {
        echo::print_banner();
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quizsift=debug,quizsift_core=debug")),
            )
            .init();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    if args.verbose {
        echo::print_step(1, 3, "Collecting URLs");
    }

    let entries = collect_sources(&args).await?;
    if entries.is_empty() {
        anyhow::bail!("No URLs given. Pass URLs or files, -i FILE, or '-' to read from stdin");
    }

    let mut fetch_config = FetchConfig::builder().timeout(args.timeout).max_attempts(args.attempts);
    if let Some(ua) = &args.user_agent {
        fetch_config = fetch_config.user_agent(ua.clone());
    }
    let fetcher = SourceFetcher::new(fetch_config.build()).context("Failed to build HTTP client")?;

    let mut config = CoordinatorConfig::builder().allowed_schemes(["http", "https", "file"]);
    if let Some(max) = args.max_options {
        config = config.max_options(max);
    }
    let coordinator = BatchCoordinator::new(Arc::new(fetcher), config.build());

    coordinator.start(LOCAL_USER).await?;
    let submission = coordinator
        .submit_urls(LOCAL_USER, &entries.join("\n"))
        .await
        .context("No usable URLs")?;

    for rejected in &submission.rejected {
        echo::print_warning(&format!("Skipping invalid entry: {}", rejected));
    }

    let interactive = !args.yes && io::stdin().is_terminal() && !args.sources.iter().any(|s| s == "-");
    if interactive && !ask_confirmation(submission.pending)? {
        coordinator.reject(LOCAL_USER).await?;
        echo::print_warning("Discarded, nothing was fetched");
        return Ok(ExitCode::SUCCESS);
    }

    if args.verbose {
        echo::print_step(2, 3, &format!("Processing {} URL(s)", submission.pending));
    }

    let job = coordinator.confirm(LOCAL_USER).await?;
    let cancel = job.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            echo::print_warning("Interrupted, stopping after the current URL");
            cancel.cancel();
        }
    });

    let report = coordinator.run(job, &ConsoleTransport::new(args.verbose)).await;

    if args.verbose {
        echo::print_step(3, 3, "Writing output");
    }

    if args.json {
        let json = convert_to_json(&report.questions, &JsonConfig { pretty: true }).context("Failed to build JSON")?;
        println!("{}", json);
    } else {
        write_exports(&report, &args.out_dir).await?;
    }

    Ok(finish(&report))
}

/// Gathers entries from positional sources, stdin and the input file, in that order.
async fn collect_sources(args: &Args) -> anyhow::Result<Vec<String>> {
    let mut entries = Vec::new();

    for source in &args.sources {
        if source == "-" {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("Failed to read from stdin")?;
            entries.extend(non_empty_lines(&buffer).map(resolve_source));
        } else {
            entries.push(resolve_source(source));
        }
    }

    if let Some(path) = &args.input {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read URL list: {}", path.display()))?;
        entries.extend(non_empty_lines(&content).map(resolve_source));
    }

    Ok(entries)
}

fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Existing local files become `file://` URLs; anything else is passed on
/// unchanged and validated by the coordinator.
fn resolve_source(source: &str) -> String {
    if Url::parse(source).is_ok() {
        return source.to_string();
    }

    match Path::new(source).canonicalize() {
        Ok(path) if path.is_file() => Url::from_file_path(&path)
            .map(String::from)
            .unwrap_or_else(|_| source.to_string()),
        _ => source.to_string(),
    }
}

fn ask_confirmation(count: usize) -> anyhow::Result<bool> {
    eprint!("{} Process {} URL(s)? [Y/n] ", "?".cyan(), count);
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer).context("Failed to read confirmation")?;

    let answer = answer.trim().to_lowercase();
    Ok(answer.is_empty() || answer == "y" || answer == "yes")
}

/// Writes the non-empty exports into `out_dir`.
async fn write_exports(report: &BatchReport, out_dir: &Path) -> anyhow::Result<()> {
    let exports = [
        (MAIN_FILE_NAME, report.main.is_empty(), report.main_document(), report.main_caption()),
        (
            UNDETECTED_FILE_NAME,
            report.undetected.is_empty(),
            report.undetected_document(),
            report.undetected_caption(),
        ),
    ];

    if exports.iter().all(|(_, empty, _, _)| *empty) {
        return Ok(());
    }

    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    for (name, empty, document, caption) in exports {
        if empty {
            continue;
        }
        let path = out_dir.join(name);
        tokio::fs::write(&path, &document)
            .await
            .with_context(|| format!("Failed to write to file: {}", path.display()))?;
        echo::print_success(&format!(
            "{} written to {} ({})",
            caption,
            path.display().bright_white(),
            echo::format_size(document.len())
        ));
    }

    Ok(())
}

/// Prints the closing line and picks the exit code.
fn finish(report: &BatchReport) -> ExitCode {
    if let BatchState::Cancelled { .. } = report.state {
        echo::print_warning(&report.summary());
    }

    match report.outcome() {
        BatchOutcome::Extracted => ExitCode::SUCCESS,
        BatchOutcome::NothingFound => {
            echo::print_warning("No questions found on any URL.");
            ExitCode::SUCCESS
        }
        BatchOutcome::OnlyFailures => {
            echo::print_error("No questions extracted, but some URLs failed.");
            ExitCode::FAILURE
        }
    }
}
