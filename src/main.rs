//! CLI entry point for the Dropbox downloader.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dropbox_dl::{
    BatchRunner, Destination, DownloadConfig, HttpClient, InterruptFlag, LinkNormalizer,
    NoProgress, ProgressSink, RetryPolicy, SizePolicy, TracingEvents, Transferrer, input,
};
use tracing::{debug, info, warn};

mod app;
mod cli;

use app::exit_handler::determine_exit_outcome;
use app::progress_bar::BarProgress;
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let links = match &args.read {
        Some(path) => input::read_links_file(path)
            .with_context(|| format!("failed to read links file {}", path.display()))?,
        None => input::dedupe_links(&args.links),
    };

    if links.is_empty() {
        warn!("No links to download");
        return Ok(());
    }

    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    let destination = match &args.dest {
        Some(dest) => Destination::from_arg(dest, &cwd),
        None => Destination::directory(PathBuf::from(".")),
    };

    let mut config = DownloadConfig::new(destination);
    config.unzip = args.unzip;
    config.retain_archive = args.retain_zip;
    if args.allow_size_mismatch {
        config.size_policy = SizePolicy::Lenient;
    }

    let interrupt = InterruptFlag::new();
    let interrupt_signal = interrupt.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt_signal.raise();
        }
    });

    let events = Arc::new(TracingEvents);
    let client = HttpClient::with_retry_policy(RetryPolicy::with_max_retries(u32::from(
        args.max_retries,
    )));
    let transferrer =
        Transferrer::new(client, events.clone(), interrupt).with_size_policy(config.size_policy);
    let runner = BatchRunner::new(LinkNormalizer::dropbox(), transferrer, events);

    let progress: Box<dyn ProgressSink> = if args.quiet || !io::stderr().is_terminal() {
        Box::new(NoProgress)
    } else {
        Box::new(BarProgress::new())
    };

    info!(links = links.len(), "Downloader starting");
    let report = runner.run(&links, &config, progress.as_ref()).await;

    info!(
        succeeded = report.succeeded(),
        skipped = report.skipped(),
        failed = report.failed(),
        interrupted = report.was_interrupted(),
        "Download complete"
    );

    let exit = determine_exit_outcome(&report);
    debug!(?exit, code = exit.code(), "exiting");
    std::process::exit(exit.code());
}
