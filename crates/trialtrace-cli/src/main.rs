//! trialtrace — clinical trial milestone dates to a spreadsheet.
//! Entry point for the command-line binary.

mod config;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trialtrace_common::RegistryClient;
use trialtrace_ingestion::pipeline::{run_export, ExportJob, PipelineProgress, ResultCountMode};
use trialtrace_ingestion::sources::detail::DetailPageSource;
use trialtrace_ingestion::sources::history::HistorySnapshotSource;
use trialtrace_ingestion::sources::registry::RegistryApiClient;
use trialtrace_ingestion::sources::DateSource;

#[derive(Parser, Debug)]
#[command(
    name = "trialtrace",
    about = "Export clinical trial milestone dates (estimated and actual) to a spreadsheet",
    version
)]
struct Cli {
    /// Condition or disease to search for, e.g. "lung cancer".
    term: Option<String>,

    /// Restrict results to a location (city, state or country).
    #[arg(long)]
    location: Option<String>,

    /// How many trials to process.
    #[arg(long, value_enum, default_value_t = Mode::Sample)]
    mode: Mode,

    /// Output file. Defaults to clinical_trials_<term>.csv in the
    /// current directory.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// First 10 results, for a quick look.
    Sample,
    /// Everything the registry returns, up to the configured cap.
    Full,
}

impl From<Mode> for ResultCountMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Sample => ResultCountMode::Sample,
            Mode::Full => ResultCountMode::Full,
        }
    }
}

/// Hostname of a configured base URL, for extending the client allowlist
/// when the config points at a mirror or fixture server.
fn host_of(base_url: &str) -> Option<String> {
    url::Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("trialtrace=info,warn")),
        )
        .init();

    let cli = Cli::parse();

    let Some(term) = cli.term.filter(|t| !t.trim().is_empty()) else {
        eprintln!("No search term given. Example: trialtrace \"lung cancer\" --location Boston");
        return Ok(());
    };
    let term = term.trim().to_string();

    let config = config::Config::load()?;
    info!(
        api = %config.registry.api_base_url,
        pages = %config.registry.page_base_url,
        "Configuration loaded"
    );

    // HTTP client, capped to the registry hosts plus any configured mirror
    let mut client = RegistryClient::new(Duration::from_secs(config.registry.timeout_secs))?;
    for base in [&config.registry.api_base_url, &config.registry.page_base_url] {
        if let Some(host) = host_of(base) {
            client.allow_domain(&host);
        }
    }

    let registry = RegistryApiClient::new(client.clone()).with_base_url(&config.registry.api_base_url);
    let date_sources: Vec<Box<dyn DateSource>> = vec![
        Box::new(registry.clone()),
        Box::new(DetailPageSource::new(client.clone()).with_base_url(&config.registry.page_base_url)),
        Box::new(HistorySnapshotSource::new(client).with_base_url(&config.registry.page_base_url)),
    ];

    let job = ExportJob {
        term: term.clone(),
        location: cli.location.clone(),
        mode: cli.mode.into(),
        full_cap: config.batch.full_cap,
        politeness_delay_ms: config.batch.politeness_delay_ms,
    };

    // Ctrl-C requests a graceful stop; rows reconciled so far are still written
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Interrupt received, finishing current trial...");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    // Progress goes to stderr so stdout stays clean for redirection
    let (progress_tx, progress_rx) = broadcast::channel::<PipelineProgress>(64);
    let printer = tokio::spawn(print_progress(progress_rx));

    let result = run_export(job, &registry, &date_sources, Some(progress_tx), Some(cancel)).await;
    let _ = printer.await;

    if result.rows.is_empty() {
        if result.cancelled {
            eprintln!("Cancelled before any trial was processed; nothing written.");
        } else {
            eprintln!("No trials found for \"{term}\". Try a broader term.");
        }
        return Ok(());
    }

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(trialtrace_export::default_filename(&term)));
    trialtrace_export::write_spreadsheet(&result.rows, &output)?;

    eprintln!(
        "Wrote {} rows to {}{}",
        result.rows.len(),
        output.display(),
        if result.cancelled { " (cancelled early)" } else { "" }
    );
    for error in &result.errors {
        warn!("{error}");
    }

    Ok(())
}

async fn print_progress(mut rx: broadcast::Receiver<PipelineProgress>) {
    while let Ok(progress) = rx.recv().await {
        eprintln!("[{}] {}", progress.stage, progress.message);
    }
}
