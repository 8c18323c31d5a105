//! End-to-end export pipeline.
//!
//! Orchestrates the full flow for a single export job:
//!   1. Search the registry for trials matching the condition term
//!   2. For each trial, query every date source in precedence order
//!   3. Reconcile the observations into one complete record
//!   4. Emit progress events via broadcast channel
//!
//! Trials are processed strictly one at a time with a politeness delay
//! between them. Every trial returned by the search yields exactly one
//! output row; a trial whose sources all fail still produces a row with
//! not-available date cells, plus an entry in the error summary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::models::{ResultSet, TrialSummary};
use crate::reconcile::reconcile;
use crate::sources::{DateSource, TrialSearch};

// ── Job config ────────────────────────────────────────────────────────────────

/// Parameters for a single export run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    /// Condition or disease search term.
    pub term: String,
    /// Optional location filter (city, state or country).
    pub location: Option<String>,
    pub mode: ResultCountMode,
    /// Upper bound on trials fetched in `Full` mode.
    pub full_cap: usize,
    /// Pause between consecutive trials, in milliseconds.
    pub politeness_delay_ms: u64,
}

/// How many trials to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultCountMode {
    /// First page only, for a quick look.
    Sample,
    /// Everything the registry returns, up to `full_cap`.
    Full,
}

pub const SAMPLE_SIZE: usize = 10;

impl ExportJob {
    pub fn max_results(&self) -> usize {
        match self.mode {
            ResultCountMode::Sample => SAMPLE_SIZE,
            ResultCountMode::Full => self.full_cap,
        }
    }
}

impl Default for ExportJob {
    fn default() -> Self {
        Self {
            term: String::new(),
            location: None,
            mode: ResultCountMode::Sample,
            full_cap: 1000,
            politeness_delay_ms: 500,
        }
    }
}

// ── Progress events ───────────────────────────────────────────────────────────

/// Progress event emitted during a pipeline run (cloneable for broadcast).
#[derive(Debug, Clone, Serialize)]
pub struct PipelineProgress {
    pub stage: String,
    pub message: String,
    pub trials_found: usize,
    pub rows_done: usize,
}

impl PipelineProgress {
    fn new(stage: &str, message: String) -> Self {
        Self {
            stage: stage.to_string(),
            message,
            trials_found: 0,
            rows_done: 0,
        }
    }
}

// ── Result summary ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub query: String,
    pub trials_found: usize,
    #[serde(skip)]
    pub rows: ResultSet,
    pub errors: Vec<String>,
    pub cancelled: bool,
    pub duration_ms: u64,
}

// ── Pipeline orchestrator ─────────────────────────────────────────────────────

/// Runs the end-to-end export pipeline for one job.
///
/// Progress events are sent via `progress_tx` if provided. Setting `cancel`
/// stops the run before the next trial; rows already reconciled are kept.
/// The pipeline never aborts on a per-trial failure: it logs and continues.
#[instrument(skip(search, date_sources, progress_tx, cancel))]
pub async fn run_export(
    job: ExportJob,
    search: &dyn TrialSearch,
    date_sources: &[Box<dyn DateSource>],
    progress_tx: Option<broadcast::Sender<PipelineProgress>>,
    cancel: Option<Arc<AtomicBool>>,
) -> PipelineResult {
    let t0 = std::time::Instant::now();
    info!(term = %job.term, location = ?job.location, mode = ?job.mode, "Starting export pipeline");

    let emit = |prog: PipelineProgress| {
        if let Some(ref tx) = progress_tx {
            let _ = tx.send(prog);
        }
    };
    let is_cancelled = || {
        cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    };

    let mut result = PipelineResult {
        query: job.term.clone(),
        trials_found: 0,
        rows: Vec::new(),
        errors: Vec::new(),
        cancelled: false,
        duration_ms: 0,
    };

    // ── 1. Registry search ────────────────────────────────────────────────────
    emit(PipelineProgress::new(
        "search",
        format!("Searching trials for: {}", job.term),
    ));

    let summaries: Vec<TrialSummary> = search
        .search(&job.term, job.location.as_deref(), job.max_results())
        .await;
    result.trials_found = summaries.len();
    info!(n = summaries.len(), "Registry search complete");

    emit({
        let mut p = PipelineProgress::new("dates", format!("{} trials found", summaries.len()));
        p.trials_found = summaries.len();
        p
    });

    // ── 2. Per-trial date collection + reconciliation ────────────────────────
    for (i, summary) in summaries.iter().enumerate() {
        if is_cancelled() {
            info!(rows_done = result.rows.len(), "Export cancelled");
            result.cancelled = true;
            break;
        }

        // Politeness delay before every request burst after the first trial
        if i > 0 && job.politeness_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(job.politeness_delay_ms)).await;
        }

        let mut observations = Vec::new();
        for source in date_sources {
            observations.extend(source.observations(&summary.id).await);
        }

        if observations.is_empty() {
            let msg = format!("no dated milestone found for {}", summary.id);
            warn!("{}", &msg);
            result.errors.push(msg);
        }

        // One row per trial regardless of what the sources yielded
        result.rows.push(reconcile(summary, &observations));

        emit({
            let mut p = PipelineProgress::new(
                "dates",
                format!("{} ({}/{})", summary.id, i + 1, summaries.len()),
            );
            p.trials_found = summaries.len();
            p.rows_done = result.rows.len();
            p
        });
    }

    result.duration_ms = t0.elapsed().as_millis() as u64;

    info!(
        trials_found = result.trials_found,
        rows = result.rows.len(),
        errors = result.errors.len(),
        cancelled = result.cancelled,
        duration_ms = result.duration_ms,
        "Export pipeline complete"
    );

    emit({
        let mut p = PipelineProgress::new(
            "complete",
            format!(
                "Done. {} rows, {} trials with no reachable source.",
                result.rows.len(),
                result.errors.len()
            ),
        );
        p.trials_found = result.trials_found;
        p.rows_done = result.rows.len();
        p
    });

    result
}

// ── Tests ─────────────────────────────────────────────────────────────────────
