//! trialtrace-export — Spreadsheet rendering of reconciled trial rows.
//!
//! One row per trial, fourteen columns, header first. Column order is part
//! of the output contract: downstream analysts key on position as well as
//! name. Missing values render as the "-" literal, never as an empty cell.

use std::path::Path;

use tracing::info;
use trialtrace_common::Result;
use trialtrace_ingestion::models::{ReconciledTrialRecord, ResultSet};

/// Export columns, in contract order.
pub const HEADER: [&str; 14] = [
    "NCT ID",
    "Study Type",
    "Brief Title",
    "Sponsor",
    "Phase",
    "Status",
    "Study Start (Estimated)",
    "Study Start (Actual)",
    "Primary Completion (Estimated)",
    "Primary Completion (Actual)",
    "Study Completion (Estimated)",
    "Study Completion (Actual)",
    "Contacts",
    "Locations",
];

fn record_fields(record: &ReconciledTrialRecord) -> [String; 14] {
    [
        record.id.as_str().to_string(),
        record.study_type.clone(),
        record.title.clone(),
        record.sponsor.clone(),
        record.phase.clone(),
        record.status.clone(),
        record.study_start_estimated.render(),
        record.study_start_actual.render(),
        record.primary_completion_estimated.render(),
        record.primary_completion_actual.render(),
        record.study_completion_estimated.render(),
        record.study_completion_actual.render(),
        record.contacts_summary.clone(),
        record.locations_summary.clone(),
    ]
}

/// Renders the result set to spreadsheet bytes (header + one row per trial).
pub fn spreadsheet_bytes(rows: &ResultSet) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for record in rows {
        writer.write_record(record_fields(record))?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()).into())
}

/// Writes the result set to `path`, replacing any existing file.
pub fn write_spreadsheet(rows: &ResultSet, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADER)?;
    for record in rows {
        writer.write_record(record_fields(record))?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "Spreadsheet written");
    Ok(())
}

/// Default output filename derived from the search term.
/// "Lung Cancer" becomes `clinical_trials_lung_cancer.csv`.
pub fn default_filename(term: &str) -> String {
    let slug: String = term
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "clinical_trials.csv".to_string()
    } else {
        format!("clinical_trials_{slug}.csv")
    }
}
