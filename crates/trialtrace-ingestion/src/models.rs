//! Data models for the reconciliation pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry-assigned trial identifier (NCT number).
/// Opaque once obtained from search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrialIdentifier(pub String);

impl TrialIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrialIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three milestone dates tracked per trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MilestoneKind {
    StudyStart,
    PrimaryCompletion,
    StudyCompletion,
}

impl MilestoneKind {
    pub const ALL: [MilestoneKind; 3] = [
        MilestoneKind::StudyStart,
        MilestoneKind::PrimaryCompletion,
        MilestoneKind::StudyCompletion,
    ];
}

/// How a source labelled a date value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateValueKind {
    Estimated,
    Actual,
    /// The source gave a date with no interpretable type marker.
    /// Never dropped; see the reconciler's fallback rule.
    Unknown,
}

/// Which adapter produced an observation. Lower rank wins during
/// reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceTag {
    Registry,
    DetailPage,
    HistoryPage,
}

impl SourceTag {
    pub fn priority(&self) -> u8 {
        match self {
            SourceTag::Registry    => 0,
            SourceTag::DetailPage  => 1,
            SourceTag::HistoryPage => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Registry    => "registry",
            SourceTag::DetailPage  => "detail_page",
            SourceTag::HistoryPage => "history_page",
        }
    }
}

/// One dated milestone as seen by a single source.
/// Created by an adapter, consumed immediately by the reconciler.
#[derive(Debug, Clone)]
pub struct RawDateObservation {
    pub milestone: MilestoneKind,
    pub kind: DateValueKind,
    pub value: String,
    pub source: SourceTag,
}

/// A reconciled date cell. `Parsed` when the source text was unambiguous,
/// `Verbatim` when it was recognized but not machine-parseable, and
/// `NotAvailable` when no source produced a value. Never unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DateCell {
    Parsed(NaiveDate),
    Verbatim(String),
    NotAvailable,
}

impl DateCell {
    /// The literal used for missing cells throughout a run.
    pub const NOT_AVAILABLE: &'static str = "-";

    /// Parses the text where possible, keeps it verbatim otherwise.
    pub fn from_text(text: &str) -> Self {
        match crate::dates::parse_date_text(text) {
            Some(date) => DateCell::Parsed(date),
            None => DateCell::Verbatim(text.trim().to_string()),
        }
    }

    pub fn render(&self) -> String {
        match self {
            DateCell::Parsed(date) => date.format("%Y-%m-%d").to_string(),
            DateCell::Verbatim(text) => text.clone(),
            DateCell::NotAvailable => Self::NOT_AVAILABLE.to_string(),
        }
    }
}

/// Contact person attached to a trial.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Facility where a trial recruits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Facility {
    pub name: String,
    pub country: Option<String>,
}

/// One search hit as returned by the registry search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialSummary {
    pub id: TrialIdentifier,
    pub title: String,
    pub sponsor: String,
    pub study_type: String,
    /// First entry of the phase list, or "N/A" when the list is empty.
    pub phase: String,
    pub status: String,
    pub contacts: Vec<Contact>,
    pub locations: Vec<Facility>,
}

impl TrialSummary {
    /// Pipe-delimited "name, phone, email" per contact.
    pub fn contacts_summary(&self) -> String {
        if self.contacts.is_empty() {
            return DateCell::NOT_AVAILABLE.to_string();
        }
        self.contacts
            .iter()
            .map(|c| {
                format!(
                    "{}, {}, {}",
                    c.name,
                    c.phone.as_deref().unwrap_or(DateCell::NOT_AVAILABLE),
                    c.email.as_deref().unwrap_or(DateCell::NOT_AVAILABLE),
                )
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Pipe-delimited "name (country)" per facility.
    pub fn locations_summary(&self) -> String {
        if self.locations.is_empty() {
            return DateCell::NOT_AVAILABLE.to_string();
        }
        self.locations
            .iter()
            .map(|l| match &l.country {
                Some(country) => format!("{} ({})", l.name, country),
                None => l.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// The unit of output: one row per trial. Every date cell is always
/// populated, so the exported table stays rectangular.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciledTrialRecord {
    pub id: TrialIdentifier,
    pub study_type: String,
    pub title: String,
    pub sponsor: String,
    pub phase: String,
    pub status: String,
    pub study_start_estimated: DateCell,
    pub study_start_actual: DateCell,
    pub primary_completion_estimated: DateCell,
    pub primary_completion_actual: DateCell,
    pub study_completion_estimated: DateCell,
    pub study_completion_actual: DateCell,
    pub contacts_summary: String,
    pub locations_summary: String,
}

impl ReconciledTrialRecord {
    /// Descriptive fields from the search summary, all date cells missing.
    pub fn unavailable(summary: &TrialSummary) -> Self {
        Self {
            id: summary.id.clone(),
            study_type: summary.study_type.clone(),
            title: summary.title.clone(),
            sponsor: summary.sponsor.clone(),
            phase: summary.phase.clone(),
            status: summary.status.clone(),
            study_start_estimated: DateCell::NotAvailable,
            study_start_actual: DateCell::NotAvailable,
            primary_completion_estimated: DateCell::NotAvailable,
            primary_completion_actual: DateCell::NotAvailable,
            study_completion_estimated: DateCell::NotAvailable,
            study_completion_actual: DateCell::NotAvailable,
            contacts_summary: summary.contacts_summary(),
            locations_summary: summary.locations_summary(),
        }
    }

    /// All six cells in export column order.
    pub fn date_cells(&self) -> [&DateCell; 6] {
        [
            &self.study_start_estimated,
            &self.study_start_actual,
            &self.primary_completion_estimated,
            &self.primary_completion_actual,
            &self.study_completion_estimated,
            &self.study_completion_actual,
        ]
    }
}

/// Ordered rows for one run, insertion order = search-result order.
pub type ResultSet = Vec<ReconciledTrialRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> TrialSummary {
        TrialSummary {
            id: TrialIdentifier::new("NCT00000001"),
            title: "A trial".to_string(),
            sponsor: "Acme".to_string(),
            study_type: "Interventional".to_string(),
            phase: "Phase 2".to_string(),
            status: "Recruiting".to_string(),
            contacts: vec![
                Contact {
                    name: "Jane Doe".to_string(),
                    phone: Some("555-0100".to_string()),
                    email: None,
                },
                Contact {
                    name: "John Roe".to_string(),
                    phone: None,
                    email: Some("john@example.org".to_string()),
                },
            ],
            locations: vec![
                Facility { name: "General Hospital".to_string(), country: Some("France".to_string()) },
                Facility { name: "City Clinic".to_string(), country: None },
            ],
        }
    }

    #[test]
    fn test_contacts_summary_pipe_delimited() {
        let s = summary();
        assert_eq!(
            s.contacts_summary(),
            "Jane Doe, 555-0100, - | John Roe, -, john@example.org"
        );
    }

    #[test]
    fn test_locations_summary() {
        let s = summary();
        assert_eq!(s.locations_summary(), "General Hospital (France) | City Clinic");
    }

    #[test]
    fn test_empty_summaries_use_marker() {
        let mut s = summary();
        s.contacts.clear();
        s.locations.clear();
        assert_eq!(s.contacts_summary(), "-");
        assert_eq!(s.locations_summary(), "-");
    }

    #[test]
    fn test_unavailable_record_has_all_cells() {
        let record = ReconciledTrialRecord::unavailable(&summary());
        for cell in record.date_cells() {
            assert_eq!(*cell, DateCell::NotAvailable);
            assert_eq!(cell.render(), "-");
        }
    }

    #[test]
    fn test_date_cell_from_text() {
        assert_eq!(
            DateCell::from_text("2021-05-01"),
            DateCell::Parsed(NaiveDate::from_ymd_opt(2021, 5, 1).unwrap())
        );
        assert_eq!(
            DateCell::from_text("sometime next year"),
            DateCell::Verbatim("sometime next year".to_string())
        );
    }
}
