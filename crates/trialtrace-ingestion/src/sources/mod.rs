//! Upstream source adapters.
//!
//! One adapter per source shape. Each exposes the same observation contract
//! regardless of its internal parsing strategy, so registry schema drift is
//! absorbed here and never reaches the reconciler.

pub mod detail;
pub mod history;
pub mod registry;

use async_trait::async_trait;
use tracing::warn;

use crate::models::{MilestoneKind, RawDateObservation, SourceTag, TrialIdentifier, TrialSummary};

/// Common interface for all milestone-date sources.
#[async_trait]
pub trait DateSource: Send + Sync {
    /// Provenance tag; its rank decides precedence during reconciliation.
    fn tag(&self) -> SourceTag;

    /// Fallible fetch + parse. Errors are downgraded by `observations`.
    async fn try_observations(
        &self,
        id: &TrialIdentifier,
    ) -> anyhow::Result<Vec<RawDateObservation>>;

    /// Soft-failure boundary: timeout, non-success status and parse errors
    /// all degrade to zero observations. Nothing escapes the adapter.
    async fn observations(&self, id: &TrialIdentifier) -> Vec<RawDateObservation> {
        match self.try_observations(id).await {
            Ok(obs) => obs,
            Err(e) => {
                warn!(
                    source = self.tag().as_str(),
                    trial = id.as_str(),
                    error = %e,
                    "source unavailable, continuing without it"
                );
                Vec::new()
            }
        }
    }
}

/// Registry keyword search. A non-success response degrades to an empty
/// list, never an error.
#[async_trait]
pub trait TrialSearch: Send + Sync {
    async fn search(
        &self,
        term: &str,
        location: Option<&str>,
        max_results: usize,
    ) -> Vec<TrialSummary>;
}

/// Maps a rendered field label to the milestone it names, if any.
pub(crate) fn milestone_for_label(label: &str) -> Option<MilestoneKind> {
    let l = label.to_lowercase();
    if l.contains("study start") || l.contains("start date") {
        Some(MilestoneKind::StudyStart)
    } else if l.contains("primary completion") {
        Some(MilestoneKind::PrimaryCompletion)
    } else if l.contains("study completion") || l.contains("completion date") {
        Some(MilestoneKind::StudyCompletion)
    } else {
        None
    }
}

/// Strips a leading/trailing "Estimated"/"Actual"/"Anticipated" qualifier
/// (bare or parenthesized) from a rendered date value.
pub(crate) fn strip_kind_qualifier(value: &str) -> String {
    let mut v = value.to_string();
    for qualifier in ["Estimated", "Anticipated", "Actual"] {
        v = v
            .replace(&format!("({})", qualifier), "")
            .replace(&format!("({})", qualifier.to_lowercase()), "")
            .replace(qualifier, "")
            .replace(&qualifier.to_lowercase(), "");
    }
    v.trim().trim_matches(':').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milestone_labels() {
        assert_eq!(milestone_for_label("Study Start Date"), Some(MilestoneKind::StudyStart));
        assert_eq!(milestone_for_label("Actual Study Start"), Some(MilestoneKind::StudyStart));
        assert_eq!(
            milestone_for_label("Primary Completion Date"),
            Some(MilestoneKind::PrimaryCompletion)
        );
        assert_eq!(
            milestone_for_label("Estimated Primary Completion Date"),
            Some(MilestoneKind::PrimaryCompletion)
        );
        assert_eq!(
            milestone_for_label("Study Completion Date"),
            Some(MilestoneKind::StudyCompletion)
        );
        assert_eq!(milestone_for_label("First Posted"), None);
        assert_eq!(milestone_for_label("Enrollment"), None);
    }

    #[test]
    fn test_strip_kind_qualifier() {
        assert_eq!(strip_kind_qualifier("June 2019 (Estimated)"), "June 2019");
        assert_eq!(strip_kind_qualifier("Estimated June 2019"), "June 2019");
        assert_eq!(strip_kind_qualifier("2021-05-01 (Actual)"), "2021-05-01");
        assert_eq!(strip_kind_qualifier("2021-05-01"), "2021-05-01");
    }
}
