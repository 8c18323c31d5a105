//! Date reconciliation.
//!
//! Merges the observations of all source adapters for one trial into a
//! single record with six date cells (estimated/actual for each of the
//! three milestones).
//!
//! Merge rule per (milestone, kind) pair:
//!   1. The highest-priority source (registry > detail page > history page)
//!      with a non-Unknown classification wins.
//!   2. Later observations for the same pair are discarded, never merged.
//!   3. No observation at all leaves the explicit not-available marker.
//!   4. Text that does not parse cleanly is preserved verbatim so the row
//!      stays inspectable.
//!
//! Unknown-kind observations are never dropped: they fill the estimated
//! cell at lowest precedence when nothing was classified for it.

use crate::models::{
    DateCell, DateValueKind, MilestoneKind, RawDateObservation, ReconciledTrialRecord,
    TrialSummary,
};

/// Total: every input, including zero observations, yields a complete
/// record. Never fails; upstream total failure degrades to an all-missing
/// row, not a dropped one.
pub fn reconcile(
    summary: &TrialSummary,
    observations: &[RawDateObservation],
) -> ReconciledTrialRecord {
    let mut record = ReconciledTrialRecord::unavailable(summary);

    for milestone in MilestoneKind::ALL {
        let estimated = pick(observations, milestone, DateValueKind::Estimated)
            .or_else(|| pick(observations, milestone, DateValueKind::Unknown));
        let actual = pick(observations, milestone, DateValueKind::Actual);

        let estimated_cell = cell_from(estimated);
        let actual_cell = cell_from(actual);
        match milestone {
            MilestoneKind::StudyStart => {
                record.study_start_estimated = estimated_cell;
                record.study_start_actual = actual_cell;
            }
            MilestoneKind::PrimaryCompletion => {
                record.primary_completion_estimated = estimated_cell;
                record.primary_completion_actual = actual_cell;
            }
            MilestoneKind::StudyCompletion => {
                record.study_completion_estimated = estimated_cell;
                record.study_completion_actual = actual_cell;
            }
        }
    }

    record
}

fn pick<'a>(
    observations: &'a [RawDateObservation],
    milestone: MilestoneKind,
    kind: DateValueKind,
) -> Option<&'a RawDateObservation> {
    // min_by_key keeps the first of equally-ranked observations
    observations
        .iter()
        .filter(|o| o.milestone == milestone && o.kind == kind)
        .min_by_key(|o| o.source.priority())
}

fn cell_from(observation: Option<&RawDateObservation>) -> DateCell {
    match observation {
        Some(o) => DateCell::from_text(&o.value),
        None => DateCell::NotAvailable,
    }
}
