//! First-version history page scraper.
//!
//! Endpoint: https://clinicaltrials.gov/study/{nctId}/history
//!
//! The earliest recorded rendering of a trial predates any outcome, so its
//! dates are estimates by construction even when the markup carries no
//! qualifier. The rare explicit "Actual" tag is honored. This is the only
//! source for originally-stated estimates that the current page no longer
//! shows, so the reconciler always consults it for the estimated side.

use async_trait::async_trait;
use scraper::{Html, Selector};
use trialtrace_common::RegistryClient;
use tracing::instrument;

use crate::classify::classify;
use crate::models::{DateValueKind, RawDateObservation, SourceTag, TrialIdentifier};
use super::{milestone_for_label, strip_kind_qualifier, DateSource};

#[derive(Debug, Clone)]
pub struct HistorySnapshotSource {
    client: RegistryClient,
    page_base_url: String,
}

impl HistorySnapshotSource {
    pub fn new(client: RegistryClient) -> Self {
        Self {
            client,
            page_base_url: super::detail::DEFAULT_PAGE_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.page_base_url = url.trim_end_matches('/').to_string();
        self
    }

    async fn fetch_first_version(&self, id: &TrialIdentifier) -> anyhow::Result<String> {
        // version=1 selects the earliest recorded rendering
        let url = format!("{}/study/{}/history?version=1", self.page_base_url, id);
        let resp = self.client.get(&url)?.send().await?;
        anyhow::ensure!(
            resp.status().is_success(),
            "history page returned status {} for {}",
            resp.status(),
            id
        );
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl DateSource for HistorySnapshotSource {
    fn tag(&self) -> SourceTag {
        SourceTag::HistoryPage
    }

    #[instrument(skip(self))]
    async fn try_observations(
        &self,
        id: &TrialIdentifier,
    ) -> anyhow::Result<Vec<RawDateObservation>> {
        let html = self.fetch_first_version(id).await?;
        Ok(parse_history_page(&html))
    }
}

/// Walks the version table rows. Rows at and past the "First posted" marker
/// belong to later submissions and are skipped.
pub(crate) fn parse_history_page(html: &str) -> Vec<RawDateObservation> {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("table tr").unwrap();
    let cell_selector = Selector::parse("th, td").unwrap();

    let mut observations = Vec::new();
    'rows: for row in document.select(&row_selector) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|c| c.text().collect::<String>().trim().to_string())
            .collect();

        for window in cells.windows(2) {
            let (label, value) = (&window[0], &window[1]);
            if label.to_lowercase().contains("first posted") {
                break 'rows;
            }
            let Some(milestone) = milestone_for_label(label) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }

            // Estimated by construction; only an explicit tag overrides
            let kind = if classify(label) == DateValueKind::Actual
                || classify(value) == DateValueKind::Actual
            {
                DateValueKind::Actual
            } else {
                DateValueKind::Estimated
            };
            observations.push(RawDateObservation {
                milestone,
                kind,
                value: strip_kind_qualifier(value),
                source: SourceTag::HistoryPage,
            });
        }
    }
    observations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MilestoneKind;

    #[test]
    fn test_unqualified_dates_are_estimated() {
        let html = r#"
        <html><body><table><tbody>
          <tr><td>v1</td><td>2019-01-10</td><td>Study Start Date</td><td>June 2019</td></tr>
          <tr><td>v1</td><td>2019-01-10</td><td>Primary Completion Date</td><td>Estimated December 2020</td></tr>
          <tr><td>v1</td><td>2019-01-10</td><td>Study Completion Date</td><td>March 2021</td></tr>
        </tbody></table></body></html>"#;

        let observations = parse_history_page(html);
        assert_eq!(observations.len(), 3);
        for obs in &observations {
            assert_eq!(obs.kind, DateValueKind::Estimated);
            assert_eq!(obs.source, SourceTag::HistoryPage);
        }
        assert_eq!(observations[0].milestone, MilestoneKind::StudyStart);
        assert_eq!(observations[0].value, "June 2019");
        assert_eq!(observations[1].value, "December 2020");
    }

    #[test]
    fn test_explicit_actual_tag_honored() {
        let html = r#"
        <table><tbody>
          <tr><td>Study Start Date</td><td>June 2019 (Actual)</td></tr>
        </tbody></table>"#;

        let observations = parse_history_page(html);
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].kind, DateValueKind::Actual);
        assert_eq!(observations[0].value, "June 2019");
    }

    #[test]
    fn test_stops_at_first_posted_marker() {
        let html = r#"
        <table><tbody>
          <tr><td>v1</td><td>2019-01-10</td><td>Study Start Date</td><td>June 2019</td></tr>
          <tr><td>v2</td><td>2019-05-02</td><td>First posted</td><td>2019-05-02</td></tr>
          <tr><td>v2</td><td>2019-05-02</td><td>Study Completion Date</td><td>March 2022</td></tr>
        </tbody></table>"#;

        let observations = parse_history_page(html);
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].milestone, MilestoneKind::StudyStart);
    }

    #[test]
    fn test_empty_page_yields_nothing() {
        assert!(parse_history_page("<html><body></body></html>").is_empty());
    }
}
