//! Current detail page scraper.
//!
//! Endpoint: https://clinicaltrials.gov/study/{nctId}
//!
//! Fallback for milestones the structured status module does not carry:
//! parses the label/value rows of the present-day study page and classifies
//! each label through the field label classifier. Labels may read "Actual",
//! "Estimated", or carry no qualifier at all.

use async_trait::async_trait;
use scraper::{Html, Selector};
use trialtrace_common::RegistryClient;
use tracing::instrument;

use crate::classify::classify;
use crate::models::{DateValueKind, RawDateObservation, SourceTag, TrialIdentifier};
use super::{milestone_for_label, strip_kind_qualifier, DateSource};

pub const DEFAULT_PAGE_BASE_URL: &str = "https://clinicaltrials.gov";

#[derive(Debug, Clone)]
pub struct DetailPageSource {
    client: RegistryClient,
    page_base_url: String,
}

impl DetailPageSource {
    pub fn new(client: RegistryClient) -> Self {
        Self {
            client,
            page_base_url: DEFAULT_PAGE_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.page_base_url = url.trim_end_matches('/').to_string();
        self
    }

    async fn fetch_page(&self, id: &TrialIdentifier) -> anyhow::Result<String> {
        let url = format!("{}/study/{}", self.page_base_url, id);
        let resp = self.client.get(&url)?.send().await?;
        anyhow::ensure!(
            resp.status().is_success(),
            "detail page returned status {} for {}",
            resp.status(),
            id
        );
        Ok(resp.text().await?)
    }
}

#[async_trait]
impl DateSource for DetailPageSource {
    fn tag(&self) -> SourceTag {
        SourceTag::DetailPage
    }

    #[instrument(skip(self))]
    async fn try_observations(
        &self,
        id: &TrialIdentifier,
    ) -> anyhow::Result<Vec<RawDateObservation>> {
        let html = self.fetch_page(id).await?;
        Ok(parse_detail_page(&html))
    }
}

/// Walks label/value rows of the rendered page. The qualifier may sit on
/// the label ("Actual Study Completion Date") or on the value
/// ("June 2019 (Estimated)"); either is honored, label first.
pub(crate) fn parse_detail_page(html: &str) -> Vec<RawDateObservation> {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("th, td").unwrap();

    let mut observations = Vec::new();
    for row in document.select(&row_selector) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|c| c.text().collect::<String>().trim().to_string())
            .collect();
        if cells.len() < 2 {
            continue;
        }

        let (label, value) = (&cells[0], &cells[1]);
        let Some(milestone) = milestone_for_label(label) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }

        let kind = match classify(label) {
            DateValueKind::Unknown => classify(value),
            tagged => tagged,
        };
        observations.push(RawDateObservation {
            milestone,
            kind,
            value: strip_kind_qualifier(value),
            source: SourceTag::DetailPage,
        });
    }
    observations
}
