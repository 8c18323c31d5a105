//! ClinicalTrials.gov v2 API client.
//!
//! API docs: https://clinicaltrials.gov/data-api/api
//! Endpoints:
//!   search: https://clinicaltrials.gov/api/v2/studies
//!   study:  https://clinicaltrials.gov/api/v2/studies/{nctId}
//!
//! Doubles as the structured-field date source: the status module of a study
//! carries one `{date, type}` struct per milestone.

use async_trait::async_trait;
use trialtrace_common::RegistryClient;
use tracing::{debug, instrument, warn};

use crate::classify::classify;
use crate::models::{
    Contact, DateValueKind, Facility, MilestoneKind, RawDateObservation, SourceTag,
    TrialIdentifier, TrialSummary,
};
use super::{DateSource, TrialSearch};

pub const DEFAULT_API_BASE_URL: &str = "https://clinicaltrials.gov/api/v2";

const SUMMARY_FIELDS: &str = "IdentificationModule,StatusModule,DesignModule,\
                              SponsorCollaboratorsModule,ContactsLocationsModule";

#[derive(Debug, Clone)]
pub struct RegistryApiClient {
    client: RegistryClient,
    api_base_url: String,
}

impl RegistryApiClient {
    pub fn new(client: RegistryClient) -> Self {
        Self {
            client,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API base (mirrors, fixtures).
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.api_base_url = url.trim_end_matches('/').to_string();
        self
    }

    async fn try_search(
        &self,
        term: &str,
        location: Option<&str>,
        max_results: usize,
    ) -> anyhow::Result<Vec<TrialSummary>> {
        let url = format!("{}/studies", self.api_base_url);
        let mut params = vec![
            ("query.cond", term.to_string()),
            ("pageSize", max_results.to_string()),
            ("format", "json".to_string()),
            ("fields", SUMMARY_FIELDS.to_string()),
        ];
        if let Some(loc) = location {
            params.push(("query.locn", loc.to_string()));
        }

        let resp = self.client.get(&url)?.query(&params).send().await?;
        if !resp.status().is_success() {
            warn!(status = %resp.status(), "registry search returned non-success");
            return Ok(Vec::new());
        }

        let body: serde_json::Value = resp.json().await?;
        let studies = body["studies"].as_array().cloned().unwrap_or_default();
        debug!(n = studies.len(), "registry search returned studies");

        Ok(studies.iter().map(parse_summary).collect())
    }

    async fn fetch_study(&self, id: &TrialIdentifier) -> anyhow::Result<serde_json::Value> {
        let url = format!("{}/studies/{}", self.api_base_url, id);
        let resp = self
            .client
            .get(&url)?
            .query(&[("format", "json")])
            .send()
            .await?;
        anyhow::ensure!(
            resp.status().is_success(),
            "registry returned status {} for {}",
            resp.status(),
            id
        );
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl TrialSearch for RegistryApiClient {
    #[instrument(skip(self))]
    async fn search(
        &self,
        term: &str,
        location: Option<&str>,
        max_results: usize,
    ) -> Vec<TrialSummary> {
        match self.try_search(term, location, max_results).await {
            Ok(summaries) => summaries,
            Err(e) => {
                warn!(error = %e, "registry search failed, returning no results");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl DateSource for RegistryApiClient {
    fn tag(&self) -> SourceTag {
        SourceTag::Registry
    }

    #[instrument(skip(self))]
    async fn try_observations(
        &self,
        id: &TrialIdentifier,
    ) -> anyhow::Result<Vec<RawDateObservation>> {
        let study = self.fetch_study(id).await?;
        Ok(status_observations(&study))
    }
}

fn parse_summary(study: &serde_json::Value) -> TrialSummary {
    let proto = &study["protocolSection"];
    let id_mod = &proto["identificationModule"];
    let status_mod = &proto["statusModule"];
    let design_mod = &proto["designModule"];
    let sponsor_mod = &proto["sponsorCollaboratorsModule"];
    let contacts_mod = &proto["contactsLocationsModule"];

    let phase = design_mod["phases"]
        .as_array()
        .and_then(|phases| phases.first())
        .and_then(|p| p.as_str())
        .unwrap_or("N/A");

    let contacts = contacts_mod["centralContacts"]
        .as_array()
        .unwrap_or(&vec![])
        .iter()
        .map(|c| Contact {
            name: c["name"].as_str().unwrap_or("-").to_string(),
            phone: c["phone"].as_str().map(String::from),
            email: c["email"].as_str().map(String::from),
        })
        .collect();

    let locations = contacts_mod["locations"]
        .as_array()
        .unwrap_or(&vec![])
        .iter()
        .map(|l| Facility {
            name: l["facility"].as_str().unwrap_or("-").to_string(),
            country: l["country"].as_str().map(String::from),
        })
        .collect();

    TrialSummary {
        id: TrialIdentifier::new(id_mod["nctId"].as_str().unwrap_or("")),
        title: id_mod["briefTitle"].as_str().unwrap_or("-").to_string(),
        sponsor: sponsor_mod["leadSponsor"]["name"]
            .as_str()
            .unwrap_or("-")
            .to_string(),
        study_type: design_mod["studyType"].as_str().unwrap_or("-").to_string(),
        phase: phase.to_string(),
        status: status_mod["overallStatus"].as_str().unwrap_or("Unknown").to_string(),
        contacts,
        locations,
    }
}

/// Reads the status-module date structs. A type tag of "actual" (any case)
/// yields an Actual observation; anything else, including a missing tag,
/// yields Estimated. A missing module yields nothing.
///
/// The structured tag is trusted outright; when a page rendering disagrees
/// with it, the registry observation outranks the page one anyway.
fn status_observations(study: &serde_json::Value) -> Vec<RawDateObservation> {
    let status_mod = &study["protocolSection"]["statusModule"];
    let fields = [
        ("startDateStruct", MilestoneKind::StudyStart),
        ("primaryCompletionDateStruct", MilestoneKind::PrimaryCompletion),
        ("completionDateStruct", MilestoneKind::StudyCompletion),
    ];

    let mut observations = Vec::new();
    for (field, milestone) in fields {
        let entry = &status_mod[field];
        let Some(date) = entry["date"].as_str() else {
            continue;
        };
        let kind = match entry["type"].as_str().map(classify) {
            Some(DateValueKind::Actual) => DateValueKind::Actual,
            _ => DateValueKind::Estimated,
        };
        observations.push(RawDateObservation {
            milestone,
            kind,
            value: date.to_string(),
            source: SourceTag::Registry,
        });
    }
    observations
}
