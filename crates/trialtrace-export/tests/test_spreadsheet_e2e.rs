//! Full flow: stubbed search and sources → pipeline → spreadsheet file.

use async_trait::async_trait;

use trialtrace_export::{spreadsheet_bytes, write_spreadsheet, HEADER};
use trialtrace_ingestion::models::{
    DateValueKind, MilestoneKind, RawDateObservation, SourceTag, TrialIdentifier, TrialSummary,
};
use trialtrace_ingestion::pipeline::{run_export, ExportJob};
use trialtrace_ingestion::sources::{DateSource, TrialSearch};

struct StubSearch;

#[async_trait]
impl TrialSearch for StubSearch {
    async fn search(
        &self,
        _term: &str,
        _location: Option<&str>,
        max_results: usize,
    ) -> Vec<TrialSummary> {
        (0..3)
            .take(max_results)
            .map(|i| TrialSummary {
                id: TrialIdentifier::new(&format!("NCT0000000{i}")),
                title: format!("Trial {i}"),
                sponsor: "Acme Pharma".to_string(),
                study_type: "Interventional".to_string(),
                phase: "Phase 3".to_string(),
                status: "Active, not recruiting".to_string(),
                contacts: vec![],
                locations: vec![],
            })
            .collect()
    }
}

struct StubRegistry;

#[async_trait]
impl DateSource for StubRegistry {
    fn tag(&self) -> SourceTag {
        SourceTag::Registry
    }

    async fn try_observations(
        &self,
        id: &TrialIdentifier,
    ) -> anyhow::Result<Vec<RawDateObservation>> {
        // Only the first trial carries dates
        if id.as_str() != "NCT00000000" {
            return Ok(Vec::new());
        }
        Ok(vec![
            RawDateObservation {
                milestone: MilestoneKind::StudyStart,
                kind: DateValueKind::Actual,
                value: "2020-01-15".to_string(),
                source: SourceTag::Registry,
            },
            RawDateObservation {
                milestone: MilestoneKind::StudyCompletion,
                kind: DateValueKind::Estimated,
                value: "2026-06".to_string(),
                source: SourceTag::Registry,
            },
        ])
    }
}

fn job() -> ExportJob {
    ExportJob {
        term: "lung cancer".to_string(),
        politeness_delay_ms: 0,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_pipeline_rows_render_to_rectangular_sheet() {
    let sources: Vec<Box<dyn DateSource>> = vec![Box::new(StubRegistry)];
    let result = run_export(job(), &StubSearch, &sources, None, None).await;
    assert_eq!(result.rows.len(), 3);

    let bytes = spreadsheet_bytes(&result.rows).unwrap();
    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    assert_eq!(reader.headers().unwrap().len(), HEADER.len());

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.len(), HEADER.len());
    }

    // Dated trial renders its cells, the rest carry the marker
    assert_eq!(&rows[0][7], "2020-01-15");
    assert_eq!(&rows[0][10], "2026-06-01");
    assert_eq!(&rows[1][7], "-");
    assert_eq!(&rows[2][10], "-");
}

#[tokio::test]
async fn test_pipeline_rows_written_to_disk() {
    let sources: Vec<Box<dyn DateSource>> = vec![Box::new(StubRegistry)];
    let result = run_export(job(), &StubSearch, &sources, None, None).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinical_trials_lung_cancer.csv");
    write_spreadsheet(&result.rows, &path).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    assert_eq!(reader.records().count(), 3);
}
