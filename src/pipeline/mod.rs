// Batch pipeline: normalize, dedupe, join, enrich, quality-check

pub mod dedupe;
pub mod enrich;
pub mod join;
pub mod normalize;
pub mod quality;

use metrics::{counter, histogram};
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::domain::{CityRecord, EnrichedRecord, PopupRecord};
use crate::error::PipelineError;
use dedupe::{KeyCollision, ReferenceIndex};
use enrich::MetricEngine;
use join::join_reference;
use normalize::CityAliases;
use quality::QcReport;

/// A record that failed hard validation; the rest of the batch continues
#[derive(Debug)]
pub struct RecordFailure {
    pub event_id: String,
    pub error: PipelineError,
}

/// Everything one pipeline run produces
#[derive(Debug)]
pub struct PipelineOutput {
    /// Successfully enriched records, in input order
    pub enriched: Vec<EnrichedRecord>,
    /// Records dropped by hard validation, in input order
    pub failures: Vec<RecordFailure>,
    pub report: QcReport,
    /// Reference keys that had to be collapsed during deduplication
    pub reference_collisions: Vec<KeyCollision>,
}

/// Batch transform over the two datasets: deduplicate the reference,
/// left-join every pop-up record by canonical city key, derive metrics in
/// parallel, then run the QC battery over the survivors.
pub struct Pipeline {
    aliases: CityAliases,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            aliases: CityAliases::default(),
        }
    }

    pub fn with_aliases(aliases: CityAliases) -> Self {
        Self { aliases }
    }

    #[instrument(skip_all, fields(popups = popups.len(), cities = reference.len()))]
    pub fn run(&self, popups: &[PopupRecord], reference: &[CityRecord]) -> PipelineOutput {
        let run_start = std::time::Instant::now();
        counter!("popup_pipeline_runs_total").increment(1);

        let index = ReferenceIndex::build(reference);
        if !index.collisions().is_empty() {
            warn!(
                duplicate_keys = index.collisions().len(),
                "reference dataset contained duplicate city keys"
            );
        }
        counter!("popup_reference_duplicate_keys_total")
            .increment(index.collisions().len() as u64);
        info!(
            reference_rows = reference.len(),
            distinct_keys = index.len(),
            "reference index built"
        );

        let pairs = join_reference(popups, &index, &self.aliases);

        // Per-record work is independent; rayon preserves input order
        let results: Vec<_> = pairs
            .par_iter()
            .map(|(popup, matched)| {
                MetricEngine::enrich(popup, *matched).map_err(|error| RecordFailure {
                    event_id: popup.event_id.clone(),
                    error,
                })
            })
            .collect();

        let mut enriched = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(record) => enriched.push(record),
                Err(failure) => failures.push(failure),
            }
        }
        let reference_collisions = index.into_collisions();

        counter!("popup_records_enriched_total").increment(enriched.len() as u64);
        for failure in &failures {
            counter!(
                "popup_records_failed_total",
                "reason" => failure_reason(&failure.error)
            )
            .increment(1);
        }
        if !failures.is_empty() {
            warn!(
                failed = failures.len(),
                "records dropped by hard validation"
            );
        }

        let report = QcReport::check(&enriched);
        counter!("popup_qc_anomalies_total").increment(report.total_anomalies() as u64);

        histogram!("popup_pipeline_duration_seconds").record(run_start.elapsed().as_secs_f64());
        info!(
            enriched = enriched.len(),
            failed = failures.len(),
            anomalies = report.total_anomalies(),
            "pipeline run complete"
        );

        PipelineOutput {
            enriched,
            failures,
            report,
            reference_collisions,
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn failure_reason(error: &PipelineError) -> &'static str {
    match error {
        PipelineError::MissingField(_) => "missing_field",
        PipelineError::InvalidDateRange { .. } => "invalid_date_range",
        _ => "other",
    }
}
