// Cleaning pipeline: ingestion, processing stages and the run orchestrator

pub mod diagnostics;
pub mod ingestion;
pub mod processing;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::metrics::FilterMetrics;
use crate::types::RawIncident;

use diagnostics::Diagnostic;
use ingestion::{fingerprint_file, load_incidents, LoaderConfig};
use processing::classify::{ClassifierConfig, DefaultTextClassifier, DerivedCase, TextClassifier};
use processing::filter::{filter_cases, reorder, CaseRow, ExclusionStats};
use processing::merge::{DefaultUnitMerger, MergeConfig, MergeStats, UnitMerger};
use processing::normalize::{DefaultFieldNormalizer, FieldNormalizer};
use processing::quality_gate::{DefaultQualityGate, QualityGate};

/// Identity of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunInfo {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub source: PathBuf,
    /// SHA-256 of the input file
    pub input_sha256: String,
}

impl RunInfo {
    pub fn new(source: PathBuf, input_sha256: String) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            source,
            input_sha256,
        }
    }
}

/// Everything a run produced; writers pick what they need from here
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub run: RunInfo,
    /// Rows of the cleaned table, input order
    pub cases: Vec<CaseRow>,
    /// The kept cases with their full derivation, parallel to `cases`
    pub derived: Vec<DerivedCase>,
    pub diagnostics: Vec<Diagnostic>,
    pub merge_stats: MergeStats,
    pub exclusion_stats: ExclusionStats,
}

impl PipelineOutput {
    pub fn review_flags(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_review_flag())
    }
}

/// The stage chain, built once from configuration
pub struct Pipeline {
    merger: Box<dyn UnitMerger>,
    normalizer: Box<dyn FieldNormalizer>,
    classifier: Box<dyn TextClassifier>,
    quality_gate: Box<dyn QualityGate>,
}

impl Pipeline {
    pub fn new(merge: MergeConfig, classifier: ClassifierConfig) -> Self {
        Self {
            merger: Box::new(DefaultUnitMerger::with_config(merge)),
            normalizer: Box::new(DefaultFieldNormalizer::new()),
            classifier: Box::new(DefaultTextClassifier::with_config(classifier)),
            quality_gate: Box::new(DefaultQualityGate::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.merge.clone(), config.classifier.clone())
    }

    /// Load, clean and classify the export at `input.path`.
    pub fn run(&self, input: &LoaderConfig) -> Result<PipelineOutput> {
        let input_sha256 = fingerprint_file(&input.path)?;
        let table = load_incidents(input)?;
        let run = RunInfo::new(table.source.clone(), input_sha256);
        info!(
            "Run {} over {} ({})",
            run.run_id,
            run.source.display(),
            &run.input_sha256[..12.min(run.input_sha256.len())]
        );

        let mut diagnostics: Vec<Diagnostic> = table
            .duplicate_ids
            .iter()
            .map(|id| Diagnostic::DuplicateId {
                case_id: id.clone(),
            })
            .collect();

        let mut output = self.process(table.records, run);
        diagnostics.append(&mut output.diagnostics);
        output.diagnostics = diagnostics;
        Ok(output)
    }

    /// Run every stage after loading. Pure apart from logging and metrics.
    pub fn process(&self, records: Vec<RawIncident>, run: RunInfo) -> PipelineOutput {
        let start_time = Instant::now();

        let merged = self.merger.merge(records);
        let mut diagnostics: Vec<Diagnostic> = merged
            .stats
            .lost_telephone_cpr_ids
            .iter()
            .map(|id| Diagnostic::LostInMerge {
                case_id: id.clone(),
            })
            .collect();

        let normalized = self.normalizer.normalize_all(merged.records);
        let derived = self.classifier.classify_all(normalized);
        let filtered = filter_cases(derived);

        diagnostics.extend(filtered.exclusions.into_iter().map(Diagnostic::Exclusion));

        let mut review_count = 0;
        for case in &filtered.kept {
            let assessment = self.quality_gate.assess(case);
            if assessment.needs_review() {
                review_count += 1;
                diagnostics.push(Diagnostic::ReviewFlag {
                    case_id: case.label(),
                    issues: assessment.issues,
                });
            }
        }
        FilterMetrics::record_review_flags(review_count);

        let cases = reorder(&filtered.kept);
        info!(
            "Pipeline finished in {:.2}s: {} cases kept, {} flagged for review",
            start_time.elapsed().as_secs_f64(),
            cases.len(),
            review_count
        );

        PipelineOutput {
            run,
            cases,
            derived: filtered.kept,
            diagnostics,
            merge_stats: merged.stats,
            exclusion_stats: filtered.stats,
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(MergeConfig::default(), ClassifierConfig::default())
    }
}
