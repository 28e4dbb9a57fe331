use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::app::ports::RunOutputPort;
use crate::config::OutputConfig;
use crate::constants;
use crate::infra::{
    CsvCasesOutputAdapter, CsvExcludedCasesAdapter, FileDiagnosticsOutputAdapter,
    FileExclusionReportAdapter, FileManualReviewAdapter, FileMetricsOutputAdapter,
    PdfReportAdapter,
};
use crate::pipeline::ingestion::LoaderConfig;
use crate::pipeline::{Pipeline, PipelineOutput};

/// Runs the pipeline over one export and hands the result to every output
pub struct CleanUseCase {
    pipeline: Pipeline,
    outputs: Vec<Box<dyn RunOutputPort>>,
}

/// A finished run and the files it produced
pub struct CleanRunReport {
    pub output: PipelineOutput,
    pub written: Vec<PathBuf>,
}

impl CleanUseCase {
    pub fn new(pipeline: Pipeline, outputs: Vec<Box<dyn RunOutputPort>>) -> Self {
        Self { pipeline, outputs }
    }

    /// Outputs selected by the `[output]` section, cleaned table first
    pub fn outputs_for(config: &OutputConfig) -> Vec<Box<dyn RunOutputPort>> {
        let dir = &config.dir;
        let mut outputs: Vec<Box<dyn RunOutputPort>> = vec![
            Box::new(CsvCasesOutputAdapter::new(config.cases_path())),
            Box::new(CsvExcludedCasesAdapter::new(dir.join(constants::EXCLUDED_CASES_FILE))),
            Box::new(FileExclusionReportAdapter::new(dir.join(constants::EXCLUSIONS_REPORT_FILE))),
            Box::new(FileManualReviewAdapter::new(dir.join(constants::MANUAL_REVIEW_FILE))),
        ];
        if config.write_diagnostics {
            outputs.push(Box::new(FileDiagnosticsOutputAdapter::new(
                dir.join(constants::DIAGNOSTICS_FILE),
            )));
        }
        if config.write_pdf {
            outputs.push(Box::new(PdfReportAdapter::new(dir.join(constants::PDF_REPORT_FILE))));
        }
        if config.write_metrics {
            outputs.push(Box::new(FileMetricsOutputAdapter::new(dir.join(constants::METRICS_FILE))));
        }
        outputs
    }

    pub fn execute(&self, input: &LoaderConfig) -> Result<CleanRunReport> {
        let output = self
            .pipeline
            .run(input)
            .with_context(|| format!("Failed to clean {}", input.path.display()))?;

        let mut written = Vec::with_capacity(self.outputs.len());
        for port in &self.outputs {
            let path = port
                .write_run(&output)
                .with_context(|| format!("Failed to write {} output", port.name()))?;
            info!("Wrote {} to {}", port.name(), path.display());
            written.push(path);
        }

        Ok(CleanRunReport { output, written })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RecordingOutput {
        seen: Rc<RefCell<Vec<usize>>>,
    }

    impl RunOutputPort for RecordingOutput {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn write_run(&self, output: &PipelineOutput) -> crate::error::Result<PathBuf> {
            self.seen.borrow_mut().push(output.cases.len());
            Ok(PathBuf::from("memory"))
        }
    }

    fn export(dir: &std::path::Path) -> PathBuf {
        let header = constants::REQUIRED_RAW_COLUMNS.join(";");
        let mut row = vec![""; constants::REQUIRED_RAW_COLUMNS.len()];
        for (column, value) in [
            (constants::RAW_ID, "100"),
            (constants::RAW_CALL_DATE, "2023-05-01 10:00:00"),
            (constants::RAW_TELEPHONE_CPR, "1"),
            (constants::RAW_UNIT_TYPE, "SVA"),
            (constants::RAW_TECNICAS, "RCP 20 min, exitus"),
        ] {
            let index = constants::REQUIRED_RAW_COLUMNS
                .iter()
                .position(|c| *c == column)
                .unwrap();
            row[index] = value;
        }
        let path = dir.join("export.csv");
        std::fs::write(&path, format!("{}\n{}\n", header, row.join(";"))).unwrap();
        path
    }

    #[test]
    fn test_every_output_sees_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let input = LoaderConfig {
            path: export(dir.path()),
            ..Default::default()
        };
        let seen = Rc::new(RefCell::new(Vec::new()));
        let outputs: Vec<Box<dyn RunOutputPort>> = vec![
            Box::new(RecordingOutput { seen: seen.clone() }),
            Box::new(RecordingOutput { seen: seen.clone() }),
        ];

        let report = CleanUseCase::new(Pipeline::default(), outputs)
            .execute(&input)
            .unwrap();

        assert_eq!(report.output.cases.len(), 1);
        assert_eq!(report.written.len(), 2);
        assert_eq!(*seen.borrow(), vec![1, 1]);
    }

    #[test]
    fn test_output_selection_follows_config() {
        let mut config = OutputConfig::default();
        let names = |c: &OutputConfig| -> Vec<&'static str> {
            CleanUseCase::outputs_for(c).iter().map(|o| o.name()).collect()
        };
        assert_eq!(
            names(&config),
            vec!["cases", "excluded cases", "exclusion report", "manual review", "diagnostics", "metrics"]
        );

        config.write_diagnostics = false;
        config.write_metrics = false;
        config.write_pdf = true;
        assert_eq!(names(&config).last(), Some(&"pdf report"));
        assert_eq!(names(&config).len(), 5);
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let input = LoaderConfig {
            path: PathBuf::from("/nonexistent/export.csv"),
            ..Default::default()
        };
        let result = CleanUseCase::new(Pipeline::default(), Vec::new()).execute(&input);
        assert!(result.is_err());
    }
}
