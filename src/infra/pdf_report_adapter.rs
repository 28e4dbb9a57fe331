use std::fs;
use std::path::PathBuf;

use crate::app::ports::RunOutputPort;
use crate::error::Result;
use crate::pipeline::PipelineOutput;
use crate::report::pdf::{render_pdf, ReportContext};
use crate::report::CohortSummary;

/// Renders the cohort PDF for a finished run
pub struct PdfReportAdapter {
    path: PathBuf,
}

impl PdfReportAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RunOutputPort for PdfReportAdapter {
    fn name(&self) -> &'static str {
        "pdf report"
    }

    fn write_run(&self, output: &PipelineOutput) -> Result<PathBuf> {
        let summary = CohortSummary::compute(&output.cases);
        let context = ReportContext {
            source: &output.run.source,
            run: Some(&output.run),
            merge: Some(&output.merge_stats),
            exclusions: Some(&output.exclusion_stats),
        };
        let bytes = render_pdf(&summary, &context)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, bytes)?;
        Ok(self.path.clone())
    }
}
