// File adapters for the run output ports

pub mod audit_report_adapter;
pub mod cases_output_adapter;
pub mod diagnostics_output_adapter;
pub mod excluded_cases_adapter;
pub mod metrics_output_adapter;
pub mod pdf_report_adapter;

pub use audit_report_adapter::{FileExclusionReportAdapter, FileManualReviewAdapter};
pub use cases_output_adapter::{read_case_rows, write_case_rows, CsvCasesOutputAdapter};
pub use diagnostics_output_adapter::FileDiagnosticsOutputAdapter;
pub use excluded_cases_adapter::CsvExcludedCasesAdapter;
pub use metrics_output_adapter::FileMetricsOutputAdapter;
pub use pdf_report_adapter::PdfReportAdapter;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

use crate::error::Result;

/// Truncate or create `path`, creating its directory first.
pub(crate) fn create_output_file(path: &Path) -> Result<BufWriter<File>> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    info!("Writing {}", path.display());
    Ok(BufWriter::new(File::create(path)?))
}
