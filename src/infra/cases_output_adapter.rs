use std::path::{Path, PathBuf};

use crate::app::ports::RunOutputPort;
use crate::constants::OUTPUT_COLUMNS;
use crate::error::{PipelineError, Result};
use crate::infra::create_output_file;
use crate::pipeline::processing::filter::CaseRow;
use crate::pipeline::PipelineOutput;

/// Writes the cleaned table as a comma-separated file
pub struct CsvCasesOutputAdapter {
    path: PathBuf,
}

impl CsvCasesOutputAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RunOutputPort for CsvCasesOutputAdapter {
    fn name(&self) -> &'static str {
        "cases"
    }

    fn write_run(&self, output: &PipelineOutput) -> Result<PathBuf> {
        write_case_rows(&self.path, &output.cases)?;
        Ok(self.path.clone())
    }
}

/// Header first, even for an empty cohort, then one line per case.
pub fn write_case_rows(path: &Path, rows: &[CaseRow]) -> Result<()> {
    let file = create_output_file(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    writer.write_record(OUTPUT_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a cleaned table back, checking that every output column is present.
pub fn read_case_rows(path: &Path) -> Result<Vec<CaseRow>> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    if let Some(missing) = OUTPUT_COLUMNS
        .iter()
        .find(|column| !headers.iter().any(|h| h == **column))
    {
        return Err(PipelineError::MissingColumn {
            column: missing.to_string(),
            path: path.display().to_string(),
        });
    }

    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
