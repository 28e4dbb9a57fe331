use std::path::{Path, PathBuf};

use crate::app::ports::RunOutputPort;
use crate::error::Result;
use crate::infra::create_output_file;
use crate::pipeline::diagnostics::Diagnostic;
use crate::pipeline::processing::filter::{Exclusion, ExclusionReason};
use crate::pipeline::PipelineOutput;

const HEADER: [&str; 5] = ["n_informe", "reason", "rcp_transtelefonica", "keyword", "field"];

/// Writes one row per excluded case
pub struct CsvExcludedCasesAdapter {
    path: PathBuf,
}

impl CsvExcludedCasesAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn record(exclusion: &Exclusion) -> [String; 5] {
    let (keyword, field) = match &exclusion.reason {
        ExclusionReason::Traumatic { keyword, field, .. } => (keyword.clone(), field.to_string()),
        ExclusionReason::MissingTelephoneCpr => (String::new(), String::new()),
    };
    [
        exclusion.case_id.clone(),
        exclusion.reason.code().to_string(),
        u8::from(exclusion.telephone_cpr).to_string(),
        keyword,
        field,
    ]
}

pub fn write_exclusions<'a>(
    path: &Path,
    exclusions: impl IntoIterator<Item = &'a Exclusion>,
) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(create_output_file(path)?);
    writer.write_record(HEADER)?;
    let mut written = 0;
    for exclusion in exclusions {
        writer.write_record(record(exclusion))?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

impl RunOutputPort for CsvExcludedCasesAdapter {
    fn name(&self) -> &'static str {
        "excluded cases"
    }

    fn write_run(&self, output: &PipelineOutput) -> Result<PathBuf> {
        let exclusions = output.diagnostics.iter().filter_map(|d| match d {
            Diagnostic::Exclusion(e) => Some(e),
            _ => None,
        });
        write_exclusions(&self.path, exclusions)?;
        Ok(self.path.clone())
    }
}
