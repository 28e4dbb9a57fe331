use std::io::Write;
use std::path::PathBuf;

use crate::app::ports::RunOutputPort;
use crate::error::Result;
use crate::infra::create_output_file;
use crate::pipeline::PipelineOutput;

/// Writes diagnostics as NDJSON, one object per line
pub struct FileDiagnosticsOutputAdapter {
    path: PathBuf,
}

impl FileDiagnosticsOutputAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RunOutputPort for FileDiagnosticsOutputAdapter {
    fn name(&self) -> &'static str {
        "diagnostics"
    }

    fn write_run(&self, output: &PipelineOutput) -> Result<PathBuf> {
        let mut writer = create_output_file(&self.path)?;
        for diagnostic in &output.diagnostics {
            let json_line = serde_json::to_string(diagnostic)?;
            writeln!(writer, "{}", json_line)?;
        }
        writer.flush()?;
        Ok(self.path.clone())
    }
}
