use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

use crate::app::ports::RunOutputPort;
use crate::error::Result;
use crate::infra::create_output_file;
use crate::pipeline::PipelineOutput;

/// Dumps the Prometheus exposition text at the end of a run
pub struct FileMetricsOutputAdapter {
    path: PathBuf,
}

impl FileMetricsOutputAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RunOutputPort for FileMetricsOutputAdapter {
    fn name(&self) -> &'static str {
        "metrics"
    }

    fn write_run(&self, output: &PipelineOutput) -> Result<PathBuf> {
        let mut file = create_output_file(&self.path)?;
        writeln!(file, "# run_id {}", output.run.run_id)?;
        match crate::metrics::render() {
            Some(text) => file.write_all(text.as_bytes())?,
            None => warn!("Metrics recorder not installed, {} has no samples", self.path.display()),
        }
        file.flush()?;
        Ok(self.path.clone())
    }
}
