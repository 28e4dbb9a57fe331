use std::path::PathBuf;

use crate::error::Result;
use crate::pipeline::PipelineOutput;

/// One artifact written from a finished run
pub trait RunOutputPort {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Write the artifact and return where it landed
    fn write_run(&self, output: &PipelineOutput) -> Result<PathBuf>;
}
