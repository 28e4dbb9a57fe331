use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{PipelineError, Result};
use crate::pipeline::ingestion::loader::LoaderConfig;
use crate::pipeline::processing::classify::ClassifierConfig;
use crate::pipeline::processing::merge::{MatchStrategy, MergeConfig};

/// Top-level run configuration, usually read from `tcpr.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: LoaderConfig,
    pub output: OutputConfig,
    pub merge: MergeConfig,
    pub classifier: ClassifierConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub cases_file: String,
    pub write_diagnostics: bool,
    pub write_pdf: bool,
    pub write_metrics: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(constants::DEFAULT_OUTPUT_DIR),
            cases_file: constants::CASES_FILE.to_string(),
            write_diagnostics: true,
            write_pdf: false,
            write_metrics: true,
        }
    }
}

impl OutputConfig {
    pub fn cases_path(&self) -> PathBuf {
        self.dir.join(&self.cases_file)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(constants::DEFAULT_LOG_DIR),
        }
    }
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `config_path` when it exists, otherwise fall back to defaults.
    ///
    /// Runs before logging is initialized, so callers report which source
    /// was used once their subscriber is installed.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.classifier.default_cpc_when_ambiguous) {
            return Err(PipelineError::Config(format!(
                "classifier.default_cpc_when_ambiguous must be between 1 and 5, got {}",
                self.classifier.default_cpc_when_ambiguous
            )));
        }
        if self.classifier.max_cpr_minutes <= 0 {
            return Err(PipelineError::Config(
                "classifier.max_cpr_minutes must be positive".to_string(),
            ));
        }
        if self.classifier.max_death_offset_minutes <= 0 {
            return Err(PipelineError::Config(
                "classifier.max_death_offset_minutes must be positive".to_string(),
            ));
        }
        if self.merge.strategy == MatchStrategy::Window && self.merge.window_minutes <= 0 {
            return Err(PipelineError::Config(
                "merge.window_minutes must be positive for the window strategy".to_string(),
            ));
        }
        if self.output.cases_file.trim().is_empty() {
            return Err(PipelineError::Config(
                "output.cases_file must not be empty".to_string(),
            ));
        }
        if !self.input.delimiter.is_ascii() {
            return Err(PipelineError::Config(format!(
                "input.delimiter must be a single ASCII character, got '{}'",
                self.input.delimiter
            )));
        }
        Ok(())
    }
}
