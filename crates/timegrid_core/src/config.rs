//! Runtime configuration.
//!
//! # Responsibility
//! - Load optional TOML settings for logging, timetable reading, the pattern
//!   annotator vocabulary and pipeline switches.
//!
//! # Invariants
//! - Every section and key is optional; missing values use defaults.
//! - Unknown keys are rejected so typos surface early.

use crate::annotate::patterns::PatternAnnotator;
use crate::io::timetable::TimetableCsvOptions;
use crate::pipeline::PipelineOptions;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub logging: LoggingConfig,
    pub timetable: TimetableConfig,
    pub annotator: AnnotatorConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rotating log files; stderr when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimetableConfig {
    pub transpose: bool,
    pub normalize_numbers: bool,
}

impl Default for TimetableConfig {
    fn default() -> Self {
        let options = TimetableCsvOptions::default();
        Self {
            transpose: options.transpose,
            normalize_numbers: options.normalize_numbers,
        }
    }
}

impl TimetableConfig {
    pub fn csv_options(&self) -> TimetableCsvOptions {
        TimetableCsvOptions {
            transpose: self.transpose,
            normalize_numbers: self.normalize_numbers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotatorConfig {
    pub known_persons: Vec<String>,
    pub known_locations: Vec<String>,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            known_persons: vec!["will".to_string(), "sharna".to_string()],
            known_locations: vec!["bar salsa".to_string()],
        }
    }
}

impl AnnotatorConfig {
    pub fn build(&self) -> Result<PatternAnnotator, regex::Error> {
        PatternAnnotator::with_known_entities(&self.known_persons, &self.known_locations)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub fine_grain: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { fine_grain: true }
    }
}

impl PipelineConfig {
    pub fn options(&self) -> PipelineOptions {
        PipelineOptions {
            fine_grain: self.fine_grain,
        }
    }
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }
}
