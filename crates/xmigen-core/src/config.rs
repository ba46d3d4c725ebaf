//! Configuration schema (xmigen.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use crate::diagnostic::{DiagnosticCode, Severity};

/// Severity overrides keyed by diagnostic code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeverityThreshold {
    /// Map of diagnostic code to severity override
    pub overrides: HashMap<String, Severity>,
}

impl SeverityThreshold {
    /// Get severity for a diagnostic code, or default
    pub fn get_severity(&self, code: DiagnosticCode, default: Severity) -> Severity {
        self.overrides
            .get(code.as_str())
            .copied()
            .unwrap_or(default)
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: DiagnosticCode, severity: Severity) {
        self.overrides.insert(code.as_str().to_string(), severity);
    }
}

/// Settings for the `check` command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Treat warnings as failures
    #[serde(default)]
    pub fail_on_warnings: bool,

    /// Severity overrides
    #[serde(default)]
    pub severity: SeverityThreshold,
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model document to read
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Directory the artifacts are written to (created when missing)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name of the instance document
    #[serde(default = "default_instance_file")]
    pub instance_file: String,

    /// File name of the metadata document
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,

    /// Indentation width of the metadata JSON
    #[serde(default = "default_json_indent")]
    pub json_indent: usize,

    /// Pretty-print the instance document with this indentation width
    #[serde(default)]
    pub instance_indent: Option<usize>,

    /// Model check settings
    #[serde(default)]
    pub check: CheckConfig,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub project_root: PathBuf,
}

fn default_input() -> PathBuf {
    PathBuf::from("input/test_input.xml")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_instance_file() -> String {
    "config.xml".to_string()
}

fn default_metadata_file() -> String {
    "meta.json".to_string()
}

fn default_json_indent() -> usize {
    4
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: default_input(),
            output_dir: default_output_dir(),
            instance_file: default_instance_file(),
            metadata_file: default_metadata_file(),
            json_indent: default_json_indent(),
            instance_indent: None,
            check: CheckConfig::default(),
            project_root: PathBuf::new(),
        }
    }
}

impl Config {
    /// Default config file name looked up in the working directory
    pub const FILE_NAME: &'static str = "xmigen.toml";

    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Paths in the file are relative to the file itself
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Resolve a path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// Full path of the model document
    pub fn input_path(&self) -> PathBuf {
        self.resolve(&self.input)
    }

    /// Full path of the output directory
    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.output_dir)
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
