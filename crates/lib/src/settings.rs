//! Resolution settings.
//!
//! Settings come from `Settings::default()`, a JSON file (`Settings::load`), and
//! finally environment variable overrides (`STRATA_STRICT`,
//! `STRATA_UNITY_SIZE`, `STRATA_OUTPUT_DIR`).
//!
//! # Example Settings File
//!
//! ```json
//! {
//!   "strict": true,
//!   "unity_size": 524288,
//!   "output_dir": "out"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{
  DEFAULT_OUTPUT_DIR, DEFAULT_SOURCE_EXTENSIONS, DEFAULT_UNITY_SIZE, ENV_OUTPUT_DIR, ENV_STRICT, ENV_UNITY_SIZE,
};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Reject re-declared literal tokens in target and namespace facets.
  pub strict: bool,

  /// Byte ceiling for one unity file.
  pub unity_size: u64,

  /// Artifact root, relative to the project root unless absolute.
  pub output_dir: PathBuf,

  /// Extensions counted for unity sizing and matched by source globs.
  pub source_extensions: Vec<String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      strict: false,
      unity_size: DEFAULT_UNITY_SIZE,
      output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
      source_extensions: DEFAULT_SOURCE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
    }
  }
}

impl Settings {
  /// Load settings from a JSON file. Missing keys keep their defaults.
  pub fn load(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let settings: Settings = serde_json::from_str(&content)?;
    debug!(path = ?path, "loaded settings");
    settings.validate()
  }

  /// Defaults with environment overrides applied.
  pub fn from_env() -> Result<Self> {
    Self::default().with_env_overrides()
  }

  pub fn with_env_overrides(mut self) -> Result<Self> {
    if let Ok(value) = std::env::var(ENV_STRICT) {
      self.strict = parse_bool(ENV_STRICT, &value)?;
    }
    if let Ok(value) = std::env::var(ENV_UNITY_SIZE) {
      self.unity_size = value.trim().parse().map_err(|_| Error::InvalidSetting {
        key: ENV_UNITY_SIZE.to_string(),
        message: format!("expected a byte count, got '{value}'"),
      })?;
    }
    if let Ok(value) = std::env::var(ENV_OUTPUT_DIR) {
      self.output_dir = PathBuf::from(value);
    }
    self.validate()
  }

  pub fn with_strict(mut self, strict: bool) -> Self {
    self.strict = strict;
    self
  }

  pub fn with_unity_size(mut self, unity_size: u64) -> Self {
    self.unity_size = unity_size;
    self
  }

  pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
    self.output_dir = output_dir.into();
    self
  }

  /// Whether `path` has one of the configured source extensions.
  pub fn is_source(&self, path: &Path) -> bool {
    path
      .extension()
      .and_then(|e| e.to_str())
      .is_some_and(|ext| self.source_extensions.iter().any(|s| s.eq_ignore_ascii_case(ext)))
  }

  fn validate(self) -> Result<Self> {
    if self.unity_size == 0 {
      return Err(Error::InvalidSetting {
        key: "unity_size".to_string(),
        message: "must be greater than zero".to_string(),
      });
    }
    Ok(self)
  }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
  match value.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Ok(true),
    "0" | "false" | "no" | "off" | "" => Ok(false),
    _ => Err(Error::InvalidSetting {
      key: key.to_string(),
      message: format!("expected a boolean, got '{value}'"),
    }),
  }
}
