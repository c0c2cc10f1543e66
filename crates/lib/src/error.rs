//! Error types for resolution.
//!
//! Every error is fatal to the resolution run that triggered it. Configuration
//! errors describe a bad declaration; invariant violations (`ValueSetError`)
//! describe a declaration script that mutates something it no longer owns.

use std::path::PathBuf;

use thiserror::Error;

use crate::facet::Category;
use crate::value_set::ValueSetError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
  /// A frozen set was mutated or a literal was declared twice in strict mode.
  #[error(transparent)]
  Values(#[from] ValueSetError),

  /// A frozen facet was mutated outside of its categories (variables, identity).
  #[error("facet is frozen: cannot modify {what}")]
  FrozenFacet { what: String },

  #[error("unknown category: {0}")]
  UnknownCategory(String),

  #[error("invalid {kind} selector '{pattern}': {message}")]
  InvalidSelector {
    kind: &'static str,
    pattern: String,
    message: String,
  },

  #[error("target '{target}' already depends on '{dependency}'")]
  DuplicateDependency { target: String, dependency: String },

  #[error("'{path}' referenced by '{target}' is not a target")]
  NotATarget { target: String, path: String },

  #[error("unknown target: {0}")]
  UnknownTarget(String),

  #[error("unknown namespace: {0}")]
  UnknownNamespace(String),

  #[error("target already declared: {0}")]
  DuplicateTarget(String),

  #[error("namespace already declared: {0}")]
  DuplicateNamespace(String),

  #[error("invalid name '{0}': names must be non-empty and must not contain '/'")]
  InvalidName(String),

  #[error("unknown platform: {0}")]
  UnknownPlatform(String),

  #[error("unknown configuration: {0}")]
  UnknownConfiguration(String),

  #[error("unknown compiler: {0}")]
  UnknownCompiler(String),

  #[error("{kind} already registered: {name}")]
  DuplicatePolicy { kind: &'static str, name: String },

  #[error("compiler '{compiler}' does not support platform '{platform}'")]
  UnsupportedPlatform { compiler: String, platform: String },

  #[error("unknown unit '{unit}' in target '{target}'")]
  UnknownUnit { target: String, unit: String },

  #[error("dependency cycle detected: {chain}")]
  CycleDetected { chain: String },

  #[error("executable '{target}' must link statically")]
  ExecutableRequiresStatic { target: String },

  #[error("unsupported artifact for {kind} target '{target}': {reason}")]
  UnsupportedArtifact {
    target: String,
    kind: String,
    reason: String,
  },

  #[error("generated file '{name}' for '{target}' failed: {message}")]
  Generation {
    target: String,
    name: String,
    message: String,
  },

  #[error("customization failed for '{target}': {message}")]
  Customization { target: String, message: String },

  #[error("invalid setting {key}: {message}")]
  InvalidSetting { key: String, message: String },

  #[error("failed to parse settings: {0}")]
  Settings(#[from] serde_json::Error),

  #[error("io error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl Error {
  /// Attach a path to an I/O error.
  pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }

  /// Error raised by a user customization callback.
  pub fn customization(target: impl Into<String>, message: impl ToString) -> Self {
    Self::Customization {
      target: target.into(),
      message: message.to_string(),
    }
  }

  pub(crate) fn frozen_category(category: Category) -> Self {
    Self::FrozenFacet {
      what: format!("category '{category}'"),
    }
  }
}
