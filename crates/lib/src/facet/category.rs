use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The closed set of token categories a facet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  /// Preprocessor defines (`NAME` or `NAME=VALUE`).
  Define,
  /// Forced includes.
  Include,
  IncludePath,
  Library,
  LibraryPath,
  /// Include paths for third-party code, typically warning-suppressed.
  ExternPath,
  SystemPath,
  AnalysisOption,
  PreprocessorOption,
  CompilerOption,
  PchOption,
  LibrarianOption,
  LinkerOption,
  /// Free-form markers consulted by tag-conditional customizations.
  Tag,
}

impl Category {
  pub const COUNT: usize = 14;

  pub const ALL: [Category; Self::COUNT] = [
    Self::Define,
    Self::Include,
    Self::IncludePath,
    Self::Library,
    Self::LibraryPath,
    Self::ExternPath,
    Self::SystemPath,
    Self::AnalysisOption,
    Self::PreprocessorOption,
    Self::CompilerOption,
    Self::PchOption,
    Self::LibrarianOption,
    Self::LinkerOption,
    Self::Tag,
  ];

  /// Stages that each re-derive their own option line from the facet.
  pub const COMPILE_STAGES: [Category; 4] = [
    Self::AnalysisOption,
    Self::PreprocessorOption,
    Self::CompilerOption,
    Self::PchOption,
  ];

  pub fn index(self) -> usize {
    self as usize
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Define => "define",
      Self::Include => "include",
      Self::IncludePath => "include_path",
      Self::Library => "library",
      Self::LibraryPath => "library_path",
      Self::ExternPath => "extern_path",
      Self::SystemPath => "system_path",
      Self::AnalysisOption => "analysis_option",
      Self::PreprocessorOption => "preprocessor_option",
      Self::CompilerOption => "compiler_option",
      Self::PchOption => "pch_option",
      Self::LibrarianOption => "librarian_option",
      Self::LinkerOption => "linker_option",
      Self::Tag => "tag",
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Category {
  type Err = Error;

  /// Accepts both `include_path` and `includePath` spellings.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized: String = s.chars().filter(|c| *c != '_').flat_map(char::to_lowercase).collect();
    Self::ALL
      .into_iter()
      .find(|c| c.as_str().replace('_', "") == normalized)
      .ok_or_else(|| Error::UnknownCategory(s.to_string()))
  }
}
