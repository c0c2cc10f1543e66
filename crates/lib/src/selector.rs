//! Name selectors for platforms, configurations and compilers.

use std::fmt;

use regex::Regex;

use crate::error::{Error, Result};

/// How a policy name is matched.
#[derive(Debug, Clone)]
pub enum Selector {
  /// Anchored regular expression over the whole name.
  ByName(Regex),
  /// Shell-style glob (`win*`, `gcc-1?`).
  ByGlob(glob::Pattern),
  /// Exact name equality.
  ByIdentity(String),
}

impl Selector {
  pub fn regex(pattern: &str) -> Result<Self> {
    Regex::new(&format!("^(?:{pattern})$"))
      .map(Self::ByName)
      .map_err(|e| Error::InvalidSelector {
        kind: "regex",
        pattern: pattern.to_string(),
        message: e.to_string(),
      })
  }

  pub fn glob(pattern: &str) -> Result<Self> {
    glob::Pattern::new(pattern)
      .map(Self::ByGlob)
      .map_err(|e| Error::InvalidSelector {
        kind: "glob",
        pattern: pattern.to_string(),
        message: e.to_string(),
      })
  }

  pub fn identity(name: impl Into<String>) -> Self {
    Self::ByIdentity(name.into())
  }

  /// Glob when the pattern carries glob metacharacters, identity otherwise.
  pub fn parse(pattern: &str) -> Result<Self> {
    if pattern.contains(['*', '?', '[']) {
      Self::glob(pattern)
    } else {
      Ok(Self::identity(pattern))
    }
  }

  pub fn matches(&self, name: &str) -> bool {
    match self {
      Self::ByName(re) => re.is_match(name),
      Self::ByGlob(pattern) => pattern.matches(name),
      Self::ByIdentity(id) => id == name,
    }
  }
}

impl fmt::Display for Selector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::ByName(re) => write!(f, "regex:{}", re.as_str()),
      Self::ByGlob(pattern) => write!(f, "glob:{}", pattern.as_str()),
      Self::ByIdentity(id) => write!(f, "{id}"),
    }
  }
}

impl From<&str> for Selector {
  fn from(name: &str) -> Self {
    Self::identity(name)
  }
}
