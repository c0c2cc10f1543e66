//! Generated-file descriptors and the checksum store that writes their output.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::facet::Facet;
use crate::util::hash::{ContentHash, hash_bytes, hash_file};
use crate::vars;

use super::Target;

/// Produces the content of one file under a target's generated directory.
pub trait GeneratedFile {
  /// File name, relative to the generated directory.
  fn name(&self) -> &str;

  /// Content for the facet built so far.
  fn generate(&self, facet: &Facet, env: &Environment, target: &Target) -> Result<Vec<u8>>;
}

/// Text whose `$NAME$` references are filled from the facet's variables.
///
/// Every reference must resolve.
#[derive(Debug, Clone)]
pub struct Template {
  name: String,
  content: String,
}

impl Template {
  pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      content: content.into(),
    }
  }
}

impl GeneratedFile for Template {
  fn name(&self) -> &str {
    &self.name
  }

  fn generate(&self, facet: &Facet, _env: &Environment, target: &Target) -> Result<Vec<u8>> {
    let missing = vars::unresolved(&self.content, facet.variables());
    if !missing.is_empty() {
      return Err(Error::Generation {
        target: target.path().to_string(),
        name: self.name.clone(),
        message: format!("undefined variables: {}", missing.join(", ")),
      });
    }
    Ok(facet.variables().substitute(&self.content).into_bytes())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
  Written,
  /// Recorded checksum still matches the file on disk.
  Unchanged,
}

/// Writes generated content, skipping files whose recorded checksum still
/// matches what is on disk.
#[derive(Debug, Default)]
pub struct GeneratedFileStore {
  checksums: RefCell<HashMap<PathBuf, ContentHash>>,
}

impl GeneratedFileStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn write(&self, path: &Path, content: &[u8]) -> Result<WriteOutcome> {
    let hash = hash_bytes(content);

    let recorded = self.checksums.borrow().get(path) == Some(&hash);
    if recorded && path.is_file() && hash_file(path)? == hash {
      debug!(path = ?path, "generated file unchanged");
      return Ok(WriteOutcome::Unchanged);
    }

    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| Error::io(path, e))?;
    info!(path = ?path, hash = %hash, "wrote generated file");

    self.checksums.borrow_mut().insert(path.to_path_buf(), hash);
    Ok(WriteOutcome::Written)
  }

  pub fn checksum(&self, path: &Path) -> Option<ContentHash> {
    self.checksums.borrow().get(path).cloned()
  }

  pub fn len(&self) -> usize {
    self.checksums.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.checksums.borrow().is_empty()
  }
}
