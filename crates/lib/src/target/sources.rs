//! Source-file sets and unity partitioning.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::trace;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Files a target compiles, relative to its source directory.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
  explicit: Vec<PathBuf>,
  isolated: Vec<PathBuf>,
  excluded: Vec<PathBuf>,
  exclude_patterns: Vec<glob::Pattern>,
  extra: Vec<PathBuf>,
  glob_root: Option<PathBuf>,
  patterns: Vec<glob::Pattern>,
}

impl SourceSet {
  pub fn explicit(&self) -> &[PathBuf] {
    &self.explicit
  }

  pub fn isolated(&self) -> &[PathBuf] {
    &self.isolated
  }

  pub fn excluded(&self) -> &[PathBuf] {
    &self.excluded
  }

  pub fn extra(&self) -> &[PathBuf] {
    &self.extra
  }

  pub fn glob_root(&self) -> Option<&Path> {
    self.glob_root.as_deref()
  }

  pub fn patterns(&self) -> impl Iterator<Item = &str> {
    self.patterns.iter().map(glob::Pattern::as_str)
  }

  pub(crate) fn add_explicit<I, P>(&mut self, files: I)
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    self.explicit.extend(files.into_iter().map(Into::into));
  }

  pub(crate) fn add_isolated<I, P>(&mut self, files: I)
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    self.isolated.extend(files.into_iter().map(Into::into));
  }

  pub(crate) fn add_excluded<I, P>(&mut self, files: I)
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    self.excluded.extend(files.into_iter().map(Into::into));
  }

  pub(crate) fn add_extra<I, P>(&mut self, files: I)
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    self.extra.extend(files.into_iter().map(Into::into));
  }

  pub(crate) fn set_glob_root(&mut self, dir: impl Into<PathBuf>) {
    self.glob_root = Some(dir.into());
  }

  pub(crate) fn add_pattern(&mut self, pattern: &str) -> Result<()> {
    self.patterns.push(compile(pattern)?);
    Ok(())
  }

  pub(crate) fn add_exclude_pattern(&mut self, pattern: &str) -> Result<()> {
    self.exclude_patterns.push(compile(pattern)?);
    Ok(())
  }

  /// Every compiled file (explicit, isolated and globbed, minus exclusions),
  /// absolute, sorted and deduplicated.
  pub fn source_files(&self, source_dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = self
      .explicit
      .iter()
      .chain(&self.isolated)
      .map(|f| source_dir.join(f))
      .collect();

    if !self.patterns.is_empty() {
      let root = match &self.glob_root {
        Some(dir) => source_dir.join(dir),
        None => source_dir.to_path_buf(),
      };
      for path in walk(&root, extensions)? {
        let Ok(relative) = path.strip_prefix(&root) else {
          continue;
        };
        if self.patterns.iter().any(|p| p.matches_path(relative)) {
          files.push(path);
        }
      }
    }

    files.retain(|f| !self.is_excluded(f, source_dir));
    files.sort();
    files.dedup();
    Ok(files)
  }

  /// Compiled files eligible for unity merging, with their byte sizes.
  ///
  /// Files that do not exist on disk count as empty.
  pub fn unity_candidates(&self, source_dir: &Path, extensions: &[String]) -> Result<Vec<(PathBuf, u64)>> {
    let isolated: Vec<PathBuf> = self.isolated.iter().map(|f| source_dir.join(f)).collect();
    Ok(
      self
        .source_files(source_dir, extensions)?
        .into_iter()
        .filter(|f| !isolated.contains(f))
        .map(|f| {
          let size = fs::metadata(&f).map(|m| m.len()).unwrap_or(0);
          (f, size)
        })
        .collect(),
    )
  }

  fn is_excluded(&self, file: &Path, source_dir: &Path) -> bool {
    if self.excluded.iter().any(|e| source_dir.join(e) == file) {
      return true;
    }
    let relative = file.strip_prefix(source_dir).unwrap_or(file);
    self.exclude_patterns.iter().any(|p| p.matches_path(relative))
  }
}

/// Total bytes of every file under `dir` with one of `extensions`.
///
/// A missing directory holds zero bytes.
pub fn tree_bytes(dir: &Path, extensions: &[String]) -> Result<u64> {
  let mut total = 0;
  for path in walk(dir, extensions)? {
    total += fs::metadata(&path).map_err(|e| Error::io(&path, e))?.len();
  }
  trace!(dir = ?dir, bytes = total, "measured source tree");
  Ok(total)
}

/// Split files into `count` buckets, largest first into the lightest bucket.
///
/// Each bucket is sorted by path; empty buckets are dropped.
pub fn partition(files: &[(PathBuf, u64)], count: u64) -> Vec<Vec<PathBuf>> {
  if count == 0 || files.is_empty() {
    return Vec::new();
  }
  let count = usize::try_from(count).unwrap_or(usize::MAX).min(files.len());

  let mut ordered: Vec<&(PathBuf, u64)> = files.iter().collect();
  ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

  let mut buckets: Vec<(u64, Vec<PathBuf>)> = vec![(0, Vec::new()); count];
  for (path, size) in ordered {
    let lightest = buckets
      .iter_mut()
      .min_by_key(|bucket| (bucket.0, bucket.1.len()))
      .map(|bucket| {
        bucket.0 += size;
        &mut bucket.1
      });
    if let Some(bucket) = lightest {
      bucket.push(path.clone());
    }
  }

  buckets
    .into_iter()
    .map(|(_, mut files)| {
      files.sort();
      files
    })
    .filter(|files| !files.is_empty())
    .collect()
}

fn walk(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
  if !dir.is_dir() {
    return Ok(Vec::new());
  }
  let mut files = Vec::new();
  for entry in WalkDir::new(dir).sort_by_file_name() {
    let entry = entry.map_err(|e| {
      let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
      Error::io(path, e.into())
    })?;
    if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
      files.push(entry.into_path());
    }
  }
  Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
  path
    .extension()
    .and_then(|e| e.to_str())
    .is_some_and(|ext| extensions.iter().any(|s| s.eq_ignore_ascii_case(ext)))
}

fn compile(pattern: &str) -> Result<glob::Pattern> {
  glob::Pattern::new(pattern).map_err(|e| Error::InvalidSelector {
    kind: "glob",
    pattern: pattern.to_string(),
    message: e.to_string(),
  })
}
