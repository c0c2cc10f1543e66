//! Namespaces: the tree that groups targets and mirrors the source layout.
//!
//! A namespace is a policy. Its facet and customizations cascade to every
//! target declared beneath it, root first.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::environment::Environment;
use crate::error::Result;
use crate::facet::Facet;
use crate::policy::{AsPolicy, Policy};
use crate::target::{Target, TargetId};

/// Index of a namespace inside its project. The root is always `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(pub(crate) usize);

impl NamespaceId {
  pub const ROOT: NamespaceId = NamespaceId(0);

  pub fn index(&self) -> usize {
    self.0
  }
}

#[derive(Debug)]
pub struct Namespace {
  policy: Policy,
  id: NamespaceId,
  path: String,
  parent: Option<NamespaceId>,
  source_dir: PathBuf,
  children: Vec<NamespaceId>,
  targets: Vec<TargetId>,
  all_targets: Vec<TargetId>,
}

impl Namespace {
  pub(crate) fn root(source_dir: PathBuf, strict: bool) -> Self {
    Self::new(NamespaceId::ROOT, "", "/".to_string(), None, source_dir, strict)
  }

  pub(crate) fn new(
    id: NamespaceId,
    name: &str,
    path: String,
    parent: Option<NamespaceId>,
    source_dir: PathBuf,
    strict: bool,
  ) -> Self {
    let mut policy = Policy::new(name);
    policy.facet_mut().set_strict(strict);
    Self {
      policy,
      id,
      path,
      parent,
      source_dir,
      children: Vec::new(),
      targets: Vec::new(),
      all_targets: Vec::new(),
    }
  }

  pub fn id(&self) -> NamespaceId {
    self.id
  }

  /// Absolute path: `/` for the root, `/engine/render` below it.
  pub fn path(&self) -> &str {
    &self.path
  }

  pub fn parent(&self) -> Option<NamespaceId> {
    self.parent
  }

  pub fn is_root(&self) -> bool {
    self.parent.is_none()
  }

  pub fn source_dir(&self) -> &Path {
    &self.source_dir
  }

  /// Override where this namespace's sources live.
  pub fn set_source_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
    let dir = dir.into();
    self.source_dir = if dir.is_absolute() { dir } else { self.source_dir.join(dir) };
    self
  }

  pub fn children(&self) -> &[NamespaceId] {
    &self.children
  }

  /// Targets declared directly in this namespace.
  pub fn targets(&self) -> &[TargetId] {
    &self.targets
  }

  /// Targets declared in this namespace or any descendant, in declaration order.
  pub fn all_targets(&self) -> &[TargetId] {
    &self.all_targets
  }

  pub fn add_customization(
    &mut self,
    customization: impl Fn(&mut Facet, &Environment, &Target) -> Result<()> + 'static,
  ) -> &mut Self {
    self.policy.add_customization(customization);
    self
  }

  pub fn on_tag(&mut self, tag: impl Into<String>, contribution: Facet) -> &mut Self {
    self.policy.on_tag(tag, contribution);
    self
  }

  /// Run this namespace's own customizations. Ancestors are run by the caller.
  pub fn customize(&self, output: &mut Facet, env: &Environment, target: &Target) -> Result<()> {
    self.policy.customize(output, env, target)
  }

  /// Path of a direct child named `name`.
  pub(crate) fn child_path(&self, name: &str) -> String {
    if self.is_root() {
      format!("/{name}")
    } else {
      format!("{}/{name}", self.path)
    }
  }

  pub(crate) fn add_child(&mut self, child: NamespaceId) {
    self.children.push(child);
  }

  pub(crate) fn add_target(&mut self, target: TargetId) {
    self.targets.push(target);
  }

  pub(crate) fn add_descendant_target(&mut self, target: TargetId) {
    self.all_targets.push(target);
  }
}

impl AsPolicy for Namespace {
  fn policy(&self) -> &Policy {
    &self.policy
  }

  fn policy_mut(&mut self) -> &mut Policy {
    &mut self.policy
  }
}

impl fmt::Display for Namespace {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.path)
  }
}
