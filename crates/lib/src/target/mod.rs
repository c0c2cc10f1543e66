//! Targets: buildable entities and their declaration builder.
//!
//! A [`Target`] is created by one of the project's kind factories
//! (`headers`, `external`, `library`, `executable`). Its configuration closure
//! receives a [`TargetBuilder`] that populates sources, PCH, generated files,
//! units and dependencies. Once the closure returns, structural fields are
//! fixed. The dependency graph and ordinal are computed on first query and
//! memoized from then on.
//!
//! # Lifecycle
//!
//! ```text
//! Declared -> Configuring -> Configured -> Resolved
//! ```

mod generated;
mod sources;
mod unit;

pub use generated::{GeneratedFile, GeneratedFileStore, Template, WriteOutcome};
pub use sources::SourceSet;
pub(crate) use sources::tree_bytes;
pub use unit::Unit;

use std::cell::{Cell, OnceCell};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::consts::{NO_UNITY_TAG, PRIVATE_DIR, PUBLIC_DIR};
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::facet::Facet;
use crate::namespace::NamespaceId;
use crate::policy::{AsPolicy, Policy};
use crate::project::Project;

/// Index of a target inside its [`Project`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub(crate) usize);

impl TargetId {
  pub fn index(&self) -> usize {
    self.0
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
  /// Header-only module. Produces no artifact.
  Headers,
  /// Prebuilt third-party library.
  External,
  Library,
  Executable,
}

impl TargetKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Headers => "headers",
      Self::External => "external",
      Self::Library => "library",
      Self::Executable => "executable",
    }
  }
}

impl fmt::Display for TargetKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkMode {
  Static,
  Dynamic,
}

/// How a dependency's surface is relayed to consumers of the depending target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
  /// Relayed to consumers.
  Public,
  /// Encapsulated: neither the dependency nor its own graph leaks further.
  Private,
  /// Relayed like public, loaded late.
  Runtime,
}

impl Visibility {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Public => "public",
      Self::Private => "private",
      Self::Runtime => "runtime",
    }
  }

  /// Whether a dependency with this visibility leaks its own graph.
  pub fn is_transitive(&self) -> bool {
    !matches!(self, Self::Private)
  }
}

impl fmt::Display for Visibility {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
  Declared,
  Configuring,
  Configured,
  Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyRef {
  Target(TargetId),
  /// Absolute path, linked on first graph query.
  Path(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
  pub reference: DependencyRef,
  pub visibility: Visibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDependency {
  pub target: TargetId,
  pub visibility: Visibility,
}

/// Precompiled header pair, relative to the target's source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pch {
  pub header: PathBuf,
  pub source: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnityCount {
  /// Computed from source bytes on first use.
  #[default]
  Auto,
  Pinned(u64),
}

pub struct Target {
  policy: Policy,
  id: TargetId,
  path: String,
  namespace: NamespaceId,
  kind: TargetKind,
  link: Option<LinkMode>,
  source_dir: PathBuf,
  sources: SourceSet,
  pch: Option<Pch>,
  generated: Vec<Box<dyn GeneratedFile>>,
  units: Vec<Unit>,
  dependencies: Vec<Dependency>,
  forced_includes: Vec<String>,
  public_includes: Vec<PathBuf>,
  unity: UnityCount,
  state: Cell<TargetState>,
  pub(crate) links: OnceCell<Vec<ResolvedDependency>>,
  pub(crate) resolved: OnceCell<Vec<ResolvedDependency>>,
  pub(crate) ordinal: OnceCell<u64>,
  /// Set once the graph reachable from this target is known to be acyclic.
  pub(crate) acyclic: Cell<bool>,
}

impl Target {
  pub(crate) fn new(
    id: TargetId,
    name: &str,
    path: String,
    namespace: NamespaceId,
    kind: TargetKind,
    source_dir: PathBuf,
    strict: bool,
  ) -> Self {
    let mut policy = Policy::new(name);
    policy.facet_mut().set_strict(strict);
    Self {
      policy,
      id,
      path,
      namespace,
      kind,
      link: None,
      source_dir,
      sources: SourceSet::default(),
      pch: None,
      generated: Vec::new(),
      units: Vec::new(),
      dependencies: Vec::new(),
      forced_includes: Vec::new(),
      public_includes: Vec::new(),
      unity: UnityCount::Auto,
      state: Cell::new(TargetState::Declared),
      links: OnceCell::new(),
      resolved: OnceCell::new(),
      ordinal: OnceCell::new(),
      acyclic: Cell::new(false),
    }
  }

  pub fn id(&self) -> TargetId {
    self.id
  }

  /// Absolute path, e.g. `/engine/core`.
  pub fn path(&self) -> &str {
    &self.path
  }

  pub fn namespace(&self) -> NamespaceId {
    self.namespace
  }

  pub fn kind(&self) -> TargetKind {
    self.kind
  }

  /// Explicit link mode, `None` when left to the configuration.
  pub fn link(&self) -> Option<LinkMode> {
    self.link
  }

  pub fn source_dir(&self) -> &Path {
    &self.source_dir
  }

  pub fn public_dir(&self) -> PathBuf {
    self.source_dir.join(PUBLIC_DIR)
  }

  pub fn private_dir(&self) -> PathBuf {
    self.source_dir.join(PRIVATE_DIR)
  }

  pub fn sources(&self) -> &SourceSet {
    &self.sources
  }

  pub fn pch(&self) -> Option<&Pch> {
    self.pch.as_ref()
  }

  pub fn generated(&self) -> &[Box<dyn GeneratedFile>] {
    &self.generated
  }

  pub fn units(&self) -> &[Unit] {
    &self.units
  }

  pub fn unit(&self, name: &str) -> Result<&Unit> {
    self
      .units
      .iter()
      .find(|u| u.name() == name)
      .ok_or_else(|| Error::UnknownUnit {
        target: self.path.clone(),
        unit: name.to_string(),
      })
  }

  /// Declared dependencies, in declaration order.
  pub fn dependencies(&self) -> &[Dependency] {
    &self.dependencies
  }

  pub fn forced_includes(&self) -> &[String] {
    &self.forced_includes
  }

  pub fn public_includes(&self) -> &[PathBuf] {
    &self.public_includes
  }

  pub fn unity(&self) -> UnityCount {
    self.unity
  }

  pub fn state(&self) -> TargetState {
    self.state.get()
  }

  pub(crate) fn set_state(&self, state: TargetState) {
    trace!(target_path = %self.path, ?state, "target state");
    self.state.set(state);
  }

  /// Non-isolated sources split into `count` buckets of similar byte size.
  pub fn unity_partitions(&self, count: u64, extensions: &[String]) -> Result<Vec<Vec<PathBuf>>> {
    let files = self.sources.unity_candidates(&self.source_dir, extensions)?;
    Ok(sources::partition(&files, count))
  }

  /// Contribute this target's facets, customizations, include paths,
  /// generated files and unity count to `output`.
  pub(crate) fn build_facet(&self, output: &mut Facet, env: &Environment, project: &Project) -> Result<()> {
    let lineage = project.lineage(self.namespace);

    for namespace in &lineage {
      output.combine_append(namespace.facet())?;
    }
    output.combine_append(self.policy.facet())?;

    self.policy.customize(output, env, self)?;
    for namespace in &lineage {
      namespace.customize(output, env, self)?;
    }

    output.include_path(&self.source_dir)?;
    output.include_path(self.public_dir())?;
    let private = self.private_dir();
    if private.is_dir() {
      output.include_path(private)?;
    }

    for dependency in project.resolve_dependencies(self.id)? {
      let other = project.target(dependency.target)?;
      output.include_path(other.public_dir())?;
      if dependency.visibility == Visibility::Public {
        output.include(other.forced_includes.clone())?;
        output.include_path(other.public_includes.clone())?;
      }
    }
    output.include(self.forced_includes.clone())?;

    if !self.generated.is_empty() {
      let dir = env.generated_dir(self);
      output.include_path(&dir)?;
      for descriptor in &self.generated {
        let content = descriptor.generate(output, env, self)?;
        project.generated_files().write(&dir.join(descriptor.name()), &content)?;
      }
    }

    let unity = match self.unity {
      UnityCount::Pinned(count) => Some(count),
      UnityCount::Auto if !output.tagged(&[NO_UNITY_TAG]) => Some(project.unity_count(self.id)?),
      UnityCount::Auto => None,
    };
    if let Some(count) = unity {
      output.export_variable("UNITY_COUNT", count.to_string())?;
    }

    debug!(target_path = %self.path, env = %env, unity = ?unity, "built target facet");
    Ok(())
  }

  fn references(&self, path: &str, project: &Project) -> bool {
    self.dependencies.iter().any(|d| match &d.reference {
      DependencyRef::Target(id) => project.target(*id).is_ok_and(|t| t.path == path),
      DependencyRef::Path(p) => p == path,
    })
  }
}

impl AsPolicy for Target {
  fn policy(&self) -> &Policy {
    &self.policy
  }

  fn policy_mut(&mut self) -> &mut Policy {
    &mut self.policy
  }
}

impl fmt::Debug for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Target")
      .field("path", &self.path)
      .field("kind", &self.kind)
      .field("link", &self.link)
      .field("state", &self.state.get())
      .field("dependencies", &self.dependencies)
      .field("generated", &self.generated.len())
      .field("units", &self.units)
      .finish_non_exhaustive()
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.path)
  }
}

/// Handed to a target's configuration closure.
pub struct TargetBuilder<'a> {
  target: &'a mut Target,
  project: &'a Project,
}

impl<'a> TargetBuilder<'a> {
  pub(crate) fn new(target: &'a mut Target, project: &'a Project) -> Self {
    Self { target, project }
  }

  pub fn id(&self) -> TargetId {
    self.target.id
  }

  pub fn path(&self) -> &str {
    &self.target.path
  }

  pub fn project(&self) -> &Project {
    self.project
  }

  pub fn target(&self) -> &Target {
    self.target
  }

  pub fn facet_mut(&mut self) -> &mut Facet {
    self.target.policy.facet_mut()
  }

  /// Depend on an already declared target.
  pub fn depend_on(&mut self, dependency: TargetId, visibility: Visibility) -> Result<&mut Self> {
    let other = self.project.target(dependency)?;
    if self.target.references(other.path(), self.project) {
      return Err(Error::DuplicateDependency {
        target: self.target.path.clone(),
        dependency: other.path().to_string(),
      });
    }
    debug!(target_path = %self.target.path, dependency = %other.path(), %visibility, "declared dependency");
    self.target.dependencies.push(Dependency {
      reference: DependencyRef::Target(dependency),
      visibility,
    });
    Ok(self)
  }

  pub fn public(&mut self, dependency: TargetId) -> Result<&mut Self> {
    self.depend_on(dependency, Visibility::Public)
  }

  pub fn private(&mut self, dependency: TargetId) -> Result<&mut Self> {
    self.depend_on(dependency, Visibility::Private)
  }

  pub fn runtime(&mut self, dependency: TargetId) -> Result<&mut Self> {
    self.depend_on(dependency, Visibility::Runtime)
  }

  /// Depend on a target by path, which may be declared later.
  ///
  /// Relative paths are taken from the target's namespace. The reference is
  /// linked on the first dependency-graph query.
  pub fn depend_on_path(&mut self, path: &str, visibility: Visibility) -> Result<&mut Self> {
    let path = self.project.qualify(self.target.namespace, path)?;
    if self.project.find_namespace(&path).is_some() {
      return Err(Error::NotATarget {
        target: self.target.path.clone(),
        path,
      });
    }
    if self.target.references(&path, self.project) {
      return Err(Error::DuplicateDependency {
        target: self.target.path.clone(),
        dependency: path,
      });
    }
    debug!(target_path = %self.target.path, dependency = %path, %visibility, "declared forward dependency");
    self.target.dependencies.push(Dependency {
      reference: DependencyRef::Path(path),
      visibility,
    });
    Ok(self)
  }

  /// Override the source directory, relative to the project root.
  pub fn source_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
    self.target.source_dir = self.project.root().join(dir);
    self
  }

  pub fn sources<I, P>(&mut self, files: I) -> &mut Self
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    self.target.sources.add_explicit(files);
    self
  }

  /// Sources compiled on their own, never merged into a unity file.
  pub fn isolate<I, P>(&mut self, files: I) -> &mut Self
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    self.target.sources.add_isolated(files);
    self
  }

  pub fn exclude<I, P>(&mut self, files: I) -> &mut Self
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    self.target.sources.add_excluded(files);
    self
  }

  pub fn exclude_glob(&mut self, pattern: &str) -> Result<&mut Self> {
    self.target.sources.add_exclude_pattern(pattern)?;
    Ok(self)
  }

  /// Files listed with the target but never compiled.
  pub fn extra<I, P>(&mut self, files: I) -> &mut Self
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    self.target.sources.add_extra(files);
    self
  }

  /// Directory glob patterns are matched under, relative to the source directory.
  pub fn glob_root(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
    self.target.sources.set_glob_root(dir);
    self
  }

  pub fn glob(&mut self, pattern: &str) -> Result<&mut Self> {
    self.target.sources.add_pattern(pattern)?;
    Ok(self)
  }

  pub fn pch(&mut self, header: impl Into<PathBuf>, source: impl Into<PathBuf>) -> &mut Self {
    self.target.pch = Some(Pch {
      header: header.into(),
      source: source.into(),
    });
    self
  }

  pub fn generate(&mut self, descriptor: impl GeneratedFile + 'static) -> &mut Self {
    self.target.generated.push(Box::new(descriptor));
    self
  }

  pub fn unit(&mut self, name: &str, configure: impl FnOnce(&mut Unit) -> Result<()>) -> Result<&mut Self> {
    if self.target.units.iter().any(|u| u.name() == name) {
      return Err(Error::DuplicatePolicy {
        kind: "unit",
        name: format!("{}:{name}", self.target.path),
      });
    }
    let mut unit = Unit::new(name);
    configure(&mut unit)?;
    self.target.units.push(unit);
    Ok(self)
  }

  pub fn link(&mut self, link: LinkMode) -> &mut Self {
    self.target.link = Some(link);
    self
  }

  /// Pin the unity-file count instead of computing it from source bytes.
  pub fn unity_count(&mut self, count: u64) -> &mut Self {
    self.target.unity = UnityCount::Pinned(count);
    self
  }

  /// Header force-included in this target, relayed to public consumers.
  pub fn forced_include(&mut self, header: impl Into<String>) -> &mut Self {
    self.target.forced_includes.push(header.into());
    self
  }

  /// Extra include directory exposed to public consumers.
  pub fn public_include(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
    let dir = dir.into();
    let dir = if dir.is_absolute() { dir } else { self.target.source_dir.join(dir) };
    self.target.public_includes.push(dir);
    self
  }

  pub fn tag(&mut self, tag: &str) -> Result<&mut Self> {
    self.facet_mut().tag(tag)?;
    Ok(self)
  }

  pub fn add_customization(
    &mut self,
    customization: impl Fn(&mut Facet, &Environment, &Target) -> Result<()> + 'static,
  ) -> &mut Self {
    self.target.policy.add_customization(customization);
    self
  }

  pub fn on_tag(&mut self, tag: impl Into<String>, contribution: Facet) -> &mut Self {
    self.target.policy.on_tag(tag, contribution);
    self
  }
}
