//! The resolution context.
//!
//! A [`Project`] owns everything a resolution run needs: the namespace tree,
//! every declared target, the platform/configuration/compiler registries,
//! decorators, settings, the ordinal counter, the attribute cache and the
//! generated-file store. Targets and namespaces are addressed by index
//! ([`TargetId`], [`NamespaceId`]) and by absolute path.
//!
//! # Declaration
//!
//! ```no_run
//! use strata_lib::{NamespaceId, Project};
//!
//! let mut project = Project::new("/src/game");
//! let engine = project.namespace(NamespaceId::ROOT, "engine", |_| Ok(())).unwrap();
//! let core = project
//!   .library(engine, "core", |t| {
//!     t.facet_mut().define("CORE_API")?;
//!     Ok(())
//!   })
//!   .unwrap();
//! project
//!   .executable(NamespaceId::ROOT, "game", |t| {
//!     t.private(core)?;
//!     Ok(())
//!   })
//!   .unwrap();
//! ```

use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, info};

use crate::cache::{AttributeCache, MemoryCache};
use crate::compiler::Compiler;
use crate::configuration::Configuration;
use crate::consts::UNITY_COUNT_ATTRIBUTE;
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::namespace::{Namespace, NamespaceId};
use crate::platform::Platform;
use crate::policy::{AsPolicy, Decorator};
use crate::settings::Settings;
use crate::target::{
  GeneratedFileStore, Target, TargetBuilder, TargetId, TargetKind, TargetState, UnityCount, tree_bytes,
};

/// What an absolute path names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
  Namespace(NamespaceId),
  Target(TargetId),
}

pub struct Project {
  root: PathBuf,
  settings: Settings,
  namespaces: Vec<Namespace>,
  pub(crate) targets: Vec<Target>,
  paths: HashMap<String, Entry>,
  platforms: Vec<Rc<Platform>>,
  configurations: Vec<Rc<Configuration>>,
  compilers: Vec<Rc<Compiler>>,
  decorators: Vec<Rc<Decorator>>,
  cache: Box<dyn AttributeCache>,
  generated: GeneratedFileStore,
  pub(crate) ordinals: Cell<u64>,
}

impl Project {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self::with_settings(root, Settings::default())
  }

  pub fn with_settings(root: impl Into<PathBuf>, settings: Settings) -> Self {
    let root = root.into();
    let mut paths = HashMap::new();
    paths.insert("/".to_string(), Entry::Namespace(NamespaceId::ROOT));
    Self {
      namespaces: vec![Namespace::root(root.clone(), settings.strict)],
      root,
      settings,
      targets: Vec::new(),
      paths,
      platforms: Vec::new(),
      configurations: Vec::new(),
      compilers: Vec::new(),
      decorators: Vec::new(),
      cache: Box::new(MemoryCache::new()),
      generated: GeneratedFileStore::new(),
      ordinals: Cell::new(0),
    }
  }

  /// Replace the attribute cache, e.g. with a persistent one.
  pub fn with_cache(mut self, cache: impl AttributeCache + 'static) -> Self {
    self.cache = Box::new(cache);
    self
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  /// Artifact root: the configured output directory under the project root.
  pub fn output_root(&self) -> PathBuf {
    self.root.join(&self.settings.output_dir)
  }

  pub fn generated_files(&self) -> &GeneratedFileStore {
    &self.generated
  }

  // ==========================================================================
  // Registries
  // ==========================================================================

  pub fn add_platform(&mut self, platform: Platform) -> Result<Rc<Platform>> {
    register(&mut self.platforms, "platform", platform)
  }

  pub fn add_configuration(&mut self, configuration: Configuration) -> Result<Rc<Configuration>> {
    register(&mut self.configurations, "configuration", configuration)
  }

  pub fn add_compiler(&mut self, compiler: Compiler) -> Result<Rc<Compiler>> {
    register(&mut self.compilers, "compiler", compiler)
  }

  pub fn add_decorator(&mut self, decorator: Decorator) {
    self.decorators.push(Rc::new(decorator));
  }

  pub fn platform(&self, name: &str) -> Result<Rc<Platform>> {
    lookup(&self.platforms, name).ok_or_else(|| Error::UnknownPlatform(name.to_string()))
  }

  pub fn configuration(&self, name: &str) -> Result<Rc<Configuration>> {
    lookup(&self.configurations, name).ok_or_else(|| Error::UnknownConfiguration(name.to_string()))
  }

  pub fn compiler(&self, name: &str) -> Result<Rc<Compiler>> {
    lookup(&self.compilers, name).ok_or_else(|| Error::UnknownCompiler(name.to_string()))
  }

  pub fn platforms(&self) -> &[Rc<Platform>] {
    &self.platforms
  }

  pub fn configurations(&self) -> &[Rc<Configuration>] {
    &self.configurations
  }

  pub fn compilers(&self) -> &[Rc<Compiler>] {
    &self.compilers
  }

  pub fn decorators(&self) -> &[Rc<Decorator>] {
    &self.decorators
  }

  // ==========================================================================
  // Environments
  // ==========================================================================

  /// Environment for registered names.
  pub fn environment(&self, platform: &str, configuration: &str, compiler: &str) -> Result<Environment> {
    let platform = self.platform(platform)?;
    let configuration = self.configuration(configuration)?;
    let compiler = self.compiler(compiler)?;
    if !compiler.supports(&platform) {
      return Err(Error::UnsupportedPlatform {
        compiler: compiler.name().to_string(),
        platform: platform.name().to_string(),
      });
    }
    Ok(self.make_environment(platform, configuration, compiler))
  }

  /// Every (platform, configuration, compiler) combination the compilers support.
  pub fn environments(&self) -> Vec<Environment> {
    let mut environments = Vec::new();
    for platform in &self.platforms {
      for configuration in &self.configurations {
        for compiler in self.compilers.iter().filter(|c| c.supports(platform)) {
          environments.push(self.make_environment(platform.clone(), configuration.clone(), compiler.clone()));
        }
      }
    }
    debug!(count = environments.len(), "enumerated environments");
    environments
  }

  fn make_environment(
    &self,
    platform: Rc<Platform>,
    configuration: Rc<Configuration>,
    compiler: Rc<Compiler>,
  ) -> Environment {
    Environment::new(platform, configuration, compiler)
      .with_root(&self.root, self.output_root())
      .with_decorators(self.decorators.iter().cloned())
  }

  // ==========================================================================
  // Declaration
  // ==========================================================================

  /// Declare a child namespace and run its configuration closure.
  pub fn namespace(
    &mut self,
    parent: NamespaceId,
    name: &str,
    configure: impl FnOnce(&mut Namespace) -> Result<()>,
  ) -> Result<NamespaceId> {
    validate_name(name)?;
    let parent_ns = self.get_namespace(parent)?;
    let path = parent_ns.child_path(name);
    if self.paths.contains_key(&path) {
      return Err(Error::DuplicateNamespace(path));
    }

    let id = NamespaceId(self.namespaces.len());
    let mut namespace = Namespace::new(
      id,
      name,
      path.clone(),
      Some(parent),
      parent_ns.source_dir().join(name),
      self.settings.strict,
    );
    configure(&mut namespace)?;

    self.namespaces.push(namespace);
    self.namespaces[parent.0].add_child(id);
    self.paths.insert(path.clone(), Entry::Namespace(id));
    info!(namespace = %path, "declared namespace");
    Ok(id)
  }

  /// Run a configuration closure against an existing namespace, e.g. the root.
  ///
  /// Changes apply to expansions computed afterwards.
  pub fn configure_namespace(
    &mut self,
    id: NamespaceId,
    configure: impl FnOnce(&mut Namespace) -> Result<()>,
  ) -> Result<()> {
    let namespace = self
      .namespaces
      .get_mut(id.0)
      .ok_or_else(|| Error::UnknownNamespace(format!("#{}", id.0)))?;
    configure(namespace)
  }

  pub fn headers(
    &mut self,
    namespace: NamespaceId,
    name: &str,
    configure: impl FnOnce(&mut TargetBuilder) -> Result<()>,
  ) -> Result<TargetId> {
    self.declare(namespace, name, TargetKind::Headers, configure)
  }

  pub fn external(
    &mut self,
    namespace: NamespaceId,
    name: &str,
    configure: impl FnOnce(&mut TargetBuilder) -> Result<()>,
  ) -> Result<TargetId> {
    self.declare(namespace, name, TargetKind::External, configure)
  }

  pub fn library(
    &mut self,
    namespace: NamespaceId,
    name: &str,
    configure: impl FnOnce(&mut TargetBuilder) -> Result<()>,
  ) -> Result<TargetId> {
    self.declare(namespace, name, TargetKind::Library, configure)
  }

  pub fn executable(
    &mut self,
    namespace: NamespaceId,
    name: &str,
    configure: impl FnOnce(&mut TargetBuilder) -> Result<()>,
  ) -> Result<TargetId> {
    self.declare(namespace, name, TargetKind::Executable, configure)
  }

  fn declare(
    &mut self,
    namespace: NamespaceId,
    name: &str,
    kind: TargetKind,
    configure: impl FnOnce(&mut TargetBuilder) -> Result<()>,
  ) -> Result<TargetId> {
    validate_name(name)?;
    let ns = self.get_namespace(namespace)?;
    let path = ns.child_path(name);
    if self.paths.contains_key(&path) {
      return Err(Error::DuplicateTarget(path));
    }

    let id = TargetId(self.targets.len());
    let mut target = Target::new(
      id,
      name,
      path.clone(),
      namespace,
      kind,
      ns.source_dir().join(name),
      self.settings.strict,
    );
    target.set_state(TargetState::Configuring);
    configure(&mut TargetBuilder::new(&mut target, self))?;
    target.set_state(TargetState::Configured);

    self.targets.push(target);
    self.paths.insert(path.clone(), Entry::Target(id));
    self.namespaces[namespace.0].add_target(id);
    let mut current = Some(namespace);
    while let Some(ns) = current {
      let ns = &mut self.namespaces[ns.0];
      ns.add_descendant_target(id);
      current = ns.parent();
    }

    info!(target_path = %path, %kind, "declared target");
    Ok(id)
  }

  // ==========================================================================
  // Lookup
  // ==========================================================================

  pub fn target(&self, id: TargetId) -> Result<&Target> {
    self
      .targets
      .get(id.0)
      .ok_or_else(|| Error::UnknownTarget(format!("#{}", id.0)))
  }

  pub fn get_namespace(&self, id: NamespaceId) -> Result<&Namespace> {
    self
      .namespaces
      .get(id.0)
      .ok_or_else(|| Error::UnknownNamespace(format!("#{}", id.0)))
  }

  pub fn targets(&self) -> impl Iterator<Item = &Target> {
    self.targets.iter()
  }

  pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
    self.namespaces.iter()
  }

  /// What an absolute path names, if anything.
  pub fn find(&self, path: &str) -> Option<Entry> {
    self.paths.get(path).copied()
  }

  pub fn find_target(&self, path: &str) -> Result<TargetId> {
    match self.find(path) {
      Some(Entry::Target(id)) => Ok(id),
      _ => Err(Error::UnknownTarget(path.to_string())),
    }
  }

  pub fn find_namespace(&self, path: &str) -> Option<NamespaceId> {
    match self.find(path) {
      Some(Entry::Namespace(id)) => Some(id),
      _ => None,
    }
  }

  /// Make `path` absolute, resolving relative paths from `namespace`.
  pub fn qualify(&self, namespace: NamespaceId, path: &str) -> Result<String> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
      return Err(Error::InvalidName(path.to_string()));
    }
    if trimmed.starts_with('/') {
      return Ok(trimmed.to_string());
    }
    let ns = self.get_namespace(namespace)?;
    Ok(ns.child_path(trimmed))
  }

  /// Namespaces from the root down to `namespace`.
  pub fn lineage(&self, namespace: NamespaceId) -> Vec<&Namespace> {
    let mut lineage = Vec::new();
    let mut current = self.namespaces.get(namespace.0);
    while let Some(ns) = current {
      lineage.push(ns);
      current = ns.parent().and_then(|p| self.namespaces.get(p.0));
    }
    lineage.reverse();
    lineage
  }

  // ==========================================================================
  // Unity
  // ==========================================================================

  /// Unity-file count: pinned, or `ceil(source bytes / unity_size)` cached per target.
  pub fn unity_count(&self, id: TargetId) -> Result<u64> {
    let target = self.target(id)?;
    if let UnityCount::Pinned(count) = target.unity() {
      return Ok(count);
    }
    let ceiling = self.settings.unity_size.max(1);
    self.cache.get_or_compute(target.path(), UNITY_COUNT_ATTRIBUTE, &mut || {
      let bytes = tree_bytes(target.source_dir(), &self.settings.source_extensions)?;
      let count = bytes.div_ceil(ceiling);
      debug!(target_path = %target.path(), bytes, ceiling, count, "computed unity count");
      Ok(count)
    })
  }

  /// Forget a computed unity count so the next query measures again.
  pub fn reset_unity_count(&self, id: TargetId) -> Result<()> {
    let target = self.target(id)?;
    self.cache.invalidate(target.path(), UNITY_COUNT_ATTRIBUTE);
    debug!(target_path = %target.path(), "reset unity count");
    Ok(())
  }

  /// Non-isolated sources of a target split into its unity files.
  pub fn unity_partitions(&self, id: TargetId) -> Result<Vec<Vec<PathBuf>>> {
    let count = self.unity_count(id)?;
    self.target(id)?.unity_partitions(count, &self.settings.source_extensions)
  }
}

fn register<T: AsPolicy>(registry: &mut Vec<Rc<T>>, kind: &'static str, item: T) -> Result<Rc<T>> {
  if registry.iter().any(|existing| existing.name() == item.name()) {
    return Err(Error::DuplicatePolicy {
      kind,
      name: item.name().to_string(),
    });
  }
  debug!(kind, name = %item.name(), "registered");
  let item = Rc::new(item);
  registry.push(item.clone());
  Ok(item)
}

fn lookup<T: AsPolicy>(registry: &[Rc<T>], name: &str) -> Option<Rc<T>> {
  registry.iter().find(|item| item.name() == name).cloned()
}

fn validate_name(name: &str) -> Result<()> {
  if name.is_empty() || name.contains('/') {
    return Err(Error::InvalidName(name.to_string()));
  }
  Ok(())
}
