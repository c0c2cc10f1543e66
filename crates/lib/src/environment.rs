//! Environments: one (platform, configuration, compiler) combination.
//!
//! An [`Environment`] memoizes its base facet and expands targets into fresh,
//! frozen facets for downstream generators.
//!
//! # Base Facet
//!
//! 1. Seed the build-identity defines and variables.
//! 2. Platform, configuration, then compiler decorate (each prepends).
//! 3. Matching decorators append in registration order.
//! 4. Substitute variables and freeze.
//!
//! # Expansion
//!
//! 1. Copy the base facet, add target-identity defines and variables.
//! 2. Build the target facet (namespaces, target, dependencies, generated files).
//! 3. Platform, configuration, then compiler customize.
//! 4. Substitute variables and freeze.

use std::cell::OnceCell;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::compiler::Compiler;
use crate::configuration::Configuration;
use crate::consts::{
  BUILD_COMPILER_DEFINE, BUILD_CONFIG_DEFINE, BUILD_ENVIRONMENT_DEFINE, BUILD_PLATFORM_DEFINE,
  BUILD_TARGET_DEFINE, BUILD_TARGET_PATH_DEFINE, DEFAULT_OUTPUT_DIR, EXTERNAL_OBJECT_DIR, GENERATED_DIR,
  OBJECT_DIR,
};
use crate::error::{Error, Result};
use crate::facet::{Category, Facet};
use crate::platform::Platform;
use crate::policy::{AsPolicy, Decorator};
use crate::project::Project;
use crate::target::{LinkMode, Target, TargetId, TargetKind};
use crate::util::hash::{ContentHash, hash_bytes, hash_serialized};
use crate::vars;

/// Output file kinds a target can produce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutputKind {
  Executable,
  SharedLibrary,
  StaticLibrary,
  /// Object file for one source, absolute or relative to the source directory.
  Object(PathBuf),
  DebugSymbols,
  Pch,
  /// Header-only targets produce no file.
  Headers,
}

impl OutputKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Executable => "executable",
      Self::SharedLibrary => "shared library",
      Self::StaticLibrary => "static library",
      Self::Object(_) => "object",
      Self::DebugSymbols => "debug symbols",
      Self::Pch => "pch",
      Self::Headers => "headers",
    }
  }
}

pub struct Environment {
  platform: Rc<Platform>,
  configuration: Rc<Configuration>,
  compiler: Rc<Compiler>,
  decorators: Vec<Rc<Decorator>>,
  root: PathBuf,
  output_root: PathBuf,
  base: OnceCell<Facet>,
}

impl Environment {
  pub fn new(platform: Rc<Platform>, configuration: Rc<Configuration>, compiler: Rc<Compiler>) -> Self {
    Self {
      platform,
      configuration,
      compiler,
      decorators: Vec::new(),
      root: PathBuf::new(),
      output_root: PathBuf::from(DEFAULT_OUTPUT_DIR),
      base: OnceCell::new(),
    }
  }

  /// Project root and artifact root used for variables and artifact paths.
  pub fn with_root(mut self, root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
    self.root = root.into();
    self.output_root = output_root.into();
    self
  }

  pub fn with_decorator(mut self, decorator: Rc<Decorator>) -> Self {
    self.decorators.push(decorator);
    self
  }

  pub fn with_decorators(mut self, decorators: impl IntoIterator<Item = Rc<Decorator>>) -> Self {
    self.decorators.extend(decorators);
    self
  }

  pub fn platform(&self) -> &Platform {
    &self.platform
  }

  pub fn configuration(&self) -> &Configuration {
    &self.configuration
  }

  pub fn compiler(&self) -> &Compiler {
    &self.compiler
  }

  pub fn platform_name(&self) -> &str {
    self.platform.name()
  }

  pub fn config_name(&self) -> &str {
    self.configuration.name()
  }

  pub fn compiler_name(&self) -> &str {
    self.compiler.name()
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// `<output root>/<platform>/<configuration>`.
  pub fn output_dir(&self) -> PathBuf {
    self.output_root.join(self.platform_name()).join(self.config_name())
  }

  /// Per-target artifact directory, mirroring the target path.
  pub fn target_output_dir(&self, target: &Target) -> PathBuf {
    self.output_dir().join(target.path().trim_start_matches('/'))
  }

  pub fn generated_dir(&self, target: &Target) -> PathBuf {
    self.target_output_dir(target).join(GENERATED_DIR)
  }

  /// Memoized, frozen defaults shared by every target in this environment.
  pub fn base_facet(&self) -> Result<&Facet> {
    if let Some(base) = self.base.get() {
      return Ok(base);
    }

    let mut facet = Facet::new();
    self.seed(&mut facet, self.compiler_name())?;

    self.platform.policy().decorate(&mut facet)?;
    self.configuration.policy().decorate(&mut facet)?;
    self.compiler.policy().decorate(&mut facet)?;

    let mut applied = 0;
    for decorator in &self.decorators {
      applied += decorator.apply_matching(&mut facet, self)?;
    }

    facet.substitute()?;
    facet.freeze();
    info!(env = %self, decorators = applied, "computed base facet");
    Ok(self.base.get_or_init(|| facet))
  }

  /// Resolve the complete facet for one target.
  pub fn expand(&self, project: &Project, id: TargetId) -> Result<Facet> {
    let target = project.target(id)?;
    let mut output = self.base_facet()?.unfrozen_copy();
    self.seed_target(&mut output, target)?;

    target.build_facet(&mut output, self, project)?;

    self.platform.policy().customize(&mut output, self, target)?;
    self.configuration.policy().customize(&mut output, self, target)?;
    self.compiler.policy().customize(&mut output, self, target)?;

    self.finish(&mut output, target)?;
    debug!(env = %self, target_path = %target.path(), "expanded target");
    Ok(output)
  }

  /// Resolve the facet for one unit of a target.
  ///
  /// Without a compiler override this is the target expansion plus the
  /// unit's own facet. With one, the facet is rebuilt from the override
  /// compiler's decoration, the target's contribution and the override's
  /// customizations.
  pub fn expand_unit(&self, project: &Project, id: TargetId, unit: &str) -> Result<Facet> {
    let target = project.target(id)?;
    let unit = target.unit(unit)?;

    let mut output = match unit.compiler() {
      None => self.expand(project, id)?.unfrozen_copy(),
      Some(compiler) => {
        let mut output = Facet::new();
        self.seed(&mut output, compiler.name())?;
        compiler.policy().decorate(&mut output)?;
        self.seed_target(&mut output, target)?;
        target.build_facet(&mut output, self, project)?;
        compiler.policy().customize(&mut output, self, target)?;
        output
      }
    };
    output.combine_append(unit.facet())?;

    self.finish(&mut output, target)?;
    debug!(
      env = %self,
      target_path = %target.path(),
      unit = unit.name(),
      compiler = ?unit.compiler_name(),
      "expanded unit"
    );
    Ok(output)
  }

  /// The primary artifact a target produces here, `None` for headers.
  pub fn derive_artifact_kind(&self, project: &Project, id: TargetId) -> Result<Option<OutputKind>> {
    let target = project.target(id)?;
    match target.kind() {
      TargetKind::Headers => Ok(None),
      TargetKind::Executable => match target.link() {
        Some(LinkMode::Dynamic) => Err(Error::ExecutableRequiresStatic {
          target: target.path().to_string(),
        }),
        Some(LinkMode::Static) | None => Ok(Some(OutputKind::Executable)),
      },
      TargetKind::Library | TargetKind::External => {
        match target.link().unwrap_or(self.configuration.default_link()) {
          LinkMode::Static => Ok(Some(OutputKind::StaticLibrary)),
          LinkMode::Dynamic => Ok(Some(OutputKind::SharedLibrary)),
        }
      }
    }
  }

  /// Canonical location of one output of a target, `None` for headers.
  ///
  /// `<output root>/<platform>/<configuration>/<target path>/<file>`, with
  /// object files under `obj/`.
  pub fn derive_artifact_path(&self, project: &Project, id: TargetId, kind: &OutputKind) -> Result<Option<PathBuf>> {
    let target = project.target(id)?;
    let os = self.platform.os;
    let dir = self.target_output_dir(target);
    let name = target.name();

    let unsupported = |reason: &str| Error::UnsupportedArtifact {
      target: target.path().to_string(),
      kind: kind.as_str().to_string(),
      reason: reason.to_string(),
    };

    let path = match kind {
      OutputKind::Headers => return Ok(None),
      OutputKind::Executable => {
        if target.kind() != TargetKind::Executable {
          return Err(unsupported("only executables link programs"));
        }
        dir.join(format!("{name}{}", os.executable_suffix()))
      }
      OutputKind::StaticLibrary | OutputKind::SharedLibrary => {
        if !matches!(target.kind(), TargetKind::Library | TargetKind::External) {
          return Err(unsupported("only libraries produce library files"));
        }
        let suffix = if *kind == OutputKind::StaticLibrary {
          os.static_library_suffix()
        } else {
          os.shared_library_suffix()
        };
        dir.join(format!("{}{name}{suffix}", os.library_prefix()))
      }
      OutputKind::Object(source) => {
        if !matches!(target.kind(), TargetKind::Library | TargetKind::Executable) {
          return Err(unsupported("target compiles no sources"));
        }
        let mut file = object_key(source, target.source_dir()).into_os_string();
        file.push(os.object_suffix());
        dir.join(OBJECT_DIR).join(file)
      }
      OutputKind::DebugSymbols => {
        if !matches!(target.kind(), TargetKind::Library | TargetKind::Executable) {
          return Err(unsupported("target links nothing"));
        }
        dir.join(format!("{name}{}", os.debug_symbols_suffix()))
      }
      OutputKind::Pch => {
        let pch = target.pch().ok_or_else(|| unsupported("no precompiled header declared"))?;
        let header = pch.header.file_name().map(|f| f.to_string_lossy().into_owned()).unwrap_or_default();
        dir.join(format!("{header}{}", self.compiler.syntax().pch_suffix()))
      }
    };
    Ok(Some(path))
  }

  /// Checksum of a target's expansion, for detecting flag changes between runs.
  pub fn fingerprint(&self, project: &Project, id: TargetId) -> Result<ContentHash> {
    hash_serialized(&self.expand(project, id)?)
  }

  fn seed(&self, facet: &mut Facet, compiler: &str) -> Result<()> {
    facet.define([
      format!("{BUILD_ENVIRONMENT_DEFINE}={}-{}-{compiler}", self.platform_name(), self.config_name()),
      format!("{BUILD_PLATFORM_DEFINE}={}", self.platform_name()),
      format!("{BUILD_CONFIG_DEFINE}={}", self.config_name()),
      format!("{BUILD_COMPILER_DEFINE}={compiler}"),
    ])?;
    facet.export_variable("PLATFORM", self.platform_name())?;
    facet.export_variable("CONFIG", self.config_name())?;
    facet.export_variable("COMPILER", compiler)?;
    facet.export_variable("ROOT", self.root.to_string_lossy())?;
    facet.export_variable("OUTPUT", self.output_dir().to_string_lossy())?;
    Ok(())
  }

  fn seed_target(&self, facet: &mut Facet, target: &Target) -> Result<()> {
    facet.define([
      format!("{BUILD_TARGET_DEFINE}={}", target.name()),
      format!("{BUILD_TARGET_PATH_DEFINE}={}", target.path()),
    ])?;
    facet.export_variable("TARGET", target.name())?;
    facet.export_variable("TARGET_PATH", target.path())?;
    facet.export_variable("TARGET_DIR", self.target_output_dir(target).to_string_lossy())?;
    if let Some(pch) = target.pch() {
      facet.export_variable("PCH_HEADER", pch.header.to_string_lossy())?;
      facet.export_variable("PCH_SOURCE", target.source_dir().join(&pch.source).to_string_lossy())?;
    }
    Ok(())
  }

  fn finish(&self, facet: &mut Facet, target: &Target) -> Result<()> {
    facet.substitute()?;
    for category in Category::ALL {
      for value in facet.get(category) {
        let Some(text) = value.as_text() else {
          continue;
        };
        for name in vars::unresolved(text, facet.variables()) {
          warn!(
            env = %self,
            target_path = %target.path(),
            %category,
            variable = %name,
            "unresolved variable"
          );
        }
      }
    }
    facet.freeze();
    Ok(())
  }
}

/// Object path for `source`, relative to the object directory.
///
/// Sources under `source_dir` mirror their layout. Anything else, or a path that would climb out with `..`,
/// is keyed by file name under a directory named for a short hash of the full path.
fn object_key(source: &Path, source_dir: &Path) -> PathBuf {
  let relative = source.strip_prefix(source_dir).unwrap_or(source);
  let contained = relative
    .components()
    .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
  if contained && relative.file_name().is_some() {
    return relative.to_path_buf();
  }
  let digest = hash_bytes(source.to_string_lossy().as_bytes());
  let bucket = digest.0.get(..12).unwrap_or(digest.0.as_str());
  let name = source.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("source"));
  Path::new(EXTERNAL_OBJECT_DIR).join(bucket).join(name)
}

impl fmt::Display for Environment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}-{}", self.platform_name(), self.config_name(), self.compiler_name())
  }
}

impl fmt::Debug for Environment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Environment")
      .field("platform", &self.platform_name())
      .field("configuration", &self.config_name())
      .field("compiler", &self.compiler_name())
      .field("decorators", &self.decorators.len())
      .field("base", &self.base.get().is_some())
      .finish()
  }
}
