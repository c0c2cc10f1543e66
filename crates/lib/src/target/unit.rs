use std::path::PathBuf;
use std::rc::Rc;

use crate::compiler::Compiler;
use crate::facet::Facet;
use crate::policy::AsPolicy;

/// Named sub-scope of a target with its own files and an optional compiler
/// override.
///
/// With an override, the unit's expansion is rebuilt from the override
/// compiler instead of the environment's, keeping the owning target's
/// dependency-derived include paths.
#[derive(Debug, Clone)]
pub struct Unit {
  name: String,
  files: Vec<PathBuf>,
  facet: Facet,
  compiler: Option<Rc<Compiler>>,
}

impl Unit {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      files: Vec::new(),
      facet: Facet::new(),
      compiler: None,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn files(&self) -> &[PathBuf] {
    &self.files
  }

  pub fn add_files<I, P>(&mut self, files: I) -> &mut Self
  where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
  {
    self.files.extend(files.into_iter().map(Into::into));
    self
  }

  pub fn facet(&self) -> &Facet {
    &self.facet
  }

  pub fn facet_mut(&mut self) -> &mut Facet {
    &mut self.facet
  }

  pub fn compiler(&self) -> Option<&Rc<Compiler>> {
    self.compiler.as_ref()
  }

  pub fn set_compiler(&mut self, compiler: Rc<Compiler>) -> &mut Self {
    self.compiler = Some(compiler);
    self
  }

  pub fn compiler_name(&self) -> Option<&str> {
    self.compiler.as_deref().map(AsPolicy::name)
  }
}
