//! Compilers and their command-line syntax.
//!
//! A [`Compiler`] is a policy whose facet carries the compiler identity. Its
//! [`Syntax`] knows how abstract facet categories are spelled on that
//! compiler's command line; `with_flag_translation` installs a customization
//! that appends those spellings to the option categories at the end of every
//! expansion.

use std::fmt;

use crate::facet::{Category, Facet};
use crate::platform::Platform;
use crate::policy::{AsPolicy, Policy};
use crate::selector::Selector;
use crate::value_set::Value;

/// Command-line dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
  /// gcc/clang style (`-DNAME`, `-Ipath`).
  Gnu,
  /// cl.exe style (`/DNAME`, `/Ipath`).
  Msvc,
}

impl Syntax {
  pub fn define(&self, define: &str) -> String {
    match self {
      Self::Gnu => format!("-D{define}"),
      Self::Msvc => format!("/D{define}"),
    }
  }

  pub fn include_path(&self, path: &str) -> String {
    match self {
      Self::Gnu => format!("-I{path}"),
      Self::Msvc => format!("/I{path}"),
    }
  }

  pub fn system_path(&self, path: &str) -> Vec<String> {
    match self {
      Self::Gnu => vec!["-isystem".to_string(), path.to_string()],
      Self::Msvc => vec![format!("/external:I{path}")],
    }
  }

  pub fn forced_include(&self, header: &str) -> Vec<String> {
    match self {
      Self::Gnu => vec!["-include".to_string(), header.to_string()],
      Self::Msvc => vec![format!("/FI{header}")],
    }
  }

  pub fn library_path(&self, path: &str) -> String {
    match self {
      Self::Gnu => format!("-L{path}"),
      Self::Msvc => format!("/LIBPATH:{path}"),
    }
  }

  pub fn library(&self, library: &str) -> String {
    match self {
      Self::Gnu => format!("-l{library}"),
      Self::Msvc if library.ends_with(".lib") => library.to_string(),
      Self::Msvc => format!("{library}.lib"),
    }
  }

  pub fn pch_suffix(&self) -> &'static str {
    match self {
      Self::Gnu => ".gch",
      Self::Msvc => ".pch",
    }
  }

  /// Append command-line spellings of the abstract categories to `facet`.
  pub fn translate(&self, facet: &mut Facet) -> crate::Result<()> {
    let mut compile = Vec::new();
    compile.extend(facet.get(Category::Define).iter().map(|v| self.define(&v.to_string())));
    compile.extend(
      facet
        .get(Category::IncludePath)
        .iter()
        .chain(facet.get(Category::ExternPath))
        .map(|v| self.include_path(&v.to_string())),
    );
    for path in facet.get(Category::SystemPath) {
      compile.extend(self.system_path(&path.to_string()));
    }
    for header in facet.get(Category::Include) {
      compile.extend(self.forced_include(&header.to_string()));
    }

    let mut link = Vec::new();
    link.extend(facet.get(Category::LibraryPath).iter().map(|v| self.library_path(&v.to_string())));
    link.extend(facet.get(Category::Library).iter().map(|v| self.library(&v.to_string())));

    let compile: Vec<Value> = compile.into_iter().map(Value::from).collect();
    facet.set(Category::PreprocessorOption, compile.clone())?;
    facet.set(Category::CompilerOption, compile)?;
    facet.set(Category::LinkerOption, link)?;
    Ok(())
  }
}

#[derive(Debug)]
pub struct Compiler {
  policy: Policy,
  syntax: Syntax,
  platforms: Vec<Selector>,
}

impl Compiler {
  pub fn new(name: impl Into<String>, syntax: Syntax) -> Self {
    let name = name.into();
    Self {
      policy: Policy::with_facet(name.clone(), Facet::with_compiler(name)),
      syntax,
      platforms: Vec::new(),
    }
  }

  pub fn syntax(&self) -> Syntax {
    self.syntax
  }

  /// Restrict the compiler to platforms matching `selector`.
  ///
  /// A compiler with no restriction supports every platform.
  pub fn for_platform(mut self, selector: Selector) -> Self {
    self.platforms.push(selector);
    self
  }

  pub fn supports(&self, platform: &Platform) -> bool {
    self.platforms.is_empty() || self.platforms.iter().any(|s| platform.matches(s))
  }

  /// Translate abstract categories into option tokens during `customize`.
  pub fn with_flag_translation(mut self) -> Self {
    let syntax = self.syntax;
    self
      .policy
      .add_customization(move |output, _, _| syntax.translate(output));
    self
  }
}

impl AsPolicy for Compiler {
  fn policy(&self) -> &Policy {
    &self.policy
  }

  fn policy_mut(&mut self) -> &mut Policy {
    &mut self.policy
  }
}

impl fmt::Display for Compiler {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.policy.name())
  }
}
