//! Facets: named bags of token categories plus substitution variables.
//!
//! A [`Facet`] is the unit of composition. Policies own one, environments
//! memoize one, and every target expansion produces a fresh one for downstream
//! generators.
//!
//! # Composition
//!
//! `combine_append`/`combine_prepend` copy another facet's tokens category by
//! category (never aliasing them), merge its variables and adopt its
//! compiler/preprocessor identity when set. `subtract` removes everything the
//! other facet contributed.
//!
//! # Freezing
//!
//! `freeze` is terminal: every later mutation fails. Use `unfrozen_copy` to
//! derive a mutable facet from a frozen one.

mod category;

pub use category::Category;

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::value_set::{IntoValues, ValueSet};
use crate::vars::Variables;

#[derive(Debug, Clone, Default)]
pub struct Facet {
  categories: [ValueSet; Category::COUNT],
  variables: Variables,
  compiler: Option<String>,
  preprocessor: Option<String>,
  frozen: bool,
}

macro_rules! category_setters {
  ($($method:ident => $category:ident),* $(,)?) => {
    $(
      #[doc = concat!("Append to the `", stringify!($method), "` category.")]
      pub fn $method(&mut self, values: impl IntoValues) -> Result<&mut Self> {
        self.set(Category::$category, values)?;
        Ok(self)
      }
    )*
  };
}

impl Facet {
  pub fn new() -> Self {
    Self::default()
  }

  /// An empty facet owned by the named compiler.
  pub fn with_compiler(name: impl Into<String>) -> Self {
    Self {
      compiler: Some(name.into()),
      ..Self::default()
    }
  }

  /// A facet whose categories reject re-declared literals.
  pub fn strict() -> Self {
    let mut facet = Self::default();
    facet.set_strict(true);
    facet
  }

  pub fn set_strict(&mut self, strict: bool) {
    for set in &mut self.categories {
      set.set_strict(strict);
    }
  }

  pub fn get(&self, category: Category) -> &ValueSet {
    &self.categories[category.index()]
  }

  /// Append values to a category.
  pub fn set(&mut self, category: Category, values: impl IntoValues) -> Result<()> {
    self.ensure_mutable(category)?;
    self.categories[category.index()].append(values)?;
    Ok(())
  }

  /// Append values to a category named at runtime.
  pub fn set_named(&mut self, category: &str, values: impl IntoValues) -> Result<()> {
    let category = category.parse::<Category>()?;
    self.set(category, values)
  }

  /// Prepend values to a category.
  pub fn set_front(&mut self, category: Category, values: impl IntoValues) -> Result<()> {
    self.ensure_mutable(category)?;
    self.categories[category.index()].prepend(values)?;
    Ok(())
  }

  pub fn unset(&mut self, category: Category, values: impl IntoValues) -> Result<()> {
    self.ensure_mutable(category)?;
    self.categories[category.index()].remove(values)?;
    Ok(())
  }

  category_setters! {
    define => Define,
    include => Include,
    include_path => IncludePath,
    library => Library,
    library_path => LibraryPath,
    extern_path => ExternPath,
    system_path => SystemPath,
    analysis_option => AnalysisOption,
    preprocessor_option => PreprocessorOption,
    compiler_option => CompilerOption,
    pch_option => PchOption,
    librarian_option => LibrarianOption,
    linker_option => LinkerOption,
    tag => Tag,
  }

  /// True only if every given tag is present.
  pub fn tagged(&self, tags: &[&str]) -> bool {
    let set = self.get(Category::Tag);
    tags.iter().all(|t| set.contains(*t))
  }

  /// Add the same tokens to every compile stage's option list.
  pub fn set_compile_flag(&mut self, values: impl IntoValues) -> Result<()> {
    let values = values.into_values();
    for category in Category::COMPILE_STAGES {
      self.set(category, values.clone())?;
    }
    Ok(())
  }

  /// Remove tokens from every compile stage's option list.
  pub fn unset_compile_flag(&mut self, values: impl IntoValues) -> Result<()> {
    let values = values.into_values();
    for category in Category::COMPILE_STAGES {
      self.unset(category, values.clone())?;
    }
    Ok(())
  }

  /// Register a `$name$` substitution.
  pub fn export_variable(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
    self.ensure_unfrozen("variables")?;
    self.variables.insert(name, value);
    Ok(())
  }

  pub fn variables(&self) -> &Variables {
    &self.variables
  }

  /// Apply every registered variable to every category.
  pub fn substitute(&mut self) -> Result<()> {
    if self.variables.is_empty() {
      return Ok(());
    }
    self.ensure_unfrozen("categories")?;
    for set in &mut self.categories {
      set.substitute(&self.variables)?;
    }
    Ok(())
  }

  pub fn compiler(&self) -> Option<&str> {
    self.compiler.as_deref()
  }

  pub fn set_compiler(&mut self, name: impl Into<String>) -> Result<()> {
    self.ensure_unfrozen("compiler")?;
    self.compiler = Some(name.into());
    Ok(())
  }

  pub fn preprocessor(&self) -> Option<&str> {
    self.preprocessor.as_deref()
  }

  pub fn set_preprocessor(&mut self, name: impl Into<String>) -> Result<()> {
    self.ensure_unfrozen("preprocessor")?;
    self.preprocessor = Some(name.into());
    Ok(())
  }

  /// Append every category of `other` after this facet's tokens.
  pub fn combine_append(&mut self, other: &Facet) -> Result<()> {
    self.adopt(other)?;
    for (mine, theirs) in self.categories.iter_mut().zip(&other.categories) {
      mine.merge_append(theirs)?;
    }
    Ok(())
  }

  /// Prepend every category of `other` before this facet's tokens.
  pub fn combine_prepend(&mut self, other: &Facet) -> Result<()> {
    self.adopt(other)?;
    for (mine, theirs) in self.categories.iter_mut().zip(&other.categories) {
      mine.merge_prepend(theirs)?;
    }
    Ok(())
  }

  /// Remove every token `other` carries and forget its variables.
  pub fn subtract(&mut self, other: &Facet) -> Result<()> {
    self.ensure_unfrozen("categories")?;
    for (mine, theirs) in self.categories.iter_mut().zip(&other.categories) {
      if !theirs.is_empty() {
        mine.remove(theirs)?;
      }
    }
    for name in other.variables.names() {
      self.variables.remove(name);
    }
    Ok(())
  }

  /// Make the facet and all of its categories permanently immutable.
  pub fn freeze(&mut self) {
    self.frozen = true;
    for set in &mut self.categories {
      set.freeze();
    }
  }

  pub fn is_frozen(&self) -> bool {
    self.frozen
  }

  /// Deep copy that can be mutated again, even if `self` is frozen.
  pub fn unfrozen_copy(&self) -> Self {
    Self {
      categories: std::array::from_fn(|i| self.categories[i].unfrozen_copy()),
      variables: self.variables.clone(),
      compiler: self.compiler.clone(),
      preprocessor: self.preprocessor.clone(),
      frozen: false,
    }
  }

  /// Whether no category holds a token and no variable is exported.
  pub fn is_empty(&self) -> bool {
    self.variables.is_empty() && self.categories.iter().all(ValueSet::is_empty)
  }

  fn adopt(&mut self, other: &Facet) -> Result<()> {
    self.ensure_unfrozen("categories")?;
    if let Some(compiler) = &other.compiler {
      self.compiler = Some(compiler.clone());
    }
    if let Some(preprocessor) = &other.preprocessor {
      self.preprocessor = Some(preprocessor.clone());
    }
    self.variables.merge(&other.variables);
    Ok(())
  }

  fn ensure_mutable(&self, category: Category) -> Result<()> {
    if self.frozen {
      return Err(Error::frozen_category(category));
    }
    Ok(())
  }

  fn ensure_unfrozen(&self, what: &str) -> Result<()> {
    if self.frozen {
      return Err(Error::FrozenFacet { what: what.to_string() });
    }
    Ok(())
  }
}

impl PartialEq for Facet {
  fn eq(&self, other: &Self) -> bool {
    self.variables == other.variables && self.categories == other.categories
  }
}

impl Eq for Facet {}

#[derive(Serialize)]
struct FacetView<'a> {
  compiler: Option<&'a str>,
  preprocessor: Option<&'a str>,
  variables: &'a Variables,
  categories: BTreeMap<&'static str, &'a ValueSet>,
}

impl Serialize for Facet {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    FacetView {
      compiler: self.compiler(),
      preprocessor: self.preprocessor(),
      variables: &self.variables,
      categories: Category::ALL
        .into_iter()
        .filter(|c| !self.get(*c).is_empty())
        .map(|c| (c.as_str(), self.get(c)))
        .collect(),
    }
    .serialize(serializer)
  }
}
