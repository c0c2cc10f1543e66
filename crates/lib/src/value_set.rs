//! Ordered, duplicate-aware token lists.
//!
//! A [`ValueSet`] is the leaf of every facet category: a list of scalar
//! [`Value`]s that keeps insertion order (compiler command lines are order
//! sensitive) but compares as a multiset.
//!
//! # Flattening
//!
//! `append`/`prepend`/`remove` accept anything implementing [`IntoValues`]: a
//! single scalar, a slice/array/`Vec` of scalars, or another `ValueSet`. Nested
//! sequences are flattened one level.
//!
//! # Strict mode
//!
//! In strict mode, declaring a literal text token that is already present is an
//! error. Path-like tokens (starting with `\`, `/` or `-`) are exempt, so
//! repeated flags and absolute paths never trip the check.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::vars::Variables;

/// A single scalar token.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
  Text(String),
  Number(i64),
  /// A symbolic name (e.g. a warning id) that never takes part in substitution.
  Symbol(String),
}

impl Value {
  pub fn symbol(name: impl Into<String>) -> Self {
    Self::Symbol(name.into())
  }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Text(s) => Some(s),
      _ => None,
    }
  }

  /// Whether the token is exempt from duplicate-literal detection.
  pub fn is_path_like(&self) -> bool {
    match self {
      Self::Text(s) => s.starts_with('\\') || s.starts_with('/') || s.starts_with('-'),
      Self::Number(_) | Self::Symbol(_) => false,
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Text(s) | Self::Symbol(s) => f.write_str(s),
      Self::Number(n) => write!(f, "{n}"),
    }
  }
}

impl Serialize for Value {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::Text(s) | Self::Symbol(s) => serializer.serialize_str(s),
      Self::Number(n) => serializer.serialize_i64(*n),
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Self::Text(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Self::Text(s)
  }
}

impl From<&String> for Value {
  fn from(s: &String) -> Self {
    Self::Text(s.clone())
  }
}

impl From<i64> for Value {
  fn from(n: i64) -> Self {
    Self::Number(n)
  }
}

impl From<i32> for Value {
  fn from(n: i32) -> Self {
    Self::Number(i64::from(n))
  }
}

impl From<&Path> for Value {
  fn from(p: &Path) -> Self {
    Self::Text(p.to_string_lossy().into_owned())
  }
}

impl From<PathBuf> for Value {
  fn from(p: PathBuf) -> Self {
    Self::from(p.as_path())
  }
}

impl From<&PathBuf> for Value {
  fn from(p: &PathBuf) -> Self {
    Self::from(p.as_path())
  }
}

/// Anything that can be flattened into a list of values.
pub trait IntoValues {
  fn into_values(self) -> Vec<Value>;
}

macro_rules! scalar_into_values {
  ($($ty:ty),* $(,)?) => {
    $(
      impl IntoValues for $ty {
        fn into_values(self) -> Vec<Value> {
          vec![Value::from(self)]
        }
      }
    )*
  };
}

scalar_into_values!(&str, String, &String, i64, i32, &Path, PathBuf, &PathBuf);

impl IntoValues for Value {
  fn into_values(self) -> Vec<Value> {
    vec![self]
  }
}

impl<T: Into<Value>> IntoValues for Vec<T> {
  fn into_values(self) -> Vec<Value> {
    self.into_iter().map(Into::into).collect()
  }
}

impl<T: Into<Value>, const N: usize> IntoValues for [T; N] {
  fn into_values(self) -> Vec<Value> {
    self.into_iter().map(Into::into).collect()
  }
}

impl<T: Into<Value> + Clone> IntoValues for &[T] {
  fn into_values(self) -> Vec<Value> {
    self.iter().cloned().map(Into::into).collect()
  }
}

impl IntoValues for &ValueSet {
  fn into_values(self) -> Vec<Value> {
    self.values.clone()
  }
}

impl IntoValues for ValueSet {
  fn into_values(self) -> Vec<Value> {
    self.values
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueSetError {
  #[error("value set is frozen")]
  Frozen,

  #[error("duplicate definition of '{0}'")]
  DuplicateLiteral(String),
}

/// Ordered list of tokens with freeze and strict-duplicate discipline.
#[derive(Debug, Clone, Default)]
pub struct ValueSet {
  values: Vec<Value>,
  frozen: bool,
  strict: bool,
}

impl ValueSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// An empty set that rejects re-declared literals.
  pub fn strict() -> Self {
    Self {
      strict: true,
      ..Self::default()
    }
  }

  pub fn set_strict(&mut self, strict: bool) {
    self.strict = strict;
  }

  pub fn is_strict(&self) -> bool {
    self.strict
  }

  pub fn freeze(&mut self) {
    self.frozen = true;
  }

  pub fn is_frozen(&self) -> bool {
    self.frozen
  }

  /// Append values after the current contents.
  pub fn append(&mut self, values: impl IntoValues) -> Result<(), ValueSetError> {
    let values = values.into_values();
    self.check_declared(&values)?;
    self.values.extend(values);
    Ok(())
  }

  /// Insert values before the current contents, keeping their relative order.
  pub fn prepend(&mut self, values: impl IntoValues) -> Result<(), ValueSetError> {
    let mut values = values.into_values();
    self.check_declared(&values)?;
    values.append(&mut self.values);
    self.values = values;
    Ok(())
  }

  /// Remove every token equal to one of `values`.
  pub fn remove(&mut self, values: impl IntoValues) -> Result<(), ValueSetError> {
    self.ensure_mutable()?;
    let values = values.into_values();
    self.values.retain(|v| !values.contains(v));
    Ok(())
  }

  /// Append another set's tokens without duplicate detection.
  ///
  /// Composition of facets merges contributions from several owners, where the
  /// same token legitimately appears more than once.
  pub fn merge_append(&mut self, other: &ValueSet) -> Result<(), ValueSetError> {
    self.ensure_mutable()?;
    self.values.extend(other.values.iter().cloned());
    Ok(())
  }

  /// Prepend another set's tokens without duplicate detection.
  pub fn merge_prepend(&mut self, other: &ValueSet) -> Result<(), ValueSetError> {
    self.ensure_mutable()?;
    let mut merged = other.values.clone();
    merged.append(&mut self.values);
    self.values = merged;
    Ok(())
  }

  pub fn contains(&self, value: impl Into<Value>) -> bool {
    let value = value.into();
    self.values.contains(&value)
  }

  /// Rewrite `$NAME$` references in text tokens.
  ///
  /// Only tokens containing `$` are touched; numbers and symbols never are.
  pub fn substitute(&mut self, vars: &Variables) -> Result<(), ValueSetError> {
    self.ensure_mutable()?;
    for value in &mut self.values {
      if let Value::Text(s) = value
        && s.contains('$')
      {
        *s = vars.substitute(s);
      }
    }
    Ok(())
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Value> {
    self.values.iter()
  }

  pub fn as_slice(&self) -> &[Value] {
    &self.values
  }

  /// Tokens rendered as strings, in order.
  pub fn to_strings(&self) -> Vec<String> {
    self.values.iter().map(ToString::to_string).collect()
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Unfrozen deep copy, keeping strictness.
  pub fn unfrozen_copy(&self) -> Self {
    Self {
      values: self.values.clone(),
      frozen: false,
      strict: self.strict,
    }
  }

  fn ensure_mutable(&self) -> Result<(), ValueSetError> {
    if self.frozen {
      return Err(ValueSetError::Frozen);
    }
    Ok(())
  }

  fn check_declared(&self, incoming: &[Value]) -> Result<(), ValueSetError> {
    self.ensure_mutable()?;
    if !self.strict {
      return Ok(());
    }
    for (i, value) in incoming.iter().enumerate() {
      let Value::Text(text) = value else {
        continue;
      };
      if value.is_path_like() {
        continue;
      }
      if self.values.contains(value) || incoming[..i].contains(value) {
        return Err(ValueSetError::DuplicateLiteral(text.clone()));
      }
    }
    Ok(())
  }
}

impl PartialEq for ValueSet {
  fn eq(&self, other: &Self) -> bool {
    if self.values.len() != other.values.len() {
      return false;
    }
    let mut lhs = self.values.clone();
    let mut rhs = other.values.clone();
    lhs.sort();
    rhs.sort();
    lhs == rhs
  }
}

impl Eq for ValueSet {}

impl Serialize for ValueSet {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(&self.values)
  }
}

impl<'a> IntoIterator for &'a ValueSet {
  type Item = &'a Value;
  type IntoIter = std::slice::Iter<'a, Value>;

  fn into_iter(self) -> Self::IntoIter {
    self.values.iter()
  }
}

impl<V: Into<Value>> FromIterator<V> for ValueSet {
  fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
    Self {
      values: iter.into_iter().map(Into::into).collect(),
      ..Self::default()
    }
  }
}
