//! `$NAME$` variable parsing and substitution.
//!
//! Facets export variables that are substituted into their tokens once the
//! facet is fully composed. A reference is a name made of ASCII letters,
//! digits and underscores enclosed in single `$` characters.
//!
//! # Unknown References
//!
//! References to names that are not defined pass through unchanged, so a token
//! can be substituted again once a later stage exports the missing variable.
//!
//! # Example
//!
//! ```
//! use strata_lib::vars::{parse, Segment, Variables};
//!
//! let segments = parse("$ROOT$/lib/$PLATFORM$").unwrap();
//! assert_eq!(segments, vec![
//!     Segment::Variable("ROOT".to_string()),
//!     Segment::Literal("/lib/".to_string()),
//!     Segment::Variable("PLATFORM".to_string()),
//! ]);
//!
//! let mut vars = Variables::new();
//! vars.insert("ROOT", "/src");
//! assert_eq!(vars.substitute("$ROOT$/lib/$PLATFORM$"), "/src/lib/$PLATFORM$");
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text (no references)
  Literal(String),

  /// A `$NAME$` reference
  Variable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VarsError {
  #[error("unclosed variable reference at position {0}")]
  Unclosed(usize),
}

/// Parse a string into literal and variable segments.
///
/// A `$` that does not start a well-formed reference (for example `$5` in a
/// shell fragment or a trailing `$`) is kept as literal text.
///
/// # Errors
///
/// Returns `Unclosed` when a run of name characters following `$` reaches the
/// end of the input without a closing `$`.
pub fn parse(input: &str) -> Result<Vec<Segment>, VarsError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut rest = input;
  let mut offset = 0;

  while let Some(start) = rest.find('$') {
    literal.push_str(&rest[..start]);
    let after = &rest[start + 1..];
    let name_len = after
      .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
      .unwrap_or(after.len());

    if name_len == after.len() && name_len > 0 {
      return Err(VarsError::Unclosed(offset + start));
    }

    if name_len > 0 && after[name_len..].starts_with('$') {
      // Flush accumulated literal
      if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(&mut literal)));
      }
      segments.push(Segment::Variable(after[..name_len].to_string()));
      let consumed = start + 1 + name_len + 1;
      offset += consumed;
      rest = &rest[consumed..];
    } else {
      literal.push('$');
      offset += start + 1;
      rest = after;
    }
  }

  literal.push_str(rest);
  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

/// Names referenced in `input` that `vars` does not define.
pub fn unresolved(input: &str, vars: &Variables) -> Vec<String> {
  match parse(input) {
    Ok(segments) => segments
      .into_iter()
      .filter_map(|s| match s {
        Segment::Variable(name) if !vars.contains(&name) => Some(name),
        _ => None,
      })
      .collect(),
    Err(_) => Vec::new(),
  }
}

/// Substitution map from variable name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables(BTreeMap<String, String>);

impl Variables {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
    self.0.insert(name.into(), value.into())
  }

  pub fn remove(&mut self, name: &str) -> Option<String> {
    self.0.remove(name)
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.0.get(name).map(String::as_str)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.0.contains_key(name)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.0.keys().map(String::as_str)
  }

  /// Copy every entry of `other` into this map, overwriting existing names.
  pub fn merge(&mut self, other: &Variables) {
    for (k, v) in &other.0 {
      self.0.insert(k.clone(), v.clone());
    }
  }

  /// Replace every `$NAME$` occurrence of each defined variable.
  ///
  /// Replacement is literal. Values may themselves reference variables, so
  /// passes over the map in name order repeat until the string stops
  /// changing, at most once per variable plus one. Strings without `$` are
  /// returned unchanged.
  pub fn substitute(&self, input: &str) -> String {
    if !input.contains('$') {
      return input.to_string();
    }
    let mut result = input.to_string();
    for _ in 0..=self.0.len() {
      let pass = self.substitute_once(&result);
      if pass == result {
        break;
      }
      result = pass;
    }
    result
  }

  fn substitute_once(&self, input: &str) -> String {
    let mut result = input.to_string();
    for (name, value) in &self.0 {
      let reference = format!("${name}$");
      if result.contains(&reference) {
        result = result.replace(&reference, value);
      }
    }
    result
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}
