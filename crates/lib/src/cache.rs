//! Cached attributes.
//!
//! Expensive per-owner attributes (unity counts today) are memoized through an
//! [`AttributeCache`], keyed by `(owner, attribute)`. Within one run the same
//! key always yields the same value; a persistent implementation can carry
//! values across runs.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::Result;

pub trait AttributeCache {
  /// Return the cached value, or compute, store and return it.
  fn get_or_compute(&self, owner: &str, attribute: &str, compute: &mut dyn FnMut() -> Result<u64>) -> Result<u64>;

  /// Peek at a cached value without computing.
  fn get(&self, owner: &str, attribute: &str) -> Option<u64>;

  /// Forget a cached value so the next access recomputes it.
  fn invalidate(&self, owner: &str, attribute: &str);
}

/// In-process cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
  values: RefCell<HashMap<(String, String), u64>>,
}

impl MemoryCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.values.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.borrow().is_empty()
  }
}

impl AttributeCache for MemoryCache {
  fn get_or_compute(&self, owner: &str, attribute: &str, compute: &mut dyn FnMut() -> Result<u64>) -> Result<u64> {
    if let Some(value) = self.get(owner, attribute) {
      return Ok(value);
    }
    let value = compute()?;
    self
      .values
      .borrow_mut()
      .insert((owner.to_string(), attribute.to_string()), value);
    Ok(value)
  }

  fn get(&self, owner: &str, attribute: &str) -> Option<u64> {
    self
      .values
      .borrow()
      .get(&(owner.to_string(), attribute.to_string()))
      .copied()
  }

  fn invalidate(&self, owner: &str, attribute: &str) {
    self
      .values
      .borrow_mut()
      .remove(&(owner.to_string(), attribute.to_string()));
  }
}
