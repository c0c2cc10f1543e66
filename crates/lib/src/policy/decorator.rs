use std::fmt;

use crate::environment::Environment;
use crate::error::Result;
use crate::facet::Facet;
use crate::selector::Selector;

/// Decides whether a registered facet applies to an environment.
pub type Predicate = Box<dyn Fn(&Environment) -> bool>;

/// Environment-conditional contributor of facets.
///
/// Registrations are applied in registration order, so a facet registered
/// first lands earlier in the output's token lists.
#[derive(Default)]
pub struct Decorator {
  entries: Vec<(Predicate, Facet)>,
}

impl Decorator {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(&mut self, facet: Facet, predicate: impl Fn(&Environment) -> bool + 'static) {
    self.entries.push((Box::new(predicate), facet));
  }

  /// Register a facet for environments matching every given selector.
  ///
  /// An absent selector matches anything.
  pub fn register_filtered(
    &mut self,
    platform: Option<Selector>,
    config: Option<Selector>,
    compiler: Option<Selector>,
    facet: Facet,
  ) {
    self.register(facet, move |env| {
      platform.as_ref().is_none_or(|s| s.matches(env.platform_name()))
        && config.as_ref().is_none_or(|s| s.matches(env.config_name()))
        && compiler.as_ref().is_none_or(|s| s.matches(env.compiler_name()))
    });
  }

  /// Append every facet whose predicate accepts `env` into `output`.
  pub fn apply_matching(&self, output: &mut Facet, env: &Environment) -> Result<usize> {
    let mut applied = 0;
    for (predicate, facet) in &self.entries {
      if predicate(env) {
        output.combine_append(facet)?;
        applied += 1;
      }
    }
    Ok(applied)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl fmt::Debug for Decorator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Decorator").field("entries", &self.entries.len()).finish()
  }
}
