//! Policies: named owners of a facet plus deferred customizations.
//!
//! Platforms, configurations, compilers, namespaces and targets all embed a
//! [`Policy`] and expose it through [`AsPolicy`]. A policy contributes in two
//! ways:
//!
//! - `decorate` prepends its static facet into an output facet, so structural
//!   defaults land before anything added afterwards.
//! - `customize` runs its callbacks, in registration order, against the output
//!   facet of a specific (environment, target) expansion.

mod decorator;

pub use decorator::{Decorator, Predicate};

use std::fmt;

use crate::environment::Environment;
use crate::error::Result;
use crate::facet::Facet;
use crate::selector::Selector;
use crate::target::Target;

/// Deferred per-expansion logic. Mutates the output facet in place.
pub type Customization = Box<dyn Fn(&mut Facet, &Environment, &Target) -> Result<()>>;

pub struct Policy {
  name: String,
  facet: Facet,
  customizations: Vec<Customization>,
}

impl Policy {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      facet: Facet::new(),
      customizations: Vec::new(),
    }
  }

  pub fn with_facet(name: impl Into<String>, facet: Facet) -> Self {
    Self {
      name: name.into(),
      facet,
      customizations: Vec::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn facet(&self) -> &Facet {
    &self.facet
  }

  pub fn facet_mut(&mut self) -> &mut Facet {
    &mut self.facet
  }

  pub fn add_customization(
    &mut self,
    customization: impl Fn(&mut Facet, &Environment, &Target) -> Result<()> + 'static,
  ) {
    self.customizations.push(Box::new(customization));
  }

  pub fn customization_count(&self) -> usize {
    self.customizations.len()
  }

  /// Prepend the static facet into `output`.
  pub fn decorate(&self, output: &mut Facet) -> Result<()> {
    output.combine_prepend(&self.facet)
  }

  /// Run every customization in registration order.
  pub fn customize(&self, output: &mut Facet, env: &Environment, target: &Target) -> Result<()> {
    for customization in &self.customizations {
      customization(output, env, target)?;
    }
    Ok(())
  }

  pub fn matches(&self, selector: &Selector) -> bool {
    selector.matches(&self.name)
  }

  /// Merge `contribution` into the output only when it already carries `tag`.
  ///
  /// The tag check sees the output as built so far, so tags contributed by
  /// earlier policies (namespaces, decorators) drive later ones.
  pub fn on_tag(&mut self, tag: impl Into<String>, contribution: Facet) {
    let tag = tag.into();
    self.add_customization(move |output, _, _| {
      if output.tagged(&[tag.as_str()]) {
        output.combine_append(&contribution)?;
      }
      Ok(())
    });
  }
}

impl fmt::Debug for Policy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Policy")
      .field("name", &self.name)
      .field("facet", &self.facet)
      .field("customizations", &self.customizations.len())
      .finish()
  }
}

/// Access to the policy embedded in a platform, configuration, compiler,
/// namespace or target.
pub trait AsPolicy {
  fn policy(&self) -> &Policy;

  fn policy_mut(&mut self) -> &mut Policy;

  fn name(&self) -> &str {
    self.policy().name()
  }

  fn facet(&self) -> &Facet {
    self.policy().facet()
  }

  fn facet_mut(&mut self) -> &mut Facet {
    self.policy_mut().facet_mut()
  }

  fn matches(&self, selector: &Selector) -> bool {
    self.policy().matches(selector)
  }
}
