//! Build configurations (debug, release, ...).

use std::fmt;

use crate::policy::{AsPolicy, Policy};
use crate::target::LinkMode;

#[derive(Debug)]
pub struct Configuration {
  policy: Policy,
  default_link: LinkMode,
}

impl Configuration {
  /// A configuration that links libraries statically unless a target says otherwise.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      policy: Policy::new(name),
      default_link: LinkMode::Static,
    }
  }

  pub fn with_default_link(mut self, link: LinkMode) -> Self {
    self.default_link = link;
    self
  }

  /// Link mode for libraries that leave theirs unset.
  pub fn default_link(&self) -> LinkMode {
    self.default_link
  }
}

impl AsPolicy for Configuration {
  fn policy(&self) -> &Policy {
    &self.policy
  }

  fn policy_mut(&mut self) -> &mut Policy {
    &mut self.policy
  }
}

impl fmt::Display for Configuration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.policy.name())
  }
}
