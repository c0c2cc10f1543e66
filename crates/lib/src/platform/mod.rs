//! Target platforms.
//!
//! A [`Platform`] is a policy naming one build target system (e.g. `linux64`)
//! together with the OS and architecture that decide artifact naming.

pub mod arch;
pub mod os;

use arch::Arch;
use os::Os;
use std::fmt;

use crate::policy::{AsPolicy, Policy};

#[derive(Debug)]
pub struct Platform {
  policy: Policy,
  pub arch: Arch,
  pub os: Os,
}

impl Platform {
  pub fn new(name: impl Into<String>, os: Os, arch: Arch) -> Self {
    Self {
      policy: Policy::new(name),
      arch,
      os,
    }
  }

  /// A platform for the running system, named by its triple (e.g. "aarch64-darwin")
  ///
  /// Returns `None` if the OS or architecture is not supported
  pub fn host() -> Option<Self> {
    let os = Os::current()?;
    let arch = Arch::current()?;
    Some(Self::new(format!("{arch}-{os}"), os, arch))
  }

  /// Returns the platform triple string (e.g., "aarch64-darwin")
  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.os)
  }
}

impl AsPolicy for Platform {
  fn policy(&self) -> &Policy {
    &self.policy
  }

  fn policy_mut(&mut self) -> &mut Policy {
    &mut self.policy
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.policy.name())
  }
}
