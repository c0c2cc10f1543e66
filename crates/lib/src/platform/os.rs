use std::fmt;

/// Operating system families, which decide artifact file naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "windows",
    }
  }

  pub fn executable_suffix(&self) -> &'static str {
    match self {
      Self::Windows => ".exe",
      Self::Linux | Self::MacOs => "",
    }
  }

  /// Prefix shared by static and shared libraries.
  pub fn library_prefix(&self) -> &'static str {
    match self {
      Self::Windows => "",
      Self::Linux | Self::MacOs => "lib",
    }
  }

  pub fn static_library_suffix(&self) -> &'static str {
    match self {
      Self::Windows => ".lib",
      Self::Linux | Self::MacOs => ".a",
    }
  }

  pub fn shared_library_suffix(&self) -> &'static str {
    match self {
      Self::Linux => ".so",
      Self::MacOs => ".dylib",
      Self::Windows => ".dll",
    }
  }

  pub fn object_suffix(&self) -> &'static str {
    match self {
      Self::Windows => ".obj",
      Self::Linux | Self::MacOs => ".o",
    }
  }

  pub fn debug_symbols_suffix(&self) -> &'static str {
    match self {
      Self::Linux => ".debug",
      Self::MacOs => ".dSYM",
      Self::Windows => ".pdb",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
