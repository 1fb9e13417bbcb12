use crate::consts::{APP_NAME, LEVAIN_HOME_ENV};
use std::path::{Path, PathBuf};

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  let userprofile = std::env::var("USERPROFILE").expect("USERPROFILE not set");
  PathBuf::from(userprofile)
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  let home = std::env::var("HOME").expect("HOME not set");
  PathBuf::from(home)
}

/// Returns the levain home directory.
///
/// `$LEVAIN_HOME` wins; otherwise `~/.levain`.
pub fn levain_home() -> PathBuf {
  match std::env::var(LEVAIN_HOME_ENV) {
    Ok(home) if !home.trim().is_empty() => PathBuf::from(home),
    _ => home_dir().join(format!(".{}", APP_NAME)),
  }
}

/// Directory holding one recipe file per installed recipe.
pub fn registry_dir() -> PathBuf {
  Layout::from_env().registry_dir()
}

/// Directories and files under one levain home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
  home: PathBuf,
}

impl Layout {
  pub fn new(home: impl Into<PathBuf>) -> Self {
    Self { home: home.into() }
  }

  /// Layout under [`levain_home`].
  pub fn from_env() -> Self {
    Self::new(levain_home())
  }

  pub fn home(&self) -> &Path {
    &self.home
  }

  pub fn registry_dir(&self) -> PathBuf {
    self.home.join("registry")
  }

  pub fn cache_dir(&self) -> PathBuf {
    self.home.join("cache").join("repos")
  }

  pub fn config_path(&self) -> PathBuf {
    self.home.join("config.json")
  }

  /// Where installed packages put their files, one directory per recipe.
  pub fn packages_dir(&self) -> PathBuf {
    self.home.join("pkgs")
  }
}
