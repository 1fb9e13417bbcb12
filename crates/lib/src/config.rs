//! Persisted levain configuration.
//!
//! Stored as `config.json` in the levain home:
//!
//! ```json
//! {
//!   "repos": [
//!     "https://github.com/jmoalves/levain-pkgs.git",
//!     { "uri": "/shared/recipes", "name": "team" }
//!   ],
//!   "extraDir": "/home/me/recipes",
//!   "baseRecipe": "levain"
//! }
//! ```
//!
//! Every field is optional. A missing file means the defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::consts::{DEFAULT_BASE_RECIPE, RECIPES_DIR_ENV};
use crate::platform::paths::Layout;
use crate::registry::Registry;
use crate::repository::{DirectoryRepository, RepositoryManager, ResourceRepository, create_repository};

/// Display name of the repository built from the extra directory.
pub const EXTRA_DIR_REPOSITORY: &str = "extra";

/// Errors that can occur when loading or saving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config file '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to write config file '{path}': {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to serialize config: {0}")]
  Serialize(#[source] serde_json::Error),
}

/// A configured repository: a bare URI or a URI with a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepoEntry {
  Uri(String),
  Named {
    uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
  },
}

impl RepoEntry {
  pub fn new(uri: impl Into<String>, name: Option<String>) -> Self {
    match name.filter(|n| !n.trim().is_empty()) {
      Some(name) => RepoEntry::Named {
        uri: uri.into(),
        name: Some(name),
      },
      None => RepoEntry::Uri(uri.into()),
    }
  }

  pub fn uri(&self) -> &str {
    match self {
      RepoEntry::Uri(uri) | RepoEntry::Named { uri, .. } => uri,
    }
  }

  pub fn name(&self) -> Option<&str> {
    match self {
      RepoEntry::Uri(_) => None,
      RepoEntry::Named { name, .. } => name.as_deref(),
    }
  }
}

/// The levain configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
  /// Recipe sources in precedence order.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub repos: Vec<RepoEntry>,

  /// A local directory searched after the configured repositories.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub extra_dir: Option<PathBuf>,

  /// Recipe every other recipe implicitly depends on.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub base_recipe: Option<String>,
}

impl Config {
  /// Load the configuration at `path`. A missing file yields the defaults.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Self::default());
      }
      Err(source) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    if content.trim().is_empty() {
      return Ok(Self::default());
    }

    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Save to `path` atomically (temp file, then rename).
  pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
    let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
    let write_err = |source| ConfigError::Write {
      path: path.to_path_buf(),
      source,
    };

    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(write_err)?;
    }
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content).map_err(write_err)?;
    fs::rename(&temp_path, path).map_err(write_err)?;
    Ok(())
  }

  /// Apply `LEVAIN_RECIPES_DIR`, which overrides the configured extra directory.
  pub fn apply_env(&mut self) {
    if let Ok(dir) = std::env::var(RECIPES_DIR_ENV)
      && !dir.trim().is_empty()
    {
      debug!(dir = %dir, "extra recipes directory from environment");
      self.extra_dir = Some(PathBuf::from(dir));
    }
  }

  /// The base recipe name.
  pub fn base_recipe(&self) -> String {
    self
      .base_recipe
      .as_deref()
      .map(str::trim)
      .filter(|b| !b.is_empty())
      .unwrap_or(DEFAULT_BASE_RECIPE)
      .to_string()
  }

  /// Append a repository. Returns `false` if the URI is already configured.
  pub fn add_repository(&mut self, uri: &str, name: Option<String>) -> bool {
    let uri = uri.trim();
    if uri.is_empty() || self.repos.iter().any(|r| r.uri() == uri) {
      return false;
    }
    self.repos.push(RepoEntry::new(uri, name));
    true
  }

  /// Remove the repository with this URI or name. Returns whether one was removed.
  pub fn remove_repository(&mut self, uri_or_name: &str) -> bool {
    let before = self.repos.len();
    self
      .repos
      .retain(|r| r.uri() != uri_or_name && r.name() != Some(uri_or_name));
    self.repos.len() != before
  }

  /// Build a manager in precedence order: bundled recipes, configured
  /// repositories, the extra directory, then the registry.
  pub fn build_manager(&self, layout: &Layout) -> RepositoryManager {
    let mut manager = RepositoryManager::new();
    manager.add(Box::new(ResourceRepository::bundled()));

    let cache_root = layout.cache_dir();
    for entry in &self.repos {
      match create_repository(Some(entry.uri()), entry.name(), &cache_root) {
        Some(repository) => manager.add(repository),
        None => warn!(uri = %entry.uri(), "skipping unsupported repository"),
      }
    }

    if let Some(dir) = &self.extra_dir {
      manager.add(Box::new(DirectoryRepository::new(EXTRA_DIR_REPOSITORY, dir)));
    }

    manager.add(Box::new(Registry::new(layout.registry_dir())));
    manager
  }
}
