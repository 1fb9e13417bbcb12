//! Recipe sources.
//!
//! Every source of recipes implements [`Repository`]. The manager probes
//! repositories in a fixed precedence order, so a repository only has to
//! answer for itself.
//!
//! # Modules
//!
//! - [`resource`] - Recipes bundled with the installer
//! - [`directory`] - Recipes in a local directory tree
//! - [`git`] - A git remote cloned into the cache
//! - [`zip`] - A zip archive extracted into the cache
//! - [`remote`] - Recipes served over plain HTTP
//! - [`factory`] - URI classification and construction
//! - [`manager`] - Precedence-ordered aggregation
//! - [`cache`] - URI-derived cache directories

pub mod cache;
pub mod directory;
pub mod factory;
pub mod git;
mod http;
pub mod manager;
pub mod remote;
pub mod resource;
pub mod zip;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::recipe::{Recipe, RecipeError};
use crate::registry::Registry;

pub use directory::DirectoryRepository;
pub use factory::{classify, create_repository};
pub use git::GitRepository;
pub use manager::{Catalog, RepositoryManager};
pub use remote::RemoteRepository;
pub use resource::ResourceRepository;
pub use zip::ZipRepository;

/// The kind of source a repository reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryKind {
  Resource,
  Directory,
  Git,
  Zip,
  Remote,
  Registry,
}

impl RepositoryKind {
  pub fn as_str(self) -> &'static str {
    match self {
      RepositoryKind::Resource => "resource",
      RepositoryKind::Directory => "directory",
      RepositoryKind::Git => "git",
      RepositoryKind::Zip => "zip",
      RepositoryKind::Remote => "remote",
      RepositoryKind::Registry => "registry",
    }
  }
}

impl fmt::Display for RepositoryKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Errors raised while initializing a repository.
///
/// These never cross the manager: a repository that fails to initialize is
/// kept and behaves as an empty source.
#[derive(Debug, Error)]
pub enum RepositoryError {
  /// The local path does not exist.
  #[error("path does not exist: {0}")]
  PathNotFound(PathBuf),

  /// The local path is not a directory.
  #[error("not a directory: {0}")]
  NotADirectory(PathBuf),

  /// Cloning or updating a git checkout failed.
  #[error(transparent)]
  Fetch(#[from] git::FetchError),

  /// An HTTP request failed.
  #[error("request to '{url}' failed: {source}")]
  Http {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The server answered with a non-success status.
  #[error("request to '{url}' returned HTTP {status}")]
  HttpStatus { url: String, status: u16 },

  /// The archive could not be opened or extracted.
  #[error("failed to extract archive '{path}': {source}")]
  Extract {
    path: PathBuf,
    #[source]
    source: ::zip::result::ZipError,
  },

  /// The remote recipe index is not valid.
  #[error("invalid recipe index at '{url}': {reason}")]
  InvalidIndex { url: String, reason: String },

  /// Filesystem error while preparing the source.
  #[error("I/O error at '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// A source of recipes.
///
/// All methods are blocking. `init` must be called before the repository is
/// queried; until then it reports no recipes.
pub trait Repository: fmt::Debug {
  /// Display identity.
  fn name(&self) -> &str;

  /// Source locator the repository was created from.
  fn uri(&self) -> &str;

  fn kind(&self) -> RepositoryKind;

  /// Discover recipes. Calling it again refreshes the catalog.
  fn init(&mut self) -> Result<(), RepositoryError>;

  fn is_initialized(&self) -> bool;

  /// Catalog snapshot as of the last `init` or mutation.
  fn list_recipes(&self) -> Vec<Recipe>;

  /// Exact-name lookup within this repository.
  ///
  /// `Ok(None)` means the repository does not have the recipe. `Err` means it
  /// has a recipe file by that name that cannot be loaded.
  fn resolve_recipe(&self, name: &str) -> Result<Option<Recipe>, RecipeError>;

  /// Original recipe file text, for sources that keep it.
  fn recipe_yaml_content(&self, _name: &str) -> Option<String> {
    None
  }

  /// Original recipe file name, for sources that keep it.
  fn recipe_file_name(&self, _name: &str) -> Option<String> {
    None
  }

  /// Human-readable identity for diagnostics.
  fn describe(&self) -> String {
    format!("{} ({} repository at {})", self.name(), self.kind(), self.uri())
  }

  /// Downcast to the install registry.
  fn as_registry(&self) -> Option<&Registry> {
    None
  }
}

/// Recipes loaded by a repository, plus the names whose files failed to load.
#[derive(Debug, Default)]
pub(crate) struct RecipeSet {
  recipes: BTreeMap<String, Recipe>,
  broken: BTreeMap<String, (String, String)>,
}

impl RecipeSet {
  /// Insert a recipe. Returns `false` if the name is already taken.
  pub fn insert(&mut self, recipe: Recipe) -> bool {
    if self.recipes.contains_key(recipe.name()) || self.broken.contains_key(recipe.name()) {
      return false;
    }
    self.recipes.insert(recipe.name().to_string(), recipe);
    true
  }

  /// Remember that `name` exists at `location` but failed to load.
  pub fn mark_broken(&mut self, name: &str, location: String, reason: String) {
    if !self.recipes.contains_key(name) {
      self.broken.entry(name.to_string()).or_insert((location, reason));
    }
  }

  pub fn contains(&self, name: &str) -> bool {
    self.recipes.contains_key(name)
  }

  pub fn resolve(&self, name: &str) -> Result<Option<Recipe>, RecipeError> {
    if let Some(recipe) = self.recipes.get(name) {
      return Ok(Some(recipe.clone()));
    }
    match self.broken.get(name) {
      Some((location, reason)) => Err(RecipeError::Malformed {
        name: name.to_string(),
        location: location.clone(),
        reason: reason.clone(),
      }),
      None => Ok(None),
    }
  }

  pub fn list(&self) -> Vec<Recipe> {
    self.recipes.values().cloned().collect()
  }

  pub fn clear(&mut self) {
    self.recipes.clear();
    self.broken.clear();
  }
}
