//! The install registry.
//!
//! A flat directory holding one `<name>.levain.yaml` per installed recipe and
//! an optional `<name>.levain.meta` JSON sidecar with install provenance.
//! The registry is also a [`Repository`], so installed recipes resolve
//! without going back to their original source.
//!
//! Queries always read the directory, so a store or remove is visible to the
//! next lookup without re-initializing. Writers serialize through
//! [`Registry::lock`].

pub mod lock;
pub mod metadata;

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::consts::{META_EXTENSION, RECIPE_EXTENSION};
use crate::platform::paths;
use crate::recipe::{Recipe, RecipeError, is_valid_recipe_name, recipe_file_name, recipe_name_from_file_name};
use crate::repository::{Repository, RepositoryError, RepositoryKind};

pub use lock::{LOCK_FILE_NAME, LockHolder, RegistryGuard, RegistryLockError};
pub use metadata::{InstallMetadata, Provenance};

/// Display name of the registry repository.
pub const REGISTRY_NAME: &str = "registry";

/// Errors that can occur while mutating the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
  /// The recipe name already carries the canonical extension.
  #[error("refusing to store '{0}': the name already ends in '.levain.yaml'")]
  DoubledExtension(String),

  /// The recipe name cannot be used as a file name.
  #[error("refusing to store '{0}': not a valid recipe name")]
  InvalidName(String),

  #[error("failed to create registry directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write '{path}': {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to remove '{path}': {source}")]
  Remove {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to read registry directory '{path}': {source}")]
  ReadDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to serialize install metadata for '{name}': {source}")]
  Metadata {
    name: String,
    #[source]
    source: serde_json::Error,
  },
}

/// The locally installed recipes.
#[derive(Debug)]
pub struct Registry {
  dir: PathBuf,
  uri: String,
  initialized: Cell<bool>,
}

impl Registry {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    let dir = dir.into();
    Self {
      uri: dir.display().to_string(),
      dir,
      initialized: Cell::new(false),
    }
  }

  /// The registry under the levain home directory.
  pub fn default_registry() -> Self {
    Self::new(paths::registry_dir())
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// Where `name` would be stored. Does not check that it exists.
  pub fn recipe_path(&self, name: &str) -> PathBuf {
    self.dir.join(recipe_file_name(name))
  }

  fn metadata_path(&self, name: &str) -> PathBuf {
    self.dir.join(format!("{}{}", name, META_EXTENSION))
  }

  /// Take this registry for writing on behalf of `command`.
  ///
  /// Fails at once with [`RegistryLockError::Busy`] while another process
  /// holds it. Keep the guard until the last store or remove.
  pub fn lock(&self, command: &str) -> Result<RegistryGuard, RegistryLockError> {
    RegistryGuard::acquire(&self.dir, command)
  }

  pub fn is_installed(&self, name: &str) -> bool {
    self.ensure_initialized();
    is_valid_recipe_name(name) && self.recipe_path(name).is_file()
  }

  /// Write `yaml_content` as the registry entry for `recipe`.
  ///
  /// The file is always named `<name>.levain.yaml`; `file_name_hint` is only
  /// logged when it differs. Invalid names are rejected before anything is
  /// written. A metadata sidecar left by an earlier install is deleted, since
  /// it no longer describes this entry.
  pub fn store(
    &self,
    recipe: &Recipe,
    yaml_content: &str,
    file_name_hint: Option<&str>,
  ) -> Result<PathBuf, RegistryError> {
    let path = self.write_entry(recipe, yaml_content, file_name_hint)?;
    if remove_if_present(&self.metadata_path(recipe.name()))? {
      debug!(recipe = recipe.name(), "dropped install metadata of the previous entry");
    }
    Ok(path)
  }

  fn write_entry(
    &self,
    recipe: &Recipe,
    yaml_content: &str,
    file_name_hint: Option<&str>,
  ) -> Result<PathBuf, RegistryError> {
    self.ensure_initialized();
    let name = recipe.name();
    if name.contains(RECIPE_EXTENSION) {
      return Err(RegistryError::DoubledExtension(name.to_string()));
    }
    if !is_valid_recipe_name(name) {
      return Err(RegistryError::InvalidName(name.to_string()));
    }

    let file_name = recipe_file_name(name);
    if let Some(hint) = file_name_hint
      && hint != file_name
    {
      debug!(recipe = name, hint, "ignoring non-canonical file name hint");
    }

    fs::create_dir_all(&self.dir).map_err(|source| RegistryError::CreateDir {
      path: self.dir.clone(),
      source,
    })?;

    let path = self.dir.join(&file_name);
    write_atomic(&path, yaml_content.as_bytes())?;
    info!(recipe = name, path = %path.display(), "recipe recorded in registry");
    Ok(path)
  }

  /// Like [`Registry::store`], also writing an install metadata sidecar.
  pub fn store_with_provenance(
    &self,
    recipe: &Recipe,
    yaml_content: &str,
    file_name_hint: Option<&str>,
    provenance: &Provenance,
  ) -> Result<PathBuf, RegistryError> {
    let metadata = InstallMetadata::now(recipe, provenance);
    let json = serde_json::to_string_pretty(&metadata).map_err(|source| RegistryError::Metadata {
      name: recipe.name().to_string(),
      source,
    })?;

    let path = self.write_entry(recipe, yaml_content, file_name_hint)?;
    write_atomic(&self.metadata_path(recipe.name()), json.as_bytes())?;
    Ok(path)
  }

  /// Remove `name` and its metadata sidecar.
  ///
  /// Returns whether anything was removed. Removing a recipe that is not
  /// installed is not an error.
  pub fn remove(&self, name: &str) -> Result<bool, RegistryError> {
    self.ensure_initialized();
    if !is_valid_recipe_name(name) {
      return Ok(false);
    }

    let mut removed = remove_if_present(&self.recipe_path(name))?;
    removed |= remove_if_present(&self.metadata_path(name))?;
    if removed {
      info!(recipe = name, "recipe removed from registry");
    }
    Ok(removed)
  }

  /// Remove every installed recipe. Returns how many were removed.
  pub fn clear(&self) -> Result<usize, RegistryError> {
    let names = self.list_installed_names()?;
    let mut count = 0;
    for name in &names {
      if self.remove(name)? {
        count += 1;
      }
    }
    Ok(count)
  }

  /// Install metadata for `name`, if a well-formed sidecar exists.
  pub fn get_metadata(&self, name: &str) -> Option<InstallMetadata> {
    self.ensure_initialized();
    if !is_valid_recipe_name(name) {
      return None;
    }

    let path = self.metadata_path(name);
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
      Ok(metadata) => Some(metadata),
      Err(e) => {
        warn!(recipe = name, path = %path.display(), error = %e, "ignoring malformed install metadata");
        None
      }
    }
  }

  /// Number of installed recipes. Zero when the directory is missing.
  pub fn size(&self) -> usize {
    self.installed_files().map(|files| files.len()).unwrap_or(0)
  }

  /// Names of installed recipes, sorted, without parsing them.
  pub fn list_installed_names(&self) -> Result<Vec<String>, RegistryError> {
    self.ensure_initialized();
    Ok(
      self
        .installed_files()?
        .into_iter()
        .map(|(name, _)| name)
        .collect(),
    )
  }

  /// Valid recipe files in the registry directory, sorted by name.
  fn installed_files(&self) -> Result<Vec<(String, PathBuf)>, RegistryError> {
    if !self.dir.is_dir() {
      return Ok(Vec::new());
    }

    let entries = fs::read_dir(&self.dir).map_err(|source| RegistryError::ReadDir {
      path: self.dir.clone(),
      source,
    })?;

    let mut files = Vec::new();
    for entry in entries.flatten() {
      let path = entry.path();
      if !path.is_file() {
        continue;
      }
      let file_name = entry.file_name().to_string_lossy().into_owned();
      match recipe_name_from_file_name(&file_name) {
        Ok(Some(name)) => files.push((name, path)),
        Ok(None) => {}
        Err(issue) => warn!(path = %path.display(), %issue, "ignoring mis-named registry file"),
      }
    }
    files.sort();
    Ok(files)
  }

  fn ensure_initialized(&self) {
    if !self.initialized.get() {
      debug!(dir = %self.dir.display(), "initializing registry on first access");
      self.initialized.set(true);
    }
  }
}

impl Repository for Registry {
  fn name(&self) -> &str {
    REGISTRY_NAME
  }

  fn uri(&self) -> &str {
    &self.uri
  }

  fn kind(&self) -> RepositoryKind {
    RepositoryKind::Registry
  }

  fn init(&mut self) -> Result<(), RepositoryError> {
    if self.dir.exists() && !self.dir.is_dir() {
      return Err(RepositoryError::NotADirectory(self.dir.clone()));
    }
    self.initialized.set(true);
    debug!(dir = %self.dir.display(), installed = self.size(), "registry initialized");
    Ok(())
  }

  fn is_initialized(&self) -> bool {
    self.initialized.get()
  }

  fn list_recipes(&self) -> Vec<Recipe> {
    self.ensure_initialized();
    let files = match self.installed_files() {
      Ok(files) => files,
      Err(e) => {
        warn!(error = %e, "cannot list registry");
        return Vec::new();
      }
    };

    files
      .into_iter()
      .filter_map(|(_, path)| match Recipe::from_file(&path) {
        Ok(recipe) => Some(recipe),
        Err(e) => {
          warn!(path = %path.display(), error = %e, "skipping corrupt registry entry");
          None
        }
      })
      .collect()
  }

  fn resolve_recipe(&self, name: &str) -> Result<Option<Recipe>, RecipeError> {
    self.ensure_initialized();
    if !is_valid_recipe_name(name) {
      return Ok(None);
    }
    let path = self.recipe_path(name);
    if !path.is_file() {
      return Ok(None);
    }
    Recipe::from_file(&path).map(Some)
  }

  fn recipe_yaml_content(&self, name: &str) -> Option<String> {
    if !self.is_installed(name) {
      return None;
    }
    fs::read_to_string(self.recipe_path(name)).ok()
  }

  fn recipe_file_name(&self, name: &str) -> Option<String> {
    self.is_installed(name).then(|| recipe_file_name(name))
  }

  fn as_registry(&self) -> Option<&Registry> {
    Some(self)
  }
}

/// Write to a hidden temp file beside `path`, then rename over it.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), RegistryError> {
  let file_name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

  let write_err = |source| RegistryError::Write {
    path: path.to_path_buf(),
    source,
  };
  fs::write(&temp_path, content).map_err(write_err)?;
  fs::rename(&temp_path, path).map_err(write_err)
}

fn remove_if_present(path: &Path) -> Result<bool, RegistryError> {
  match fs::remove_file(path) {
    Ok(()) => Ok(true),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
    Err(source) => Err(RegistryError::Remove {
      path: path.to_path_buf(),
      source,
    }),
  }
}
