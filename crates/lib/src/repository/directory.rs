//! Recipes stored in a local directory tree.
//!
//! The directory is walked recursively. Hidden directories (such as `.git`)
//! are skipped. Files with a mis-spelled recipe suffix and files that fail to
//! parse are logged and left out of the catalog without affecting the rest.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::{RecipeSet, Repository, RepositoryError, RepositoryKind};
use crate::recipe::{Recipe, RecipeError, recipe_name_from_file_name};

/// A repository backed by a local directory.
#[derive(Debug)]
pub struct DirectoryRepository {
  name: String,
  uri: String,
  root: PathBuf,
  initialized: bool,
  recipes: RecipeSet,
  paths: BTreeMap<String, PathBuf>,
}

impl DirectoryRepository {
  /// Create a repository over `root`. Nothing is read until [`Repository::init`].
  pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
    let root = root.into();
    Self {
      name: name.into(),
      uri: root.display().to_string(),
      root,
      initialized: false,
      recipes: RecipeSet::default(),
      paths: BTreeMap::new(),
    }
  }

  /// Keep `uri` as the locator reported to callers while reading from `root`.
  pub(crate) fn with_uri(mut self, uri: impl Into<String>) -> Self {
    self.uri = uri.into();
    self
  }

  /// The directory being scanned.
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Path of the file a recipe was loaded from.
  pub fn recipe_path(&self, name: &str) -> Option<&Path> {
    self.paths.get(name).map(PathBuf::as_path)
  }

  fn scan(&mut self) {
    let walker = WalkDir::new(&self.root)
      .follow_links(true)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
      let entry = match entry {
        Ok(entry) => entry,
        Err(e) => {
          warn!(repository = %self.name, error = %e, "skipping unreadable entry");
          continue;
        }
      };

      if !entry.file_type().is_file() {
        continue;
      }

      let file_name = entry.file_name().to_string_lossy();
      let name = match recipe_name_from_file_name(&file_name) {
        Ok(Some(name)) => name,
        Ok(None) => continue,
        Err(issue) => {
          warn!(
            repository = %self.name,
            path = %entry.path().display(),
            %issue,
            "ignoring mis-named recipe file"
          );
          continue;
        }
      };

      if self.paths.contains_key(&name) {
        warn!(
          repository = %self.name,
          recipe = %name,
          path = %entry.path().display(),
          "duplicate recipe name, keeping the first one found"
        );
        continue;
      }

      match Recipe::from_file(entry.path()) {
        Ok(recipe) => {
          self.recipes.insert(recipe);
        }
        Err(e) => {
          warn!(
            repository = %self.name,
            path = %entry.path().display(),
            error = %e,
            "skipping malformed recipe file"
          );
          self
            .recipes
            .mark_broken(&name, entry.path().display().to_string(), e.to_string());
        }
      }
      self.paths.insert(name, entry.path().to_path_buf());
    }
  }
}

fn is_hidden(entry: &DirEntry) -> bool {
  entry.file_name().to_string_lossy().starts_with('.')
}

impl Repository for DirectoryRepository {
  fn name(&self) -> &str {
    &self.name
  }

  fn uri(&self) -> &str {
    &self.uri
  }

  fn kind(&self) -> RepositoryKind {
    RepositoryKind::Directory
  }

  fn init(&mut self) -> Result<(), RepositoryError> {
    self.recipes.clear();
    self.paths.clear();

    if !self.root.exists() {
      return Err(RepositoryError::PathNotFound(self.root.clone()));
    }
    if !self.root.is_dir() {
      return Err(RepositoryError::NotADirectory(self.root.clone()));
    }

    self.scan();
    self.initialized = true;
    debug!(
      repository = %self.name,
      root = %self.root.display(),
      recipes = self.paths.len(),
      "directory repository initialized"
    );
    Ok(())
  }

  fn is_initialized(&self) -> bool {
    self.initialized
  }

  fn list_recipes(&self) -> Vec<Recipe> {
    self.recipes.list()
  }

  fn resolve_recipe(&self, name: &str) -> Result<Option<Recipe>, RecipeError> {
    self.recipes.resolve(name)
  }

  fn recipe_yaml_content(&self, name: &str) -> Option<String> {
    if !self.recipes.contains(name) {
      return None;
    }
    let path = self.paths.get(name)?;
    match fs::read_to_string(path) {
      Ok(content) => Some(content),
      Err(e) => {
        warn!(recipe = name, path = %path.display(), error = %e, "failed to read recipe file");
        None
      }
    }
  }

  fn recipe_file_name(&self, name: &str) -> Option<String> {
    if !self.recipes.contains(name) {
      return None;
    }
    self
      .paths
      .get(name)?
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
  }
}
