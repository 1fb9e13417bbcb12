//! Precedence-ordered aggregation of repositories.
//!
//! Repositories are added in precedence order: bundled defaults, configured
//! sources in configuration order, the local extra directory, and the
//! registry last. Lookups probe in that order and the first hit wins, which
//! lets a local recipe shadow a bundled or remote one of the same name.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::Repository;
use crate::recipe::{Recipe, RecipeError};
use crate::registry::Registry;

/// An immutable, ordered snapshot of the aggregate catalog.
///
/// Built fresh per request; the first occurrence of a name wins.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
  recipes: Vec<Recipe>,
  index: HashMap<String, usize>,
}

impl Catalog {
  /// Build a catalog from recipes in precedence order.
  pub fn from_recipes<I>(recipes: I) -> Self
  where
    I: IntoIterator<Item = Recipe>,
  {
    let mut catalog = Self::default();
    for recipe in recipes {
      if catalog.index.contains_key(recipe.name()) {
        continue;
      }
      catalog.index.insert(recipe.name().to_string(), catalog.recipes.len());
      catalog.recipes.push(recipe);
    }
    catalog
  }

  pub fn get(&self, name: &str) -> Option<&Recipe> {
    self.index.get(name).map(|&i| &self.recipes[i])
  }

  pub fn contains(&self, name: &str) -> bool {
    self.index.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.recipes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.recipes.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
    self.recipes.iter()
  }

  pub fn into_recipes(self) -> Vec<Recipe> {
    self.recipes
  }
}

/// Holds the configured repositories in precedence order.
#[derive(Debug, Default)]
pub struct RepositoryManager {
  repositories: Vec<Box<dyn Repository>>,
}

impl RepositoryManager {
  pub fn new() -> Self {
    Self::default()
  }

  /// Initialize `repository` and append it with the lowest precedence so far.
  ///
  /// A repository that fails to initialize is kept; it simply reports no
  /// recipes.
  pub fn add(&mut self, mut repository: Box<dyn Repository>) {
    match repository.init() {
      Ok(()) => debug!(repository = %repository.describe(), "repository ready"),
      Err(e) => warn!(
        repository = %repository.describe(),
        error = %e,
        "repository unavailable, continuing without it"
      ),
    }
    self.repositories.push(repository);
  }

  /// Add several repositories in order.
  pub fn add_all<I>(&mut self, repositories: I)
  where
    I: IntoIterator<Item = Box<dyn Repository>>,
  {
    for repository in repositories {
      self.add(repository);
    }
  }

  pub fn repositories(&self) -> impl Iterator<Item = &dyn Repository> {
    self.repositories.iter().map(|r| r.as_ref())
  }

  pub fn len(&self) -> usize {
    self.repositories.len()
  }

  pub fn is_empty(&self) -> bool {
    self.repositories.is_empty()
  }

  /// All recipes, de-duplicated by name with the first occurrence winning.
  pub fn list_recipes(&self) -> Vec<Recipe> {
    self.catalog().into_recipes()
  }

  /// Snapshot of the aggregate catalog.
  pub fn catalog(&self) -> Catalog {
    Catalog::from_recipes(self.repositories.iter().flat_map(|r| r.list_recipes()))
  }

  /// Resolve `name` from the first repository that has it.
  pub fn resolve_recipe(&self, name: &str) -> Result<Option<Recipe>, RecipeError> {
    Ok(self.find(name)?.map(|(_, recipe)| recipe))
  }

  /// The repository that `resolve_recipe` would take `name` from.
  pub fn find_repository_for_recipe(&self, name: &str) -> Option<&dyn Repository> {
    match self.find(name) {
      Ok(found) => found.map(|(repository, _)| repository),
      Err(e) => {
        warn!(recipe = name, error = %e, "recipe cannot be loaded");
        None
      }
    }
  }

  /// Original recipe text from the owning repository, if it keeps it.
  pub fn recipe_yaml_content(&self, name: &str) -> Option<String> {
    self.find_repository_for_recipe(name)?.recipe_yaml_content(name)
  }

  /// Original recipe file name from the owning repository, if it keeps it.
  pub fn recipe_file_name(&self, name: &str) -> Option<String> {
    self.find_repository_for_recipe(name)?.recipe_file_name(name)
  }

  /// A single field of a named recipe, for `pkg.<name>.<field>` variables.
  pub fn recipe_attribute(&self, name: &str, key: &str) -> Result<Option<String>, RecipeError> {
    Ok(self.resolve_recipe(name)?.and_then(|recipe| recipe.attribute(key)))
  }

  /// The install registry, if one is managed.
  pub fn registry(&self) -> Option<&Registry> {
    self.repositories.iter().find_map(|r| r.as_registry())
  }

  /// Whether the managed registry has `name` installed.
  pub fn is_installed(&self, name: &str) -> bool {
    self.registry().is_some_and(|registry| registry.is_installed(name))
  }

  fn find(&self, name: &str) -> Result<Option<(&dyn Repository, Recipe)>, RecipeError> {
    for repository in &self.repositories {
      if let Some(recipe) = repository.resolve_recipe(name)? {
        debug!(recipe = name, repository = %repository.name(), "resolved recipe");
        return Ok(Some((repository.as_ref(), recipe)));
      }
    }
    Ok(None)
  }
}
