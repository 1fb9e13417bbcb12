//! Recipes compiled into the installer.
//!
//! Always available, including offline. The original file text is not
//! exposed; callers that need YAML must serialize the parsed recipe.

use tracing::{debug, warn};

use super::{RecipeSet, Repository, RepositoryError, RepositoryKind};
use crate::recipe::{Recipe, RecipeError, recipe_name_from_file_name};

/// URI reported for the bundled repository.
pub const RESOURCE_URI: &str = "resource://bundled";

/// Recipe files shipped with the installer, as `(file name, content)`.
pub const BUNDLED_RECIPES: &[(&str, &str)] = &[
  ("levain.levain.yaml", include_str!("../../recipes/levain.levain.yaml")),
  ("git.levain.yaml", include_str!("../../recipes/git.levain.yaml")),
  ("jdk-21.levain.yaml", include_str!("../../recipes/jdk-21.levain.yaml")),
  ("maven.levain.yaml", include_str!("../../recipes/maven.levain.yaml")),
];

/// A repository over an in-memory set of recipe files.
#[derive(Debug)]
pub struct ResourceRepository {
  name: String,
  files: Vec<(String, String)>,
  initialized: bool,
  recipes: RecipeSet,
}

impl Default for ResourceRepository {
  fn default() -> Self {
    Self::bundled()
  }
}

impl ResourceRepository {
  /// The recipes bundled with this build.
  pub fn bundled() -> Self {
    Self::from_files(
      "bundled",
      BUNDLED_RECIPES
        .iter()
        .map(|(file_name, content)| (file_name.to_string(), content.to_string())),
    )
  }

  /// A resource repository over arbitrary `(file name, content)` pairs.
  pub fn from_files<I>(name: impl Into<String>, files: I) -> Self
  where
    I: IntoIterator<Item = (String, String)>,
  {
    Self {
      name: name.into(),
      files: files.into_iter().collect(),
      initialized: false,
      recipes: RecipeSet::default(),
    }
  }
}

impl Repository for ResourceRepository {
  fn name(&self) -> &str {
    &self.name
  }

  fn uri(&self) -> &str {
    RESOURCE_URI
  }

  fn kind(&self) -> RepositoryKind {
    RepositoryKind::Resource
  }

  fn init(&mut self) -> Result<(), RepositoryError> {
    self.recipes.clear();

    for (file_name, content) in &self.files {
      let name = match recipe_name_from_file_name(file_name) {
        Ok(Some(name)) => name,
        Ok(None) => continue,
        Err(issue) => {
          warn!(repository = %self.name, file = %file_name, %issue, "ignoring mis-named bundled recipe");
          continue;
        }
      };

      match Recipe::from_yaml(&name, content) {
        Ok(recipe) => {
          if !self.recipes.insert(recipe) {
            warn!(repository = %self.name, recipe = %name, "duplicate bundled recipe");
          }
        }
        Err(e) => {
          warn!(repository = %self.name, file = %file_name, error = %e, "skipping malformed bundled recipe");
          self
            .recipes
            .mark_broken(&name, format!("{}/{}", RESOURCE_URI, file_name), e.to_string());
        }
      }
    }

    self.initialized = true;
    debug!(repository = %self.name, recipes = self.files.len(), "resource repository initialized");
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
}
