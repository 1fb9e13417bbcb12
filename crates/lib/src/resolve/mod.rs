//! Installation order for requested recipes.
//!
//! - [`DependencyResolver`] loads recipes lazily through a loader callback,
//!   usually backed by [`RepositoryManager::resolve_recipe`].
//! - [`RecipeTree`] works on an immutable [`Catalog`] snapshot and can also
//!   print the dependency tree.
//!
//! [`RepositoryManager::resolve_recipe`]: crate::repository::RepositoryManager::resolve_recipe
//! [`Catalog`]: crate::repository::Catalog

mod resolver;
mod tree;

use thiserror::Error;

use crate::recipe::{Recipe, RecipeError};
use crate::repository::RepositoryManager;

pub use resolver::{DependencyResolver, Resolution};
pub use tree::RecipeTree;

/// Errors raised while ordering recipes.
#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("Recipe not found: {0}")]
  NotFound(String),

  #[error("Circular dependency detected involving: {0}")]
  CircularDependency(String),

  /// The recipe exists but could not be loaded.
  #[error("Recipe {name} could not be loaded: {source}")]
  Load {
    name: String,
    #[source]
    source: RecipeError,
  },
}

/// A resolver that loads recipes from `manager` in precedence order.
pub fn manager_resolver(
  manager: &RepositoryManager,
  base_recipe: Option<String>,
) -> DependencyResolver<impl FnMut(&str) -> Result<Option<Recipe>, RecipeError> + '_> {
  DependencyResolver::new(move |name: &str| manager.resolve_recipe(name)).with_base_recipe(base_recipe)
}
