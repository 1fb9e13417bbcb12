//! Resolution over a catalog snapshot.

use std::collections::HashSet;

use super::{DependencyResolver, ResolveError, Resolution};
use crate::consts::DEFAULT_BASE_RECIPE;
use crate::recipe::{Recipe, RecipeError};
use crate::repository::Catalog;

/// Dependency resolution against an immutable [`Catalog`].
#[derive(Debug, Clone)]
pub struct RecipeTree {
  catalog: Catalog,
  base_recipe: Option<String>,
}

impl RecipeTree {
  pub fn new(catalog: Catalog) -> Self {
    Self {
      catalog,
      base_recipe: Some(DEFAULT_BASE_RECIPE.to_string()),
    }
  }

  /// Replace the base recipe. `None` disables the implicit dependency.
  pub fn with_base_recipe(mut self, base_recipe: Option<String>) -> Self {
    self.base_recipe = base_recipe.filter(|b| !b.trim().is_empty());
    self
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  /// Installation order for `name`.
  pub fn resolve(&self, name: &str) -> Result<Vec<Recipe>, ResolveError> {
    self.resolver().resolve_and_sort(name)
  }

  /// Installation order for several names.
  pub fn resolve_all<I, S>(&self, names: I) -> Result<Vec<Recipe>, ResolveError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    self.resolver().resolve_all(names)
  }

  /// Installation order for several names, collecting missing ones.
  pub fn resolve_with_missing<I, S>(&self, names: I) -> Result<Resolution, ResolveError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    self.resolver().resolve_and_sort_with_missing(names)
  }

  /// Print the dependency tree of `name`.
  ///
  /// The implicit base recipe edge is shown, except on recipes the base
  /// recipe itself depends on. A subtree already printed is marked `(*)`
  /// instead of being repeated, and a dependency missing from the catalog is
  /// marked `(not found)`.
  pub fn render(&self, name: &str) -> Result<String, ResolveError> {
    let recipe = self
      .catalog
      .get(name)
      .ok_or_else(|| ResolveError::NotFound(name.to_string()))?;

    let mut out = label(recipe);
    out.push('\n');
    let below_base = self.below_base();
    let mut stack = vec![name.to_string()];
    let mut expanded = HashSet::from([name.to_string()]);
    self.render_children(recipe, "", &below_base, &mut stack, &mut expanded, &mut out)?;
    Ok(out)
  }

  /// Everything the base recipe reaches through its own dependencies.
  fn below_base(&self) -> HashSet<String> {
    let mut reached = HashSet::new();
    let Some(base) = &self.base_recipe else {
      return reached;
    };
    let mut pending = vec![base.clone()];
    while let Some(name) = pending.pop() {
      let Some(recipe) = self.catalog.get(&name) else {
        continue;
      };
      for dependency in &recipe.dependencies {
        let dependency = dependency.trim();
        if !dependency.is_empty() && dependency != base && reached.insert(dependency.to_string()) {
          pending.push(dependency.to_string());
        }
      }
    }
    reached
  }

  fn resolver(&self) -> DependencyResolver<impl FnMut(&str) -> Result<Option<Recipe>, RecipeError> + '_> {
    DependencyResolver::new(|name: &str| Ok(self.catalog.get(name).cloned()))
      .with_base_recipe(self.base_recipe.clone())
  }

  fn render_children(
    &self,
    recipe: &Recipe,
    prefix: &str,
    below_base: &HashSet<String>,
    stack: &mut Vec<String>,
    expanded: &mut HashSet<String>,
    out: &mut String,
  ) -> Result<(), ResolveError> {
    let children = self.children(recipe, below_base, stack);
    for (i, child) in children.iter().enumerate() {
      let (branch, indent) = if i + 1 == children.len() {
        ("└── ", "    ")
      } else {
        ("├── ", "│   ")
      };

      if stack.contains(child) {
        return Err(ResolveError::CircularDependency(child.clone()));
      }

      let Some(dependency) = self.catalog.get(child) else {
        out.push_str(&format!("{prefix}{branch}{child} (not found)\n"));
        continue;
      };

      let has_children = !self.children(dependency, below_base, stack).is_empty();
      if has_children && !expanded.insert(child.clone()) {
        out.push_str(&format!("{prefix}{branch}{} (*)\n", label(dependency)));
        continue;
      }

      out.push_str(&format!("{prefix}{branch}{}\n", label(dependency)));
      stack.push(child.clone());
      self.render_children(dependency, &format!("{prefix}{indent}"), below_base, stack, expanded, out)?;
      stack.pop();
    }
    Ok(())
  }

  /// Direct dependencies of `recipe`, implicit base first.
  fn children(&self, recipe: &Recipe, below_base: &HashSet<String>, stack: &[String]) -> Vec<String> {
    let mut children = Vec::new();
    if let Some(base) = &self.base_recipe
      && base != recipe.name()
      && self.catalog.contains(base)
      && !below_base.contains(recipe.name())
      && !stack.contains(base)
    {
      children.push(base.clone());
    }

    for dependency in &recipe.dependencies {
      let dependency = dependency.trim();
      if dependency.is_empty() || self.base_recipe.as_deref() == Some(dependency) {
        continue;
      }
      if !children.iter().any(|c| c == dependency) {
        children.push(dependency.to_string());
      }
    }
    children
  }
}

fn label(recipe: &Recipe) -> String {
  if recipe.version.is_empty() {
    recipe.name().to_string()
  } else {
    format!("{} {}", recipe.name(), recipe.version)
  }
}
