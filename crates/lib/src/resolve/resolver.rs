//! Depth-first dependency resolution.
//!
//! Every recipe except the base recipe implicitly depends on the base
//! recipe. A recipe's dependencies are visited before the recipe itself is
//! appended, so the output is a post-order topological sort: each recipe
//! appears strictly after everything it depends on.

use std::collections::HashSet;

use tracing::{debug, trace};

use super::ResolveError;
use crate::consts::DEFAULT_BASE_RECIPE;
use crate::recipe::{Recipe, RecipeError};

/// Result of a batch resolution that tolerates missing recipes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
  /// Installable recipes, dependencies first.
  pub recipes: Vec<Recipe>,
  /// Names that no repository provides, in the order they were found.
  pub missing: Vec<String>,
}

impl Resolution {
  pub fn is_complete(&self) -> bool {
    self.missing.is_empty()
  }

  pub fn names(&self) -> Vec<&str> {
    self.recipes.iter().map(Recipe::name).collect()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
  Strict,
  CollectMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
  Placed,
  Unresolvable,
}

/// Orders recipes for installation, loading them lazily through `loader`.
///
/// The loader is the only contact with recipe sources. It returns
/// `Ok(None)` for an unknown name and `Err` for a recipe that exists but
/// cannot be loaded.
pub struct DependencyResolver<L> {
  loader: L,
  base_recipe: Option<String>,
}

impl<L> DependencyResolver<L>
where
  L: FnMut(&str) -> Result<Option<Recipe>, RecipeError>,
{
  /// A resolver using the default base recipe.
  pub fn new(loader: L) -> Self {
    Self {
      loader,
      base_recipe: Some(DEFAULT_BASE_RECIPE.to_string()),
    }
  }

  /// Replace the base recipe. `None` disables the implicit dependency.
  pub fn with_base_recipe(mut self, base_recipe: Option<String>) -> Self {
    self.base_recipe = base_recipe.filter(|b| !b.trim().is_empty());
    self
  }

  pub fn base_recipe(&self) -> Option<&str> {
    self.base_recipe.as_deref()
  }

  /// Resolve one recipe. Any missing recipe is an error.
  pub fn resolve_and_sort(&mut self, name: &str) -> Result<Vec<Recipe>, ResolveError> {
    self.resolve_all([name])
  }

  /// Resolve several recipes into one plan. Any missing recipe is an error.
  pub fn resolve_all<I, S>(&mut self, names: I) -> Result<Vec<Recipe>, ResolveError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut walk = Walk::new(Mode::Strict);
    for name in names {
      let name = name.as_ref().trim();
      if name.is_empty() {
        continue;
      }
      self.visit(&mut walk, name)?;
    }
    Ok(walk.sorted)
  }

  /// Resolve several recipes, reporting missing names instead of failing.
  ///
  /// A recipe that is missing, or that depends on a missing recipe, is left
  /// out of the plan. Everything else is still ordered. Cycles and recipes
  /// that fail to load remain errors.
  pub fn resolve_and_sort_with_missing<I, S>(&mut self, names: I) -> Result<Resolution, ResolveError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut walk = Walk::new(Mode::CollectMissing);
    for name in names {
      let name = name.as_ref().trim();
      if name.is_empty() {
        continue;
      }
      self.visit(&mut walk, name)?;
    }
    Ok(Resolution {
      recipes: walk.sorted,
      missing: walk.missing,
    })
  }

  fn visit(&mut self, walk: &mut Walk, name: &str) -> Result<Outcome, ResolveError> {
    self.visit_edge(walk, name, false)
  }

  /// Visit `name`. `implicit` marks the base recipe edge, which tolerates an
  /// absent base recipe.
  fn visit_edge(&mut self, walk: &mut Walk, name: &str, implicit: bool) -> Result<Outcome, ResolveError> {
    if walk.visited.contains(name) {
      return Ok(Outcome::Placed);
    }
    if walk.unresolvable.contains(name) {
      return Ok(Outcome::Unresolvable);
    }
    if walk.visiting.contains(name) {
      return Err(ResolveError::CircularDependency(name.to_string()));
    }

    let recipe = match (self.loader)(name) {
      Ok(Some(recipe)) => recipe,
      Ok(None) if implicit => {
        debug!(base = name, "base recipe not available, resolving without it");
        walk.absent_base = true;
        return Ok(Outcome::Placed);
      }
      Ok(None) => return self.on_missing(walk, name),
      Err(source) => {
        return Err(ResolveError::Load {
          name: name.to_string(),
          source,
        });
      }
    };

    // The base goes in before `name` is on the stack. When `name` is one of
    // the base's own dependencies, the base's subtree places it and the
    // implicit edge back to the base is never followed.
    let mut complete = true;
    if let Some(base) = self.base_recipe.clone()
      && base != name
      && !walk.absent_base
      && !walk.visiting.contains(&base)
    {
      if self.visit_edge(walk, &base, true)? == Outcome::Unresolvable {
        complete = false;
      }
      if walk.visited.contains(name) {
        trace!(recipe = name, base = %base, "placed by the base recipe");
        return Ok(Outcome::Placed);
      }
      if walk.unresolvable.contains(name) {
        return Ok(Outcome::Unresolvable);
      }
    }

    trace!(recipe = name, dependencies = ?recipe.dependencies, "visiting");
    walk.visiting.insert(name.to_string());

    for dependency in &recipe.dependencies {
      let dependency = dependency.trim();
      if dependency.is_empty() || self.base_recipe.as_deref() == Some(dependency) {
        continue;
      }
      if self.visit(walk, dependency)? == Outcome::Unresolvable {
        complete = false;
      }
    }

    walk.visiting.remove(name);
    if !complete {
      debug!(recipe = name, "left out of the plan: a dependency is missing");
      walk.unresolvable.insert(name.to_string());
      return Ok(Outcome::Unresolvable);
    }

    walk.visited.insert(name.to_string());
    walk.sorted.push(recipe);
    Ok(Outcome::Placed)
  }

  fn on_missing(&mut self, walk: &mut Walk, name: &str) -> Result<Outcome, ResolveError> {
    match walk.mode {
      Mode::Strict => Err(ResolveError::NotFound(name.to_string())),
      Mode::CollectMissing => {
        debug!(recipe = name, "recipe not found");
        walk.unresolvable.insert(name.to_string());
        walk.missing.push(name.to_string());
        Ok(Outcome::Unresolvable)
      }
    }
  }
}

/// DFS state for one resolution call.
struct Walk {
  mode: Mode,
  visited: HashSet<String>,
  visiting: HashSet<String>,
  unresolvable: HashSet<String>,
  absent_base: bool,
  sorted: Vec<Recipe>,
  missing: Vec<String>,
}

impl Walk {
  fn new(mode: Mode) -> Self {
    Self {
      mode,
      visited: HashSet::new(),
      visiting: HashSet::new(),
      unresolvable: HashSet::new(),
      absent_base: false,
      sorted: Vec::new(),
      missing: Vec::new(),
    }
  }
}
