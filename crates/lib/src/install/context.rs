//! Variables available to recipe commands.
//!
//! Commands may reference `${name}` style variables:
//!
//! - `${baseDir}`: where the package is installed (`<levain-home>/pkgs/<name>`)
//! - `${levainHome}`: the levain home directory
//! - `${name}`, `${version}`, `${description}`, `${recipesDir}`
//! - any custom attribute of the recipe, e.g. `${baseUrl}`
//! - `${pkg.<recipe>.<field>}`: a field of another recipe
//!
//! Unknown variables are left in place.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::platform::paths::Layout;
use crate::recipe::Recipe;
use crate::repository::RepositoryManager;

/// What an executor knows about the command it is running.
#[derive(Debug)]
pub struct ActionContext<'a> {
  pub recipe: &'a Recipe,
  pub stage: &'a str,
  pub base_dir: PathBuf,
  pub levain_home: PathBuf,
  manager: Option<&'a RepositoryManager>,
}

impl<'a> ActionContext<'a> {
  pub fn new(recipe: &'a Recipe, stage: &'a str, layout: &Layout) -> Self {
    Self {
      recipe,
      stage,
      base_dir: layout.packages_dir().join(recipe.name()),
      levain_home: layout.home().to_path_buf(),
      manager: None,
    }
  }

  /// Allow `${pkg.<recipe>.<field>}` lookups through `manager`.
  pub fn with_manager(mut self, manager: &'a RepositoryManager) -> Self {
    self.manager = Some(manager);
    self
  }

  /// Value of a single variable.
  pub fn variable(&self, key: &str) -> Option<String> {
    match key {
      "baseDir" => return Some(self.base_dir.display().to_string()),
      "levainHome" => return Some(self.levain_home.display().to_string()),
      _ => {}
    }

    if let Some(rest) = key.strip_prefix("pkg.") {
      let (name, field) = rest.rsplit_once('.')?;
      let manager = self.manager?;
      return match manager.recipe_attribute(name, field) {
        Ok(value) => value,
        Err(e) => {
          warn!(recipe = name, error = %e, "cannot read recipe for variable");
          None
        }
      };
    }

    self.recipe.attribute(key)
  }

  /// Replace every `${...}` in `template`.
  pub fn expand(&self, template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
      out.push_str(&rest[..start]);
      let after = &rest[start + 2..];
      let Some(end) = after.find('}') else {
        out.push_str(&rest[start..]);
        return out;
      };

      let key = &after[..end];
      match self.variable(key) {
        Some(value) => out.push_str(&value),
        None => {
          debug!(recipe = %self.recipe.name(), variable = key, "unknown variable left as is");
          out.push_str(&rest[start..start + 2 + end + 1]);
        }
      }
      rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
  }
}
