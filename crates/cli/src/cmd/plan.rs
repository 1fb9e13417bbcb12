//! Implementation of the `levain plan` command.
//!
//! Resolves the requested recipes into an installation order and prints it
//! without running anything.

use anyhow::{Context, Result, bail};

use levain_lib::resolve::manager_resolver;

use super::Session;
use crate::output::{print_json, print_warning};

pub fn cmd_plan(session: &Session, names: &[String], json: bool) -> Result<()> {
  let manager = session.manager();
  let resolution = manager_resolver(&manager, Some(session.base_recipe()))
    .resolve_and_sort_with_missing(names)
    .context("Failed to resolve dependencies")?;

  if json {
    let recipes: Vec<_> = resolution
      .recipes
      .iter()
      .map(|recipe| {
        serde_json::json!({
          "name": recipe.name(),
          "version": recipe.version,
          "installed": manager.is_installed(recipe.name()),
        })
      })
      .collect();
    print_json(&serde_json::json!({ "recipes": recipes, "missing": resolution.missing }))?;
  } else {
    for (i, recipe) in resolution.recipes.iter().enumerate() {
      let status = if manager.is_installed(recipe.name()) {
        " (installed)"
      } else {
        ""
      };
      println!("{:>3}. {} {}{}", i + 1, recipe.name(), recipe.version, status);
    }
    for name in &resolution.missing {
      print_warning(&format!("Recipe not found: {}", name));
    }
  }

  if !resolution.is_complete() {
    bail!("{} recipe(s) not found: {}", resolution.missing.len(), resolution.missing.join(", "));
  }
  Ok(())
}
