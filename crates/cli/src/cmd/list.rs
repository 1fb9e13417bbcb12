//! Implementation of the `levain list` command.

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use levain_lib::recipe::Recipe;
use levain_lib::repository::Repository;

use super::Session;
use crate::output::{print_info, print_json, print_stat};

pub fn cmd_list(session: &Session, installed: bool, json: bool) -> Result<()> {
  let manager = session.manager();
  let registry = session.registry();

  let rows: Vec<(Recipe, String)> = if installed {
    registry
      .list_recipes()
      .into_iter()
      .map(|recipe| {
        let source = registry
          .get_metadata(recipe.name())
          .map(|m| m.source_repository)
          .unwrap_or_default();
        (recipe, source)
      })
      .collect()
  } else {
    manager
      .list_recipes()
      .into_iter()
      .map(|recipe| {
        let source = manager
          .find_repository_for_recipe(recipe.name())
          .map(|r| r.name().to_string())
          .unwrap_or_default();
        (recipe, source)
      })
      .collect()
  };

  if json {
    let items: Vec<_> = rows
      .iter()
      .map(|(recipe, source)| {
        serde_json::json!({
          "name": recipe.name(),
          "version": recipe.version,
          "description": recipe.description,
          "repository": source,
          "installed": registry.is_installed(recipe.name()),
        })
      })
      .collect();
    return print_json(&items);
  }

  if rows.is_empty() {
    if installed {
      print_info("No recipes installed.");
    } else {
      print_info("No recipes available.");
    }
    return Ok(());
  }

  let width = rows.iter().map(|(r, _)| r.name().len()).max().unwrap_or(0);
  for (recipe, source) in &rows {
    let marker = if !installed && registry.is_installed(recipe.name()) {
      "*"
    } else {
      " "
    };
    println!(
      "{} {:<width$}  {:<12} {}",
      marker,
      recipe.name(),
      recipe.version,
      source.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    );
  }
  println!();
  print_stat("Recipes", &rows.len().to_string());
  Ok(())
}
