//! Implementation of the `levain info` command.

use std::time::SystemTime;

use anyhow::{Result, bail};

use levain_lib::repository::Repository;

use super::Session;
use crate::output::{format_installed_at, print_json, print_stat, print_success, symbols};

pub fn cmd_info(session: &Session, name: &str, json: bool) -> Result<()> {
  let manager = session.manager();
  let Some(recipe) = manager.resolve_recipe(name)? else {
    bail!("Recipe not found: {}", name);
  };
  let repository = manager.find_repository_for_recipe(name);
  let metadata = session.registry().get_metadata(name);
  let installed = manager.is_installed(name);

  if json {
    let value = serde_json::json!({
      "name": recipe.name(),
      "version": recipe.version,
      "description": recipe.description,
      "dependencies": recipe.dependencies,
      "commands": recipe.commands,
      "attributes": recipe.custom_attributes,
      "recipesDir": recipe.recipes_dir,
      "repository": repository.map(|r| r.name()),
      "repositoryUri": repository.map(|r| r.uri()),
      "installed": installed,
      "installMetadata": metadata,
    });
    return print_json(&value);
  }

  print_success(&format!("{} {}", recipe.name(), recipe.version));
  if !recipe.description.is_empty() {
    print_stat("Description", &recipe.description);
  }
  if let Some(repository) = repository {
    print_stat("Repository", &repository.describe());
  }
  if let Some(dir) = &recipe.recipes_dir {
    print_stat("Recipes dir", &dir.display().to_string());
  }
  print_stat("Installed", if installed { "yes" } else { "no" });

  if let Some(metadata) = &metadata {
    let installed_at = SystemTime::from(metadata.installed_at);
    print_stat("Installed at", &format_installed_at(installed_at, SystemTime::now()));
    print_stat("Installed from", &metadata.source_repository);
    if !metadata.installed_version.is_empty() {
      print_stat("Installed version", &metadata.installed_version);
    }
  }

  if !recipe.dependencies.is_empty() {
    println!();
    println!("Dependencies:");
    for dependency in &recipe.dependencies {
      println!("  {} {}", symbols::INFO, dependency);
    }
  }

  if !recipe.commands.is_empty() {
    println!();
    println!("Commands:");
    for (stage, commands) in &recipe.commands {
      println!("  {}:", stage);
      for command in commands {
        println!("    {} {}", symbols::ARROW, command);
      }
    }
  }

  Ok(())
}
