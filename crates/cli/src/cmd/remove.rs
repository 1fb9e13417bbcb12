//! Implementation of the `levain remove` command.

use anyhow::{Context, Result};

use super::Session;
use crate::output::{print_info, print_success};
use crate::prompts::confirm;

/// Remove recipes from the registry.
///
/// Only the registry entries are removed; files the recipes installed stay
/// where they are.
pub fn cmd_remove(session: &Session, names: &[String], all: bool, yes: bool) -> Result<()> {
  let registry = session.registry();
  let command = if all {
    "remove --all".to_string()
  } else {
    format!("remove {}", names.join(" "))
  };
  let _guard = registry.lock(&command).context("Cannot remove recipes right now")?;

  if all {
    let count = registry.size();
    if count == 0 {
      print_info("Nothing to remove.");
      return Ok(());
    }
    if !confirm(&format!("Remove all {} installed recipe(s)?", count), yes)? {
      print_info("Aborted.");
      return Ok(());
    }
    let removed = registry.clear().context("Failed to clear registry")?;
    print_success(&format!("Removed {} recipe(s)", removed));
    return Ok(());
  }

  for name in names {
    if registry
      .remove(name)
      .with_context(|| format!("Failed to remove {}", name))?
    {
      print_success(&format!("Removed {}", name));
    } else {
      print_info(&format!("{} is not installed", name));
    }
  }
  Ok(())
}
