//! Implementation of the `levain install` command.
//!
//! `install` takes the registry's write guard itself, so a concurrent
//! `install` or `remove` fails fast instead of interleaving registry writes.

use anyhow::{Result, bail};

use levain_lib::install::{InstallError, InstallOptions, ShellExecutor, install};

use super::Session;
use crate::output::{print_error, print_info, print_stat, print_success, print_warning};

pub fn cmd_install(session: &Session, names: &[String], force: bool, dry_run: bool) -> Result<()> {
  let manager = session.manager();
  let options = InstallOptions::new(session.layout.clone())
    .force(force)
    .dry_run(dry_run)
    .base_recipe(Some(session.base_recipe()));
  let mut executor = ShellExecutor::new();

  let report = match install(&manager, names, &mut executor, &options) {
    Ok(report) => report,
    Err(InstallError::Execute { name, installed, source }) => {
      for done in &installed {
        print_success(&format!("Installed {}", done));
      }
      print_error(&format!("Failed to install {}: {}", name, source));
      bail!("Installation stopped at '{}'", name);
    }
    Err(e) => return Err(e.into()),
  };

  for name in &report.skipped {
    print_info(&format!("{} is already installed", name));
  }
  for name in &report.installed {
    if dry_run {
      print_info(&format!("Would install {}", name));
    } else {
      print_success(&format!("Installed {}", name));
    }
  }
  for name in &report.missing {
    print_warning(&format!("Recipe not found: {}", name));
  }

  println!();
  let label = if dry_run { "To install" } else { "Installed" };
  print_stat(label, &report.installed.len().to_string());
  print_stat("Already installed", &report.skipped.len().to_string());

  if !report.is_complete() {
    bail!("{} recipe(s) not found: {}", report.missing.len(), report.missing.join(", "));
  }
  Ok(())
}
