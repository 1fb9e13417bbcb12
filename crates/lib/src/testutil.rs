//! Test utilities for levain-lib.

use std::fs;
use std::path::{Path, PathBuf};

use crate::recipe::recipe_file_name;

/// Write `<name>.levain.yaml` into `dir`, creating the directory if needed.
pub fn write_recipe(dir: &Path, name: &str, content: &str) -> PathBuf {
  fs::create_dir_all(dir).unwrap();
  let path = dir.join(recipe_file_name(name));
  fs::write(&path, content).unwrap();
  path
}

/// Write a recipe whose only content is its dependency list.
pub fn write_recipe_with_deps(dir: &Path, name: &str, deps: &[&str]) -> PathBuf {
  let content = if deps.is_empty() {
    "version: 1.0\n".to_string()
  } else {
    let list: Vec<String> = deps.iter().map(|d| format!("  - {}", d)).collect();
    format!("version: 1.0\ndependencies:\n{}\n", list.join("\n"))
  };
  write_recipe(dir, name, &content)
}

/// Returns a command line that succeeds on the current platform.
#[cfg(unix)]
pub fn succeeding_command() -> &'static str {
  "true"
}

#[cfg(windows)]
pub fn succeeding_command() -> &'static str {
  "exit 0"
}

/// Returns a command line that exits with status 3 on the current platform.
#[cfg(unix)]
pub fn failing_command() -> &'static str {
  "exit 3"
}

#[cfg(windows)]
pub fn failing_command() -> &'static str {
  "exit /b 3"
}
