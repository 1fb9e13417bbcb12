//! Shared helpers for library integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use levain_lib::config::Config;
use levain_lib::platform::paths::Layout;
use levain_lib::recipe::{Recipe, recipe_file_name};
use levain_lib::repository::{DirectoryRepository, RepositoryManager};
use tempfile::TempDir;

/// An isolated levain home plus a local recipes directory.
pub struct TestEnv {
  pub temp: TempDir,
  pub layout: Layout,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let layout = Layout::new(temp.path().join("home"));
    Self { temp, layout }
  }

  /// The local recipes directory.
  pub fn recipes_dir(&self) -> PathBuf {
    let dir = self.temp.path().join("recipes");
    fs::create_dir_all(&dir).unwrap();
    dir
  }

  /// Write `<name>.levain.yaml` into the recipes directory.
  pub fn recipe(&self, name: &str, content: &str) -> PathBuf {
    write_recipe(&self.recipes_dir(), name, content)
  }

  /// Config using the recipes directory as the extra directory.
  pub fn config(&self) -> Config {
    Config {
      extra_dir: Some(self.recipes_dir()),
      ..Default::default()
    }
  }

  /// Manager in the standard precedence order.
  pub fn manager(&self) -> RepositoryManager {
    self.config().build_manager(&self.layout)
  }

  /// Manager with only the recipes directory.
  pub fn directory_manager(&self) -> RepositoryManager {
    let mut manager = RepositoryManager::new();
    manager.add(Box::new(DirectoryRepository::new("local", self.recipes_dir())));
    manager
  }
}

pub fn write_recipe(dir: &Path, name: &str, content: &str) -> PathBuf {
  fs::create_dir_all(dir).unwrap();
  let path = dir.join(recipe_file_name(name));
  fs::write(&path, content).unwrap();
  path
}

pub fn names(recipes: &[Recipe]) -> Vec<&str> {
  recipes.iter().map(Recipe::name).collect()
}

pub fn position(order: &[&str], name: &str) -> usize {
  order
    .iter()
    .position(|n| *n == name)
    .unwrap_or_else(|| panic!("{name} missing from {order:?}"))
}
