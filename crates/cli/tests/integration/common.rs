//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated test environment.
///
/// Each test gets its own levain home and local recipes directory.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Levain home (isolated per test).
  pub fn home_path(&self) -> PathBuf {
    let p = self.temp.path().join("home");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Local recipes directory, passed as `--recipes-dir`.
  pub fn recipes_path(&self) -> PathBuf {
    let p = self.temp.path().join("recipes");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn registry_path(&self) -> PathBuf {
    self.home_path().join("registry")
  }

  /// Write `<name>.levain.yaml` into the recipes directory.
  pub fn recipe(&self, name: &str, content: &str) {
    std::fs::write(self.recipes_path().join(format!("{}.levain.yaml", name)), content).unwrap();
  }

  /// Get a pre-configured Command for the levain binary.
  ///
  /// Sets `LEVAIN_HOME` to the isolated home and points `--recipes-dir` at
  /// the local recipes directory.
  pub fn levain_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("levain");
    cmd.env("LEVAIN_HOME", self.home_path());
    cmd.env_remove("LEVAIN_RECIPES_DIR");
    cmd.env_remove("RUST_LOG");
    cmd.arg("--recipes-dir").arg(self.recipes_path());
    cmd
  }
}
