//! Install and remove integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

const TOOL: &str = "version: 1.0.0\ndependencies: [helper]\ncommands:\n  install:\n    - echo installing ${name}\n";
const HELPER: &str = "version: 0.3.0\ncommands:\n  install:\n    - echo installing ${name}\n";

fn env_with_tool() -> TestEnv {
  let env = TestEnv::new();
  env.recipe("tool", TOOL);
  env.recipe("helper", HELPER);
  env
}

#[test]
fn install_records_recipes_in_registry() {
  let env = env_with_tool();

  env
    .levain_cmd()
    .args(["install", "tool"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Installed tool"));

  let registry = env.registry_path();
  assert!(registry.join("levain.levain.yaml").exists());
  assert!(registry.join("helper.levain.yaml").exists());
  assert!(registry.join("tool.levain.yaml").exists());
  assert!(registry.join("tool.levain.meta").exists());

  let stored = std::fs::read_to_string(registry.join("tool.levain.yaml")).unwrap();
  assert_eq!(stored, TOOL);
}

#[test]
fn install_twice_skips_installed() {
  let env = env_with_tool();
  env.levain_cmd().args(["install", "tool"]).assert().success();

  env
    .levain_cmd()
    .args(["install", "tool"])
    .assert()
    .success()
    .stdout(predicate::str::contains("tool is already installed"));
}

#[test]
fn dry_run_installs_nothing() {
  let env = env_with_tool();

  env
    .levain_cmd()
    .args(["install", "--dry-run", "tool"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Would install helper"));

  assert!(!env.registry_path().join("tool.levain.yaml").exists());
}

#[test]
fn failing_command_stops_install() {
  let env = TestEnv::new();
  env.recipe("broken", "commands:\n  install:\n    - exit 3\n");

  env
    .levain_cmd()
    .args(["install", "broken"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to install broken"));

  assert!(!env.registry_path().join("broken.levain.yaml").exists());
}

#[test]
fn missing_recipe_fails_after_installing_the_rest() {
  let env = env_with_tool();

  env
    .levain_cmd()
    .args(["install", "helper", "ghost"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Recipe not found: ghost"));

  assert!(env.registry_path().join("helper.levain.yaml").exists());
}

#[test]
fn remove_installed_recipe() {
  let env = env_with_tool();
  env.levain_cmd().args(["install", "tool"]).assert().success();

  env
    .levain_cmd()
    .args(["remove", "tool"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed tool"));
  assert!(!env.registry_path().join("tool.levain.yaml").exists());
  assert!(!env.registry_path().join("tool.levain.meta").exists());

  env
    .levain_cmd()
    .args(["remove", "tool"])
    .assert()
    .success()
    .stdout(predicate::str::contains("tool is not installed"));
}

#[test]
fn remove_all_needs_confirmation() {
  let env = env_with_tool();
  env.levain_cmd().args(["install", "tool"]).assert().success();

  env
    .levain_cmd()
    .args(["remove", "--all"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--yes"));

  env
    .levain_cmd()
    .args(["remove", "--all", "--yes"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed 3 recipe(s)"));
}

#[test]
fn bundled_recipe_action_is_reported_by_name() {
  let env = TestEnv::new();

  env
    .levain_cmd()
    .args(["install", "maven"])
    .assert()
    .failure()
    .stdout(predicate::str::contains("Installed levain"))
    .stderr(predicate::str::contains("Failed to install jdk-21"))
    .stderr(predicate::str::contains("recipe action 'extract'"));

  assert!(env.registry_path().join("levain.levain.yaml").exists());
  assert!(!env.registry_path().join("jdk-21.levain.yaml").exists());
}

#[test]
fn busy_registry_refuses_a_second_writer() {
  let env = env_with_tool();
  let registry = levain_lib::registry::Registry::new(env.registry_path());
  let guard = registry.lock("install something-else").unwrap();

  env
    .levain_cmd()
    .args(["install", "tool"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("is busy"))
    .stderr(predicate::str::contains("'levain install something-else'"));
  assert!(!env.registry_path().join("tool.levain.yaml").exists());

  env
    .levain_cmd()
    .args(["remove", "tool"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Cannot remove recipes right now"));

  drop(guard);
  env.levain_cmd().args(["install", "tool"]).assert().success();
}
