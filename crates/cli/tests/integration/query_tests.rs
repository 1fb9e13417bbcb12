//! list / info / plan / tree integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

fn env_with_project() -> TestEnv {
  let env = TestEnv::new();
  env.recipe(
    "project",
    "version: 2.0.0\ndescription: Team project\ndependencies: [maven]\nteam: core\n",
  );
  env
}

#[test]
fn list_json_includes_local_recipes() {
  let env = env_with_project();

  let output = env.levain_cmd().args(["list", "--json"]).output().unwrap();
  assert!(output.status.success());

  let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let project = items
    .as_array()
    .unwrap()
    .iter()
    .find(|item| item["name"] == "project")
    .unwrap();
  assert_eq!(project["version"], "2.0.0");
  assert_eq!(project["repository"], "extra");
  assert_eq!(project["installed"], false);
}

#[test]
fn local_recipe_cannot_shadow_bundled_one() {
  let env = TestEnv::new();
  env.recipe("maven", "version: 0.0.1\n");

  let output = env.levain_cmd().args(["info", "maven", "--json"]).output().unwrap();
  let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(info["repository"], "bundled");
  assert_eq!(info["version"], "3.9.8");
}

#[test]
fn info_shows_attributes() {
  let env = env_with_project();

  env
    .levain_cmd()
    .args(["info", "project"])
    .assert()
    .success()
    .stdout(predicate::str::contains("project 2.0.0").and(predicate::str::contains("Team project")));

  let output = env.levain_cmd().args(["info", "project", "--json"]).output().unwrap();
  let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(info["attributes"]["team"], "core");
  assert_eq!(info["dependencies"][0], "maven");
}

#[test]
fn plan_json_orders_dependencies_first() {
  let env = env_with_project();

  let output = env.levain_cmd().args(["plan", "project", "--json"]).output().unwrap();
  assert!(output.status.success());

  let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let names: Vec<&str> = plan["recipes"]
    .as_array()
    .unwrap()
    .iter()
    .map(|r| r["name"].as_str().unwrap())
    .collect();
  assert_eq!(names, vec!["levain", "jdk-21", "maven", "project"]);
  assert!(plan["missing"].as_array().unwrap().is_empty());
}

#[test]
fn plan_reports_missing_recipes() {
  let env = TestEnv::new();
  env.recipe("needs-ghost", "dependencies: [ghost]\n");

  env
    .levain_cmd()
    .args(["plan", "needs-ghost", "git"])
    .assert()
    .failure()
    .stdout(predicate::str::contains("git"))
    .stderr(predicate::str::contains("Recipe not found: ghost"));
}

#[test]
fn plan_reports_cycles() {
  let env = TestEnv::new();
  env.recipe("ping", "dependencies: [pong]\n");
  env.recipe("pong", "dependencies: [ping]\n");

  env
    .levain_cmd()
    .args(["plan", "ping"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Circular dependency detected involving"));
}

#[test]
fn tree_shows_dependencies() {
  let env = env_with_project();

  env
    .levain_cmd()
    .args(["tree", "project"])
    .assert()
    .success()
    .stdout(
      predicate::str::starts_with("project 2.0.0\n")
        .and(predicate::str::contains("maven 3.9.8"))
        .and(predicate::str::contains("jdk-21 21.0.4")),
    );
}
