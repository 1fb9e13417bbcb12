//! `levain repo` integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn add_and_remove_directory_repository() {
  let env = TestEnv::new();
  let shared = env.temp.path().join("shared");
  std::fs::create_dir_all(&shared).unwrap();
  std::fs::write(shared.join("team-tool.levain.yaml"), "version: 4.2\n").unwrap();
  let shared_uri = shared.display().to_string();

  env
    .levain_cmd()
    .args(["repo", "add", &shared_uri, "--name", "team"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Added repository"));

  let config = std::fs::read_to_string(env.home_path().join("config.json")).unwrap();
  assert!(config.contains("\"team\""));
  assert!(!config.contains("extraDir"));

  env
    .levain_cmd()
    .args(["repo", "list"])
    .assert()
    .success()
    .stdout(predicate::str::contains("team [directory]"));

  env
    .levain_cmd()
    .args(["info", "team-tool"])
    .assert()
    .success()
    .stdout(predicate::str::contains("team-tool 4.2"));

  env
    .levain_cmd()
    .args(["repo", "remove", "team"])
    .assert()
    .success();

  env
    .levain_cmd()
    .args(["info", "team-tool"])
    .assert()
    .failure();
}

#[test]
fn repo_list_json_is_in_precedence_order() {
  let env = TestEnv::new();

  let output = env.levain_cmd().args(["repo", "list", "--json"]).output().unwrap();
  let repos: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let kinds: Vec<&str> = repos
    .as_array()
    .unwrap()
    .iter()
    .map(|r| r["kind"].as_str().unwrap())
    .collect();
  assert_eq!(kinds, vec!["resource", "directory", "registry"]);
}

#[test]
fn unsupported_uri_is_rejected() {
  let env = TestEnv::new();

  env
    .levain_cmd()
    .args(["repo", "add", "ftp://example.com/recipes"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Unsupported repository URI"));
}

#[test]
fn removing_unknown_repository_fails() {
  let env = TestEnv::new();

  env
    .levain_cmd()
    .args(["repo", "remove", "nope"])
    .assert()
    .failure();
}
