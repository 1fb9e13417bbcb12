//! Registry persistence and its place in the manager.

use std::fs;

use levain_lib::recipe::Recipe;
use levain_lib::registry::{Provenance, Registry, RegistryError, RegistryLockError};
use levain_lib::repository::{Repository, RepositoryManager};
use levain_lib::resolve::manager_resolver;

use super::common::{TestEnv, names};

#[test]
fn installed_state_survives_new_instances() {
  let env = TestEnv::new();
  let dir = env.layout.registry_dir();
  let recipe = Recipe::new("git").with_version("2.45");

  Registry::new(&dir)
    .store_with_provenance(
      &recipe,
      "version: 2.45\n",
      Some("git.levain.yaml"),
      &Provenance::new("team", "/shared/recipes"),
    )
    .unwrap();

  let reopened = Registry::new(&dir);
  assert!(reopened.is_installed("git"));
  assert_eq!(reopened.size(), 1);
  assert_eq!(reopened.list_installed_names().unwrap(), vec!["git"]);
  let metadata = reopened.get_metadata("git").unwrap();
  assert_eq!(metadata.source_repository, "team");
  assert_eq!(metadata.installed_version, "2.45");
}

#[test]
fn remove_is_idempotent() {
  let env = TestEnv::new();
  let registry = Registry::new(env.layout.registry_dir());
  registry.store(&Recipe::new("git"), "version: 1\n", None).unwrap();

  assert!(registry.remove("git").unwrap());
  assert!(!registry.remove("git").unwrap());
  assert!(!registry.is_installed("git"));
  assert_eq!(registry.size(), 0);
}

#[test]
fn doubled_extension_is_rejected_before_writing() {
  let env = TestEnv::new();
  let registry = Registry::new(env.layout.registry_dir());

  let err = registry
    .store(&Recipe::new("git.levain.yaml"), "version: 1\n", None)
    .unwrap_err();
  assert!(matches!(err, RegistryError::DoubledExtension(_)));
  assert_eq!(registry.size(), 0);
  assert!(!env.layout.registry_dir().join("git.levain.yaml.levain.yaml").exists());
}

#[test]
fn missing_registry_directory_is_empty() {
  let env = TestEnv::new();
  let registry = Registry::new(env.temp.path().join("nowhere"));

  assert_eq!(registry.size(), 0);
  assert!(registry.list_recipes().is_empty());
  assert!(registry.resolve_recipe("git").unwrap().is_none());
}

#[test]
fn registry_resolves_when_sources_lack_a_recipe() {
  let env = TestEnv::new();
  let registry = Registry::new(env.layout.registry_dir());
  registry
    .store(
      &Recipe::new("legacy"),
      "version: 0.9\ndependencies: [git]\n",
      None,
    )
    .unwrap();
  env.recipe("git", "version: 2.45\n");

  let mut manager = env.directory_manager();
  manager.add(Box::new(Registry::new(env.layout.registry_dir())));

  let plan = manager_resolver(&manager, None).resolve_and_sort("legacy").unwrap();
  assert_eq!(names(&plan), vec!["git", "legacy"]);
  assert_eq!(manager.find_repository_for_recipe("legacy").unwrap().name(), "registry");
  assert!(manager.is_installed("legacy"));
  assert!(!manager.is_installed("git"));
}

#[test]
fn corrupt_registry_entry_is_skipped_in_listing() {
  let env = TestEnv::new();
  let dir = env.layout.registry_dir();
  let registry = Registry::new(&dir);
  registry.store(&Recipe::new("good"), "version: 1\n", None).unwrap();
  fs::write(dir.join("bad.levain.yaml"), "dependencies: [oops\n").unwrap();

  let mut manager = RepositoryManager::new();
  manager.add(Box::new(Registry::new(&dir)));
  let listed: Vec<String> = manager.list_recipes().iter().map(|r| r.name().to_string()).collect();
  assert_eq!(listed, vec!["good"]);
  assert!(manager.resolve_recipe("bad").is_err());
}

#[test]
fn one_writer_at_a_time_per_registry_directory() {
  let env = TestEnv::new();
  let installer = Registry::new(env.layout.registry_dir());
  let remover = Registry::new(env.layout.registry_dir());

  let held = installer.lock("install git").unwrap();
  let err = remover.lock("remove git").unwrap_err();
  assert!(matches!(err, RegistryLockError::Busy { holder: Some(ref h), .. } if h.command == "install git"));

  // Readers are never blocked.
  installer.store(&Recipe::new("git"), "version: 2\n", None).unwrap();
  assert!(remover.is_installed("git"));

  drop(held);
  assert!(remover.lock("remove git").is_ok());
}
