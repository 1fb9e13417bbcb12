//! Resolution across real repositories.

use std::fs;
use std::io::Write;

use levain_lib::recipe::Recipe;
use levain_lib::repository::{DirectoryRepository, Repository, RepositoryKind, RepositoryManager, ZipRepository};
use levain_lib::resolve::{RecipeTree, ResolveError, manager_resolver};

use super::common::{TestEnv, names, position, write_recipe};

// =============================================================================
// Directory-only repositories
// =============================================================================

#[test]
fn maven_from_directory_without_base_recipe() {
  let env = TestEnv::new();
  env.recipe("jdk-21", "version: 21.0.4\n");
  env.recipe("maven", "version: 3.9.8\ndependencies:\n  - jdk-21\n");

  let manager = env.directory_manager();
  let plan = manager_resolver(&manager, Some("levain".to_string()))
    .resolve_and_sort("maven")
    .unwrap();

  assert_eq!(names(&plan), vec!["jdk-21", "maven"]);
}

#[test]
fn diamond_dependencies_appear_once() {
  let env = TestEnv::new();
  env.recipe("app", "dependencies: [web, worker]\n");
  env.recipe("web", "dependencies: [runtime]\n");
  env.recipe("worker", "dependencies: [runtime]\n");
  env.recipe("runtime", "version: 1\n");

  let manager = env.directory_manager();
  let plan = manager_resolver(&manager, None).resolve_and_sort("app").unwrap();
  let order = names(&plan);

  assert_eq!(order.len(), 4);
  assert_eq!(order[0], "runtime");
  assert_eq!(order[3], "app");
  assert!(position(&order, "web") > position(&order, "runtime"));
  assert!(position(&order, "worker") > position(&order, "runtime"));
}

#[test]
fn cycle_across_files_is_reported() {
  let env = TestEnv::new();
  env.recipe("a", "dependencies: [b]\n");
  env.recipe("b", "dependencies: [c]\n");
  env.recipe("c", "dependencies: [a]\n");

  let manager = env.directory_manager();
  let err = manager_resolver(&manager, None).resolve_and_sort("a").unwrap_err();
  assert!(matches!(err, ResolveError::CircularDependency(_)));
  assert!(err.to_string().starts_with("Circular dependency detected involving:"));
}

#[test]
fn missing_dependency_is_not_found() {
  let env = TestEnv::new();
  env.recipe("maven", "dependencies: [jdk-21]\n");

  let manager = env.directory_manager();
  let err = manager_resolver(&manager, None).resolve_and_sort("maven").unwrap_err();
  assert_eq!(err.to_string(), "Recipe not found: jdk-21");
}

#[test]
fn malformed_recipe_does_not_hide_others() {
  let env = TestEnv::new();
  env.recipe("good", "version: 1\n");
  env.recipe("broken", "dependencies: [unterminated\n");

  let manager = env.directory_manager();
  let listed: Vec<String> = manager.list_recipes().iter().map(|r| r.name().to_string()).collect();
  assert_eq!(listed, vec!["good"]);

  assert!(manager.resolve_recipe("broken").is_err());
  let plan = manager_resolver(&manager, None).resolve_and_sort("good").unwrap();
  assert_eq!(names(&plan), vec!["good"]);
}

#[test]
fn files_without_recipe_extension_are_ignored() {
  let env = TestEnv::new();
  env.recipe("tool", "version: 1\n");
  fs::write(env.recipes_dir().join("notes.yaml"), "version: 2\n").unwrap();
  fs::write(env.recipes_dir().join("README.md"), "# recipes\n").unwrap();

  let manager = env.directory_manager();
  let listed: Vec<String> = manager.list_recipes().iter().map(|r| r.name().to_string()).collect();
  assert_eq!(listed, vec!["tool"]);
}

// =============================================================================
// Precedence
// =============================================================================

#[test]
fn first_repository_shadows_later_ones() {
  let env = TestEnv::new();
  let first = env.temp.path().join("first");
  let second = env.temp.path().join("second");
  write_recipe(&first, "tool", "version: 1.0\n");
  write_recipe(&second, "tool", "version: 2.0\ndependencies: [extra]\n");
  write_recipe(&second, "extra", "version: 1\n");

  let mut manager = RepositoryManager::new();
  manager.add(Box::new(DirectoryRepository::new("first", &first)));
  manager.add(Box::new(DirectoryRepository::new("second", &second)));

  let tool = manager.resolve_recipe("tool").unwrap().unwrap();
  assert_eq!(tool.version, "1.0");
  assert_eq!(manager.find_repository_for_recipe("tool").unwrap().name(), "first");
  assert_eq!(manager.find_repository_for_recipe("extra").unwrap().name(), "second");

  // The shadowed definition's dependencies are never followed.
  let plan = manager_resolver(&manager, None).resolve_and_sort("tool").unwrap();
  assert_eq!(names(&plan), vec!["tool"]);

  let catalog = manager.catalog();
  assert_eq!(catalog.len(), 2);
  assert_eq!(catalog.get("tool").unwrap().version, "1.0");
}

#[test]
fn configured_manager_puts_base_recipe_first() {
  let env = TestEnv::new();
  env.recipe("project", "dependencies: [maven]\n");

  let manager = env.manager();
  let plan = manager_resolver(&manager, Some("levain".to_string()))
    .resolve_and_sort("project")
    .unwrap();

  assert_eq!(names(&plan), vec!["levain", "jdk-21", "maven", "project"]);
}

#[test]
fn missing_directory_leaves_manager_usable() {
  let env = TestEnv::new();
  env.recipe("tool", "version: 1\n");
  let mut manager = RepositoryManager::new();
  manager.add(Box::new(DirectoryRepository::new(
    "gone",
    env.temp.path().join("does-not-exist"),
  )));
  manager.add(Box::new(DirectoryRepository::new("local", env.recipes_dir())));

  assert!(!manager.repositories().next().unwrap().is_initialized());
  assert!(manager.resolve_recipe("tool").unwrap().is_some());
}

// =============================================================================
// Batch resolution
// =============================================================================

#[test]
fn batch_collects_missing_names() {
  let env = TestEnv::new();
  env.recipe("git", "version: 2.45\n");
  env.recipe("maven", "dependencies: [jdk-21]\n");

  let manager = env.directory_manager();
  let resolution = manager_resolver(&manager, None)
    .resolve_and_sort_with_missing(["git", "maven", "nope"])
    .unwrap();

  assert_eq!(resolution.names(), vec!["git"]);
  assert_eq!(resolution.missing, vec!["jdk-21", "nope"]);
  assert!(!resolution.is_complete());
}

#[test]
fn batch_shares_dependencies() {
  let env = TestEnv::new();
  env.recipe("a", "dependencies: [shared]\n");
  env.recipe("b", "dependencies: [shared]\n");
  env.recipe("shared", "version: 1\n");

  let manager = env.directory_manager();
  let plan = manager_resolver(&manager, None).resolve_all(["a", "b"]).unwrap();
  assert_eq!(names(&plan), vec!["shared", "a", "b"]);
}

#[test]
fn tree_over_catalog_snapshot() {
  let env = TestEnv::new();
  env.recipe("levain", "version: 0.1.0\n");
  env.recipe("jdk-21", "version: 21\n");
  env.recipe("maven", "version: 3.9\ndependencies: [jdk-21]\n");

  let tree = RecipeTree::new(env.directory_manager().catalog());
  let plan = tree.resolve("maven").unwrap();
  assert_eq!(names(&plan), vec!["levain", "jdk-21", "maven"]);

  let rendered = tree.render("maven").unwrap();
  assert!(rendered.starts_with("maven 3.9\n"));
  assert!(rendered.contains("└── jdk-21 21"));
}

// =============================================================================
// Archives
// =============================================================================

#[test]
fn local_zip_repository() {
  let env = TestEnv::new();
  let archive = env.temp.path().join("recipes.zip");
  let file = fs::File::create(&archive).unwrap();
  let mut zip = zip::ZipWriter::new(file);
  let options = zip::write::SimpleFileOptions::default();
  zip.start_file("jdk-21.levain.yaml", options).unwrap();
  zip.write_all(b"version: 21.0.4\n").unwrap();
  zip.start_file("maven.levain.yaml", options).unwrap();
  zip.write_all(b"version: 3.9.8\ndependencies: [jdk-21]\n").unwrap();
  zip.finish().unwrap();

  let cache = env.temp.path().join("cache");
  let mut manager = RepositoryManager::new();
  manager.add(Box::new(ZipRepository::new(
    "archive",
    archive.display().to_string(),
    &cache,
  )));

  let repository = manager.repositories().next().unwrap();
  assert_eq!(repository.kind(), RepositoryKind::Zip);
  assert!(repository.is_initialized());

  let plan = manager_resolver(&manager, None).resolve_and_sort("maven").unwrap();
  assert_eq!(names(&plan), vec!["jdk-21", "maven"]);
  assert!(plan.iter().all(|r: &Recipe| r.recipes_dir.is_some()));
}
