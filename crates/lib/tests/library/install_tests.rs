//! Installing through the public API with a custom executor.

use levain_lib::install::{
  ActionContext, ActionExecutor, ExecuteError, InstallError, InstallOptions, ShellExecutor, install,
};
use levain_lib::registry::Registry;
use levain_lib::repository::{RepositoryManager, ResourceRepository};

use super::common::TestEnv;

/// Remembers which recipes ran which commands.
#[derive(Default)]
struct Journal {
  entries: Vec<String>,
}

impl ActionExecutor for Journal {
  fn execute(&mut self, context: &ActionContext<'_>, command: &str) -> Result<(), ExecuteError> {
    let command = context.expand(command);
    if command.starts_with("explode") {
      return Err(ExecuteError::CmdFailed { cmd: command, code: Some(2) });
    }
    self.entries.push(format!("{}: {}", context.recipe.name(), command));
    Ok(())
  }
}

fn setup() -> TestEnv {
  let env = TestEnv::new();
  env.recipe(
    "jdk-21",
    "version: 21.0.4\ncommands:\n  install:\n    - unpack jdk ${version}\n",
  );
  env.recipe(
    "maven",
    "version: 3.9.8\ndependencies: [jdk-21]\ncommands:\n  install:\n    - unpack maven with ${pkg.jdk-21.version}\n",
  );
  env
}

#[test]
fn installs_plan_in_order_and_records_it() {
  let env = setup();
  let mut manager = env.directory_manager();
  manager.add(Box::new(Registry::new(env.layout.registry_dir())));
  let options = InstallOptions::new(env.layout.clone()).base_recipe(None);
  let mut journal = Journal::default();

  let report = install(&manager, ["maven"], &mut journal, &options).unwrap();

  assert_eq!(report.installed, vec!["jdk-21", "maven"]);
  assert_eq!(
    journal.entries,
    vec!["jdk-21: unpack jdk 21.0.4", "maven: unpack maven with 21.0.4"]
  );

  let registry = manager.registry().unwrap();
  assert_eq!(registry.list_installed_names().unwrap(), vec!["jdk-21", "maven"]);
  let metadata = registry.get_metadata("maven").unwrap();
  assert_eq!(metadata.source_repository, "local");
  assert_eq!(metadata.installed_version, "3.9.8");
}

#[test]
fn second_run_skips_installed_recipes() {
  let env = setup();
  let mut manager = env.directory_manager();
  manager.add(Box::new(Registry::new(env.layout.registry_dir())));
  let options = InstallOptions::new(env.layout.clone()).base_recipe(None);

  install(&manager, ["maven"], &mut Journal::default(), &options).unwrap();
  let mut journal = Journal::default();
  let report = install(&manager, ["maven"], &mut journal, &options).unwrap();

  assert!(report.installed.is_empty());
  assert_eq!(report.skipped, vec!["jdk-21", "maven"]);
  assert!(journal.entries.is_empty());
}

#[test]
fn failure_reports_what_was_installed() {
  let env = setup();
  env.recipe(
    "broken",
    "dependencies: [jdk-21]\ncommands:\n  install:\n    - explode now\n",
  );
  let mut manager = env.directory_manager();
  manager.add(Box::new(Registry::new(env.layout.registry_dir())));
  let options = InstallOptions::new(env.layout.clone()).base_recipe(None);

  let err = install(&manager, ["broken"], &mut Journal::default(), &options).unwrap_err();
  match err {
    InstallError::Execute { name, installed, .. } => {
      assert_eq!(name, "broken");
      assert_eq!(installed, vec!["jdk-21"]);
    }
    other => panic!("unexpected error: {other}"),
  }
  assert!(manager.is_installed("jdk-21"));
  assert!(!manager.is_installed("broken"));
}

#[test]
fn dry_run_changes_nothing() {
  let env = setup();
  let manager = env.manager();
  let options = InstallOptions::new(env.layout.clone()).dry_run(true);
  let mut journal = Journal::default();

  let report = install(&manager, ["maven", "ghost"], &mut journal, &options).unwrap();

  assert_eq!(report.installed, vec!["levain", "jdk-21", "maven"]);
  assert_eq!(report.missing, vec!["ghost"]);
  assert!(!report.is_complete());
  assert!(journal.entries.is_empty());
  assert_eq!(manager.registry().unwrap().size(), 0);
}

#[test]
fn install_needs_a_registry() {
  let env = setup();
  let manager = env.directory_manager();
  let options = InstallOptions::new(env.layout.clone());

  let err = install(&manager, ["maven"], &mut Journal::default(), &options).unwrap_err();
  assert!(matches!(err, InstallError::NoRegistry));
}

#[test]
fn bundled_recipe_with_shell_executor_names_the_missing_action() {
  let env = TestEnv::new();
  let mut manager = RepositoryManager::new();
  manager.add(Box::new(ResourceRepository::bundled()));
  manager.add(Box::new(Registry::new(env.layout.registry_dir())));
  let options = InstallOptions::new(env.layout.clone());

  let err = install(&manager, ["git"], &mut ShellExecutor::new(), &options).unwrap_err();
  match err {
    InstallError::Execute { name, installed, source } => {
      assert_eq!(name, "git");
      assert_eq!(installed, vec!["levain"]);
      assert!(
        matches!(source, ExecuteError::UnsupportedAction { ref action, .. } if action == "extract"),
        "unexpected source: {source:?}"
      );
    }
    other => panic!("unexpected error: {other}"),
  }
  assert!(manager.is_installed("levain"));
  assert!(!manager.is_installed("git"));
}
