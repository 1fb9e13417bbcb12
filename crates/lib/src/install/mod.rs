//! Installing recipes.
//!
//! The requested names are resolved into a plan, each recipe's `install`
//! stage is handed to an [`ActionExecutor`], and every recipe that installs
//! successfully is recorded in the registry with its provenance.
//!
//! Installation is not atomic: when a command fails, recipes installed
//! earlier in the plan stay recorded. A real run holds the registry's write
//! guard from before the installed checks until the last record.

mod context;
mod executor;

use thiserror::Error;
use tracing::{debug, info};

use crate::consts::DEFAULT_BASE_RECIPE;
use crate::platform::paths::Layout;
use crate::recipe::{Recipe, RecipeError};
use crate::registry::{Provenance, Registry, RegistryError, RegistryLockError};
use crate::repository::{RepositoryKind, RepositoryManager};
use crate::resolve::{ResolveError, manager_resolver};

pub use context::ActionContext;
pub use executor::{ActionExecutor, ExecuteError, ShellExecutor};

/// The command stage run on install.
pub const INSTALL_STAGE: &str = "install";

/// Errors that can occur during installation.
#[derive(Debug, Error)]
pub enum InstallError {
  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error("no install registry is configured")]
  NoRegistry,

  /// A command failed. `installed` lists what this run installed before it.
  #[error("failed to install '{name}': {source}")]
  Execute {
    name: String,
    installed: Vec<String>,
    #[source]
    source: ExecuteError,
  },

  #[error(transparent)]
  Recipe(#[from] RecipeError),

  #[error(transparent)]
  Registry(#[from] RegistryError),

  #[error(transparent)]
  Lock(#[from] RegistryLockError),
}

/// Options for [`install`].
#[derive(Debug, Clone)]
pub struct InstallOptions {
  /// Levain home layout, for `${baseDir}` and `${levainHome}`.
  pub layout: Layout,
  /// Reinstall requested recipes even when already installed.
  pub force: bool,
  /// Compute the plan only.
  pub dry_run: bool,
  pub base_recipe: Option<String>,
}

impl InstallOptions {
  pub fn new(layout: Layout) -> Self {
    Self {
      layout,
      force: false,
      dry_run: false,
      base_recipe: Some(DEFAULT_BASE_RECIPE.to_string()),
    }
  }

  pub fn force(mut self, force: bool) -> Self {
    self.force = force;
    self
  }

  pub fn dry_run(mut self, dry_run: bool) -> Self {
    self.dry_run = dry_run;
    self
  }

  pub fn base_recipe(mut self, base_recipe: Option<String>) -> Self {
    self.base_recipe = base_recipe;
    self
  }
}

/// What an install run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
  /// Installed in plan order (or, for a dry run, would be).
  pub installed: Vec<String>,
  /// Already installed and left alone.
  pub skipped: Vec<String>,
  /// Not provided by any repository.
  pub missing: Vec<String>,
}

impl InstallReport {
  pub fn is_complete(&self) -> bool {
    self.missing.is_empty()
  }
}

/// Install `names` and their dependencies.
///
/// Dependencies that are already installed are skipped. With `force`, the
/// requested recipes themselves are reinstalled; their dependencies are not.
pub fn install<I, S, E>(
  manager: &RepositoryManager,
  names: I,
  executor: &mut E,
  options: &InstallOptions,
) -> Result<InstallReport, InstallError>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
  E: ActionExecutor + ?Sized,
{
  let registry = manager.registry().ok_or(InstallError::NoRegistry)?;
  let requested: Vec<String> = names
    .into_iter()
    .map(|n| n.as_ref().trim().to_string())
    .filter(|n| !n.is_empty())
    .collect();

  let _guard = if options.dry_run {
    None
  } else {
    Some(registry.lock(&format!("install {}", requested.join(" ")))?)
  };

  let resolution = manager_resolver(manager, options.base_recipe.clone()).resolve_and_sort_with_missing(&requested)?;
  let mut report = InstallReport {
    missing: resolution.missing,
    ..Default::default()
  };

  for recipe in &resolution.recipes {
    let name = recipe.name();
    let forced = options.force && requested.iter().any(|r| r == name);
    if registry.is_installed(name) && !forced {
      debug!(recipe = name, "already installed");
      report.skipped.push(name.to_string());
      continue;
    }

    if options.dry_run {
      report.installed.push(name.to_string());
      continue;
    }

    let context = ActionContext::new(recipe, INSTALL_STAGE, &options.layout).with_manager(manager);
    for command in recipe.commands(INSTALL_STAGE) {
      if let Err(source) = executor.execute(&context, command) {
        return Err(InstallError::Execute {
          name: name.to_string(),
          installed: report.installed,
          source,
        });
      }
    }

    record(manager, registry, recipe)?;
    info!(recipe = name, version = %recipe.version, "installed");
    report.installed.push(name.to_string());
  }

  Ok(report)
}

/// Store `recipe` in the registry, keeping the original text when the
/// source has it.
fn record(manager: &RepositoryManager, registry: &Registry, recipe: &Recipe) -> Result<(), InstallError> {
  let name = recipe.name();
  let source = manager.find_repository_for_recipe(name);
  if source.is_some_and(|r| r.kind() == RepositoryKind::Registry) {
    return Ok(());
  }

  let yaml = match manager.recipe_yaml_content(name) {
    Some(content) => content,
    None => recipe.to_yaml()?,
  };
  let file_name = manager.recipe_file_name(name);
  let provenance = match source {
    Some(repository) => Provenance::new(repository.name(), repository.uri()),
    None => Provenance::new("unknown", ""),
  };

  registry.store_with_provenance(recipe, &yaml, file_name.as_deref(), &provenance)?;
  Ok(())
}
