mod info;
mod install;
mod list;
mod plan;
mod remove;
mod repo;
mod tree;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use levain_lib::config::Config;
use levain_lib::platform::paths::Layout;
use levain_lib::registry::Registry;
use levain_lib::repository::RepositoryManager;

pub use info::cmd_info;
pub use install::cmd_install;
pub use list::cmd_list;
pub use plan::cmd_plan;
pub use remove::cmd_remove;
pub use repo::{cmd_repo_add, cmd_repo_list, cmd_repo_remove};
pub use tree::cmd_tree;

/// Layout and effective configuration for one invocation.
pub struct Session {
  pub layout: Layout,
  pub config: Config,
}

impl Session {
  /// Load the configuration, then apply the environment and flag overrides.
  pub fn load(levain_home: Option<PathBuf>, recipes_dir: Option<PathBuf>) -> Result<Self> {
    let layout = levain_home.map(Layout::new).unwrap_or_else(Layout::from_env);
    let mut config = Config::load(&layout.config_path()).context("Failed to load configuration")?;
    config.apply_env();
    if let Some(dir) = recipes_dir {
      config.extra_dir = Some(dir);
    }
    debug!(home = %layout.home().display(), repos = config.repos.len(), "configuration loaded");
    Ok(Self { layout, config })
  }

  /// The configured repositories, initialized.
  pub fn manager(&self) -> RepositoryManager {
    self.config.build_manager(&self.layout)
  }

  pub fn registry(&self) -> Registry {
    Registry::new(self.layout.registry_dir())
  }

  pub fn base_recipe(&self) -> String {
    self.config.base_recipe()
  }
}
