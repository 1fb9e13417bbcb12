//! Implementation of the `levain repo` commands.
//!
//! `add` and `remove` edit the saved configuration only. Environment and
//! flag overrides are never written back.

use anyhow::{Context, Result, bail};

use levain_lib::config::{Config, EXTRA_DIR_REPOSITORY};
use levain_lib::repository::{RepositoryKind, classify, resource::RESOURCE_URI};

use super::Session;
use crate::output::{print_info, print_json, print_success};

pub fn cmd_repo_list(session: &Session, json: bool) -> Result<()> {
  let mut rows = vec![("bundled".to_string(), RepositoryKind::Resource, RESOURCE_URI.to_string())];
  for entry in &session.config.repos {
    match classify(entry.uri()) {
      Some(kind) => rows.push((
        entry.name().unwrap_or(entry.uri()).to_string(),
        kind,
        entry.uri().to_string(),
      )),
      None => print_info(&format!("Ignoring unsupported repository: {}", entry.uri())),
    }
  }
  if let Some(dir) = &session.config.extra_dir {
    rows.push((
      EXTRA_DIR_REPOSITORY.to_string(),
      RepositoryKind::Directory,
      dir.display().to_string(),
    ));
  }
  rows.push((
    "registry".to_string(),
    RepositoryKind::Registry,
    session.layout.registry_dir().display().to_string(),
  ));

  if json {
    let items: Vec<_> = rows
      .iter()
      .map(|(name, kind, uri)| serde_json::json!({ "name": name, "kind": kind.as_str(), "uri": uri }))
      .collect();
    return print_json(&items);
  }

  for (i, (name, kind, uri)) in rows.iter().enumerate() {
    println!("{:>3}. {} [{}] {}", i + 1, name, kind, uri);
  }
  Ok(())
}

pub fn cmd_repo_add(session: &Session, uri: &str, name: Option<String>) -> Result<()> {
  if classify(uri).is_none() {
    bail!("Unsupported repository URI: {}", uri);
  }

  let path = session.layout.config_path();
  let mut config = Config::load(&path).context("Failed to load configuration")?;
  if !config.add_repository(uri, name) {
    print_info(&format!("Repository already configured: {}", uri));
    return Ok(());
  }
  config.save(&path).context("Failed to save configuration")?;
  print_success(&format!("Added repository {}", uri));
  Ok(())
}

pub fn cmd_repo_remove(session: &Session, uri_or_name: &str) -> Result<()> {
  let path = session.layout.config_path();
  let mut config = Config::load(&path).context("Failed to load configuration")?;
  if !config.remove_repository(uri_or_name) {
    bail!("No repository matches: {}", uri_or_name);
  }
  config.save(&path).context("Failed to save configuration")?;
  print_success(&format!("Removed repository {}", uri_or_name));
  Ok(())
}
