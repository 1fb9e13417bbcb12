//! Install metadata sidecars.
//!
//! Each installed recipe may have a `<name>.levain.meta` JSON file next to
//! its recipe file:
//!
//! ```json
//! {
//!   "recipeName": "maven",
//!   "sourceRepository": "levain-pkgs",
//!   "sourceRepositoryUri": "https://github.com/jmoalves/levain-pkgs.git",
//!   "installedAt": "2026-10-17T09:30:00Z",
//!   "installedVersion": "3.9.8"
//! }
//! ```
//!
//! Registries written before sidecars existed have none; that is not an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::recipe::Recipe;

/// Where an installed recipe came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
  pub repository: String,
  pub repository_uri: String,
}

impl Provenance {
  pub fn new(repository: impl Into<String>, repository_uri: impl Into<String>) -> Self {
    Self {
      repository: repository.into(),
      repository_uri: repository_uri.into(),
    }
  }
}

/// Contents of a metadata sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallMetadata {
  pub recipe_name: String,
  pub source_repository: String,
  pub source_repository_uri: String,
  pub installed_at: DateTime<Utc>,
  pub installed_version: String,
}

impl InstallMetadata {
  /// Metadata for installing `recipe` from `provenance` now.
  pub fn now(recipe: &Recipe, provenance: &Provenance) -> Self {
    Self {
      recipe_name: recipe.name().to_string(),
      source_repository: provenance.repository.clone(),
      source_repository_uri: provenance.repository_uri.clone(),
      installed_at: Utc::now(),
      installed_version: recipe.version.clone(),
    }
  }
}
