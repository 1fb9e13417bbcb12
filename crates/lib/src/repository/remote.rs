//! Recipes served from a plain HTTP directory.
//!
//! The base URL may publish an `index.json` listing its recipes (a JSON array
//! of names or file names). When it does, every listed recipe is fetched
//! during `init`. Without an index, recipes are fetched one at a time as
//! `<base>/<name>.levain.yaml` when first requested.
//!
//! Content is parsed on the fly and not retained, so this repository never
//! returns original YAML text or file names.

use std::cell::RefCell;
use std::collections::BTreeMap;

use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use super::http;
use super::{RecipeSet, Repository, RepositoryError, RepositoryKind};
use crate::consts::RECIPE_EXTENSION;
use crate::recipe::{Recipe, RecipeError, is_valid_recipe_name, recipe_file_name};

/// Name of the optional recipe index under the base URL.
pub const INDEX_FILENAME: &str = "index.json";

/// Normalize a base URL.
///
/// GitHub `tree`/`blob` URLs are rewritten to raw-content URLs and trailing
/// slashes are removed.
pub fn normalize_base_url(uri: &str) -> String {
  let uri = uri.trim().trim_end_matches('/');
  for prefix in ["https://github.com/", "http://github.com/"] {
    if let Some(rest) = uri.strip_prefix(prefix) {
      let parts: Vec<&str> = rest.splitn(4, '/').collect();
      if parts.len() >= 4 && matches!(parts[2], "tree" | "blob") {
        return format!("https://raw.githubusercontent.com/{}/{}/{}", parts[0], parts[1], parts[3]);
      }
    }
  }
  uri.to_string()
}

/// A repository over HTTP.
#[derive(Debug)]
pub struct RemoteRepository {
  name: String,
  uri: String,
  base_url: String,
  client: Option<Client>,
  has_index: bool,
  recipes: RecipeSet,
  fetched: RefCell<BTreeMap<String, Option<Recipe>>>,
}

impl RemoteRepository {
  pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
    let uri = uri.into();
    Self {
      name: name.into(),
      base_url: normalize_base_url(&uri),
      uri,
      client: None,
      has_index: false,
      recipes: RecipeSet::default(),
      fetched: RefCell::new(BTreeMap::new()),
    }
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn recipe_url(&self, name: &str) -> String {
    format!("{}/{}", self.base_url, recipe_file_name(name))
  }

  fn load_index(&mut self, client: &Client) -> Result<(), RepositoryError> {
    let index_url = format!("{}/{}", self.base_url, INDEX_FILENAME);
    let Some(body) = http::get_text(client, &index_url)? else {
      info!(repository = %self.name, url = %index_url, "no recipe index, recipes are fetched on demand");
      return Ok(());
    };

    let entries: Vec<String> = serde_json::from_str(&body).map_err(|e| RepositoryError::InvalidIndex {
      url: index_url.clone(),
      reason: e.to_string(),
    })?;
    self.has_index = true;

    for entry in entries {
      let name = entry.strip_suffix(RECIPE_EXTENSION).unwrap_or(&entry);
      if !is_valid_recipe_name(name) {
        warn!(repository = %self.name, entry = %entry, "ignoring invalid index entry");
        continue;
      }

      let url = self.recipe_url(name);
      match http::get_text(client, &url) {
        Ok(Some(content)) => match Recipe::from_yaml(name, &content) {
          Ok(recipe) => {
            self.recipes.insert(recipe);
          }
          Err(e) => {
            warn!(repository = %self.name, url = %url, error = %e, "skipping malformed recipe");
            self.recipes.mark_broken(name, url, e.to_string());
          }
        },
        Ok(None) => warn!(repository = %self.name, url = %url, "indexed recipe not found"),
        Err(e) => warn!(repository = %self.name, url = %url, error = %e, "failed to fetch indexed recipe"),
      }
    }

    Ok(())
  }

  fn fetch_on_demand(&self, client: &Client, name: &str) -> Result<Option<Recipe>, RecipeError> {
    if let Some(cached) = self.fetched.borrow().get(name) {
      return Ok(cached.clone());
    }

    let url = self.recipe_url(name);
    let recipe = match http::get_text(client, &url) {
      Ok(Some(content)) => Some(Recipe::from_yaml(name, &content)?),
      Ok(None) => None,
      Err(e) => {
        warn!(repository = %self.name, url = %url, error = %e, "failed to fetch recipe");
        return Ok(None);
      }
    };

    debug!(repository = %self.name, recipe = name, found = recipe.is_some(), "fetched recipe on demand");
    self.fetched.borrow_mut().insert(name.to_string(), recipe.clone());
    Ok(recipe)
  }
}

impl Repository for RemoteRepository {
  fn name(&self) -> &str {
    &self.name
  }

  fn uri(&self) -> &str {
    &self.uri
  }

  fn kind(&self) -> RepositoryKind {
    RepositoryKind::Remote
  }

  fn init(&mut self) -> Result<(), RepositoryError> {
    self.client = None;
    self.has_index = false;
    self.recipes.clear();
    self.fetched.borrow_mut().clear();

    let client = http::client()?;
    self.load_index(&client)?;
    self.client = Some(client);
    Ok(())
  }

  fn is_initialized(&self) -> bool {
    self.client.is_some()
  }

  fn list_recipes(&self) -> Vec<Recipe> {
    let mut recipes = self.recipes.list();
    recipes.extend(self.fetched.borrow().values().flatten().cloned());
    recipes
  }

  fn resolve_recipe(&self, name: &str) -> Result<Option<Recipe>, RecipeError> {
    let Some(client) = &self.client else {
      return Ok(None);
    };

    if let Some(recipe) = self.recipes.resolve(name)? {
      return Ok(Some(recipe));
    }
    if self.has_index || !is_valid_recipe_name(name) {
      return Ok(None);
    }
    self.fetch_on_demand(client, name)
  }
}
