//! Recipes from a zip archive.
//!
//! The archive is downloaded (for URLs) or read from disk (for local paths)
//! and extracted once into a cache directory derived from the URI. Later runs
//! reuse the extracted content.

use std::fs;
use std::path::{Path, PathBuf};

use ::zip::ZipArchive;
use tracing::{debug, info};

use super::cache::cache_path;
use super::http::{self, is_http_url};
use super::{DirectoryRepository, Repository, RepositoryError, RepositoryKind};
use crate::recipe::{Recipe, RecipeError};

const ARCHIVE_FILENAME: &str = "archive.zip";
const CONTENT_DIR: &str = "content";

/// A repository backed by an extracted zip archive.
#[derive(Debug)]
pub struct ZipRepository {
  name: String,
  uri: String,
  cache_root: PathBuf,
  inner: Option<DirectoryRepository>,
}

impl ZipRepository {
  pub fn new(name: impl Into<String>, uri: impl Into<String>, cache_root: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      uri: uri.into(),
      cache_root: cache_root.into(),
      inner: None,
    }
  }

  /// Directory the archive is extracted into.
  pub fn content_dir(&self) -> PathBuf {
    cache_path(&self.cache_root, &self.uri).join(CONTENT_DIR)
  }

  fn prepare(&self) -> Result<PathBuf, RepositoryError> {
    let cache_dir = cache_path(&self.cache_root, &self.uri);
    let content = cache_dir.join(CONTENT_DIR);

    if is_populated(&content) {
      debug!(repository = %self.name, path = %content.display(), "using extracted archive");
      return Ok(content);
    }

    fs::create_dir_all(&cache_dir).map_err(|source| RepositoryError::Io {
      path: cache_dir.clone(),
      source,
    })?;

    let archive = if is_http_url(&self.uri) {
      let archive = cache_dir.join(ARCHIVE_FILENAME);
      http::download(&http::client()?, self.uri.trim(), &archive)?;
      archive
    } else {
      let local = local_path(&self.uri);
      if !local.is_file() {
        return Err(RepositoryError::PathNotFound(local));
      }
      local
    };

    extract(&archive, &content)?;
    Ok(content)
  }
}

fn local_path(uri: &str) -> PathBuf {
  let uri = uri.trim();
  let path = uri
    .strip_prefix("file://")
    .or_else(|| uri.strip_prefix("file:"))
    .unwrap_or(uri);
  PathBuf::from(path)
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> RepositoryError + use<> {
  let path = path.to_path_buf();
  move |source| RepositoryError::Io { path, source }
}

fn is_populated(dir: &Path) -> bool {
  fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}

/// Extract `archive` into `dest`, all or nothing.
fn extract(archive: &Path, dest: &Path) -> Result<(), RepositoryError> {
  let extract_err = |source| RepositoryError::Extract {
    path: archive.to_path_buf(),
    source,
  };

  let parent = dest.parent().unwrap_or(Path::new("."));
  let staging = tempfile::Builder::new()
    .prefix(".extract-")
    .tempdir_in(parent)
    .map_err(io_err(parent))?;

  let file = fs::File::open(archive).map_err(io_err(archive))?;
  let mut zip = ZipArchive::new(file).map_err(extract_err)?;
  info!(archive = %archive.display(), entries = zip.len(), "extracting archive");
  zip.extract(staging.path()).map_err(extract_err)?;

  if dest.exists() {
    fs::remove_dir_all(dest).map_err(io_err(dest))?;
  }
  fs::rename(staging.path(), dest).map_err(io_err(dest))?;
  Ok(())
}

impl Repository for ZipRepository {
  fn name(&self) -> &str {
    &self.name
  }

  fn uri(&self) -> &str {
    &self.uri
  }

  fn kind(&self) -> RepositoryKind {
    RepositoryKind::Zip
  }

  fn init(&mut self) -> Result<(), RepositoryError> {
    self.inner = None;
    let content = self.prepare()?;
    let mut inner = DirectoryRepository::new(self.name.clone(), content).with_uri(self.uri.clone());
    inner.init()?;
    self.inner = Some(inner);
    Ok(())
  }

  fn is_initialized(&self) -> bool {
    self.inner.as_ref().is_some_and(|inner| inner.is_initialized())
  }

  fn list_recipes(&self) -> Vec<Recipe> {
    self.inner.as_ref().map(|inner| inner.list_recipes()).unwrap_or_default()
  }

  fn resolve_recipe(&self, name: &str) -> Result<Option<Recipe>, RecipeError> {
    match &self.inner {
      Some(inner) => inner.resolve_recipe(name),
      None => Ok(None),
    }
  }

  fn recipe_yaml_content(&self, name: &str) -> Option<String> {
    self.inner.as_ref()?.recipe_yaml_content(name)
  }

  fn recipe_file_name(&self, name: &str) -> Option<String> {
    self.inner.as_ref()?.recipe_file_name(name)
  }
}
