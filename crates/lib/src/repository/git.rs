//! Recipes from a git remote.
//!
//! The remote is cloned shallowly into a cache directory derived from the
//! repository URI. Later runs fetch into that clone and fast-forward its
//! working tree; when the remote cannot be reached the existing checkout is
//! used as-is.
//!
//! Accepted URI forms:
//! - `https://host/org/repo.git`, `git://host/repo`, `git@host:org/repo.git`
//! - any of the above with `#<ref>` to pick a branch or tag
//! - `https://github.com/org/repo/tree/<ref>/<subdir>` to use a subdirectory

use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use gix::remote::Direction;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::cache::cache_path;
use super::{DirectoryRepository, Repository, RepositoryError, RepositoryKind};
use crate::recipe::{Recipe, RecipeError};

/// Errors that can occur during fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
  /// Failed to create the cache directory.
  #[error("failed to create cache directory '{0}': {1}")]
  CreateCacheDir(PathBuf, #[source] std::io::Error),

  /// Failed to clone a git repository.
  #[error("failed to clone repository '{url}': {source}")]
  Clone {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// Failed to check out the working tree.
  #[error("failed to checkout '{url}': {source}")]
  Checkout {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// The requested branch or tag name is not a valid reference.
  #[error("invalid reference '{reference}': {source}")]
  InvalidReference {
    reference: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// Failed to fetch into an existing checkout or move it forward.
  #[error("failed to update checkout at '{path}': {source}")]
  Update {
    path: PathBuf,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What an update of an existing checkout did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
  UpToDate,
  /// The working tree moved to the fetched commit.
  FastForwarded,
  /// HEAD is detached or has no tracking ref, e.g. a tag checkout.
  Pinned,
}

/// Where to clone from and which part of the checkout holds recipes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSource {
  /// URL handed to git.
  pub url: String,
  /// Branch or tag to check out; remote HEAD when `None`.
  pub reference: Option<String>,
  /// Subdirectory of the checkout to scan.
  pub subdir: Option<String>,
}

impl GitSource {
  /// Parse a repository URI into a clone URL, reference and subdirectory.
  pub fn parse(uri: &str) -> Self {
    let uri = uri.trim();
    let (base, fragment) = match uri.split_once('#') {
      Some((base, fragment)) if !fragment.is_empty() => (base, Some(fragment.to_string())),
      Some((base, _)) => (base, None),
      None => (uri, None),
    };

    if let Some(source) = Self::parse_github_tree(base) {
      return source;
    }

    Self {
      url: base.to_string(),
      reference: fragment,
      subdir: None,
    }
  }

  /// `https://github.com/<org>/<repo>/(tree|blob)/<ref>[/<path>]`
  fn parse_github_tree(uri: &str) -> Option<Self> {
    let rest = uri
      .strip_prefix("https://github.com/")
      .or_else(|| uri.strip_prefix("http://github.com/"))?;
    let parts: Vec<&str> = rest.trim_end_matches('/').split('/').collect();
    if parts.len() < 4 || !matches!(parts[2], "tree" | "blob") {
      return None;
    }

    let repo = parts[1].trim_end_matches(".git");
    let subdir = parts[4..].join("/");
    Some(Self {
      url: format!("https://github.com/{}/{}.git", parts[0], repo),
      reference: Some(parts[3].to_string()),
      subdir: (!subdir.is_empty()).then_some(subdir),
    })
  }
}

/// A repository backed by a cached git checkout.
#[derive(Debug)]
pub struct GitRepository {
  name: String,
  uri: String,
  source: GitSource,
  cache_root: PathBuf,
  inner: Option<DirectoryRepository>,
}

impl GitRepository {
  pub fn new(name: impl Into<String>, uri: impl Into<String>, cache_root: impl Into<PathBuf>) -> Self {
    let uri = uri.into();
    Self {
      name: name.into(),
      source: GitSource::parse(&uri),
      uri,
      cache_root: cache_root.into(),
      inner: None,
    }
  }

  pub fn source(&self) -> &GitSource {
    &self.source
  }

  /// Directory the checkout lives in.
  pub fn checkout_dir(&self) -> PathBuf {
    cache_path(&self.cache_root, &self.uri)
  }
}

impl Repository for GitRepository {
  fn name(&self) -> &str {
    &self.name
  }

  fn uri(&self) -> &str {
    &self.uri
  }

  fn kind(&self) -> RepositoryKind {
    RepositoryKind::Git
  }

  fn init(&mut self) -> Result<(), RepositoryError> {
    self.inner = None;
    let checkout = self.checkout_dir();
    sync_checkout(&self.source.url, self.source.reference.as_deref(), &checkout)?;

    let root = match &self.source.subdir {
      Some(subdir) => checkout.join(subdir),
      None => checkout,
    };
    let mut inner = DirectoryRepository::new(self.name.clone(), root).with_uri(self.uri.clone());
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

/// Make `checkout` hold a current shallow clone of `url`.
///
/// A missing checkout is cloned. An existing one is updated in place with
/// [`pull`]; if that fails the existing checkout is kept.
pub fn sync_checkout(url: &str, reference: Option<&str>, checkout: &Path) -> Result<(), FetchError> {
  let parent = checkout.parent().unwrap_or(Path::new("."));
  if !parent.exists() {
    fs::create_dir_all(parent).map_err(|e| FetchError::CreateCacheDir(parent.to_path_buf(), e))?;
  }

  if !checkout.join(".git").exists() {
    info!(url, path = %checkout.display(), "cloning repository");
    if checkout.exists() {
      // leftover from an interrupted clone
      let _ = fs::remove_dir_all(checkout);
    }
    return clone_repo(url, reference, checkout);
  }

  match pull(checkout) {
    Ok(outcome) => debug!(url, path = %checkout.display(), ?outcome, "checkout updated"),
    Err(e) => warn!(url, error = %e, "could not update repository, using cached checkout"),
  }
  Ok(())
}

/// Fetch the checkout's branch from its remote and fast-forward to it.
///
/// The cache is never edited locally, so the branch is moved to the fetched
/// commit without an ancestry check. Shallow history could not prove one.
pub fn pull(checkout: &Path) -> Result<Pull, FetchError> {
  let update_err = |source: BoxError| FetchError::Update {
    path: checkout.to_path_buf(),
    source,
  };

  let mut repo = gix::open(checkout).map_err(|e| update_err(Box::new(e)))?;
  // Reflog entries need an identity even on machines without git config.
  repo
    .committer_or_set_generic_fallback()
    .map_err(|e| update_err(Box::new(e)))?;
  let remote = repo
    .find_default_remote(Direction::Fetch)
    .ok_or_else(|| update_err("checkout has no remote to fetch from".into()))?
    .map_err(|e| update_err(Box::new(e)))?;
  let remote_name = remote
    .name()
    .map(|name| name.as_bstr().to_string())
    .unwrap_or_else(|| "origin".to_string());

  remote
    .connect(Direction::Fetch)
    .map_err(|e| update_err(Box::new(e)))?
    .prepare_fetch(gix::progress::Discard, Default::default())
    .map_err(|e| update_err(Box::new(e)))?
    .with_shallow(gix::remote::fetch::Shallow::DepthAtRemote(NonZeroU32::MIN))
    .receive(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| update_err(Box::new(e)))?;

  let Some(branch) = repo.head_name().map_err(|e| update_err(Box::new(e)))? else {
    return Ok(Pull::Pinned);
  };
  let tracking = format!("refs/remotes/{}/{}", remote_name, branch.shorten());
  let Some(mut tracking) = repo
    .try_find_reference(tracking.as_str())
    .map_err(|e| update_err(Box::new(e)))?
  else {
    return Ok(Pull::Pinned);
  };

  let target = tracking.peel_to_id().map_err(|e| update_err(Box::new(e)))?.detach();
  let current = repo.head_id().map_err(|e| update_err(Box::new(e)))?.detach();
  if target == current {
    return Ok(Pull::UpToDate);
  }

  checkout_commit(&repo, target).map_err(update_err)?;
  repo
    .reference(branch, target, gix::refs::transaction::PreviousValue::Any, "levain: fast-forward")
    .map_err(|e| update_err(Box::new(e)))?;
  info!(path = %checkout.display(), from = %current, to = %target, "fast-forwarded checkout");
  Ok(Pull::FastForwarded)
}

/// Rewrite the working tree and index of `repo` to match `commit`.
///
/// Files tracked before but absent from `commit` are deleted. Untracked
/// files are left alone.
fn checkout_commit(repo: &gix::Repository, commit: gix::ObjectId) -> Result<(), BoxError> {
  let workdir = repo.workdir().ok_or("checkout has no working tree")?;
  let tree = repo.find_commit(commit)?.tree_id()?.detach();
  let mut index = repo.index_from_tree(&tree)?;

  let previous = repo.index_or_empty()?;
  for entry in previous.entries() {
    let path = entry.path(&previous);
    if index.entry_by_path(path).is_some() {
      continue;
    }
    let stale = workdir.join(gix::path::from_bstr(path));
    if let Err(e) = fs::remove_file(&stale)
      && e.kind() != std::io::ErrorKind::NotFound
    {
      return Err(Box::new(e));
    }
  }

  let mut options = repo.checkout_options(gix::worktree::stack::state::attributes::Source::IdMapping)?;
  options.overwrite_existing = true;
  let outcome = gix::worktree::state::checkout(
    &mut index,
    workdir,
    repo.objects.clone().into_arc()?,
    &gix::progress::Discard,
    &gix::progress::Discard,
    &gix::interrupt::IS_INTERRUPTED,
    options,
  )?;
  index.write(Default::default())?;
  debug!(files = outcome.files_updated, "working tree rewritten");
  Ok(())
}

/// Shallow-clone `url` into `dest` and check out the working tree.
fn clone_repo(url: &str, reference: Option<&str>, dest: &Path) -> Result<(), FetchError> {
  let mut prepared = gix::prepare_clone(url, dest)
    .map_err(|e| FetchError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })?
    .with_shallow(gix::remote::fetch::Shallow::DepthAtRemote(NonZeroU32::MIN));

  if let Some(reference) = reference {
    prepared = prepared
      .with_ref_name(Some(reference))
      .map_err(|e| FetchError::InvalidReference {
        reference: reference.to_string(),
        source: Box::new(e),
      })?;
  }

  let (mut checkout, _outcome) = prepared
    .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| FetchError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })?;

  checkout
    .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| FetchError::Checkout {
      url: url.to_string(),
      source: Box::new(e),
    })?;

  Ok(())
}
