//! Repository construction from URI strings.
//!
//! Classification, in priority order:
//! 1. Local path (no scheme, or `file:`): a directory, or a zip archive when
//!    the path ends in `.zip`
//! 2. Git: a `.git` path segment, `git://`, or scp-like `git@host:path`
//! 3. Zip: a URL ending in `.zip`
//! 4. Git: any other `github.com` URL (`/tree/`, `/raw/`, ...)
//! 5. Remote: any other `http(s)://` URL

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::http::is_http_url;
use super::{DirectoryRepository, GitRepository, RemoteRepository, Repository, RepositoryKind, ZipRepository};

/// Classify a repository URI. `None` for blank or unsupported URIs.
pub fn classify(uri: &str) -> Option<RepositoryKind> {
  let uri = uri.trim();
  if uri.is_empty() {
    return None;
  }

  let path = strip_query(uri);

  if is_local_path(uri) {
    return Some(if path.ends_with(".zip") {
      RepositoryKind::Zip
    } else {
      RepositoryKind::Directory
    });
  }

  if uri.starts_with("git://") || is_scp_like(uri) || has_git_segment(path) {
    return Some(RepositoryKind::Git);
  }

  if path.ends_with(".zip") {
    return Some(RepositoryKind::Zip);
  }

  if is_github(uri) {
    return Some(RepositoryKind::Git);
  }

  if is_http_url(uri) {
    return Some(RepositoryKind::Remote);
  }

  None
}

/// Create a repository for `uri`.
///
/// `name` defaults to the URI. `cache_root` is where git clones and zip
/// extractions are kept. Returns `None` when the URI is blank or unsupported.
pub fn create_repository(uri: Option<&str>, name: Option<&str>, cache_root: &Path) -> Option<Box<dyn Repository>> {
  let uri = uri?.trim();
  let Some(kind) = classify(uri) else {
    if !uri.is_empty() {
      warn!(uri, "unsupported repository URI");
    }
    return None;
  };

  let name = name
    .map(str::trim)
    .filter(|n| !n.is_empty())
    .unwrap_or(uri)
    .to_string();
  debug!(uri, %kind, name = %name, "creating repository");

  let repository: Box<dyn Repository> = match kind {
    RepositoryKind::Directory => Box::new(DirectoryRepository::new(name, local_path(uri))),
    RepositoryKind::Git => Box::new(GitRepository::new(name, uri, cache_root)),
    RepositoryKind::Zip => Box::new(ZipRepository::new(name, uri, cache_root)),
    RepositoryKind::Remote => Box::new(RemoteRepository::new(name, uri)),
    RepositoryKind::Resource | RepositoryKind::Registry => return None,
  };
  Some(repository)
}

fn strip_query(uri: &str) -> &str {
  uri.split(['?', '#']).next().unwrap_or(uri)
}

fn is_local_path(uri: &str) -> bool {
  if uri.starts_with("file:") {
    return true;
  }
  !uri.contains("://") && !is_scp_like(uri)
}

/// `git@host:org/repo.git`
fn is_scp_like(uri: &str) -> bool {
  uri
    .strip_prefix("git@")
    .and_then(|rest| rest.split_once(':'))
    .is_some_and(|(host, path)| !host.is_empty() && !path.is_empty() && !host.contains('/'))
}

/// A path segment ending in `.git`, e.g. `/org/repo.git` or `/repo.git/`.
fn has_git_segment(path: &str) -> bool {
  path
    .trim_end_matches('/')
    .split('/')
    .any(|segment| segment.len() > 4 && segment.ends_with(".git"))
}

fn is_github(uri: &str) -> bool {
  let lower = uri.to_ascii_lowercase();
  ["https://github.com/", "http://github.com/", "https://www.github.com/"]
    .iter()
    .any(|prefix| lower.starts_with(prefix))
}

fn local_path(uri: &str) -> PathBuf {
  let path = uri
    .strip_prefix("file://")
    .or_else(|| uri.strip_prefix("file:"))
    .unwrap_or(uri);
  PathBuf::from(path)
}
