//! Cache directories for repositories that materialize remote content.
//!
//! Each source URI maps to a stable directory under the cache root, so a
//! later run reuses the previous clone or extraction.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Derive a stable, filesystem-safe cache key for a source URI.
///
/// The key is the sanitized last path segment followed by a short hash of
/// the full URI, e.g. `recipes-3f2a9c01d4e5b6a7`.
pub fn cache_key(uri: &str) -> String {
  let digest = {
    let mut hasher = Sha256::new();
    hasher.update(uri.trim().as_bytes());
    hex::encode(hasher.finalize())
  };

  let segment = uri
    .trim()
    .split(['#', '?'])
    .next()
    .unwrap_or_default()
    .trim_end_matches(['/', '\\'])
    .rsplit(['/', '\\', ':'])
    .next()
    .unwrap_or_default();
  let segment = segment
    .strip_suffix(".git")
    .or_else(|| segment.strip_suffix(".zip"))
    .unwrap_or(segment);

  let sanitized: String = segment
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
        c
      } else {
        '_'
      }
    })
    .collect();

  if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
    format!("repo-{}", &digest[..16])
  } else {
    format!("{}-{}", sanitized, &digest[..16])
  }
}

/// The cache directory for a source URI under `cache_root`.
pub fn cache_path(cache_root: &Path, uri: &str) -> PathBuf {
  cache_root.join(cache_key(uri))
}
