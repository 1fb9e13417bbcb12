//! Blocking HTTP helpers shared by the zip and remote repositories.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use tracing::{debug, info};

use super::RepositoryError;
use crate::consts::APP_NAME;

const TIMEOUT: Duration = Duration::from_secs(60);

/// Build the HTTP client used for recipe sources.
pub fn client() -> Result<Client, RepositoryError> {
  Client::builder()
    .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
    .timeout(TIMEOUT)
    .build()
    .map_err(|source| RepositoryError::Http {
      url: String::new(),
      source,
    })
}

/// GET a text document. `Ok(None)` when the server answers 404.
pub fn get_text(client: &Client, url: &str) -> Result<Option<String>, RepositoryError> {
  debug!(url, "fetching");
  let response = client.get(url).send().map_err(|source| RepositoryError::Http {
    url: url.to_string(),
    source,
  })?;

  if response.status() == StatusCode::NOT_FOUND {
    return Ok(None);
  }
  if !response.status().is_success() {
    return Err(RepositoryError::HttpStatus {
      url: url.to_string(),
      status: response.status().as_u16(),
    });
  }

  response.text().map(Some).map_err(|source| RepositoryError::Http {
    url: url.to_string(),
    source,
  })
}

/// Download `url` to `dest`, replacing any existing file.
pub fn download(client: &Client, url: &str, dest: &Path) -> Result<(), RepositoryError> {
  info!(url, path = %dest.display(), "downloading");
  let response = client.get(url).send().map_err(|source| RepositoryError::Http {
    url: url.to_string(),
    source,
  })?;

  if !response.status().is_success() {
    return Err(RepositoryError::HttpStatus {
      url: url.to_string(),
      status: response.status().as_u16(),
    });
  }

  let bytes = response.bytes().map_err(|source| RepositoryError::Http {
    url: url.to_string(),
    source,
  })?;

  let io_err = |source| RepositoryError::Io {
    path: dest.to_path_buf(),
    source,
  };
  if let Some(parent) = dest.parent() {
    fs::create_dir_all(parent).map_err(io_err)?;
  }
  let mut file = fs::File::create(dest).map_err(io_err)?;
  file.write_all(&bytes).map_err(io_err)?;
  file.flush().map_err(io_err)?;

  info!(path = %dest.display(), size = bytes.len(), "download complete");
  Ok(())
}

/// Whether `uri` is an http(s) URL.
pub fn is_http_url(uri: &str) -> bool {
  let lower = uri.trim().to_ascii_lowercase();
  lower.starts_with("http://") || lower.starts_with("https://")
}
