//! Recipe file name rules.
//!
//! A recipe file is named exactly `<name>.levain.yaml`. The suffix is
//! case-sensitive and must appear once. Near-miss suffixes are reported so
//! callers can warn instead of silently skipping a mis-named recipe.

use std::fmt;

use crate::consts::RECIPE_EXTENSION;

/// Suffixes that look like a recipe but are not accepted.
const NEAR_MISS_EXTENSIONS: &[&str] = &[".levain.yml", ".levain", ".yml", ".yaml"];

/// Why a file name was rejected as a recipe file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileNameIssue {
  /// The canonical suffix appears more than once (`foo.levain.yaml.levain.yaml`).
  DoubledExtension,
  /// The file uses a near-miss suffix such as `.levain.yml`.
  WrongExtension(&'static str),
  /// Nothing is left once the suffix is removed.
  EmptyName,
}

impl fmt::Display for FileNameIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FileNameIssue::DoubledExtension => write!(f, "'{}' appears more than once", RECIPE_EXTENSION),
      FileNameIssue::WrongExtension(ext) => {
        write!(f, "uses '{}' instead of '{}'", ext, RECIPE_EXTENSION)
      }
      FileNameIssue::EmptyName => write!(f, "recipe name is empty"),
    }
  }
}

/// Derive a recipe name from a file name.
///
/// Returns `Ok(Some(name))` for a valid recipe file, `Ok(None)` for files that
/// are clearly not recipes, and `Err` for files that look like a recipe but
/// break the naming rule.
pub fn recipe_name_from_file_name(file_name: &str) -> Result<Option<String>, FileNameIssue> {
  if let Some(stem) = file_name.strip_suffix(RECIPE_EXTENSION) {
    if stem.is_empty() {
      return Err(FileNameIssue::EmptyName);
    }
    if stem.contains(RECIPE_EXTENSION) {
      return Err(FileNameIssue::DoubledExtension);
    }
    return Ok(Some(stem.to_string()));
  }

  match NEAR_MISS_EXTENSIONS.iter().find(|ext| file_name.ends_with(*ext)) {
    Some(ext) => Err(FileNameIssue::WrongExtension(ext)),
    None => Ok(None),
  }
}

/// The canonical file name for a recipe.
pub fn recipe_file_name(name: &str) -> String {
  format!("{}{}", name, RECIPE_EXTENSION)
}

/// Whether `name` can be used as a recipe identity.
///
/// Names must be non-blank, must not contain path separators and must not
/// contain the canonical extension.
pub fn is_valid_recipe_name(name: &str) -> bool {
  !name.trim().is_empty()
    && !name.contains(RECIPE_EXTENSION)
    && !name.contains('/')
    && !name.contains('\\')
    && name != "."
    && name != ".."
}
