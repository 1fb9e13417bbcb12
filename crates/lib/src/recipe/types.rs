//! The recipe entity and its on-disk YAML document.
//!
//! A recipe file looks like:
//!
//! ```yaml
//! version: 3.9.6
//! description: Apache Maven
//! dependencies:
//!   - jdk-21
//! commands:
//!   install:
//!     - extract ${baseUrl}/apache-maven-${version}-bin.zip ${baseDir}
//!   env:
//!     - addPath ${baseDir}/bin
//! baseUrl: https://archive.apache.org/dist/maven/maven-3
//! ```
//!
//! The recipe name always comes from the file name. A `name:` field in the
//! document is read and discarded.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use super::filename::{FileNameIssue, recipe_name_from_file_name};

/// Errors that can occur while loading or writing a recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
  /// The file name does not follow the `<name>.levain.yaml` rule.
  #[error("invalid recipe file name '{file_name}': {issue}")]
  InvalidFileName { file_name: String, issue: FileNameIssue },

  /// The file is not a recipe file at all.
  #[error("'{0}' is not a recipe file")]
  NotARecipe(PathBuf),

  /// Failed to read the recipe file.
  #[error("failed to read recipe file '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The YAML document could not be parsed.
  #[error("failed to parse recipe '{name}': {source}")]
  Parse {
    name: String,
    #[source]
    source: serde_yaml::Error,
  },

  /// A recipe source knows the recipe but could not load it.
  #[error("recipe '{name}' in {location} is malformed: {reason}")]
  Malformed {
    name: String,
    location: String,
    reason: String,
  },

  /// The recipe could not be serialized back to YAML.
  #[error("failed to serialize recipe '{name}': {source}")]
  Serialize {
    name: String,
    #[source]
    source: serde_yaml::Error,
  },
}

/// A named package definition.
///
/// The name is fixed at construction time from the recipe's provenance and
/// cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
  name: String,

  /// Free-form version string.
  pub version: String,

  /// Free-form description.
  pub description: String,

  /// Names of recipes this recipe depends on, in declaration order.
  pub dependencies: Vec<String>,

  /// Lifecycle stage name to ordered command lines.
  pub commands: BTreeMap<String, Vec<String>>,

  /// Additional top-level scalar fields from the recipe file.
  pub custom_attributes: BTreeMap<String, String>,

  /// Where the recipe's own source files live.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub recipes_dir: Option<PathBuf>,
}

impl Recipe {
  /// Create an empty recipe with the given name.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: String::new(),
      description: String::new(),
      dependencies: Vec::new(),
      commands: BTreeMap::new(),
      custom_attributes: BTreeMap::new(),
      recipes_dir: None,
    }
  }

  /// Set the version.
  pub fn with_version(mut self, version: impl Into<String>) -> Self {
    self.version = version.into();
    self
  }

  /// Set the dependency list.
  pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.dependencies = dependencies.into_iter().map(Into::into).collect();
    self
  }

  /// Set the command list for a lifecycle stage.
  pub fn with_commands<I, S>(mut self, stage: &str, commands: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self
      .commands
      .insert(stage.to_string(), commands.into_iter().map(Into::into).collect());
    self
  }

  /// The recipe identity.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Commands for a lifecycle stage. Absent stages are empty.
  pub fn commands(&self, stage: &str) -> &[String] {
    self.commands.get(stage).map(Vec::as_slice).unwrap_or_default()
  }

  /// Look up a field for `pkg.<name>.<field>` variable expansion.
  ///
  /// Built-in fields (`name`, `version`, `description`, `recipesDir`) take
  /// precedence over custom attributes of the same name.
  pub fn attribute(&self, key: &str) -> Option<String> {
    match key {
      "name" => Some(self.name.clone()),
      "version" => Some(self.version.clone()),
      "description" => Some(self.description.clone()),
      "recipesDir" => self.recipes_dir.as_ref().map(|p| p.display().to_string()),
      _ => self.custom_attributes.get(key).cloned(),
    }
  }

  /// Parse a recipe document, assigning `name` as its identity.
  pub fn from_yaml(name: &str, content: &str) -> Result<Self, RecipeError> {
    let document: RecipeDocument = if content.trim().is_empty() {
      RecipeDocument::default()
    } else {
      serde_yaml::from_str(content).map_err(|source| RecipeError::Parse {
        name: name.to_string(),
        source,
      })?
    };

    if let Some(declared) = &document.name
      && declared != name
    {
      debug!(recipe = name, declared = %declared, "ignoring name field in recipe file");
    }

    Ok(document.into_recipe(name))
  }

  /// Load a recipe from a `<name>.levain.yaml` file.
  ///
  /// When the document has no `recipesDir`, it defaults to the directory
  /// containing the file.
  pub fn from_file(path: &Path) -> Result<Self, RecipeError> {
    let file_name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();

    let name = recipe_name_from_file_name(&file_name)
      .map_err(|issue| RecipeError::InvalidFileName {
        file_name: file_name.clone(),
        issue,
      })?
      .ok_or_else(|| RecipeError::NotARecipe(path.to_path_buf()))?;

    let content = fs::read_to_string(path).map_err(|source| RecipeError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let mut recipe = Self::from_yaml(&name, &content)?;
    if recipe.recipes_dir.is_none() {
      recipe.recipes_dir = path.parent().map(Path::to_path_buf);
    }

    trace!(recipe = %recipe.name, path = %path.display(), "loaded recipe file");
    Ok(recipe)
  }

  /// Serialize the recipe back to a YAML document.
  ///
  /// The name is not written; it is carried by the file name.
  pub fn to_yaml(&self) -> Result<String, RecipeError> {
    serde_yaml::to_string(&RecipeDocument::from_recipe(self)).map_err(|source| RecipeError::Serialize {
      name: self.name.clone(),
      source,
    })
  }
}

/// The YAML shape of a recipe file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecipeDocument {
  #[serde(default, deserialize_with = "scalar_string", skip_serializing)]
  name: Option<String>,

  #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
  version: Option<String>,

  #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
  description: Option<String>,

  #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
  recipes_dir: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  dependencies: Option<Vec<String>>,

  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  commands: BTreeMap<String, Option<Vec<String>>>,

  #[serde(flatten)]
  extra: BTreeMap<String, serde_yaml::Value>,
}

impl RecipeDocument {
  fn into_recipe(self, name: &str) -> Recipe {
    let custom_attributes = self
      .extra
      .into_iter()
      .filter_map(|(key, value)| match scalar_to_string(&value) {
        Some(text) => Some((key, text)),
        None => {
          debug!(recipe = name, attribute = %key, "skipping non-scalar custom attribute");
          None
        }
      })
      .collect();

    Recipe {
      name: name.to_string(),
      version: self.version.unwrap_or_default(),
      description: self.description.unwrap_or_default(),
      dependencies: self.dependencies.unwrap_or_default(),
      commands: self
        .commands
        .into_iter()
        .map(|(stage, commands)| (stage, commands.unwrap_or_default()))
        .collect(),
      custom_attributes,
      recipes_dir: self.recipes_dir.map(PathBuf::from),
    }
  }

  fn from_recipe(recipe: &Recipe) -> Self {
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    Self {
      name: None,
      version: non_empty(&recipe.version),
      description: non_empty(&recipe.description),
      recipes_dir: None,
      dependencies: (!recipe.dependencies.is_empty()).then(|| recipe.dependencies.clone()),
      commands: recipe
        .commands
        .iter()
        .map(|(stage, commands)| (stage.clone(), Some(commands.clone())))
        .collect(),
      extra: recipe
        .custom_attributes
        .iter()
        .map(|(key, value)| (key.clone(), serde_yaml::Value::String(value.clone())))
        .collect(),
    }
  }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
  match value {
    serde_yaml::Value::String(s) => Some(s.clone()),
    serde_yaml::Value::Number(n) => Some(n.to_string()),
    serde_yaml::Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

/// Accept any YAML scalar (`version: 21` is as valid as `version: "21"`).
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = serde_yaml::Value::deserialize(deserializer)?;
  match value {
    serde_yaml::Value::Null => Ok(None),
    other => scalar_to_string(&other)
      .map(Some)
      .ok_or_else(|| serde::de::Error::custom("expected a string, number or boolean")),
  }
}
