//! Recipe definitions and recipe file handling.
//!
//! # Modules
//!
//! - [`filename`] - Validation of `<name>.levain.yaml` file names
//! - [`types`] - The [`Recipe`] entity and its YAML document format

pub mod filename;
mod types;

pub use filename::{FileNameIssue, is_valid_recipe_name, recipe_file_name, recipe_name_from_file_name};
pub use types::*;
