//! levain-lib: recipe resolution engine for levain
//!
//! This crate turns "install X" into an ordered installation plan:
//! - `Recipe`: a named package definition loaded from a `.levain.yaml` file
//! - `Repository`: a source of recipes (bundled, directory, git, zip, remote HTTP)
//! - `Registry`: the repository of recipes installed on this machine
//! - `RepositoryManager`: precedence-ordered aggregation of repositories
//! - `DependencyResolver`: depth-first topological ordering with cycle detection

pub mod config;
pub mod consts;
pub mod install;
pub mod platform;
pub mod recipe;
pub mod registry;
pub mod repository;
pub mod resolve;

#[cfg(test)]
pub(crate) mod testutil;
