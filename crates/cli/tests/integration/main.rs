//! CLI integration tests against an isolated levain home.

mod common;
mod install_tests;
mod query_tests;
mod repo_tests;
