//! End-to-end tests of the resolution engine against real directories.

mod common;
mod install_tests;
mod registry_tests;
mod resolution_tests;
