//! CLI output formatting utilities.
//!
//! Colored status lines on the terminal, JSON for scripts, and human-readable
//! install times.

use std::time::{Duration, SystemTime};

use anyhow::Context;
use owo_colors::{OwoColorize, Stream};

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
}

/// `2026-10-17T09:30:00Z (3h 12m ago)`
pub fn format_installed_at(installed_at: SystemTime, now: SystemTime) -> String {
  let stamp = humantime::format_rfc3339_seconds(installed_at);
  match now.duration_since(installed_at) {
    Ok(age) => format!("{} ({} ago)", stamp, format_age(age)),
    Err(_) => stamp.to_string(),
  }
}

/// Age rounded to the two most significant units.
pub fn format_age(age: Duration) -> String {
  let age = Duration::from_secs(age.as_secs());
  let full = humantime::format_duration(age).to_string();
  let units: Vec<&str> = full.split(' ').take(2).collect();
  units.join(" ")
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
