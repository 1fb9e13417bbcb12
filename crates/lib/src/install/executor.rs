//! Running recipe commands.

use std::io;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::ActionContext;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The shell could not be started.
  #[error("failed to run '{cmd}': {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: io::Error,
  },

  /// The command exited unsuccessfully.
  #[error("command '{cmd}' failed with exit code {code:?}")]
  CmdFailed { cmd: String, code: Option<i32> },

  /// The command is a recipe action, which this executor cannot perform.
  #[error("'{cmd}' uses the recipe action '{action}', which needs an action executor; the shell executor only runs shell commands")]
  UnsupportedAction { action: String, cmd: String },
}

/// Recipe action verbs. None of them is a shell command.
const RECIPE_ACTIONS: &[&str] = &[
  "addPath",
  "addToDesktop",
  "addToStartMenu",
  "extract",
  "levainShell",
  "setEnv",
  "setVar",
  "template",
];

/// The recipe action `command` starts with, if any.
fn recipe_action(command: &str) -> Option<&'static str> {
  let verb = command.split_whitespace().next()?;
  RECIPE_ACTIONS.iter().copied().find(|action| *action == verb)
}

/// Performs the commands of a recipe stage.
pub trait ActionExecutor {
  fn execute(&mut self, context: &ActionContext<'_>, command: &str) -> Result<(), ExecuteError>;
}

/// Runs each command line through the system shell after variable expansion.
///
/// The command sees `LEVAIN_HOME`, `LEVAIN_RECIPE` and `LEVAIN_BASE_DIR` in
/// its environment and runs from the recipe's `recipesDir` when that exists.
/// Recipe actions such as `extract` are refused before anything is spawned.
#[derive(Debug, Default, Clone)]
pub struct ShellExecutor {
  shell: Option<String>,
}

impl ShellExecutor {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_shell(shell: impl Into<String>) -> Self {
    Self {
      shell: Some(shell.into()),
    }
  }
}

impl ActionExecutor for ShellExecutor {
  fn execute(&mut self, context: &ActionContext<'_>, command: &str) -> Result<(), ExecuteError> {
    let cmd = context.expand(command);
    if let Some(action) = recipe_action(&cmd) {
      warn!(recipe = %context.recipe.name(), action, "recipe action reached the shell executor");
      return Err(ExecuteError::UnsupportedAction {
        action: action.to_string(),
        cmd,
      });
    }
    info!(recipe = %context.recipe.name(), stage = context.stage, cmd = %cmd, "executing command");

    let (shell, shell_args) = get_shell(self.shell.as_deref());
    let mut process = Command::new(&shell);
    process
      .args(&shell_args)
      .arg(&cmd)
      .env("LEVAIN_HOME", &context.levain_home)
      .env("LEVAIN_RECIPE", context.recipe.name())
      .env("LEVAIN_BASE_DIR", &context.base_dir);

    if let Some(dir) = context.recipe.recipes_dir.as_deref()
      && dir.is_dir()
    {
      process.current_dir(dir);
    }

    debug!(shell = %shell, "spawning process");
    let output = process.output().map_err(|source| ExecuteError::Spawn {
      cmd: cmd.clone(),
      source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.trim().is_empty() {
      debug!(stdout = %stdout.trim(), "command stdout");
    }
    if !stderr.trim().is_empty() {
      debug!(stderr = %stderr.trim(), "command stderr");
    }

    if !output.status.success() {
      return Err(ExecuteError::CmdFailed {
        cmd,
        code: output.status.code(),
      });
    }
    Ok(())
  }
}

/// The shell and the argument that passes it a command line.
fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec!["-NoProfile".to_string(), "-Command".to_string()]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    ("cmd.exe".to_string(), vec!["/C".to_string()])
  }
}
