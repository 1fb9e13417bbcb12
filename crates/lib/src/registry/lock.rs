//! Single-writer guard for the registry directory.
//!
//! Reads never lock: every registry file is replaced by an atomic rename, so
//! a reader sees either the old or the new entry. Writers (`install`,
//! `remove`) take a [`RegistryGuard`] through [`Registry::lock`] and keep it
//! for the whole run. A second writer fails at once and is told who holds
//! the registry.
//!
//! The lock is an OS file lock, so it goes away with the process that held
//! it. A lock file left on disk never blocks anybody by itself.
//!
//! [`Registry::lock`]: super::Registry::lock

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Lock file inside the registry directory.
pub const LOCK_FILE_NAME: &str = ".levain.lock";

/// Who is writing to the registry, as recorded in the lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockHolder {
  pub pid: u32,
  /// The levain command line, e.g. `install maven`.
  pub command: String,
  pub since: DateTime<Utc>,
}

impl LockHolder {
  fn current(command: &str) -> Self {
    Self {
      pid: std::process::id(),
      command: command.to_string(),
      since: Utc::now(),
    }
  }

  /// The holder recorded at `path`. Unreadable or partial records count as
  /// unknown.
  fn read(path: &Path) -> Option<Self> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
  }
}

#[derive(Debug, Error)]
pub enum RegistryLockError {
  /// Another process is writing to the registry.
  #[error("registry '{}' is busy: {}", .dir.display(), describe(.holder))]
  Busy { dir: PathBuf, holder: Option<LockHolder> },

  #[error("cannot {action} registry lock '{}': {source}", .path.display())]
  Io {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

fn describe(holder: &Option<LockHolder>) -> String {
  match holder {
    Some(holder) => format!(
      "'levain {}' (pid {}) has been writing since {}",
      holder.command,
      holder.pid,
      holder.since.to_rfc3339_opts(SecondsFormat::Secs, true)
    ),
    None => "another levain process is writing to it".to_string(),
  }
}

/// Exclusive write access to one registry directory. Released on drop.
#[derive(Debug)]
pub struct RegistryGuard {
  file: File,
  path: PathBuf,
  holder: LockHolder,
}

impl RegistryGuard {
  /// Take the registry in `dir` for `command`, creating the directory if
  /// needed. Never waits.
  pub(crate) fn acquire(dir: &Path, command: &str) -> Result<Self, RegistryLockError> {
    let path = dir.join(LOCK_FILE_NAME);
    let io_err = |action| {
      let path = path.clone();
      move |source| RegistryLockError::Io { action, path, source }
    };

    fs::create_dir_all(dir).map_err(io_err("create the directory for"))?;
    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&path)
      .map_err(io_err("open"))?;

    if !sys::try_lock_exclusive(&file).map_err(io_err("lock"))? {
      let holder = LockHolder::read(&path);
      debug!(lock = %path.display(), ?holder, "registry lock is taken");
      return Err(RegistryLockError::Busy {
        dir: dir.to_path_buf(),
        holder,
      });
    }

    let holder = LockHolder::current(command);
    let record = serde_json::to_vec(&holder).map_err(|e| io_err("record the holder in")(io::Error::other(e)))?;
    file.set_len(0).map_err(io_err("record the holder in"))?;
    (&file).write_all(&record).map_err(io_err("record the holder in"))?;
    debug!(lock = %path.display(), command, "registry locked");

    Ok(Self { file, path, holder })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn holder(&self) -> &LockHolder {
    &self.holder
  }
}

impl Drop for RegistryGuard {
  fn drop(&mut self) {
    // An idle lock file names nobody. Closing the file releases the lock.
    if let Err(e) = self.file.set_len(0) {
      warn!(lock = %self.path.display(), error = %e, "could not clear registry lock holder");
    }
  }
}

#[cfg(unix)]
mod sys {
  use std::fs::File;
  use std::io;

  use rustix::fs::{FlockOperation, flock};
  use rustix::io::Errno;

  /// `Ok(false)` when another open file holds the lock.
  pub fn try_lock_exclusive(file: &File) -> io::Result<bool> {
    match flock(file, FlockOperation::NonBlockingLockExclusive) {
      Ok(()) => Ok(true),
      Err(errno) if errno == Errno::WOULDBLOCK => Ok(false),
      Err(errno) => Err(errno.into()),
    }
  }
}

#[cfg(windows)]
mod sys {
  use std::fs::File;
  use std::io;
  use std::os::windows::io::AsRawHandle;

  use windows_sys::Win32::Foundation::{ERROR_LOCK_VIOLATION, HANDLE};
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};
  use windows_sys::Win32::System::IO::OVERLAPPED;

  /// `Ok(false)` when another handle holds the lock.
  ///
  /// Locks one byte far past the holder record, so a blocked process can
  /// still read who holds the registry.
  pub fn try_lock_exclusive(file: &File) -> io::Result<bool> {
    // SAFETY: OVERLAPPED is plain data and valid when zeroed.
    let mut overlapped: OVERLAPPED = unsafe {
      let mut overlapped: OVERLAPPED = std::mem::zeroed();
      overlapped.Anonymous.Anonymous.Offset = u32::MAX;
      overlapped
    };

    // SAFETY: the handle stays open for the call and `overlapped` outlives it.
    let locked = unsafe {
      LockFileEx(
        file.as_raw_handle() as HANDLE,
        LOCKFILE_EXCLUSIVE_LOCK | LOCKFILE_FAIL_IMMEDIATELY,
        0,
        1,
        0,
        &mut overlapped,
      )
    };
    if locked != 0 {
      return Ok(true);
    }

    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(ERROR_LOCK_VIOLATION as i32) {
      Ok(false)
    } else {
      Err(err)
    }
  }
}
