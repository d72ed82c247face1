//! File primitives that keep the original recoverable.
//!
//! Two guarantees bracket every in-place compression:
//!
//! 1. **Backup first.** Before any mutation a sibling `<path><suffix>` copy is
//!    created with exclusive creation. If it already exists it is left alone,
//!    so reruns never overwrite the pristine original with an already
//!    compressed version. The copy carries the original's permissions and
//!    modification time.
//! 2. **Atomic commit.** The new bytes go to a temp file in the same directory
//!    which is then renamed over the original. A crash leaves either the old
//!    file or the new one, never a truncated mix.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Failed to back up {path}: {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to replace {path}: {source}")]
    CommitFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupStatus {
    Created(PathBuf),
    AlreadyPresent(PathBuf),
}

impl BackupStatus {
    pub fn path(&self) -> &Path {
        match self {
            BackupStatus::Created(p) | BackupStatus::AlreadyPresent(p) => p,
        }
    }
}

/// `photo.jpg` + `.backup` → `photo.jpg.backup`
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Create the backup unless one already exists.
pub fn ensure_backup(path: &Path, suffix: &str) -> Result<BackupStatus, SafetyError> {
    let backup = backup_path(path, suffix);
    let fail = |source| SafetyError::BackupFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut original = File::open(path).map_err(fail)?;
    let mut copy = match OpenOptions::new().write(true).create_new(true).open(&backup) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            // Only a regular file counts; a directory or symlink there is no backup
            let existing = fs::symlink_metadata(&backup).map_err(fail)?;
            if !existing.is_file() {
                return Err(fail(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} exists and is not a regular file", backup.display()),
                )));
            }
            tracing::debug!(backup = %backup.display(), "backup already present");
            return Ok(BackupStatus::AlreadyPresent(backup));
        }
        Err(e) => return Err(fail(e)),
    };

    let copied = io::copy(&mut original, &mut copy)
        .and_then(|_| original.metadata())
        .and_then(|meta| {
            copy.set_modified(meta.modified()?)?;
            copy.set_permissions(meta.permissions())
        })
        .and_then(|_| copy.sync_all());
    if let Err(e) = copied {
        drop(copy);
        let _ = fs::remove_file(&backup);
        return Err(fail(e));
    }
    Ok(BackupStatus::Created(backup))
}

/// Atomically replace `path` with `bytes`, keeping its permissions.
pub fn commit(path: &Path, bytes: &[u8]) -> Result<(), SafetyError> {
    let fail = |source| SafetyError::CommitFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(path).map_err(fail)?.permissions();

    let mut temp = NamedTempFile::new_in(dir).map_err(fail)?;
    temp.write_all(bytes).map_err(fail)?;
    temp.as_file().set_permissions(permissions).map_err(fail)?;
    temp.as_file().sync_all().map_err(fail)?;
    temp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}
