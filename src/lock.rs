// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Process-wide advisory locking.
//!
//! Only one mutating operation may run at a time per program directory: a
//! manual sync and a watcher-triggered re-sync racing each other would
//! interleave publication and metadata writes. The lock is an advisory
//! exclusive file lock, so the operating system releases it whenever the
//! holding process exits, including abnormal termination.

use crate::error::{Error, Result};

use fs2::FileExt;
use std::{
    fs::{File, OpenOptions},
    io::ErrorKind,
    path::Path,
};
use tracing::debug;

/// Exclusive lock held for the duration of one mutating operation.
///
/// Dropping the guard releases the lock.
#[derive(Debug)]
pub struct SyncLock {
    _file: File,
}

impl SyncLock {
    /// Acquire the lock without blocking.
    ///
    /// Acquisition failure is immediate. The caller is told another
    /// operation is running and must retry later on its own initiative.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Status`] if another operation already holds the
    ///   lock.
    /// - Return [`Error::Io`] if the lock file cannot be opened.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|err| Error::io(path, err))?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("acquired sync lock at {:?}", path);
                Ok(Self { _file: file })
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => Err(Error::status(
                "another sync operation is already taking place",
            )),
            Err(err) => Err(Error::io(path, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquisition_fails_until_release() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("lock");

        let guard = SyncLock::acquire(&path)?;
        let conflict = SyncLock::acquire(&path);
        assert!(matches!(conflict, Err(Error::Status(_))));

        drop(guard);
        let reacquired = SyncLock::acquire(&path);
        assert!(reacquired.is_ok());

        Ok(())
    }
}
