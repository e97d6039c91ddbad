// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Program-wide error taxonomy.
//!
//! Syndot distinguishes failures that are anticipated during normal operation
//! from truly unexpected faults. Anticipated failures come in three flavors:
//! bad user input, a conflicting program or environment status, and files
//! that should be machine readable but are not. Everything else (permission
//! faults, corrupted filesystem state) is carried through [`Error::Io`]
//! unmodified so that the full fault chain survives to the caller.

use std::path::PathBuf;

/// All failure categories recognized by syndot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// User-provided input is invalid, and recoverable by correcting it.
    #[error("{0}")]
    Input(String),

    /// The status of the program or its environment conflicts with the
    /// requested operation.
    #[error("{0}")]
    Status(String),

    /// A file that should be machine readable could not be opened or parsed.
    #[error("failed to parse {}: {reason}", path.display())]
    FileParse {
        path: PathBuf,
        reason: String,
    },

    /// Unexpected I/O fault.
    #[error("unexpected fault at {}", path.display())]
    Io {
        path: PathBuf,

        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Construct new input error.
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    /// Construct new status error.
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status(message.into())
    }

    /// Construct new file parse error.
    pub fn file_parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Construct new unexpected I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this failure was anticipated during normal operation.
    ///
    /// Anticipated failures print as a single line for the user to act on.
    /// Unexpected faults keep their full chain for diagnosis.
    pub fn is_anticipated(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
