// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Atomic file publication.
//!
//! Rendered output replaces files the user's programs read at arbitrary
//! times, so publication goes through a write-to-temp-then-rename dance. An
//! external reader observes either the old content or the new content in
//! full, never a partially written file.

use crate::error::{Error, Result};

use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

/// Write `content` to `path` atomically.
///
/// Creates parent directories as needed. The staging file lives next to the
/// final path so the rename never crosses a filesystem boundary.
///
/// # Errors
///
/// - Return [`Error::Io`] if staging or renaming fails.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(temp_name);

    let mut staged = File::create(&temp_path).map_err(|err| Error::io(&temp_path, err))?;
    staged
        .write_all(content.as_bytes())
        .map_err(|err| Error::io(&temp_path, err))?;
    staged
        .sync_all()
        .map_err(|err| Error::io(&temp_path, err))?;

    fs::rename(&temp_path, path).map_err(|err| Error::io(path, err))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn write_atomic_creates_parents_and_replaces() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join(".config/i3/config");

        write_atomic(&path, "font NotoSans\n")?;
        assert_eq!(fs::read_to_string(&path)?, "font NotoSans\n");

        write_atomic(&path, "font Roboto\n")?;
        assert_eq!(fs::read_to_string(&path)?, "font Roboto\n");

        // No staging leftovers.
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        Ok(())
    }
}
