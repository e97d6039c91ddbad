// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Every well-known location syndot touches is collected into one [`Paths`]
//! context constructed once at process start and handed to each component by
//! reference. No component derives paths from ambient global state.

use crate::error::{Error, Result};

use std::{
    collections::VecDeque,
    fs::{read_dir, OpenOptions},
    path::{Path, PathBuf},
};

/// File extension shared by every config file and role selection link.
pub const CONFIG_EXT: &str = ".conf";

/// Well-known file locations for one syndot instance.
///
/// The program directory holds everything syndot writes for itself: the
/// template tree, the config tree, the priority file, the metadata store,
/// and the lock file. The target root is where rendered output lands, which
/// is the user's home directory by default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paths {
    program_dir: PathBuf,
    target_root: PathBuf,
}

impl Paths {
    /// Construct paths rooted at an explicit program directory and target root.
    pub fn new(program_dir: impl Into<PathBuf>, target_root: impl Into<PathBuf>) -> Self {
        Self {
            program_dir: program_dir.into(),
            target_root: target_root.into(),
        }
    }

    /// Construct default paths from the user's environment.
    ///
    /// Uses XDG base directory `$XDG_CONFIG_HOME/syndot` as the program
    /// directory, and the user's home directory as the target root.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Status`] if the home directory cannot be determined.
    pub fn from_env() -> Result<Self> {
        let config_root = dirs::config_dir().ok_or_else(|| {
            Error::status("cannot determine absolute path to user's config directory")
        })?;
        let home_dir = dirs::home_dir().ok_or_else(|| {
            Error::status("cannot determine absolute path to user's home directory")
        })?;

        Ok(Self::new(config_root.join("syndot"), home_dir))
    }

    /// Directory holding all syndot state.
    pub fn program_dir(&self) -> &Path {
        &self.program_dir
    }

    /// Root the rendered output is published under.
    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    /// Directory holding the user's template tree.
    pub fn templates_dir(&self) -> PathBuf {
        self.program_dir.join("templates")
    }

    /// Directory holding the user's config files and roles.
    pub fn config_dir(&self) -> PathBuf {
        self.program_dir.join("config")
    }

    /// Newline-delimited listing of enabled sources, highest priority first.
    pub fn priority_file(&self) -> PathBuf {
        self.program_dir.join("priority")
    }

    /// Persistent metadata store.
    pub fn info_file(&self) -> PathBuf {
        self.program_dir.join("info.json")
    }

    /// Advisory lock file guarding mutating operations.
    pub fn lock_file(&self) -> PathBuf {
        self.program_dir.join("lock")
    }

    /// Create the program directory tree if any part of it is missing.
    ///
    /// Leaves existing files untouched. The metadata store is not generated
    /// here; it is created lazily with defaults on first load.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Io`] if any directory or file cannot be created.
    pub fn bootstrap(&self) -> Result<()> {
        for dir in [&self.program_dir, &self.templates_dir(), &self.config_dir()] {
            std::fs::create_dir_all(dir).map_err(|err| Error::io(dir, err))?;
        }

        let priority_file = self.priority_file();
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&priority_file)
            .map_err(|err| Error::io(&priority_file, err))?;

        Ok(())
    }
}

/// Append the config extension to a name that lacks it.
pub fn add_config_ext(name: &str) -> String {
    format!("{}{}", strip_config_ext(name), CONFIG_EXT)
}

/// Strip the config extension from a name that carries it.
pub fn strip_config_ext(name: &str) -> &str {
    name.strip_suffix(CONFIG_EXT).unwrap_or(name)
}

/// Walk every non-directory entry under `root`.
///
/// Iterative worklist traversal. Entries within one directory are visited in
/// name order so the resulting listing is deterministic. Directory symbolic
/// links are not followed; file symbolic links are reported as files.
///
/// # Errors
///
/// - Return [`Error::Io`] if any directory cannot be read.
pub fn walk_files(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut worklist = VecDeque::from([root.as_ref().to_path_buf()]);

    while let Some(dir) = worklist.pop_front() {
        let mut entries = Vec::new();
        for entry in read_dir(&dir).map_err(|err| Error::io(&dir, err))? {
            let entry = entry.map_err(|err| Error::io(&dir, err))?;
            let file_type = entry
                .file_type()
                .map_err(|err| Error::io(entry.path(), err))?;
            entries.push((entry.path(), file_type));
        }
        entries.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));

        for (path, file_type) in entries {
            if file_type.is_dir() {
                worklist.push_back(path);
            } else {
                files.push(path);
            }
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::{create_dir_all, write};

    #[test]
    fn config_ext_round_trip() {
        assert_eq!(add_config_ext("desktop"), "desktop.conf");
        assert_eq!(add_config_ext("desktop.conf"), "desktop.conf");
        assert_eq!(strip_config_ext("desktop.conf"), "desktop");
        assert_eq!(strip_config_ext("desktop"), "desktop");
    }

    #[test]
    fn bootstrap_creates_program_tree() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let paths = Paths::new(temp.path().join("syndot"), temp.path().join("home"));

        paths.bootstrap()?;

        assert!(paths.templates_dir().is_dir());
        assert!(paths.config_dir().is_dir());
        assert!(paths.priority_file().is_file());

        // Idempotent, and existing files stay untouched.
        write(paths.priority_file(), "desktop\n")?;
        paths.bootstrap()?;
        assert_eq!(std::fs::read_to_string(paths.priority_file())?, "desktop\n");

        Ok(())
    }

    #[test]
    fn walk_files_is_deterministic_and_recursive() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        create_dir_all(temp.path().join("b/nested"))?;
        write(temp.path().join("b/nested/deep.txt"), "")?;
        write(temp.path().join("b/file.txt"), "")?;
        write(temp.path().join("a.txt"), "")?;

        let result = walk_files(temp.path())?;
        let expect = vec![
            temp.path().join("a.txt"),
            temp.path().join("b/file.txt"),
            temp.path().join("b/nested/deep.txt"),
        ];
        assert_eq!(result, expect);

        Ok(())
    }
}
