// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Role selection via filesystem symbolic link.
//!
//! A __role__ is a named slot holding multiple candidate config variants, of
//! which at most one is selected at a time. The variants live as plain config
//! files inside a directory named after the role under the config root. The
//! selection itself is a symbolic link placed next to that directory, named
//! after the role plus the config extension, pointing at the absolute path of
//! the chosen variant.
//!
//! Representing the selection as a symbolic link gives atomic, observable
//! selection state to any process for free, including the priority resolver,
//! which reads the role like any other config file. All dangling-link and
//! relative-link resolution lives behind this module so nothing else has to
//! care how the pointer is realized.

use crate::{
    error::{Error, Result},
    path::{add_config_ext, strip_config_ext, CONFIG_EXT},
};

use std::{
    fs::{read_dir, read_link, remove_file},
    io::ErrorKind,
    os::unix::fs::symlink,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// A named slot with multiple candidate config variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Role {
    name: String,
    dir_path: PathBuf,
    link_path: PathBuf,
}

impl Role {
    /// Open the role named `name` under the config root.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Input`] if no directory for the role exists.
    pub fn open(name: impl Into<String>, config_dir: impl AsRef<Path>) -> Result<Self> {
        let name = name.into();
        let dir_path = config_dir.as_ref().join(&name);
        if !dir_path.is_dir() {
            return Err(Error::input(format!("no such role '{name}'")));
        }

        let link_path = config_dir.as_ref().join(add_config_ext(&name));
        Ok(Self {
            name,
            dir_path,
            link_path,
        })
    }

    /// Name of the role.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enumerate the role's candidate variants, sorted by name.
    ///
    /// Only regular files carrying the config extension count as variants.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Io`] if the role directory cannot be read.
    pub fn variants(&self) -> Result<Vec<Variant>> {
        let mut variants = Vec::new();
        for entry in read_dir(&self.dir_path).map_err(|err| Error::io(&self.dir_path, err))? {
            let entry = entry.map_err(|err| Error::io(&self.dir_path, err))?;
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if path.is_file() && file_name.ends_with(CONFIG_EXT) {
                variants.push(Variant {
                    name: strip_config_ext(file_name).to_owned(),
                    path,
                });
            }
        }
        variants.sort_by(|lhs, rhs| lhs.name.cmp(&rhs.name));

        Ok(variants)
    }

    /// Currently selected variant, if any.
    ///
    /// Follows the selection link and resolves relative targets against the
    /// link's parent directory. A missing or dangling link is a recoverable
    /// condition reported as no selection, never a failure.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Io`] if the link exists but cannot be followed for
    ///   reasons other than being absent or not a link.
    pub fn selected(&self) -> Result<Option<Variant>> {
        let destination = match read_link(&self.link_path) {
            Ok(destination) => destination,
            // Not selected, or something other than a link squats on the path.
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) if err.kind() == ErrorKind::InvalidInput => return Ok(None),
            Err(err) => return Err(Error::io(&self.link_path, err)),
        };

        let destination = if destination.is_absolute() {
            destination
        } else {
            match self.link_path.parent() {
                Some(parent) => parent.join(destination),
                None => destination,
            }
        };

        if !destination.is_file() {
            debug!("selection link of role {:?} is dangling", self.name);
            return Ok(None);
        }

        let name = destination
            .file_name()
            .and_then(|name| name.to_str())
            .map(strip_config_ext)
            .unwrap_or_default()
            .to_owned();

        Ok(Some(Variant {
            name,
            path: destination,
        }))
    }

    /// Switch the selection to the variant named `config_name`.
    ///
    /// The name is accepted with or without the config extension. On success
    /// any existing selection link is replaced by one pointing at the chosen
    /// variant's absolute path. On failure the existing link stays untouched.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Input`] if no such variant exists in the role.
    /// - Return [`Error::Io`] if the link cannot be replaced.
    #[instrument(skip(self), fields(role = %self.name), level = "debug")]
    pub fn select(&self, config_name: &str) -> Result<()> {
        let wanted = strip_config_ext(config_name);
        let variant = self
            .variants()?
            .into_iter()
            .find(|variant| variant.name == wanted)
            .ok_or_else(|| {
                Error::input(format!("no such config '{config_name}' in this role"))
            })?;

        let destination = if variant.path.is_absolute() {
            variant.path.clone()
        } else {
            std::path::absolute(&variant.path).map_err(|err| Error::io(&variant.path, err))?
        };

        match remove_file(&self.link_path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(Error::io(&self.link_path, err)),
        }
        symlink(&destination, &self.link_path).map_err(|err| Error::io(&self.link_path, err))?;

        debug!("role {:?} now selects {:?}", self.name, variant.name);
        Ok(())
    }
}

/// One candidate config variant of a role.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variant {
    /// Variant name without the config extension.
    pub name: String,

    /// Path of the variant's backing config file.
    pub path: PathBuf,
}

/// Enumerate every role defined under the config root, sorted by name.
///
/// # Errors
///
/// - Return [`Error::Io`] if the config root cannot be read.
pub fn list_roles(config_dir: impl AsRef<Path>) -> Result<Vec<Role>> {
    let config_dir = config_dir.as_ref();
    let mut roles = Vec::new();
    for entry in read_dir(config_dir).map_err(|err| Error::io(config_dir, err))? {
        let entry = entry.map_err(|err| Error::io(config_dir, err))?;
        let file_type = entry
            .file_type()
            .map_err(|err| Error::io(entry.path(), err))?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if file_type.is_dir() {
            roles.push(Role::open(name, config_dir)?);
        }
    }
    roles.sort_by(|lhs, rhs| lhs.name.cmp(&rhs.name));

    Ok(roles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;
    use std::fs::{create_dir_all, write};
    use tempfile::TempDir;

    fn role_fixture() -> anyhow::Result<(TempDir, Role)> {
        let temp = tempfile::tempdir()?;
        let config_dir = temp.path().join("config");
        create_dir_all(config_dir.join("color_scheme"))?;
        write(
            config_dir.join("color_scheme/solarized.conf"),
            "Font=NotoSans\n",
        )?;
        write(
            config_dir.join("color_scheme/zenburn.conf"),
            "Font=Roboto\n",
        )?;

        let role = Role::open("color_scheme", config_dir)?;
        Ok((temp, role))
    }

    #[test]
    fn open_missing_role_fails() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let result = Role::open("foo", temp.path());
        assert!(matches!(result, Err(Error::Input(_))));
        Ok(())
    }

    #[test]
    fn variants_sorted_by_name() -> anyhow::Result<()> {
        let (_temp, role) = role_fixture()?;
        let names: Vec<_> = role
            .variants()?
            .into_iter()
            .map(|variant| variant.name)
            .collect();
        assert_eq!(names, ["solarized", "zenburn"]);
        Ok(())
    }

    #[test_case(""; "without extension")]
    #[test_case(CONFIG_EXT; "with extension")]
    #[test]
    fn select_replaces_link(extension: &str) -> anyhow::Result<()> {
        let (_temp, role) = role_fixture()?;

        role.select(&format!("solarized{extension}"))?;
        role.select(&format!("zenburn{extension}"))?;

        let destination = read_link(&role.link_path)?;
        assert_eq!(destination, role.dir_path.join("zenburn.conf"));
        assert_eq!(role.selected()?.map(|variant| variant.name), Some("zenburn".to_owned()));

        Ok(())
    }

    #[test]
    fn select_unknown_variant_keeps_existing_link() -> anyhow::Result<()> {
        let (_temp, role) = role_fixture()?;
        role.select("solarized")?;

        let result = role.select("foo");
        assert!(matches!(result, Err(Error::Input(_))));
        assert_eq!(
            role.selected()?.map(|variant| variant.name),
            Some("solarized".to_owned())
        );

        Ok(())
    }

    #[test]
    fn missing_and_dangling_links_read_as_no_selection() -> anyhow::Result<()> {
        let (_temp, role) = role_fixture()?;
        assert_eq!(role.selected()?, None);

        role.select("zenburn")?;
        remove_file(role.dir_path.join("zenburn.conf"))?;
        assert_eq!(role.selected()?, None);

        Ok(())
    }

    #[test]
    fn list_roles_skips_plain_configs() -> anyhow::Result<()> {
        let (temp, _role) = role_fixture()?;
        let config_dir = temp.path().join("config");
        write(config_dir.join("desktop.conf"), "Font=NotoSans\n")?;
        create_dir_all(config_dir.join("font_stack"))?;

        let names: Vec<_> = list_roles(&config_dir)?
            .into_iter()
            .map(|role| role.name().to_owned())
            .collect();
        assert_eq!(names, ["color_scheme", "font_stack"]);

        Ok(())
    }
}
