// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Flat configuration sources and priority resolution.
//!
//! A __config source__ is one flat `key=value` file contributing values to
//! the effective mapping. Which sources are enabled, and in what order, is
//! governed by the __priority file__: a newline-delimited listing of source
//! names, highest priority first. An entry may name a plain config file or a
//! role; roles contribute whichever variant is currently selected.
//!
//! The __effective mapping__ is the single key→value table produced by
//! folding every enabled source in reverse priority order, so values from
//! higher-priority sources overwrite values from lower-priority ones. It is
//! recomputed in full on every sync and never persisted.

use crate::{
    error::{Error, Result},
    path::{add_config_ext, strip_config_ext, Paths},
    role::Role,
};

use std::{
    collections::HashMap,
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::debug;

/// One flat `key=value` configuration source.
///
/// Values are opaque strings. No type coercion happens at this layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigSource {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl ConfigSource {
    /// Parse a config source from a flat text file.
    ///
    /// The first `=` on a line separates key from value, with surrounding
    /// whitespace trimmed from both halves. Later lines overwrite earlier
    /// ones for the same key. Comment lines (leading whitespace then `#`)
    /// and lines without a separator are ignored, which deliberately
    /// tolerates blank lines and freeform prose.
    ///
    /// # Errors
    ///
    /// - Return [`Error::FileParse`] if the file cannot be opened for
    ///   reading. Absence is the caller's concern, not this function's.
    pub fn read(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = read_to_string(&path).map_err(|err| {
            Error::file_parse(&path, format!("could not open the configuration file: {err}"))
        })?;

        let mut values = HashMap::new();
        for line in content.lines() {
            if line.trim_start().starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            values.insert(key.trim().to_owned(), value.trim().to_owned());
        }

        Ok(Self { path, values })
    }

    /// Basename of the backing file without the config extension.
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .map(strip_config_ext)
            .unwrap_or_default()
    }

    /// Parsed key→value pairs.
    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }

    /// Consume the source, keeping only its key→value pairs.
    pub fn into_values(self) -> HashMap<String, String> {
        self.values
    }
}

/// Priority-ordered listing of enabled source names, highest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PriorityList {
    names: Vec<String>,
}

impl PriorityList {
    /// Load the priority file.
    ///
    /// Blank lines are skipped and the config extension is stripped from
    /// entries that carry it. A missing priority file reads as an empty
    /// listing, since a fresh program directory starts with nothing enabled.
    ///
    /// # Errors
    ///
    /// - Return [`Error::FileParse`] if the file exists but cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
            Err(err) => {
                return Err(Error::file_parse(
                    path,
                    format!("could not open the priority file: {err}"),
                ))
            }
        };

        let names = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| strip_config_ext(line).to_owned())
            .collect();

        Ok(Self { names })
    }

    /// Source names from highest to lowest priority.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Fold every enabled config source into one effective key→value mapping.
///
/// Sources are read in reverse priority order so that later merges, coming
/// from higher-priority sources, overwrite earlier ones. The highest-priority
/// source therefore always wins on key collision, regardless of file system
/// ordering. Entries that resolve to nothing are skipped without error.
///
/// When `only` is given, priority entries outside that subset are left out
/// of the fold entirely.
///
/// # Errors
///
/// - Return [`Error::FileParse`] if the priority file or any resolved config
///   source cannot be read.
pub fn resolve_effective(paths: &Paths, only: Option<&[String]>) -> Result<HashMap<String, String>> {
    let priority = PriorityList::load(paths.priority_file())?;

    let mut mapping = HashMap::new();
    for name in priority.names().iter().rev() {
        if let Some(only) = only {
            if !only.iter().any(|pick| strip_config_ext(pick) == name) {
                continue;
            }
        }

        let Some(path) = resolve_source(paths, name)? else {
            debug!("priority entry {name:?} does not resolve to any config, skipping");
            continue;
        };

        let source = ConfigSource::read(path)?;
        mapping.extend(source.into_values());
    }

    Ok(mapping)
}

/// Resolve one priority entry to a concrete config file path.
///
/// An entry naming a role directory resolves to the role's currently
/// selected variant, or nothing when the role has no selection. Any other
/// entry resolves to a plain config file of the same name, or nothing when
/// no such file exists.
fn resolve_source(paths: &Paths, name: &str) -> Result<Option<PathBuf>> {
    let config_dir = paths.config_dir();

    if config_dir.join(name).is_dir() {
        let role = Role::open(name, &config_dir)?;
        return Ok(role.selected()?.map(|variant| variant.path));
    }

    let config_path = config_dir.join(add_config_ext(name));
    if config_path.is_file() {
        Ok(Some(config_path))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::fs::{create_dir_all, write};

    #[test]
    fn read_flat_config_source() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("desktop.conf");
        write(
            &path,
            indoc! {r#"
                # Comment lines are skipped.
                   # Even indented ones.
                Font = NotoSans
                FontSize=12
                freeform prose without a separator
                Greeting=hello=world
                Font=Roboto
            "#},
        )?;

        let source = ConfigSource::read(&path)?;
        assert_eq!(source.name(), "desktop");
        assert_eq!(source.values().get("FontSize"), Some(&"12".to_owned()));
        // First separator splits; the rest stays in the value.
        assert_eq!(
            source.values().get("Greeting"),
            Some(&"hello=world".to_owned())
        );
        // Last occurrence within one file wins.
        assert_eq!(source.values().get("Font"), Some(&"Roboto".to_owned()));
        assert_eq!(source.values().len(), 3);

        Ok(())
    }

    #[test]
    fn read_missing_config_source_fails() {
        let result = ConfigSource::read("/nonexistent/desktop.conf");
        assert!(matches!(result, Err(Error::FileParse { .. })));
    }

    #[test]
    fn load_priority_list() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("priority");
        write(&path, "desktop.conf\n\n  color_scheme  \n")?;

        let priority = PriorityList::load(&path)?;
        assert_eq!(priority.names(), ["desktop", "color_scheme"]);

        let missing = PriorityList::load(temp.path().join("nothing"))?;
        assert!(missing.names().is_empty());

        Ok(())
    }

    #[test]
    fn effective_mapping_prefers_higher_priority() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let paths = Paths::new(temp.path(), temp.path().join("home"));
        paths.bootstrap()?;

        write(
            paths.config_dir().join("high.conf"),
            "Font=NotoSans\nFontSize=12\n",
        )?;
        write(
            paths.config_dir().join("low.conf"),
            "Font=Roboto\nBackgroundColor=#002b36\n",
        )?;
        write(paths.priority_file(), "high\nlow\nghost\n")?;

        let mapping = resolve_effective(&paths, None)?;
        assert_eq!(mapping.get("Font"), Some(&"NotoSans".to_owned()));
        assert_eq!(mapping.get("FontSize"), Some(&"12".to_owned()));
        assert_eq!(
            mapping.get("BackgroundColor"),
            Some(&"#002b36".to_owned())
        );

        Ok(())
    }

    #[test]
    fn effective_mapping_honors_subset() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let paths = Paths::new(temp.path(), temp.path().join("home"));
        paths.bootstrap()?;

        write(paths.config_dir().join("high.conf"), "Font=NotoSans\n")?;
        write(paths.config_dir().join("low.conf"), "FontSize=12\n")?;
        write(paths.priority_file(), "high\nlow\n")?;

        let mapping = resolve_effective(&paths, Some(&["low.conf".to_owned()]))?;
        assert_eq!(mapping.get("Font"), None);
        assert_eq!(mapping.get("FontSize"), Some(&"12".to_owned()));

        Ok(())
    }

    #[test]
    fn effective_mapping_resolves_roles() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let paths = Paths::new(temp.path(), temp.path().join("home"));
        paths.bootstrap()?;

        create_dir_all(paths.config_dir().join("color_scheme"))?;
        write(
            paths.config_dir().join("color_scheme/zenburn.conf"),
            "ForegroundColor=#dcdccc\n",
        )?;
        write(paths.priority_file(), "color_scheme\n")?;

        // No selection yet, so the role contributes nothing.
        let mapping = resolve_effective(&paths, None)?;
        assert!(mapping.is_empty());

        let role = Role::open("color_scheme", paths.config_dir())?;
        role.select("zenburn")?;

        let mapping = resolve_effective(&paths, None)?;
        assert_eq!(
            mapping.get("ForegroundColor"),
            Some(&"#dcdccc".to_owned())
        );

        Ok(())
    }
}
