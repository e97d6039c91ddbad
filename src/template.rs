// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Identifier scanning and template substitution.
//!
//! A __template file__ is ordinary text sprinkled with identifier tokens in a
//! user-configurable format. Templates mirror the user's real file tree under
//! a separate root: a template's path relative to the template root names the
//! target file it renders into under the target root.
//!
//! # Identifier Format
//!
//! The identifier format is a literal template string containing the
//! placeholder marker `%s` exactly once; every other character matches
//! literally. The default `{{%s}}` makes `{{Font}}` a token referencing the
//! identifier `Font`, but anything like `__%s__` or `${%s}` works equally
//! well. Identifier names consist of word characters and hyphens.

use crate::error::{Error, Result};
use crate::path::walk_files;

use regex::Regex;
use std::{
    collections::{BTreeSet, HashMap},
    fs::{self, read_to_string},
    io::ErrorKind,
    path::{Path, PathBuf},
    time::SystemTime,
};
use tracing::debug;

/// Placeholder marker inside an identifier format.
pub const PLACEHOLDER: &str = "%s";

/// Compiled identifier matcher built from the user's identifier format.
#[derive(Clone, Debug)]
pub struct IdentifierFormat {
    format: String,
    matcher: Regex,
}

impl IdentifierFormat {
    /// Compile an identifier format into a matcher.
    ///
    /// The format string is literal-escaped, then its placeholder is replaced
    /// with a capture group matching one or more word characters or hyphens.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Input`] if the format is blank or does not contain
    ///   the placeholder exactly once.
    pub fn new(format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        if format.is_empty() {
            return Err(Error::input("identifier format must not be blank"));
        }
        if format.matches(PLACEHOLDER).count() != 1 {
            return Err(Error::input(format!(
                "identifier format must contain the placeholder '{PLACEHOLDER}' exactly once"
            )));
        }

        let pattern = regex::escape(&format).replace(PLACEHOLDER, r"([\w-]+)");
        let matcher = Regex::new(&pattern).map_err(|err| {
            Error::input(format!("identifier format does not form a valid matcher: {err}"))
        })?;

        Ok(Self { format, matcher })
    }

    /// The format string as given.
    pub fn as_str(&self) -> &str {
        &self.format
    }

    /// Expand the format into the full token for one identifier name.
    pub fn expand(&self, name: &str) -> String {
        self.format.replace(PLACEHOLDER, name)
    }

    /// Extract the deduplicated set of identifier names referenced in `text`.
    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for line in text.lines() {
            for captures in self.matcher.captures_iter(line) {
                names.insert(captures[1].to_owned());
            }
        }

        names
    }
}

impl Default for IdentifierFormat {
    /// The documented default format `{{%s}}`.
    fn default() -> Self {
        Self::new("{{%s}}").unwrap()
    }
}

/// Association between one template file and its target file.
///
/// Derived purely from relative-path correspondence under the two roots. A
/// template without a living target never becomes a pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplatePair {
    /// Template file under the template root.
    pub template: PathBuf,

    /// Real file in the user's tree that receives rendered output.
    pub target: PathBuf,
}

/// Discover every template↔target pair under two parallel roots.
///
/// Walks every file under `templates_root`, re-roots its relative path under
/// `targets_root`, and keeps the pair when a file lives at the re-rooted
/// path. Symbolic links are followed, so a target reached through a link is
/// judged by what the link resolves to. Templates whose target is absent,
/// including targets behind a dangling link, are silently excluded. The
/// returned order follows the deterministic walk order of the template tree.
///
/// # Errors
///
/// - Return [`Error::Status`] if a target path exists but is a directory.
/// - Return [`Error::Io`] if either tree cannot be traversed.
pub fn discover(templates_root: &Path, targets_root: &Path) -> Result<Vec<TemplatePair>> {
    let mut pairs = Vec::new();
    if !templates_root.is_dir() {
        return Ok(pairs);
    }

    for template in walk_files(templates_root)? {
        let Ok(relative) = template.strip_prefix(templates_root) else {
            continue;
        };
        let target = targets_root.join(relative);

        match fs::metadata(&target) {
            Ok(metadata) if metadata.is_dir() => {
                return Err(Error::status(format!(
                    "target for template {:?} exists but is a directory: {}",
                    relative,
                    target.display()
                )));
            }
            Ok(_) => pairs.push(TemplatePair { template, target }),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("template {:?} has no target file, skipping", relative);
            }
            Err(err) => return Err(Error::io(target, err)),
        }
    }

    Ok(pairs)
}

/// Partition pairs into those eligible for update and those skipped as stale.
///
/// A target modified after the last successful sync belongs to the user and
/// must not be clobbered, so its pair is skipped unless `force` pushes every
/// pair through. Symbolic links are followed, so the modification time of
/// the resolved file decides, not the link's own. A target that no longer
/// exists is always eligible, since first-time creation cannot be blocked
/// by staleness.
///
/// # Errors
///
/// - Return [`Error::Io`] if a target's modification time cannot be read.
pub fn partition_stale(
    pairs: Vec<TemplatePair>,
    last_sync: SystemTime,
    force: bool,
) -> Result<(Vec<TemplatePair>, Vec<TemplatePair>)> {
    if force {
        return Ok((pairs, Vec::new()));
    }

    let mut eligible = Vec::new();
    let mut skipped = Vec::new();
    for pair in pairs {
        match fs::metadata(&pair.target) {
            Ok(metadata) => {
                let modified = metadata
                    .modified()
                    .map_err(|err| Error::io(&pair.target, err))?;
                if modified <= last_sync {
                    eligible.push(pair);
                } else {
                    skipped.push(pair);
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => eligible.push(pair),
            Err(err) => return Err(Error::io(&pair.target, err)),
        }
    }

    Ok((eligible, skipped))
}

/// Substitution outcome for one template.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rendered {
    /// Fully rendered text for the template.
    pub text: String,

    /// Identifiers referenced by the template but absent from the mapping.
    pub missing: BTreeSet<String>,
}

/// Rewrite template content, resolving every identifier token.
///
/// Works line by line. Each identifier found on a line has its fully expanded
/// token replaced everywhere on that line with the resolved value. An
/// identifier absent from the mapping is recorded instead of aborting, so
/// every unresolved name across a whole sync can be reported in one batch.
///
/// # Errors
///
/// - Return [`Error::FileParse`] if the template cannot be read.
pub fn render(
    template_path: &Path,
    mapping: &HashMap<String, String>,
    format: &IdentifierFormat,
) -> Result<Rendered> {
    let content = read_to_string(template_path).map_err(|err| {
        Error::file_parse(
            template_path,
            format!("could not open the template file: {err}"),
        )
    })?;

    let mut text = String::with_capacity(content.len());
    let mut missing = BTreeSet::new();
    // split_inclusive keeps line terminators so rendering round-trips bytes
    // that are not part of any token.
    for line in content.split_inclusive('\n') {
        let mut rendered = line.to_owned();
        for name in format.extract(line) {
            match mapping.get(&name) {
                Some(value) => rendered = rendered.replace(&format.expand(&name), value),
                None => {
                    missing.insert(name);
                }
            }
        }
        text.push_str(&rendered);
    }

    Ok(Rendered { text, missing })
}
