// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Persistent sync metadata store.
//!
//! One JSON file records everything syndot must remember between runs: the
//! time of the last fully successful sync, and the user-tunable settings.
//! The store is read in full at the start of every sync and written back in
//! full at the end. `LastSync` only advances after a sync publishes without
//! error, which is what makes the staleness filter trustworthy.
//!
//! Settings are validated into a typed [`Settings`] struct at load time.
//! Unknown keys, malformed booleans, and malformed identifier formats are
//! all rejected up front rather than surfacing later at point of use.

use crate::{
    error::{Error, Result},
    io::write_atomic,
    template::IdentifierFormat,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fs::read_to_string, io::ErrorKind, path::PathBuf};
use tracing::debug;

/// String tokens recognized as boolean true in user settings.
const TRUE_TOKENS: [&str; 2] = ["yes", "true"];

/// String tokens recognized as boolean false in user settings.
const FALSE_TOKENS: [&str; 2] = ["no", "false"];

/// On-disk layout of the metadata store.
///
/// `OverwriteAlways` stays a string on disk so the file remains friendly to
/// hand editing; validation turns it into a real boolean.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawMetadata {
    #[serde(rename = "LastSync")]
    last_sync: DateTime<Utc>,

    #[serde(rename = "IdentifierFormat", default = "default_identifier_format")]
    identifier_format: String,

    #[serde(rename = "OverwriteAlways", default = "default_overwrite_always")]
    overwrite_always: String,
}

fn default_identifier_format() -> String {
    "{{%s}}".into()
}

fn default_overwrite_always() -> String {
    "no".into()
}

/// Validated user-tunable settings.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Compiled identifier format used for scanning and substitution.
    pub identifier_format: IdentifierFormat,

    /// Overwrite targets even when modified since the last sync.
    pub overwrite_always: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            identifier_format: IdentifierFormat::default(),
            overwrite_always: false,
        }
    }
}

/// Durable record of the last sync time and user settings.
#[derive(Clone, Debug)]
pub struct SyncMetadata {
    path: PathBuf,

    /// Moment of the last fully successful sync, UTC with sub-second
    /// precision.
    pub last_sync: DateTime<Utc>,

    /// Validated settings.
    pub settings: Settings,
}

impl SyncMetadata {
    /// Load the metadata store, generating defaults when absent.
    ///
    /// A store generated on first load is persisted immediately with
    /// `LastSync` set to the current time, so targets that already existed
    /// before syndot was introduced stay eligible for the first sync while
    /// anything edited afterwards is protected.
    ///
    /// # Errors
    ///
    /// - Return [`Error::FileParse`] if the store exists but is not valid
    ///   JSON.
    /// - Return [`Error::Input`] if the store carries unrecognized keys or
    ///   malformed settings values.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = match read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no metadata store at {:?}, generating defaults", path);
                let metadata = Self::generate(path);
                metadata.persist()?;
                return Ok(metadata);
            }
            Err(err) => {
                return Err(Error::file_parse(
                    &path,
                    format!("could not open the metadata store: {err}"),
                ))
            }
        };

        let raw: RawMetadata = serde_json::from_str(&content).map_err(|err| {
            if err.is_syntax() || err.is_eof() {
                Error::file_parse(&path, format!("metadata store is not valid JSON: {err}"))
            } else {
                Error::input(format!("metadata store: {err}"))
            }
        })?;

        let identifier_format = IdentifierFormat::new(raw.identifier_format)
            .map_err(|err| Error::input(format!("settings: 'IdentifierFormat' {err}")))?;
        let overwrite_always = parse_bool_token(&raw.overwrite_always).ok_or_else(|| {
            Error::input(format!(
                "settings: 'OverwriteAlways' must have a boolean value, got '{}'",
                raw.overwrite_always
            ))
        })?;

        Ok(Self {
            path,
            last_sync: raw.last_sync,
            settings: Settings {
                identifier_format,
                overwrite_always,
            },
        })
    }

    /// Generate a fresh store with default settings.
    fn generate(path: PathBuf) -> Self {
        Self {
            path,
            last_sync: Utc::now(),
            settings: Settings::default(),
        }
    }

    /// Record the current moment as the last fully successful sync.
    pub fn mark_synced(&mut self) {
        self.last_sync = Utc::now();
    }

    /// Write the store back out to durable storage.
    ///
    /// # Errors
    ///
    /// - Return [`Error::Io`] if the store cannot be written.
    pub fn persist(&self) -> Result<()> {
        let raw = RawMetadata {
            last_sync: self.last_sync,
            identifier_format: self.settings.identifier_format.as_str().to_owned(),
            overwrite_always: if self.settings.overwrite_always {
                "yes".into()
            } else {
                "no".into()
            },
        };

        // Serialization of this layout cannot fail, but avoid asserting so.
        let content = serde_json::to_string_pretty(&raw)
            .map_err(|err| Error::file_parse(&self.path, err.to_string()))?;
        write_atomic(&self.path, &content)
    }
}

/// Interpret a user-supplied boolean token.
fn parse_bool_token(token: &str) -> Option<bool> {
    let token = token.to_lowercase();
    if TRUE_TOKENS.contains(&token.as_str()) {
        Some(true)
    } else if FALSE_TOKENS.contains(&token.as_str()) {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use simple_test_case::test_case;
    use std::fs::write;

    #[test]
    fn load_generates_and_persists_defaults() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("info.json");

        let before = Utc::now();
        let metadata = SyncMetadata::load(&path)?;

        assert!(path.is_file());
        assert!(metadata.last_sync >= before);
        assert_eq!(metadata.settings.identifier_format.as_str(), "{{%s}}");
        assert!(!metadata.settings.overwrite_always);

        Ok(())
    }

    #[test]
    fn persist_then_load_round_trips() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("info.json");

        let mut metadata = SyncMetadata::load(&path)?;
        metadata.settings.overwrite_always = true;
        metadata.mark_synced();
        metadata.persist()?;

        let reloaded = SyncMetadata::load(&path)?;
        assert_eq!(reloaded.last_sync, metadata.last_sync);
        assert!(reloaded.settings.overwrite_always);

        Ok(())
    }

    #[test_case(r#""yes""#, true; "yes token")]
    #[test_case(r#""TRUE""#, true; "uppercase true token")]
    #[test_case(r#""no""#, false; "no token")]
    #[test_case(r#""false""#, false; "false token")]
    #[test]
    fn boolean_tokens_accepted(token: &str, expect: bool) -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("info.json");
        write(
            &path,
            format!(
                indoc! {r#"
                    {{
                        "LastSync": "2026-08-29T10:15:30.123456Z",
                        "IdentifierFormat": "{{{{%s}}}}",
                        "OverwriteAlways": {}
                    }}
                "#},
                token
            ),
        )?;

        let metadata = SyncMetadata::load(&path)?;
        assert_eq!(metadata.settings.overwrite_always, expect);

        Ok(())
    }

    #[test_case(r#"{"LastSync": "2026-08-29T10:15:30Z", "OverwriteAlways": "maybe"}"#; "bad boolean")]
    #[test_case(r#"{"LastSync": "2026-08-29T10:15:30Z", "IdentifierFormat": "plain"}"#; "bad format")]
    #[test_case(r#"{"LastSync": "2026-08-29T10:15:30Z", "Unknown": "1"}"#; "unknown key")]
    #[test]
    fn malformed_settings_rejected(content: &str) -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("info.json");
        write(&path, content)?;

        let result = SyncMetadata::load(&path);
        assert!(matches!(result, Err(Error::Input(_))));

        Ok(())
    }

    #[test]
    fn unparsable_store_rejected() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("info.json");
        write(&path, "not json at all")?;

        let result = SyncMetadata::load(&path);
        assert!(matches!(result, Err(Error::FileParse { .. })));

        Ok(())
    }
}
