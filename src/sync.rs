// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Sync orchestration.
//!
//! One sync is a straight run through a fixed sequence of phases:
//!
//! 1. __Locking__ — take the advisory lock, or bail if one is held.
//! 2. __Resolving__ — load the metadata store and fold every enabled config
//!    source into the effective mapping.
//! 3. __Discovering__ — pair every template with its living target.
//! 4. __Filtering__ — drop pairs whose target was modified since the last
//!    sync, unless overwrite is forced.
//! 5. __Rendering__ — substitute identifiers into every eligible pair,
//!    buffering output and collecting unresolved identifiers as they appear.
//! 6. __Validating__ — any unresolved identifier anywhere fails the whole
//!    batch before a single byte is published. Partial publication would
//!    leave the fan-out inconsistent, so it is all or nothing.
//! 7. __Publishing__ — atomically move each buffered render over its target.
//! 8. __Persisting__ — record the sync time back into the metadata store.
//!
//! I/O failure in phases 2 through 5 aborts without publishing anything.
//! Rendering is idempotent, so a sync that dies between publishing and
//! persisting only means the next run re-renders to identical bytes.

use crate::{
    config::resolve_effective,
    error::{Error, Result},
    io::write_atomic,
    lock::SyncLock,
    path::Paths,
    store::SyncMetadata,
    template::{discover, partition_stale, render},
};

use std::{collections::BTreeSet, path::PathBuf, time::SystemTime};
use tracing::{debug, info, instrument, warn};

/// What one sync did, for reporting back to the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Targets that received freshly rendered content.
    pub rendered: Vec<PathBuf>,

    /// Targets skipped because the user modified them since the last sync.
    pub skipped: Vec<PathBuf>,
}

/// Run one full sync.
///
/// `config_names` restricts the fold to a subset of enabled sources; `None`
/// folds everything the priority file enables. `overwrite` forces every
/// discovered pair through the staleness filter, as does the persistent
/// `OverwriteAlways` setting.
///
/// # Errors
///
/// - Return [`Error::Status`] if another sync is already running, or a
///   target path is occupied by a directory.
/// - Return [`Error::Input`] if any template references an identifier that
///   no enabled config source defines. Every unresolved identifier across
///   the whole batch is reported at once, and nothing is published.
/// - Return [`Error::FileParse`] if a config source, template, or the
///   metadata store cannot be read.
#[instrument(skip(paths, config_names), level = "debug")]
pub fn run_sync(
    paths: &Paths,
    config_names: Option<&[String]>,
    overwrite: bool,
) -> Result<SyncReport> {
    paths.bootstrap()?;
    let _lock = SyncLock::acquire(paths.lock_file())?;

    let mut metadata = SyncMetadata::load(paths.info_file())?;
    let mapping = resolve_effective(paths, config_names)?;
    let format = metadata.settings.identifier_format.clone();
    debug!("effective mapping holds {} keys", mapping.len());

    let pairs = discover(&paths.templates_dir(), paths.target_root())?;
    info!("discovered {} template pairs", pairs.len());

    let force = overwrite || metadata.settings.overwrite_always;
    let (eligible, skipped) =
        partition_stale(pairs, SystemTime::from(metadata.last_sync), force)?;
    for pair in &skipped {
        warn!(
            "skipping {:?}: modified since last sync, pass --overwrite to clobber",
            pair.target
        );
    }

    let mut staged = Vec::with_capacity(eligible.len());
    let mut missing = BTreeSet::new();
    for pair in eligible {
        let rendered = render(&pair.template, &mapping, &format)?;
        missing.extend(rendered.missing);
        staged.push((pair, rendered.text));
    }

    if !missing.is_empty() {
        let names = missing.into_iter().collect::<Vec<_>>().join(", ");
        return Err(Error::input(format!(
            "identifiers not found in any enabled config: {names}"
        )));
    }

    let mut rendered = Vec::with_capacity(staged.len());
    for (pair, text) in staged {
        write_atomic(&pair.target, &text)?;
        info!("synced {:?}", pair.target);
        rendered.push(pair.target);
    }

    metadata.mark_synced();
    metadata.persist()?;

    Ok(SyncReport {
        rendered,
        skipped: skipped.into_iter().map(|pair| pair.target).collect(),
    })
}
