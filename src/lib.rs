// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Consolidate your dotfiles.
//!
//! Syndot lets the user keep one canonical value, say a color or a font, in
//! one flat config file and fan it out into every application config that
//! wants that value in its own location and syntax.
//!
//! # How It Works
//!
//! The user mirrors their real dotfiles as __templates__ under the program
//! directory, replacing each value they want consolidated with an
//! __identifier token__ like `{{Font}}`. Flat `key=value` __config sources__
//! supply the values, stacked by a priority file so higher-priority sources
//! win on collision. A __role__ groups interchangeable config variants, for
//! example one file per color scheme, with one variant selected at a time
//! through a symbolic link.
//!
//! A __sync__ folds the enabled sources into one effective mapping, pairs
//! each template with its living target file, substitutes every identifier,
//! and atomically publishes the results. Targets the user has modified since
//! the last sync are left alone unless overwriting is forced, and a single
//! unresolved identifier anywhere fails the whole batch before anything is
//! published.

pub mod config;
pub mod error;
pub mod io;
pub mod lock;
pub mod path;
pub mod role;
pub mod store;
pub mod sync;
pub mod template;

pub use error::{Error, Result};
pub use path::Paths;
pub use sync::{run_sync, SyncReport};
