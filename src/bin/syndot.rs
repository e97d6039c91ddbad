// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use syndot::{
    config::resolve_effective,
    path::walk_files,
    role::{list_roles, Role},
    run_sync,
    store::SyncMetadata,
    Error, Paths,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use notify::{RecursiveMode, Watcher};
use std::{collections::BTreeSet, process::exit, sync::mpsc};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  syndot [options] <syndot-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Show full error chains instead of one-line summaries.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Command::Init => run_init(),
            Command::Sync(opts) => run_sync_command(opts),
            Command::Role(opts) => run_role(opts),
            Command::List => run_list(),
            Command::Watch => run_watch(),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Create the program directory layout and default metadata.
    #[command(override_usage = "syndot init [options]")]
    Init,

    /// Render all templates and publish them to their real locations.
    #[command(override_usage = "syndot sync [options] [<config_name>]...")]
    Sync(SyncOptions),

    /// List roles, or select which variant a role points at.
    #[command(override_usage = "syndot role [options] [<role_name> [<config_name>]]")]
    Role(RoleOptions),

    /// Show every identifier found in the templates and its resolved value.
    #[command(override_usage = "syndot list [options]")]
    List,

    /// Watch the program directory and re-sync on every change.
    #[command(override_usage = "syndot watch [options]")]
    Watch,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct SyncOptions {
    /// Restrict resolution to these enabled configs only.
    #[arg(value_name = "config_name")]
    pub config_names: Vec<String>,

    /// Re-render every template even if its target changed since last sync.
    #[arg(short, long)]
    pub overwrite: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RoleOptions {
    /// Name of role to inspect or reassign.
    #[arg(value_name = "role_name")]
    pub role_name: Option<String>,

    /// Name of variant config the role should select.
    #[arg(value_name = "config_name")]
    pub config_name: Option<String>,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    let cli = Cli::parse();
    let debug = cli.debug;
    if let Err(error) = cli.run() {
        match error.downcast_ref::<Error>() {
            Some(cause) if cause.is_anticipated() && !debug => error!("{error:#}"),
            _ => error!("{error:?}"),
        }
        exit(1);
    }

    exit(0)
}

fn run_init() -> Result<()> {
    let paths = Paths::from_env()?;
    paths.bootstrap()?;
    SyncMetadata::load(paths.info_file())?;
    info!("initialized program directory at {}", paths.program_dir().display());

    Ok(())
}

fn run_sync_command(opts: SyncOptions) -> Result<()> {
    let paths = Paths::from_env()?;
    let only = if opts.config_names.is_empty() {
        None
    } else {
        Some(opts.config_names.as_slice())
    };

    let report = run_sync(&paths, only, opts.overwrite)?;
    info!(
        "synced {} template(s), skipped {}",
        report.rendered.len(),
        report.skipped.len()
    );

    Ok(())
}

fn run_role(opts: RoleOptions) -> Result<()> {
    let paths = Paths::from_env()?;
    paths.bootstrap()?;

    match (opts.role_name, opts.config_name) {
        (Some(role_name), Some(config_name)) => {
            let role = Role::open(role_name, paths.config_dir())?;
            role.select(&config_name)?;
            info!("role '{}' now selects '{config_name}'", role.name());
        }
        (Some(role_name), None) => {
            let role = Role::open(role_name, paths.config_dir())?;
            let selected = role.selected()?;
            for variant in role.variants()? {
                let marker = if selected.as_ref().is_some_and(|sel| sel.path == variant.path) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {}", variant.name);
            }
        }
        (None, _) => {
            for role in list_roles(paths.config_dir())? {
                let selected = role
                    .selected()?
                    .map(|variant| variant.name)
                    .unwrap_or_else(|| "<none>".into());
                println!("{:<24} {selected}", role.name());
            }
        }
    }

    Ok(())
}

fn run_list() -> Result<()> {
    let paths = Paths::from_env()?;
    paths.bootstrap()?;

    let metadata = SyncMetadata::load(paths.info_file())?;
    let format = &metadata.settings.identifier_format;
    let mapping = resolve_effective(&paths, None)?;

    let mut names = BTreeSet::new();
    for template in walk_files(paths.templates_dir())? {
        let content = std::fs::read_to_string(&template)
            .with_context(|| format!("failed to read template {}", template.display()))?;
        names.extend(format.extract(&content));
    }

    for name in names {
        match mapping.get(&name) {
            Some(value) => println!("{name:<24} {value}"),
            None => println!("{name:<24} <unresolved>"),
        }
    }

    Ok(())
}

fn run_watch() -> Result<()> {
    let paths = Paths::from_env()?;
    paths.bootstrap()?;

    let (sender, receiver) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
        let _ = sender.send(result);
    })?;
    watcher.watch(&paths.templates_dir(), RecursiveMode::Recursive)?;
    watcher.watch(&paths.config_dir(), RecursiveMode::Recursive)?;
    watcher.watch(&paths.priority_file(), RecursiveMode::NonRecursive)?;
    info!("watching {} for changes", paths.program_dir().display());

    for result in receiver {
        let event = match result {
            Ok(event) => event,
            Err(error) => {
                warn!("watch error: {error}");
                continue;
            }
        };
        if !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
            continue;
        }

        match run_sync(&paths, None, false) {
            Ok(report) if report.rendered.is_empty() => {
                debug!("change produced nothing new to sync")
            }
            Ok(report) => info!("re-synced {} template(s)", report.rendered.len()),
            // Another sync already holds the lock, its run covers this change.
            Err(error @ Error::Status(_)) => debug!("{error}"),
            Err(error) => error!("sync failed: {error}"),
        }
    }

    Ok(())
}
