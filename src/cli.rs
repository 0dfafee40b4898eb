//! CLI interface for Waymark.
//!
//! Each subcommand opens the trail catalog and the progress store, does one
//! thing, and exits. `follow` is the exception: it keeps running until its
//! position feed ends.
//!
//! Progress lives in `~/.waymark/progress.sqlite` unless `--store` points
//! elsewhere or `--ephemeral` keeps it in memory for the one invocation.

mod follow;
mod format;
mod trail;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::engine::TrailEngine;
use crate::session::SessionConfig;
use crate::storage::{self, KeyValueStore, MemoryStore, ProgressStore, SqliteStore};

/// Waymark: walk a trail, one stop at a time.
#[derive(Debug, Parser)]
#[command(name = "waymark", version, after_long_help = WALK_HELP)]
pub struct Cli {
    /// Trail definition (TOML). Defaults to the built-in trail.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Directory for saved progress. Defaults to `~/.waymark`.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Keep progress in memory only; nothing is read or saved.
    #[arg(long, global = true, conflicts_with = "store")]
    ephemeral: bool,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

const WALK_HELP: &str = r#"Walking the trail:
  1. waymark stops                       list every stop in order
  2. gpspipe -w | to-latlng | waymark follow
                                          follow a live feed on stdin
  3. waymark follow --input walk.txt --interval-ms 1000
                                          replay a recorded walk
  4. waymark skip                        give up on the current stop

Trying it out without a GPS:
  waymark spoof "Main Lab Block (Orion/Antares)"
  waymark fix 52.0579 1.2800"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the current target, its distance and bearing, and progress.
    Status {
        /// Print the derived view as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List every stop with its state and distance.
    Stops,

    /// Show the full content of one stop.
    Show {
        /// Stop name, exactly as listed by `stops`.
        name: String,
    },

    /// Record one substituted position fix.
    #[command(allow_negative_numbers = true)]
    Fix {
        /// Latitude in decimal degrees.
        lat: f64,
        /// Longitude in decimal degrees.
        lng: f64,
    },

    /// Pretend to stand at a stop.
    Spoof {
        /// Stop name, exactly as listed by `stops`.
        name: String,
    },

    /// Skip the current stop and move on to the next.
    Skip,

    /// Clear visited and skipped stops and start over.
    Reset {
        /// Don't ask for confirmation.
        #[arg(long)]
        yes: bool,
    },

    /// Follow a live position feed until it ends.
    ///
    /// Reads one `lat,lng` fix per line from `--input` or stdin.
    Follow {
        /// Read fixes from this file instead of stdin.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Read compass headings (degrees, one per line) from this file.
        #[arg(long)]
        heading: Option<PathBuf>,

        /// Pause between fixes, for replaying a recording at walking pace.
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run(cli: Cli, config: &Config) -> Result<(), String> {
    let catalog = match cli.catalog.as_ref().or(config.catalog.as_ref()) {
        Some(path) => Catalog::load(path, config.default_radius),
        None => Catalog::builtin(config.default_radius),
    }
    .map_err(|e| format!("failed to load trail: {e}"))?;

    let session = SessionConfig {
        fix_timeout: config.fix_timeout(),
        smoothing: config.smoothing(),
    };

    if cli.ephemeral {
        let engine = TrailEngine::new(catalog, ProgressStore::new(MemoryStore::new()));
        return dispatch(engine, session, cli.command);
    }

    let root = cli
        .store
        .or_else(|| config.store.clone())
        .or_else(storage::default_root)
        .ok_or("could not determine home directory")?;
    let store = SqliteStore::open(&root)
        .map_err(|e| format!("failed to open progress store at {}: {e}", root.display()))?;
    dispatch(
        TrailEngine::new(catalog, ProgressStore::new(store)),
        session,
        cli.command,
    )
}

fn dispatch<S: KeyValueStore>(
    mut engine: TrailEngine<S>,
    session: SessionConfig,
    command: Command,
) -> Result<(), String> {
    match command {
        Command::Status { json } => trail::cmd_status(&engine, json),
        Command::Stops => trail::cmd_stops(&engine),
        Command::Show { name } => trail::cmd_show(&engine, &name),
        Command::Fix { lat, lng } => follow::cmd_fix(engine, session, lat, lng),
        Command::Spoof { name } => follow::cmd_spoof(engine, session, &name),
        Command::Skip => trail::cmd_skip(&mut engine),
        Command::Reset { yes } => trail::cmd_reset(&mut engine, yes),
        Command::Follow {
            input,
            heading,
            interval_ms,
        } => follow::cmd_follow(
            engine,
            session,
            input.as_deref(),
            heading.as_deref(),
            interval_ms.map(Duration::from_millis),
        ),
    }
}
