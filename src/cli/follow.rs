//! Session commands: fix, spoof, follow.
//!
//! All three drive a [`Session`] and print what it reports. `fix` and `spoof`
//! substitute a single position; `follow` reads a live feed until it ends.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;
use std::time::Duration;

use crate::engine::TrailEngine;
use crate::heading::{HeadingState, LineHeadingFeed};
use crate::model::{Coordinate, DerivedView, Stop};
use crate::position::{FixedFeed, LineFeed, PositionFeed};
use crate::session::{Session, SessionConfig, Status, TrailObserver};
use crate::storage::KeyValueStore;

use super::format::{
    format_bearing, format_distance, format_progress, format_status, format_stop, turn_hint,
};

/// Prints trail events as they happen.
///
/// Views are printed only when the target or the rounded distance changes,
/// so a stationary visitor doesn't scroll the terminal.
pub(super) struct TrailPrinter<W> {
    out: W,
    total: usize,
    last_line: Option<String>,
    last_hint: Option<&'static str>,
}

impl<W: Write> TrailPrinter<W> {
    pub(super) fn new(out: W, total: usize) -> Self {
        Self {
            out,
            total,
            last_line: None,
            last_hint: None,
        }
    }

    fn print_once(&mut self, line: String) {
        if self.last_line.as_ref() == Some(&line) {
            return;
        }
        let _ = writeln!(self.out, "{line}");
        self.last_line = Some(line);
    }
}

impl<W: Write> TrailObserver for TrailPrinter<W> {
    fn on_view(&mut self, view: &DerivedView) {
        let line = match &view.current {
            Some(target) => format!(
                "-> {}: {}, bearing {} | Progress: {}",
                target.name,
                format_distance(target.distance_meters),
                format_bearing(target.bearing_degrees),
                format_progress(&view.progress),
            ),
            None => format!("Progress: {}", format_progress(&view.progress)),
        };
        self.print_once(line);
    }

    fn on_arrival(&mut self, index: usize, stop: &Stop) {
        let _ = writeln!(
            self.out,
            "\nArrived at stop {} of {}\n{}\n",
            index + 1,
            self.total,
            format_stop(stop)
        );
        self.last_line = None;
    }

    fn on_complete(&mut self) {
        let _ = writeln!(self.out, "Trail complete: all {} stops done", self.total);
    }

    fn on_status_changed(&mut self, status: &Status) {
        eprintln!("{}", format_status(status));
    }

    fn on_pointer(&mut self, heading: &HeadingState) {
        let hint = turn_hint(heading.smoothed_pointer_degrees);
        if self.last_hint != Some(hint) {
            let _ = writeln!(self.out, "   ({hint})");
            self.last_hint = Some(hint);
        }
    }
}

pub(super) fn cmd_fix<S: KeyValueStore>(
    engine: TrailEngine<S>,
    config: SessionConfig,
    lat: f64,
    lng: f64,
) -> Result<(), String> {
    let coordinate = Coordinate::new(lat, lng);
    if !coordinate.is_valid() {
        return Err(format!("coordinate out of range: {lat}, {lng}"));
    }
    let feed = FixedFeed::new(coordinate, coordinate.to_string());
    run_session(engine, config, Box::new(feed), None)
}

pub(super) fn cmd_spoof<S: KeyValueStore>(
    engine: TrailEngine<S>,
    config: SessionConfig,
    name: &str,
) -> Result<(), String> {
    let (_, stop) = engine
        .catalog()
        .find(name)
        .ok_or_else(|| format!("no stop named '{name}'"))?;
    let feed = FixedFeed::new(stop.coordinate, stop.name.clone());
    run_session(engine, config, Box::new(feed), None)
}

pub(super) fn cmd_follow<S: KeyValueStore>(
    engine: TrailEngine<S>,
    config: SessionConfig,
    input: Option<&Path>,
    heading: Option<&Path>,
    interval: Option<Duration>,
) -> Result<(), String> {
    let mut feed = match input {
        Some(path) => LineFeed::new(path.display().to_string(), Box::new(open(path)?)),
        None => LineFeed::new("stdin", Box::new(BufReader::new(io::stdin()))),
    };
    if let Some(interval) = interval {
        feed = feed.with_pace(interval);
    }

    let heading = heading.map(LineHeadingFeed::open);

    run_session(engine, config, Box::new(feed), heading)
}

fn run_session<S: KeyValueStore>(
    engine: TrailEngine<S>,
    config: SessionConfig,
    feed: Box<dyn PositionFeed>,
    heading: Option<LineHeadingFeed>,
) -> Result<(), String> {
    let printer = TrailPrinter::new(io::stdout(), engine.catalog().len());
    let mut session = Session::new(engine, printer, config);
    session.refresh();

    if let Some(heading) = heading {
        session
            .start_heading(Box::new(heading))
            .map_err(|e| format!("failed to start compass: {e}"))?;
    }
    session
        .switch_feed(feed)
        .map_err(|e| format!("failed to start position feed: {e}"))?;
    session.run();

    eprintln!("Progress: {}", format_progress(&session.engine().progress()));
    Ok(())
}

fn open(path: &Path) -> Result<BufReader<File>, String> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| format!("failed to open {}: {e}", path.display()))
}
