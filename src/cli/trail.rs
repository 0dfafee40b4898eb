//! Trail commands: status, stops, show, skip, reset.

use std::io::{self, BufRead, Write};

use crate::engine::{TrailEngine, Update};
use crate::model::Effect;
use crate::storage::KeyValueStore;

use super::format::{
    format_bearing, format_distance, format_progress, format_stop, format_stop_status,
};

pub(super) fn cmd_status<S: KeyValueStore>(
    engine: &TrailEngine<S>,
    json: bool,
) -> Result<(), String> {
    let view = engine.view();

    if json {
        let json = serde_json::to_string_pretty(&view)
            .map_err(|e| format!("failed to serialize view: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    println!("{}", engine.catalog().title());
    match engine.store().updated_at() {
        Some(at) => println!("Position: {} (saved {at})", view.position),
        None => println!("Position: {}", view.position),
    }

    match &view.current {
        Some(target) => println!(
            "Next: {} ({} of {}), {} away, bearing {}",
            target.name,
            target.index + 1,
            engine.catalog().len(),
            format_distance(target.distance_meters),
            format_bearing(target.bearing_degrees),
        ),
        None => println!("Trail complete"),
    }

    if let Some(nearest) = view.nearest() {
        println!(
            "Nearest stop: {} ({})",
            nearest.name,
            format_distance(nearest.distance_meters)
        );
    }

    let skipped = &engine.state().skipped;
    if !skipped.is_empty() {
        let names: Vec<&str> = skipped.iter().map(String::as_str).collect();
        println!("Skipped: {}", names.join(", "));
    }

    println!("Progress: {}", format_progress(&view.progress));
    Ok(())
}

pub(super) fn cmd_stops<S: KeyValueStore>(engine: &TrailEngine<S>) -> Result<(), String> {
    let view = engine.view();

    for (i, (stop, distance)) in engine
        .catalog()
        .stops()
        .iter()
        .zip(&view.per_stop)
        .enumerate()
    {
        println!(
            "{:>2}. [{:<7}] {:<40} {:>9}  {}",
            i + 1,
            format_stop_status(engine.stop_status(i)),
            stop.name,
            format_distance(distance.distance_meters),
            stop.content.snippet(),
        );
    }

    if engine.is_complete() {
        println!("Trail complete");
    }
    println!("Progress: {}", format_progress(&view.progress));
    Ok(())
}

pub(super) fn cmd_show<S: KeyValueStore>(engine: &TrailEngine<S>, name: &str) -> Result<(), String> {
    let (index, stop) = engine
        .catalog()
        .find(name)
        .ok_or_else(|| format!("no stop named '{name}'"))?;

    println!("{}", format_stop(stop));
    println!("Status: {}", format_stop_status(engine.stop_status(index)));
    if let Some(distance) = engine.view().distance_to(&stop.name) {
        println!("Distance: {}", format_distance(distance));
    }
    Ok(())
}

pub(super) fn cmd_skip<S: KeyValueStore>(engine: &mut TrailEngine<S>) -> Result<(), String> {
    let skipped = engine
        .current_stop()
        .map(|s| s.name.clone())
        .ok_or("the trail is already complete; nothing to skip")?;

    let Update { view, effects } = engine.skip_current().map_err(|e| e.to_string())?;

    eprintln!("Skipped {skipped}");
    if effects.contains(&Effect::Completed) {
        println!("Trail complete: {}", format_progress(&view.progress));
    } else if let Some(target) = &view.current {
        println!(
            "Next: {}, {} away",
            target.name,
            format_distance(target.distance_meters)
        );
    }
    Ok(())
}

pub(super) fn cmd_reset<S: KeyValueStore>(
    engine: &mut TrailEngine<S>,
    yes: bool,
) -> Result<(), String> {
    if !yes {
        let prompt = format!(
            "Clear all progress on {}? [y/N] ",
            engine.catalog().title()
        );
        if !confirm(&prompt, io::stdin().lock())? {
            eprintln!("Reset cancelled");
            return Ok(());
        }
    }

    engine.reset();
    eprintln!("Progress cleared");
    Ok(())
}

/// Asks a yes/no question on stderr. Anything but `y` or `yes` is a no.
fn confirm(prompt: &str, mut input: impl BufRead) -> Result<bool, String> {
    eprint!("{prompt}");
    io::stderr()
        .flush()
        .map_err(|e| format!("failed to write prompt: {e}"))?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .map_err(|e| format!("failed to read answer: {e}"))?;

    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
