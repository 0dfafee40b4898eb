//! Live position from a line-oriented stream.
//!
//! One fix per line, `lat,lng` or `lat lng`, decimal degrees. Blank lines
//! and lines starting with `#` are ignored. This is how a GPS daemon pipe,
//! a recorded walk, or a terminal session feeds the trail.

use std::io::BufRead;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};

use crate::feed::{self, FeedError, FeedSink};
use crate::model::{Coordinate, Fix};

use super::PositionFeed;

/// Reads fixes from any buffered reader on a worker thread.
pub struct LineFeed {
    label: String,
    reader: Option<Box<dyn BufRead + Send>>,
    pace: Option<Duration>,
    sink: Option<FeedSink>,
    worker: Option<JoinHandle<()>>,
}

impl LineFeed {
    pub fn new(label: impl Into<String>, reader: Box<dyn BufRead + Send>) -> Self {
        Self {
            label: label.into(),
            reader: Some(reader),
            pace: None,
            sink: None,
            worker: None,
        }
    }

    /// Waits this long after each line, for replaying a recorded walk.
    #[must_use]
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }
}

impl PositionFeed for LineFeed {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn start(&mut self, sink: FeedSink) -> Result<(), FeedError> {
        let reader = self.reader.take().ok_or(FeedError::AlreadyStarted)?;

        let line_sink = sink.clone();
        let end_sink = sink.clone();
        let mut line_no = 0_u64;

        let worker = feed::spawn_line_reader(
            "waymark-position",
            reader,
            self.pace,
            move |line| {
                line_no += 1;
                match line {
                    Ok(line) => deliver(&line_sink, line_no, &line),
                    Err(e) => {
                        warn!(error = %e, "position input failed");
                        line_sink.on_error(format!("position input failed: {e}"));
                        false
                    }
                }
            },
            move || end_sink.on_end(),
        )?;

        self.sink = Some(sink);
        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.deactivate();
        }
        // A reader blocked on stdin can't be interrupted; the deactivated
        // sink keeps it from delivering anything once it wakes.
        if let Some(worker) = self.worker.take()
            && worker.is_finished()
        {
            let _ = worker.join();
        }
    }
}

/// Handles one input line. Returns `false` when the subscription is over.
fn deliver(sink: &FeedSink, line_no: u64, line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return sink.is_active();
    }
    match parse_fix(line) {
        Ok(coordinate) => sink.on_fix(Fix::now(coordinate)),
        Err(reason) => {
            debug!(line_no, %reason, "skipping malformed fix");
            sink.on_error(format!("line {line_no}: {reason}"))
        }
    }
}

/// Parses `lat,lng` or `lat lng` into a valid coordinate.
fn parse_fix(line: &str) -> Result<Coordinate, String> {
    let mut parts = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty());

    let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected \"lat,lng\", got \"{line}\""));
    };

    let lat: f64 = lat
        .parse()
        .map_err(|_| format!("invalid latitude \"{lat}\""))?;
    let lng: f64 = lng
        .parse()
        .map_err(|_| format!("invalid longitude \"{lng}\""))?;

    let coordinate = Coordinate::new(lat, lng);
    if !coordinate.is_valid() {
        return Err(format!("coordinate out of range: {lat}, {lng}"));
    }
    Ok(coordinate)
}
