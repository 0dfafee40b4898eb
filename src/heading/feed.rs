//! Heading feeds: compass samples behind a permission gate.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::feed::{self, FeedError, HeadingSink};

/// Outcome of asking for compass access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    Unsupported,
}

/// A source of compass headings.
///
/// `authorize` must be called, and must return [`Permission::Granted`],
/// before `start`.
pub trait HeadingFeed: Send {
    fn authorize(&mut self) -> Permission;

    fn start(&mut self, sink: HeadingSink) -> Result<(), FeedError>;

    fn stop(&mut self);
}

/// Reads one heading in degrees per line from a buffered reader.
///
/// Unparseable lines are skipped, the way a device drops readings it
/// can't make sense of.
pub struct LineHeadingFeed {
    reader: Option<Box<dyn BufRead + Send>>,
    denied: bool,
    sink: Option<HeadingSink>,
    worker: Option<JoinHandle<()>>,
}

impl LineHeadingFeed {
    pub fn new(reader: Box<dyn BufRead + Send>) -> Self {
        Self {
            reader: Some(reader),
            denied: false,
            sink: None,
            worker: None,
        }
    }

    /// Opens a compass device or recording.
    ///
    /// Never fails: a file we may not read authorizes as
    /// [`Permission::Denied`], any other failure as [`Permission::Unsupported`].
    pub fn open(path: &Path) -> Self {
        match File::open(path) {
            Ok(file) => Self::new(Box::new(BufReader::new(file))),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "compass unavailable");
                Self {
                    reader: None,
                    denied: e.kind() == ErrorKind::PermissionDenied,
                    sink: None,
                    worker: None,
                }
            }
        }
    }
}

impl HeadingFeed for LineHeadingFeed {
    fn authorize(&mut self) -> Permission {
        if self.reader.is_some() {
            Permission::Granted
        } else if self.denied {
            Permission::Denied
        } else {
            Permission::Unsupported
        }
    }

    fn start(&mut self, sink: HeadingSink) -> Result<(), FeedError> {
        let reader = self.reader.take().ok_or(FeedError::AlreadyStarted)?;
        let line_sink = sink.clone();

        let worker = feed::spawn_line_reader(
            "waymark-heading",
            reader,
            None,
            move |line| match line {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        return line_sink.is_active();
                    }
                    match line.parse::<f64>() {
                        Ok(degrees) => line_sink.on_heading(degrees),
                        Err(_) => {
                            debug!(line, "skipping unreadable heading");
                            line_sink.is_active()
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "heading input failed");
                    false
                }
            },
            || debug!("heading input ended"),
        )?;

        self.sink = Some(sink);
        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.deactivate();
        }
        if let Some(worker) = self.worker.take()
            && worker.is_finished()
        {
            let _ = worker.join();
        }
    }
}
