//! Feed plumbing: how position and heading sources talk to a session.
//!
//! Sources run at their own cadence, usually on a worker thread, and only
//! ever send [`FeedEvent`]s down a channel. The session drains that channel
//! on its own thread, so every state transition happens one event at a time.
//!
//! Each position subscription is stamped with an epoch. Stopping a feed
//! clears its sink's active flag, and the session discards anything that
//! still arrives from an old epoch, so a replaced source can never move
//! the trail.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use jiff::Timestamp;

use crate::model::{Fix, HeadingSample};

/// Something a feed reported.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Fix { epoch: u64, fix: Fix },
    FixError { epoch: u64, reason: String },
    /// The position source has nothing more to say.
    FixEnded { epoch: u64 },
    Heading(HeadingSample),
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed was already started; its input can only be read once")]
    AlreadyStarted,

    #[error("failed to start feed thread: {0}")]
    Spawn(#[from] io::Error),
}

/// Where a position feed delivers fixes and errors.
#[derive(Debug, Clone)]
pub struct FeedSink {
    epoch: u64,
    active: Arc<AtomicBool>,
    tx: Sender<FeedEvent>,
}

impl FeedSink {
    pub(crate) fn new(epoch: u64, tx: Sender<FeedEvent>) -> Self {
        Self {
            epoch,
            active: Arc::new(AtomicBool::new(true)),
            tx,
        }
    }

    /// Delivers a fix. Returns `false` once the subscription is over.
    pub fn on_fix(&self, fix: Fix) -> bool {
        self.send(FeedEvent::Fix {
            epoch: self.epoch,
            fix,
        })
    }

    /// Reports a feed problem. Returns `false` once the subscription is over.
    pub fn on_error(&self, reason: impl Into<String>) -> bool {
        self.send(FeedEvent::FixError {
            epoch: self.epoch,
            reason: reason.into(),
        })
    }

    pub fn on_end(&self) {
        self.send(FeedEvent::FixEnded { epoch: self.epoch });
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Ends the subscription. Every clone of this sink goes quiet.
    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    fn send(&self, event: FeedEvent) -> bool {
        self.is_active() && self.tx.send(event).is_ok()
    }
}

/// Where a heading feed delivers compass samples.
#[derive(Debug, Clone)]
pub struct HeadingSink {
    active: Arc<AtomicBool>,
    tx: Sender<FeedEvent>,
}

impl HeadingSink {
    pub(crate) fn new(tx: Sender<FeedEvent>) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
            tx,
        }
    }

    /// Delivers a raw heading. Non-finite readings are dropped.
    /// Returns `false` once the subscription is over.
    pub fn on_heading(&self, raw_degrees: f64) -> bool {
        if !self.is_active() {
            return false;
        }
        match HeadingSample::new(raw_degrees, Timestamp::now()) {
            Some(sample) => self.tx.send(FeedEvent::Heading(sample)).is_ok(),
            None => true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

/// Reads `reader` line by line on a named worker thread until it ends or
/// `on_line` returns `false`. `pace` is slept after each line.
pub(crate) fn spawn_line_reader<R, F>(
    name: &str,
    reader: R,
    pace: Option<Duration>,
    mut on_line: F,
    on_done: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>, FeedError>
where
    R: BufRead + Send + 'static,
    F: FnMut(Result<String, io::Error>) -> bool + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            for line in reader.lines() {
                if !on_line(line) {
                    return;
                }
                if let Some(pace) = pace {
                    thread::sleep(pace);
                }
            }
            on_done();
        })?;
    Ok(handle)
}
