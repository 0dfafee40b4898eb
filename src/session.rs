//! Session: the single-threaded loop between feeds and the engine.
//!
//! Feeds push [`FeedEvent`]s into one channel; the session pulls them off
//! one at a time and applies them. A fix is fully processed (state mutated,
//! progress saved, observer told) before the next event is looked at, so
//! there is no way for one fix to interleave with another.
//!
//! Presentation subscribes through [`TrailObserver`]. Observers are only
//! ever called after the engine has finished its transition.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::engine::{TrailEngine, Update};
use crate::feed::{FeedError, FeedEvent, FeedSink, HeadingSink};
use crate::heading::{HeadingFeed, HeadingSmoother, HeadingState, Permission, Smoothing};
use crate::model::{DerivedView, Effect, Fix, HeadingSample, Stop};
use crate::position::PositionFeed;
use crate::storage::KeyValueStore;

/// How long to wait for a fix before reporting a timeout.
pub const DEFAULT_FIX_TIMEOUT: Duration = Duration::from_secs(10);

/// Feed and compass status, for display. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Waiting for the first fix from a new source.
    Acquiring,
    Tracking,
    /// No fix within the timeout. The last view stays valid.
    TimedOut,
    FeedError(String),
    /// The position source finished.
    FeedEnded,
    HeadingActive,
    HeadingDenied,
    HeadingUnsupported,
}

/// Presentation's view of a session. Every method has a no-op default.
pub trait TrailObserver {
    fn on_view(&mut self, _view: &DerivedView) {}

    /// The visitor reached `stop` for the first time. Reveal its content.
    fn on_arrival(&mut self, _index: usize, _stop: &Stop) {}

    fn on_complete(&mut self) {}

    fn on_status_changed(&mut self, _status: &Status) {}

    fn on_pointer(&mut self, _heading: &HeadingState) {}
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub fix_timeout: Duration,
    pub smoothing: Smoothing,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fix_timeout: DEFAULT_FIX_TIMEOUT,
            smoothing: Smoothing::default(),
        }
    }
}

/// Whether the loop should keep going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Ended,
}

struct ActiveFeed {
    feed: Box<dyn PositionFeed>,
    sink: FeedSink,
}

pub struct Session<S, O> {
    engine: TrailEngine<S>,
    smoother: HeadingSmoother,
    observer: O,
    config: SessionConfig,
    tx: Sender<FeedEvent>,
    rx: Receiver<FeedEvent>,
    epoch: u64,
    position: Option<ActiveFeed>,
    heading: Option<(Box<dyn HeadingFeed>, HeadingSink)>,
    status: Option<Status>,
    target_bearing: Option<f64>,
    /// When the position feed is overdue. Only fixes push it back.
    fix_deadline: Instant,
}

impl<S: KeyValueStore, O: TrailObserver> Session<S, O> {
    pub fn new(engine: TrailEngine<S>, observer: O, config: SessionConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        let target_bearing = engine.view().current.map(|c| c.bearing_degrees);
        Self {
            engine,
            smoother: HeadingSmoother::new(config.smoothing),
            observer,
            config,
            tx,
            rx,
            epoch: 0,
            position: None,
            heading: None,
            status: None,
            target_bearing,
            fix_deadline: Instant::now() + config.fix_timeout,
        }
    }

    pub fn engine(&self) -> &TrailEngine<S> {
        &self.engine
    }

    /// Shows the view for the last known position before any fix arrives.
    pub fn refresh(&mut self) {
        let view = self.engine.view();
        self.target_bearing = view.current.as_ref().map(|c| c.bearing_degrees);
        self.observer.on_view(&view);
    }

    /// Replaces the position source.
    ///
    /// The old feed is stopped and its epoch retired before the new one
    /// starts, so nothing it still has in flight can reach the engine.
    pub fn switch_feed(&mut self, mut feed: Box<dyn PositionFeed>) -> Result<(), FeedError> {
        self.stop_position_feed();

        self.epoch += 1;
        let sink = FeedSink::new(self.epoch, self.tx.clone());
        info!(source = %feed.describe(), epoch = self.epoch, "starting position feed");
        feed.start(sink.clone())?;
        self.position = Some(ActiveFeed { feed, sink });
        self.fix_deadline = Instant::now() + self.config.fix_timeout;
        self.set_status(Status::Acquiring);
        Ok(())
    }

    /// Asks for compass access and starts the heading feed if granted.
    ///
    /// Denial and lack of support are reported as status, not errors.
    pub fn start_heading(&mut self, mut feed: Box<dyn HeadingFeed>) -> Result<(), FeedError> {
        self.stop_heading_feed();

        match feed.authorize() {
            Permission::Granted => {}
            Permission::Denied => {
                warn!("compass permission denied");
                self.set_status(Status::HeadingDenied);
                return Ok(());
            }
            Permission::Unsupported => {
                warn!("compass not supported");
                self.set_status(Status::HeadingUnsupported);
                return Ok(());
            }
        }

        let sink = HeadingSink::new(self.tx.clone());
        feed.start(sink.clone())?;
        self.heading = Some((feed, sink));
        self.set_status(Status::HeadingActive);
        Ok(())
    }

    /// Processes events until the position source ends.
    ///
    /// Going longer than the fix timeout without a fix reports
    /// [`Status::TimedOut`] once and keeps waiting. Compass samples don't
    /// count as fixes.
    pub fn run(&mut self) {
        loop {
            let now = Instant::now();
            if now >= self.fix_deadline {
                self.on_timeout();
                self.fix_deadline = now + self.config.fix_timeout;
            }

            match self
                .rx
                .recv_timeout(self.fix_deadline.saturating_duration_since(now))
            {
                Ok(event) => {
                    if self.handle(event) == Flow::Ended {
                        break;
                    }
                }
                // Checked against the deadline at the top of the loop.
                Err(RecvTimeoutError::Timeout) => {}
                // The session holds a sender, so this only happens if it was dropped.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.stop();
    }

    /// Applies one event.
    pub fn handle(&mut self, event: FeedEvent) -> Flow {
        match event {
            FeedEvent::Fix { epoch, fix } if epoch == self.epoch => {
                self.on_fix(fix);
                Flow::Continue
            }
            FeedEvent::FixError { epoch, reason } if epoch == self.epoch => {
                warn!(%reason, "position feed error");
                self.status = Some(Status::FeedError(reason.clone()));
                self.observer.on_status_changed(&Status::FeedError(reason));
                Flow::Continue
            }
            FeedEvent::FixEnded { epoch } if epoch == self.epoch => {
                self.set_status(Status::FeedEnded);
                Flow::Ended
            }
            FeedEvent::Heading(sample) => {
                self.on_heading(sample);
                Flow::Continue
            }
            stale => {
                debug!(?stale, current_epoch = self.epoch, "dropping event from retired feed");
                Flow::Continue
            }
        }
    }

    fn on_fix(&mut self, fix: Fix) {
        self.fix_deadline = Instant::now() + self.config.fix_timeout;
        self.set_status(Status::Tracking);

        let Update { view, effects } = self.engine.record_fix(fix.coordinate);
        self.target_bearing = view.current.as_ref().map(|c| c.bearing_degrees);
        self.observer.on_view(&view);

        for effect in effects {
            match effect {
                Effect::Arrived { index, .. } => {
                    if let Some(stop) = self.engine.catalog().get(index) {
                        self.observer.on_arrival(index, stop);
                    }
                }
                Effect::Completed => self.observer.on_complete(),
            }
        }

        if let Some(bearing) = self.target_bearing
            && let Some(heading) = self.smoother.reaim(bearing, fix.received_at)
        {
            self.observer.on_pointer(&heading);
        }
    }

    fn on_heading(&mut self, sample: HeadingSample) {
        if let Some(heading) = self.smoother.update(sample, self.target_bearing) {
            self.observer.on_pointer(&heading);
        }
    }

    fn on_timeout(&mut self) {
        if self.position.is_some() {
            self.set_status(Status::TimedOut);
        }
    }

    /// Records and reports a status, once per change.
    fn set_status(&mut self, status: Status) {
        if self.status.as_ref() == Some(&status) {
            return;
        }
        self.observer.on_status_changed(&status);
        self.status = Some(status);
    }
}

impl<S, O> Session<S, O> {
    /// Stops every feed.
    pub fn stop(&mut self) {
        self.stop_position_feed();
        self.stop_heading_feed();
    }

    fn stop_position_feed(&mut self) {
        if let Some(mut active) = self.position.take() {
            active.sink.deactivate();
            active.feed.stop();
            debug!(epoch = self.epoch, "stopped position feed");
        }
    }

    fn stop_heading_feed(&mut self) {
        if let Some((mut feed, sink)) = self.heading.take() {
            sink.deactivate();
            feed.stop();
        }
    }
}

impl<S, O> Drop for Session<S, O> {
    fn drop(&mut self) {
        self.stop();
    }
}
