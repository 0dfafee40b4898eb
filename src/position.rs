//! Position feeds: live or substituted sources of fixes.
//!
//! A feed is started with a [`FeedSink`] and stopped by the session. The
//! caller controls nothing but start and stop; timing belongs to the source.

mod fixed;
mod line;

pub use fixed::FixedFeed;
pub use line::LineFeed;

use crate::feed::{FeedError, FeedSink};

/// A source of position fixes.
pub trait PositionFeed: Send {
    /// Short human-readable name for status output.
    fn describe(&self) -> String;

    /// Begins delivering fixes to `sink`.
    fn start(&mut self, sink: FeedSink) -> Result<(), FeedError>;

    /// Stops delivering. Nothing reaches the old sink afterwards.
    fn stop(&mut self);
}
