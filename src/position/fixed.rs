//! Substituted position: one spoofed coordinate for testing and demos.

use tracing::debug;

use crate::feed::{FeedError, FeedSink};
use crate::model::{Coordinate, Fix};

use super::PositionFeed;

/// Delivers a single fix at a fixed coordinate, then ends.
pub struct FixedFeed {
    coordinate: Coordinate,
    label: String,
    sink: Option<FeedSink>,
}

impl FixedFeed {
    pub fn new(coordinate: Coordinate, label: impl Into<String>) -> Self {
        Self {
            coordinate,
            label: label.into(),
            sink: None,
        }
    }
}

impl PositionFeed for FixedFeed {
    fn describe(&self) -> String {
        format!("spoofed location \"{}\"", self.label)
    }

    fn start(&mut self, sink: FeedSink) -> Result<(), FeedError> {
        debug!(label = %self.label, coordinate = %self.coordinate, "substituting position");
        sink.on_fix(Fix::now(self.coordinate));
        sink.on_end();
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.deactivate();
        }
    }
}
