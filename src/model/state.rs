//! Trail state: the visitor's progress through the catalog.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Coordinate, Progress, Stop};

/// The mutable core of a session.
///
/// Owned by the engine. `current_index` points into the catalog's ordered
/// stops; `current_index == len` means the trail is complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailState {
    pub visited: BTreeSet<String>,
    pub skipped: BTreeSet<String>,
    pub current_index: usize,
    pub last_position: Coordinate,
}

impl Default for TrailState {
    fn default() -> Self {
        Self {
            visited: BTreeSet::new(),
            skipped: BTreeSet::new(),
            current_index: 0,
            last_position: Coordinate::FALLBACK,
        }
    }
}

impl TrailState {
    /// Brings loaded state back inside its invariants for `stops`.
    ///
    /// Names not on the trail are dropped, and names that are both visited
    /// and skipped are kept as visited only. Every stop before the index must
    /// be visited or skipped, so the index is pulled back to the first stop
    /// that is neither.
    pub fn normalize(mut self, stops: &[Stop]) -> Self {
        let on_trail = |name: &String| stops.iter().any(|s| &s.name == name);
        self.visited.retain(on_trail);
        self.skipped.retain(on_trail);
        let visited = &self.visited;
        self.skipped.retain(|name| !visited.contains(name));

        let done = stops
            .iter()
            .position(|s| !self.visited.contains(&s.name) && !self.skipped.contains(&s.name))
            .unwrap_or(stops.len());
        self.current_index = self.current_index.min(done);
        self
    }

    pub fn is_complete(&self, len: usize) -> bool {
        self.current_index >= len
    }

    /// Visited plus skipped, counted once per stop.
    pub fn progress(&self, total: usize) -> Progress {
        let completed = self.visited.union(&self.skipped).count();
        Progress::new(self.visited.len(), self.skipped.len(), completed, total)
    }
}
