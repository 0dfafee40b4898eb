//! Progress store: trail state mapped onto namespaced keys.
//!
//! Keys are `waymark.<trail>.<field>`, so trails sharing one store never see
//! each other's progress. Every key holds a JSON value. Keys are read independently, so one
//! corrupt value only resets that field. There is no schema version;
//! renaming a key is the only migration path.
//!
//! Saving is best effort. Progress is advisory, so a failed write is
//! logged and dropped rather than surfaced to the engine.

use std::collections::BTreeSet;

use jiff::Timestamp;
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::model::{Coordinate, TrailState};

use super::{KeyValueStore, Result};

const NAMESPACE: &str = "waymark";

const VISITED: &str = "visited";
const SKIPPED: &str = "skipped";
const CURRENT_INDEX: &str = "current-index";
const LAST_POSITION: &str = "last-position";
const UPDATED_AT: &str = "updated-at";

/// Serializes [`TrailState`] into a [`KeyValueStore`].
pub struct ProgressStore<S> {
    kv: S,
    prefix: String,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(kv: S) -> Self {
        Self {
            kv,
            prefix: NAMESPACE.to_string(),
        }
    }

    /// Scopes every key to one trail.
    pub fn for_trail(self, trail_id: &str) -> Self {
        Self {
            prefix: format!("{NAMESPACE}.{trail_id}"),
            kv: self.kv,
        }
    }

    /// Loads saved progress, falling back to defaults for anything
    /// missing or unreadable. Never fails.
    pub fn load(&self) -> TrailState {
        TrailState {
            visited: self.read_or(VISITED, BTreeSet::new),
            skipped: self.read_or(SKIPPED, BTreeSet::new),
            current_index: self.read_or(CURRENT_INDEX, || 0),
            last_position: valid_or_fallback(
                self.read_or(LAST_POSITION, || Coordinate::FALLBACK),
            ),
        }
    }

    /// Writes every field. Failures are logged, not returned.
    pub fn save(&self, state: &TrailState) {
        if let Err(e) = self.try_save(state) {
            warn!(error = %e, "failed to save trail progress");
        }
    }

    /// Forgets visited, skipped and the current index, keeping the last
    /// known position. Failures are logged, not returned.
    pub fn clear(&self) {
        let result = [VISITED, SKIPPED, CURRENT_INDEX]
            .into_iter()
            .try_for_each(|field| self.kv.remove(&self.key(field)))
            .and_then(|()| self.write(UPDATED_AT, &Timestamp::now()));
        if let Err(e) = result {
            warn!(error = %e, "failed to clear trail progress");
        }
    }

    /// When progress was last written, if ever.
    pub fn updated_at(&self) -> Option<Timestamp> {
        self.read(UPDATED_AT).ok().flatten()
    }

    fn try_save(&self, state: &TrailState) -> Result<()> {
        self.write(VISITED, &state.visited)?;
        self.write(SKIPPED, &state.skipped)?;
        self.write(CURRENT_INDEX, &state.current_index)?;
        self.write(LAST_POSITION, &state.last_position)?;
        self.write(UPDATED_AT, &Timestamp::now())
    }

    fn key(&self, field: &str) -> String {
        format!("{}.{field}", self.prefix)
    }

    fn write<T: Serialize + ?Sized>(&self, field: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.kv.set(&self.key(field), &json)
    }

    fn read<T: DeserializeOwned>(&self, field: &str) -> Result<Option<T>> {
        match self.kv.get(&self.key(field))? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn read_or<T: DeserializeOwned>(&self, field: &str, default: impl FnOnce() -> T) -> T {
        match self.read(field) {
            Ok(Some(value)) => value,
            Ok(None) => default(),
            Err(e) => {
                warn!(key = %self.key(field), error = %e, "ignoring unreadable progress value");
                default()
            }
        }
    }
}

fn valid_or_fallback(position: Coordinate) -> Coordinate {
    if position.is_valid() {
        position
    } else {
        Coordinate::FALLBACK
    }
}
