//! Trail engine: turns position fixes into trail progress.
//!
//! The engine owns the [`TrailState`] and is the only thing that mutates it.
//! Every mutation is persisted through the [`ProgressStore`] before the
//! call returns, and every call returns an [`Update`]: the fresh derived
//! view plus the effects presentation should act on. The engine never calls
//! presentation itself.
//!
//! Arrival is strictly sequential. Only the stop at `current_index` can be
//! arrived at; standing next to a future or skipped stop does nothing.

use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::geo;
use crate::model::{
    Coordinate, CurrentTarget, DerivedView, Effect, Progress, Stop, StopDistance, TrailState,
};
use crate::storage::{KeyValueStore, ProgressStore};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TrailError {
    #[error("the trail is already complete")]
    AlreadyComplete,
}

/// The result of an engine call: what presentation should show and do.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub view: DerivedView,
    pub effects: Vec<Effect>,
}

/// Where a stop stands relative to the visitor's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopStatus {
    Visited,
    Skipped,
    /// The stop the visitor is heading to.
    Next,
    Pending,
}

pub struct TrailEngine<S> {
    catalog: Catalog,
    state: TrailState,
    store: ProgressStore<S>,
}

impl<S: KeyValueStore> TrailEngine<S> {
    /// Starts a session from whatever progress the store holds for this trail.
    pub fn new(catalog: Catalog, store: ProgressStore<S>) -> Self {
        let store = store.for_trail(&catalog.id());
        let state = store.load().normalize(catalog.stops());
        debug!(
            current_index = state.current_index,
            visited = state.visited.len(),
            skipped = state.skipped.len(),
            "loaded trail progress"
        );
        Self {
            catalog,
            state,
            store,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &TrailState {
        &self.state
    }

    pub fn store(&self) -> &ProgressStore<S> {
        &self.store
    }

    /// The stop the visitor is heading to, or `None` once the trail is complete.
    pub fn current_stop(&self) -> Option<&Stop> {
        self.catalog.get(self.state.current_index)
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete(self.catalog.len())
    }

    pub fn progress(&self) -> Progress {
        self.state.progress(self.catalog.len())
    }

    /// Visited takes precedence over skipped.
    pub fn stop_status(&self, index: usize) -> StopStatus {
        let Some(stop) = self.catalog.get(index) else {
            return StopStatus::Pending;
        };
        if self.state.visited.contains(&stop.name) {
            StopStatus::Visited
        } else if self.state.skipped.contains(&stop.name) {
            StopStatus::Skipped
        } else if index == self.state.current_index {
            StopStatus::Next
        } else {
            StopStatus::Pending
        }
    }

    /// Records a position fix.
    ///
    /// Updates the last known position, checks arrival at the current stop,
    /// and advances by exactly one stop on arrival. Arrival fires once per
    /// stop: a visited stop never arrives again.
    pub fn record_fix(&mut self, position: Coordinate) -> Update {
        if !position.is_valid() {
            warn!(%position, "ignoring invalid fix");
            return self.update(Vec::new());
        }

        self.state.last_position = position;
        let mut effects = Vec::new();

        if let Some(target) = self.catalog.get(self.state.current_index) {
            let distance = geo::distance_meters(position, target.coordinate);
            debug!(
                target = %target.name,
                distance_m = distance,
                radius_m = target.arrival_radius_meters,
                "fix"
            );
            if distance <= target.arrival_radius_meters
                && !self.state.visited.contains(&target.name)
            {
                let index = self.state.current_index;
                let name = target.name.clone();
                info!(stop = %name, index, "arrived");
                self.state.visited.insert(name.clone());
                effects.push(Effect::Arrived { index, name });
                self.advance(&mut effects);
            }
        }

        self.store.save(&self.state);
        self.update(effects)
    }

    /// Skips the current stop and moves on to the next.
    ///
    /// Skipping the last stop completes the trail. A stop that was already
    /// visited is not marked skipped.
    pub fn skip_current(&mut self) -> Result<Update, TrailError> {
        let Some(target) = self.catalog.get(self.state.current_index) else {
            return Err(TrailError::AlreadyComplete);
        };

        if self.state.visited.contains(&target.name) {
            debug!(stop = %target.name, "current stop already visited; advancing without skip");
        } else {
            info!(stop = %target.name, index = self.state.current_index, "skipped");
            self.state.skipped.insert(target.name.clone());
        }

        let mut effects = Vec::new();
        self.advance(&mut effects);
        self.store.save(&self.state);
        Ok(self.update(effects))
    }

    /// Clears visited and skipped and returns to the first stop.
    ///
    /// The last known position is kept so the map can stay centred.
    pub fn reset(&mut self) -> Update {
        info!("progress reset");
        self.state.visited.clear();
        self.state.skipped.clear();
        self.state.current_index = 0;
        self.store.clear();
        self.update(Vec::new())
    }

    /// The derived view for the last known position, without mutating anything.
    pub fn view(&self) -> DerivedView {
        let position = self.state.last_position;

        let current = self
            .catalog
            .get(self.state.current_index)
            .map(|stop| CurrentTarget {
                index: self.state.current_index,
                name: stop.name.clone(),
                coordinate: stop.coordinate,
                distance_meters: geo::distance_meters(position, stop.coordinate),
                bearing_degrees: geo::initial_bearing_degrees(position, stop.coordinate),
            });

        let per_stop = self
            .catalog
            .stops()
            .iter()
            .map(|stop| StopDistance {
                name: stop.name.clone(),
                distance_meters: geo::distance_meters(position, stop.coordinate),
            })
            .collect();

        DerivedView {
            position,
            current,
            per_stop,
            progress: self.progress(),
        }
    }

    fn advance(&mut self, effects: &mut Vec<Effect>) {
        let len = self.catalog.len();
        self.state.current_index = (self.state.current_index + 1).min(len);
        if self.state.current_index == len {
            info!("trail complete");
            effects.push(Effect::Completed);
        }
    }

    fn update(&self, effects: Vec<Effect>) -> Update {
        Update {
            view: self.view(),
            effects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeSet;

    use tempfile::TempDir;

    use crate::geo::EARTH_RADIUS_M;
    use crate::model::Content;
    use crate::storage::{MemoryStore, SqliteStore};

    const A: Coordinate = Coordinate::new(52.0, 1.0);
    const B: Coordinate = Coordinate::new(52.001, 1.0);
    const C: Coordinate = Coordinate::new(52.002, 1.0);

    fn stop(name: &str, coordinate: Coordinate) -> Stop {
        Stop {
            name: name.into(),
            coordinate,
            arrival_radius_meters: 10.0,
            content: Content::default(),
        }
    }

    fn two_stops() -> Catalog {
        Catalog::new("Test", vec![stop("A", A), stop("B", B)]).unwrap()
    }

    fn three_stops() -> Catalog {
        Catalog::new("Test", vec![stop("A", A), stop("B", B), stop("C", C)]).unwrap()
    }

    fn engine(catalog: Catalog) -> TrailEngine<MemoryStore> {
        TrailEngine::new(catalog, ProgressStore::new(MemoryStore::new()))
    }

    /// A point `meters` due north of `c`.
    fn north_of(c: Coordinate, meters: f64) -> Coordinate {
        Coordinate::new(c.lat + (meters / EARTH_RADIUS_M).to_degrees(), c.lng)
    }

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn fix_at_stop_arrives() {
        let mut engine = engine(two_stops());
        let update = engine.record_fix(A);

        assert_eq!(engine.state().visited, names(&["A"]));
        assert_eq!(engine.state().current_index, 1);
        assert_eq!(
            update.effects,
            vec![Effect::Arrived {
                index: 0,
                name: "A".into()
            }]
        );
        assert_eq!(update.view.current.as_ref().unwrap().name, "B");
    }

    #[test]
    fn fix_outside_radius_changes_nothing() {
        let mut engine = engine(two_stops());
        let update = engine.record_fix(north_of(A, 11.0));

        assert!(update.effects.is_empty());
        assert!(engine.state().visited.is_empty());
        assert_eq!(engine.state().current_index, 0);
        let current = update.view.current.unwrap();
        assert!((current.distance_meters - 11.0).abs() < 1e-6);
    }

    #[test]
    fn fix_just_inside_radius_arrives() {
        let mut engine = engine(two_stops());
        let update = engine.record_fix(north_of(A, 9.999));
        assert_eq!(update.effects.len(), 1);
    }

    #[test]
    fn fix_exactly_on_radius_arrives() {
        let fix = north_of(A, 12.0);
        let mut edge = stop("A", A);
        edge.arrival_radius_meters = geo::distance_meters(fix, A);
        let catalog = Catalog::new("Test", vec![edge, stop("B", B)]).unwrap();
        let mut engine = engine(catalog);

        let update = engine.record_fix(fix);

        assert_eq!(update.effects.len(), 1);
        assert_eq!(engine.state().current_index, 1);
    }

    #[test]
    fn arrival_fires_once() {
        let mut engine = engine(two_stops());
        engine.record_fix(A);
        let again = engine.record_fix(A);

        assert!(again.effects.is_empty());
        assert_eq!(engine.state().visited, names(&["A"]));
        assert_eq!(engine.state().current_index, 1);
    }

    #[test]
    fn future_stop_never_arrives_out_of_order() {
        let mut engine = engine(three_stops());
        let update = engine.record_fix(C);

        assert!(update.effects.is_empty());
        assert!(engine.state().visited.is_empty());
        assert_eq!(engine.state().current_index, 0);
    }

    #[test]
    fn only_current_stop_arrives_when_several_are_in_range() {
        let catalog = Catalog::new(
            "Overlap",
            vec![stop("A", A), stop("B", north_of(A, 3.0))],
        )
        .unwrap();
        let mut engine = engine(catalog);

        let update = engine.record_fix(north_of(A, 1.5));

        assert_eq!(
            update.effects,
            vec![Effect::Arrived {
                index: 0,
                name: "A".into()
            }]
        );
        assert_eq!(engine.state().visited, names(&["A"]));

        // B arrives on the next fix, not the same one.
        let next = engine.record_fix(north_of(A, 1.5));
        assert_eq!(engine.state().visited, names(&["A", "B"]));
        assert!(next.effects.contains(&Effect::Completed));
    }

    #[test]
    fn skip_then_arrive_at_next() {
        let mut engine = engine(two_stops());

        engine.skip_current().unwrap();
        assert_eq!(engine.state().skipped, names(&["A"]));
        assert_eq!(engine.state().current_index, 1);

        let update = engine.record_fix(B);
        assert_eq!(engine.state().visited, names(&["B"]));
        assert_eq!(engine.state().skipped, names(&["A"]));
        assert_eq!(engine.state().current_index, 2);
        assert_eq!(
            update.effects,
            vec![
                Effect::Arrived {
                    index: 1,
                    name: "B".into()
                },
                Effect::Completed,
            ]
        );
        assert!(update.view.current.is_none());
    }

    #[test]
    fn skipping_last_stop_completes_trail() {
        let mut engine = engine(two_stops());
        engine.skip_current().unwrap();

        let update = engine.skip_current().unwrap();

        assert_eq!(engine.state().current_index, 2);
        assert_eq!(update.effects, vec![Effect::Completed]);
        assert!(engine.is_complete());
        assert_eq!(engine.skip_current(), Err(TrailError::AlreadyComplete));
        assert_eq!(engine.state().current_index, 2);
    }

    #[test]
    fn skipping_a_visited_stop_does_not_mark_it_skipped() {
        let progress = ProgressStore::new(MemoryStore::new()).for_trail(&two_stops().id());
        progress.save(&TrailState {
            visited: names(&["A"]),
            ..TrailState::default()
        });
        let mut engine = TrailEngine::new(two_stops(), progress);

        engine.skip_current().unwrap();

        assert!(engine.state().skipped.is_empty());
        assert_eq!(engine.state().current_index, 1);
        assert_eq!(engine.progress().completed, 1);
    }

    #[test]
    fn fixes_after_completion_only_refresh_distances() {
        let mut engine = engine(two_stops());
        engine.record_fix(A);
        engine.record_fix(B);

        let update = engine.record_fix(north_of(B, 50.0));

        assert!(update.effects.is_empty());
        assert!(update.view.current.is_none());
        assert_eq!(engine.state().current_index, 2);
        let to_b = update.view.distance_to("B").unwrap();
        assert!((to_b - 50.0).abs() < 1e-6);
    }

    #[test]
    fn reset_keeps_last_position() {
        let mut engine = engine(two_stops());
        engine.record_fix(A);
        engine.skip_current().unwrap();
        let here = north_of(B, 40.0);
        engine.record_fix(here);

        let update = engine.reset();

        assert!(engine.state().visited.is_empty());
        assert!(engine.state().skipped.is_empty());
        assert_eq!(engine.state().current_index, 0);
        assert_eq!(engine.state().last_position, here);
        assert!(update.effects.is_empty());
        assert_eq!(update.view.current.unwrap().name, "A");
    }

    #[test]
    fn index_never_regresses() {
        let mut engine = engine(three_stops());
        let fixes = [
            north_of(A, 30.0),
            A,
            C,
            north_of(B, 5.0),
            A,
            B,
            C,
            north_of(C, 100.0),
        ];

        let mut last = engine.state().current_index;
        for (i, fix) in fixes.into_iter().enumerate() {
            if i % 3 == 2 {
                let _ = engine.skip_current();
                assert!(engine.state().current_index >= last);
                last = engine.state().current_index;
            }
            engine.record_fix(fix);
            assert!(engine.state().current_index >= last);
            assert!(engine.state().current_index <= engine.catalog().len());
            last = engine.state().current_index;
        }
    }

    #[test]
    fn view_reports_bearing_and_distances() {
        let mut engine = engine(three_stops());
        let update = engine.record_fix(north_of(A, 50.0));

        let current = update.view.current.as_ref().unwrap();
        assert_eq!(current.name, "A");
        // A is due south.
        assert!((current.bearing_degrees - 180.0).abs() < 1e-6);
        assert_eq!(update.view.per_stop.len(), 3);
        assert_eq!(update.view.nearest().unwrap().name, "A");
    }

    #[test]
    fn progress_percent() {
        let mut engine = engine(three_stops());
        engine.record_fix(A);
        engine.skip_current().unwrap();

        let progress = engine.progress();
        assert_eq!(progress.visited, 1);
        assert_eq!(progress.skipped, 1);
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.percent, 67);
    }

    #[test]
    fn stop_statuses() {
        let mut engine = engine(three_stops());
        engine.record_fix(A);
        engine.skip_current().unwrap();

        assert_eq!(engine.stop_status(0), StopStatus::Visited);
        assert_eq!(engine.stop_status(1), StopStatus::Skipped);
        assert_eq!(engine.stop_status(2), StopStatus::Next);
    }

    #[test]
    fn invalid_fix_is_ignored() {
        let mut engine = engine(two_stops());
        engine.record_fix(north_of(A, 20.0));

        let update = engine.record_fix(Coordinate::new(f64::NAN, 1.0));

        assert!(update.effects.is_empty());
        assert_eq!(engine.state().last_position, north_of(A, 20.0));
    }

    #[test]
    fn progress_survives_restart() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("waymark");

        {
            let store = ProgressStore::new(SqliteStore::open(&root).unwrap());
            let mut engine = TrailEngine::new(three_stops(), store);
            engine.record_fix(A);
            engine.skip_current().unwrap();
        }

        let store = ProgressStore::new(SqliteStore::open(&root).unwrap());
        let engine = TrailEngine::new(three_stops(), store);

        assert_eq!(engine.state().visited, names(&["A"]));
        assert_eq!(engine.state().skipped, names(&["B"]));
        assert_eq!(engine.state().current_index, 2);
        assert_eq!(engine.state().last_position, A);
        assert_eq!(engine.current_stop().unwrap().name, "C");
    }

    #[test]
    fn stale_index_is_clamped_to_catalog() {
        let progress = ProgressStore::new(MemoryStore::new()).for_trail(&two_stops().id());
        progress.save(&TrailState {
            visited: names(&["A", "B"]),
            current_index: 9,
            ..TrailState::default()
        });

        let engine = TrailEngine::new(two_stops(), progress);
        assert_eq!(engine.state().current_index, 2);
        assert!(engine.is_complete());
    }

    #[test]
    fn trails_sharing_a_store_start_fresh() {
        let dir = TempDir::new().unwrap();
        let open = || ProgressStore::new(SqliteStore::open(dir.path()).unwrap());
        let other = Catalog::new(
            "Riverside",
            vec![stop("Gate", A), stop("Pond", B), stop("Mill", C)],
        )
        .unwrap();

        {
            let mut engine = TrailEngine::new(other.clone(), open());
            engine.record_fix(A);
            engine.skip_current().unwrap();
        }
        let engine = TrailEngine::new(two_stops(), open());

        assert!(engine.state().visited.is_empty());
        assert!(engine.state().skipped.is_empty());
        assert_eq!(engine.state().current_index, 0);
        assert_eq!(engine.progress().percent, 0);

        let resumed = TrailEngine::new(other, open());
        assert_eq!(resumed.state().current_index, 2);
    }
}
