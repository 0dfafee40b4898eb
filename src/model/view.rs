//! The derived view: a per-fix projection of trail state for presentation.

use serde::Serialize;

use super::Coordinate;

/// Everything presentation needs after a fix, recomputed every time.
///
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedView {
    /// The position the view was computed from.
    pub position: Coordinate,

    /// The stop the visitor is heading to, or `None` once the trail is complete.
    pub current: Option<CurrentTarget>,

    /// Distance to every stop, in catalog order.
    pub per_stop: Vec<StopDistance>,

    pub progress: Progress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTarget {
    pub index: usize,
    pub name: String,
    pub coordinate: Coordinate,
    pub distance_meters: f64,
    pub bearing_degrees: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopDistance {
    pub name: String,
    pub distance_meters: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub visited: usize,
    pub skipped: usize,
    pub completed: usize,
    pub total: usize,
    pub percent: u32,
}

impl Progress {
    pub fn new(visited: usize, skipped: usize, completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let p = (100.0 * completed as f64 / total as f64).round() as u32;
            p
        };
        Self {
            visited,
            skipped,
            completed,
            total,
            percent,
        }
    }
}

impl DerivedView {
    /// Distance to the named stop, if it is in the catalog.
    pub fn distance_to(&self, name: &str) -> Option<f64> {
        self.per_stop
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.distance_meters)
    }

    /// The closest stop regardless of trail order. Display only.
    pub fn nearest(&self) -> Option<&StopDistance> {
        self.per_stop
            .iter()
            .min_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters))
    }
}
