//! Effects: what an engine transition asks presentation to do.

use serde::Serialize;

/// A side effect produced by a state transition.
///
/// The engine returns these instead of calling presentation itself; the
/// caller acts on them after the transition has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "camelCase")]
pub enum Effect {
    /// The current stop was reached for the first time. Reveal its content.
    Arrived { index: usize, name: String },

    /// The last stop was reached or skipped.
    Completed,
}
