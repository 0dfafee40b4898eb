//! Core data model for Waymark.
//!
//! These types represent the trail as the engine sees it:
//! stops, the visitor's progress, position fixes, and the derived view
//! handed to whatever is presenting the trail.

mod coordinate;
mod effect;
mod state;
mod stop;
mod view;

pub use coordinate::{Coordinate, Fix, HeadingSample};
pub use effect::Effect;
pub use state::TrailState;
pub use stop::{AudioClip, Content, Stop};
pub use view::{CurrentTarget, DerivedView, Progress, StopDistance};
