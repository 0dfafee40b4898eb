//! Stop types: the immutable points of interest on a trail.

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// One point of interest in the trail catalog.
///
/// `name` is the primary key: it identifies the stop in the visited and
/// skipped sets and in per-stop distance lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,
    pub coordinate: Coordinate,
    pub arrival_radius_meters: f64,
    pub content: Content,
}

/// What is revealed on arrival. Opaque to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Descriptive text. May contain inline markup; passed through as-is.
    pub info: String,

    /// Path or URL of the stop's image.
    pub image: Option<String>,

    /// Narration clips, played on request.
    pub audio: Vec<AudioClip>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    pub label: String,
    pub src: String,
}

impl Content {
    /// The first sentence of the info text, terminated with a period.
    pub fn snippet(&self) -> String {
        let first = self.info.split('.').next().unwrap_or_default().trim();
        format!("{first}.")
    }
}
