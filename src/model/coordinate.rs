//! Coordinates and the raw samples that carry them.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A WGS84 position in signed decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Where the map is centred before the first fix ever arrives.
    pub const FALLBACK: Self = Self {
        lat: 52.0579,
        lng: 1.2800,
    };

    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite, with latitude in [-90, 90] and longitude in [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// A single reported position sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub coordinate: Coordinate,
    pub received_at: Timestamp,
}

impl Fix {
    /// A fix stamped with the current time.
    pub fn now(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            received_at: Timestamp::now(),
        }
    }
}

/// A single compass reading, already normalized into [0, 360).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingSample {
    pub degrees: f64,
    pub received_at: Timestamp,
}

impl HeadingSample {
    /// Normalizes a raw device heading. Returns `None` for NaN or infinite input.
    pub fn new(raw_degrees: f64, received_at: Timestamp) -> Option<Self> {
        if !raw_degrees.is_finite() {
            return None;
        }
        // rem_euclid rounds tiny negatives up to exactly 360.0.
        let degrees = raw_degrees.rem_euclid(360.0);
        Some(Self {
            degrees: if degrees >= 360.0 { 0.0 } else { degrees },
            received_at,
        })
    }
}
