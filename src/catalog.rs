//! Trail catalog: the ordered, immutable list of stops.
//!
//! Loaded once at startup from a TOML definition:
//!
//! ```toml
//! title = "Heritage Trail"
//!
//! [[stop]]
//! name = "Acoustic Block"
//! lat = 52.05671008
//! lng = 1.28002642
//! radius = 10.0          # optional, meters
//! info = "Anechoic chambers and a reverberation room."
//! image = "images/a.jpg" # optional
//!
//! [[stop.audio]]
//! label = "Introduction"
//! src = "audio/acoustic-intro.mp3"
//! ```
//!
//! Validation is fail-fast: a bad catalog is a programmer error and
//! the trail never starts.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::model::{AudioClip, Content, Coordinate, Stop};

/// Arrival radius applied to stops that don't set one.
pub const DEFAULT_RADIUS_M: f64 = 15.0;

const BUILTIN: &str = include_str!("../trails/adastral-heritage.toml");

const IMAGE_DIR: &str = "images/";
const IMAGE_EXT: &str = "jpg";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid catalog: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("catalog has no stops")]
    Empty,

    #[error("duplicate stop name: {0}")]
    DuplicateName(String),

    #[error("stop '{name}' has an invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { name: String, lat: f64, lng: f64 },

    #[error("stop '{name}' has a non-positive radius ({radius})")]
    InvalidRadius { name: String, radius: f64 },
}

pub type Result<T> = core::result::Result<T, CatalogError>;

/// An ordered sequence of uniquely named stops.
#[derive(Debug, Clone)]
pub struct Catalog {
    title: String,
    stops: Vec<Stop>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    title: String,
    #[serde(default, rename = "stop")]
    stops: Vec<StopEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StopEntry {
    name: String,
    lat: f64,
    lng: f64,
    radius: Option<f64>,
    #[serde(default)]
    info: String,
    image: Option<String>,
    #[serde(default)]
    audio: Vec<AudioEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AudioEntry {
    label: String,
    src: String,
}

impl Catalog {
    /// Builds a catalog, rejecting empty lists, duplicate names, bad
    /// coordinates, and non-positive radii.
    pub fn new(title: impl Into<String>, stops: Vec<Stop>) -> Result<Self> {
        if stops.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for stop in &stops {
            if !seen.insert(stop.name.as_str()) {
                return Err(CatalogError::DuplicateName(stop.name.clone()));
            }
            if !stop.coordinate.is_valid() {
                return Err(CatalogError::InvalidCoordinate {
                    name: stop.name.clone(),
                    lat: stop.coordinate.lat,
                    lng: stop.coordinate.lng,
                });
            }
            let radius = stop.arrival_radius_meters;
            if !radius.is_finite() || radius <= 0.0 {
                return Err(CatalogError::InvalidRadius {
                    name: stop.name.clone(),
                    radius,
                });
            }
        }
        Ok(Self {
            title: title.into(),
            stops,
        })
    }

    /// Parses a TOML catalog definition.
    pub fn from_toml(source: &str, default_radius: f64) -> Result<Self> {
        let file: CatalogFile = toml::from_str(source)?;
        let stops = file
            .stops
            .into_iter()
            .map(|entry| entry.into_stop(default_radius))
            .collect();
        Self::new(file.title, stops)
    }

    /// Reads and parses a catalog file.
    pub fn load(path: &Path, default_radius: f64) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&source, default_radius)
    }

    /// The trail compiled into the binary.
    pub fn builtin(default_radius: f64) -> Result<Self> {
        Self::from_toml(BUILTIN, default_radius)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Key under which this trail's progress is saved.
    pub fn id(&self) -> String {
        slug(&self.title)
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Never zero: an empty catalog fails to construct.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn get(&self, index: usize) -> Option<&Stop> {
        self.stops.get(index)
    }

    /// Finds a stop by exact name, returning its position in the trail.
    pub fn find(&self, name: &str) -> Option<(usize, &Stop)> {
        self.stops.iter().enumerate().find(|(_, s)| s.name == name)
    }
}

impl StopEntry {
    fn into_stop(self, default_radius: f64) -> Stop {
        let image = self.image.unwrap_or_else(|| image_path(&self.name));
        Stop {
            coordinate: Coordinate::new(self.lat, self.lng),
            arrival_radius_meters: self.radius.unwrap_or(default_radius),
            content: Content {
                info: self.info,
                image: Some(image),
                audio: self
                    .audio
                    .into_iter()
                    .map(|a| AudioClip {
                        label: a.label,
                        src: a.src,
                    })
                    .collect(),
            },
            name: self.name,
        }
    }
}

/// Default image location for a stop: `images/<slug>.jpg`.
pub fn image_path(name: &str) -> String {
    format!("{IMAGE_DIR}{}.{IMAGE_EXT}", slug(name))
}

/// Lower-cases `name`, replaces whitespace runs with `-`, and drops
/// anything outside `[a-z0-9-]`.
fn slug(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut slug = String::with_capacity(lower.len());
    let mut in_space = false;
    for c in lower.chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            slug.push(c);
        }
    }
    slug
}
