//! Waymark configuration.
//!
//! Loaded from `~/.waymark/config.toml`. Every key is optional and a missing
//! file means defaults. Command-line flags override whatever is set here.
//!
//! ```toml
//! catalog = "/srv/trails/harbour.toml"
//! store = "/var/lib/waymark"
//! default-radius = 20.0
//! fix-timeout-secs = 10
//!
//! [heading]
//! smoothing-factor = 0.25
//! time-constant-ms = 400
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_RADIUS_M;
use crate::heading::{DEFAULT_SMOOTHING_FACTOR, Smoothing};
use crate::session::DEFAULT_FIX_TIMEOUT;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHome,

    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config at {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Trail definition to walk. The built-in trail when unset.
    pub catalog: Option<PathBuf>,

    /// Directory holding `progress.sqlite`. `~/.waymark` when unset.
    pub store: Option<PathBuf>,

    /// Arrival radius for stops that don't set their own.
    pub default_radius: f64,

    /// Seconds without a fix before the feed is reported as timed out.
    pub fix_timeout_secs: u64,

    pub heading: HeadingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct HeadingConfig {
    pub smoothing_factor: f64,

    /// When set, damping follows elapsed time instead of sample count.
    pub time_constant_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: None,
            store: None,
            default_radius: DEFAULT_RADIUS_M,
            fix_timeout_secs: DEFAULT_FIX_TIMEOUT.as_secs(),
            heading: HeadingConfig::default(),
        }
    }
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
            time_constant_ms: None,
        }
    }
}

impl Config {
    /// Load config from `~/.waymark/config.toml`, or defaults if there is none.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path().ok_or(ConfigError::NoHome)?;
        Self::load_from(&path)
    }

    /// Load config from a specific file, or defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate().map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;

        Ok(config)
    }

    /// The config file path: `~/.waymark/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".waymark").join("config.toml"))
    }

    pub fn fix_timeout(&self) -> Duration {
        Duration::from_secs(self.fix_timeout_secs)
    }

    pub fn smoothing(&self) -> Smoothing {
        match self.heading.time_constant_ms {
            Some(ms) => Smoothing::TimeConstant(Duration::from_millis(ms)),
            None => Smoothing::PerSample(self.heading.smoothing_factor),
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.default_radius.is_finite() && self.default_radius > 0.0) {
            return Err(format!(
                "default-radius must be a positive number of meters, got {}",
                self.default_radius
            ));
        }
        if self.fix_timeout_secs == 0 {
            return Err("fix-timeout-secs must be at least 1".to_string());
        }
        let factor = self.heading.smoothing_factor;
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(format!(
                "heading.smoothing-factor must be in (0, 1], got {factor}"
            ));
        }
        if self.heading.time_constant_ms == Some(0) {
            return Err("heading.time-constant-ms must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.default_radius, 15.0);
        assert_eq!(config.fix_timeout(), Duration::from_secs(10));
        assert_eq!(config.smoothing(), Smoothing::PerSample(0.25));
    }

    #[test]
    fn reads_every_key() {
        let (_dir, path) = write_config(
            r#"
catalog = "/trails/harbour.toml"
store = "/var/lib/waymark"
default-radius = 20.0
fix-timeout-secs = 5

[heading]
smoothing-factor = 0.5
time-constant-ms = 400
"#,
        );

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.catalog, Some(PathBuf::from("/trails/harbour.toml")));
        assert_eq!(config.store, Some(PathBuf::from("/var/lib/waymark")));
        assert_eq!(config.default_radius, 20.0);
        assert_eq!(config.fix_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.smoothing(),
            Smoothing::TimeConstant(Duration::from_millis(400))
        );
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let (_dir, path) = write_config("[heading]\nsmoothing-factor = 0.1\n");

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.smoothing(), Smoothing::PerSample(0.1));
        assert_eq!(config.default_radius, DEFAULT_RADIUS_M);
        assert!(config.catalog.is_none());
    }

    #[test]
    fn unknown_key_is_an_error() {
        let (_dir, path) = write_config("radius = 3.0\n");

        let err = Config::load_from(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for bad in [
            "default-radius = 0.0",
            "fix-timeout-secs = 0",
            "[heading]\nsmoothing-factor = 1.5",
            "[heading]\ntime-constant-ms = 0",
        ] {
            let (_dir, path) = write_config(bad);
            let err = Config::load_from(&path).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { .. }),
                "{bad} should be invalid"
            );
        }
    }
}
