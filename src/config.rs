//! Run configuration, loaded from an optional JSON file.

use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use topograph::DEFAULT_LEVEL;

/// Names of the two attribute fields carrying a feature's area names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Field holding the district (leaf area) name.
    pub district: String,
    /// Field holding the subregion (parent area) name.
    pub region:   String,
}

impl FieldSchema {
    pub fn new(district: &str, region: &str) -> Self {
        Self { district: district.into(), region: region.into() }
    }
}

/// Admin levels assigned to each kind of area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Levels {
    pub subregion: u8,
    pub district:  u8,
    /// Level of lines that no area uses as outer boundary.
    pub default:   u8,
}

impl Default for Levels {
    fn default() -> Self {
        Self { subregion: 6, district: 7, default: DEFAULT_LEVEL }
    }
}

/// Settings for one run.  Every field has a default, so an empty JSON object
/// (or no file at all) is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Snapping tolerance in degrees.
    pub tolerance:   f64,
    /// Expected number of points, used to pre-size the point index.
    pub cache_size:  usize,
    pub levels:      Levels,
    /// Accepted attribute schemas, tried in order.
    pub schemas:     Vec<FieldSchema>,
    /// PROJ.4 definition of the source coordinates.  `None` when the input is
    /// already WGS84 lon/lat.
    pub source_proj: Option<String>,
    /// Worker threads for area verification (`0` = one per core).
    pub threads:     usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tolerance:   1e-7,
            cache_size:  1 << 20,
            levels:      Levels::default(),
            schemas:     vec![
                FieldSchema::new("DNAME_2010", "SUBREGION"),
                FieldSchema::new("place", "region"),
            ],
            source_proj: None,
            threads:     0,
        }
    }
}

impl Config {
    /// Read a configuration from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("[config] Failed to read {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("[config] Invalid configuration in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.tolerance.is_finite() && self.tolerance > 0.0,
            "[config] tolerance must be a positive number of degrees, got {}", self.tolerance);
        ensure!(!self.schemas.is_empty(), "[config] at least one attribute schema is required");
        ensure!(self.levels.subregion < self.levels.district,
            "[config] subregion level ({}) must be coarser than district level ({})",
            self.levels.subregion, self.levels.district);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_levels_keep_other_defaults() {
        let config: Config = serde_json::from_str(r#"{"levels": {"district": 8}, "tolerance": 1e-6}"#).unwrap();
        assert_eq!(config.levels.subregion, 6);
        assert_eq!(config.levels.district, 8);
        assert_eq!(config.tolerance, 1e-6);
        assert_eq!(config.schemas.len(), 2);
    }

    #[test]
    fn rejects_inverted_levels() {
        let config = Config { levels: Levels { subregion: 7, district: 6, default: 8 }, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"source_proj": "+proj=utm +zone=36 +datum=WGS84", "threads": 2}"#).unwrap();
        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.threads, 2);
        assert!(config.source_proj.is_some());
    }
}
