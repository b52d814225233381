//! Game settings and preferences
//!
//! Read from an optional JSON file. Every field has a default, so a partial
//! file (or none at all) is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::DEFAULT_FRAME_MS;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding `images/` and `music/`
    pub asset_root: PathBuf,
    /// Fixed run seed; time-based when absent
    pub seed: Option<u64>,
    /// Simulated frame duration for the headless driver
    pub frame_ms: u32,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects and ambience volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Background music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,

    // === Debug ===
    /// Q/W/E/R jump to the tutorial and levels
    pub debug_shortcuts: bool,
    /// Dump a canvas PNG every N frames (0 = never)
    pub snapshot_every: u64,
    pub snapshot_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            seed: None,
            frame_ms: DEFAULT_FRAME_MS,

            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,

            debug_shortcuts: true,
            snapshot_every: 0,
            snapshot_dir: PathBuf::from("snapshots"),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str, path: &Path) -> Result<Self, SettingsError> {
        serde_json::from_str(json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json, path)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults on any error
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::info!("Using default settings");
            return Self::default();
        };
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Frame duration, never zero
    pub fn effective_frame_ms(&self) -> u32 {
        self.frame_ms.max(1)
    }

    pub fn snapshots_enabled(&self) -> bool {
        self.snapshot_every > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let s = Settings::from_json(r#"{ "seed": 7, "muted": true }"#, Path::new("x.json")).unwrap();
        assert_eq!(s.seed, Some(7));
        assert!(s.muted);
        assert_eq!(s.frame_ms, DEFAULT_FRAME_MS);
        assert_eq!(s.master_volume, 0.8);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let err = Settings::from_json("{ seed: }", Path::new("bad.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let path = Path::new("/definitely/not/here/settings.json");
        assert!(matches!(Settings::load(path), Err(SettingsError::Io { .. })));
        assert_eq!(Settings::load_or_default(Some(path)), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("flower-keeper-{}.json", std::process::id()));
        let settings = Settings {
            seed: Some(11),
            snapshot_every: 60,
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, settings);
        assert!(loaded.snapshots_enabled());
    }

    #[test]
    fn test_zero_frame_ms_is_clamped() {
        let s = Settings {
            frame_ms: 0,
            ..Settings::default()
        };
        assert_eq!(s.effective_frame_ms(), 1);
    }
}
