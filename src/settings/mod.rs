//! Settings management for the molecule visualisation
//!
//! Scene-level configuration (`VisualisationSettings`) is merged from a partial
//! JSON object like every entity settings record. Runner preferences are
//! stored as XML in the platform config directory.

pub mod merge;

use std::fs;
use std::path::PathBuf;

use quick_xml::de::from_str;
use quick_xml::se::to_string;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::animation::Easing;
use crate::units::Percent;

pub use merge::{conform, decode_settings, merge_deep, to_settings_map};

/// Default duration of eased transitions in milliseconds
pub const DEFAULT_TRANSITION_MS: u32 = 1000;

/// Interaction mode of the visualisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    /// Viewing only
    #[default]
    View,
    /// Emitters can be placed and edited
    Edit,
}

/// Scene-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisualisationSettings {
    /// Show debug bounds overlays around molecules
    pub debug: bool,
    /// Show every emitter's spawn-radius gizmo
    pub show_gizmos: bool,
    /// Share of each emitter's population that is visible (0-100)
    pub quality_level: Percent,
    /// Whether molecules rotate on their own every frame
    pub animate: bool,
    /// Ambient self-rotation in radians per second at scale 1.0
    pub rotation_speed: f32,
    /// Default eased-transition duration
    pub transition_duration_ms: u32,
    /// Easing curve used for every transition
    pub easing: Easing,
    /// Seed for reproducible molecule generation
    pub seed: Option<u64>,
    /// Interaction mode
    pub mode: Mode,
}

impl Default for VisualisationSettings {
    fn default() -> Self {
        Self {
            debug: false,
            show_gizmos: false,
            quality_level: Percent::FULL,
            animate: true,
            rotation_speed: 0.25,
            transition_duration_ms: DEFAULT_TRANSITION_MS,
            easing: Easing::default(),
            seed: None,
            mode: Mode::View,
        }
    }
}

impl VisualisationSettings {
    /// Merge a partial JSON object onto the defaults
    pub fn from_partial(partial: Option<&Value>) -> Self {
        decode_settings(partial)
    }

    /// Seeded settings, mostly for tests and reproducible exports
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }
}

/// Preferences for the headless runner (stored in config directory)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "MoleculeVizPreferences")]
pub struct RunnerPreferences {
    /// Viewport width used when none is given on the command line
    #[serde(rename = "viewportWidth", default = "default_viewport_width")]
    pub viewport_width: u32,

    /// Viewport height used when none is given on the command line
    #[serde(rename = "viewportHeight", default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Number of frames to advance
    #[serde(rename = "frames", default = "default_frames")]
    pub frames: u32,

    /// Simulated frame duration in milliseconds
    #[serde(rename = "frameMs", default = "default_frame_ms")]
    pub frame_ms: f32,

    /// Path to the last snapshot the runner loaded
    #[serde(rename = "lastSnapshot", default, skip_serializing_if = "Option::is_none")]
    pub last_snapshot: Option<String>,
}

fn default_viewport_width() -> u32 {
    1920
}

fn default_viewport_height() -> u32 {
    1080
}

fn default_frames() -> u32 {
    60
}

fn default_frame_ms() -> f32 {
    1000.0 / 60.0
}

impl Default for RunnerPreferences {
    fn default() -> Self {
        Self {
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            frames: default_frames(),
            frame_ms: default_frame_ms(),
            last_snapshot: None,
        }
    }
}

impl RunnerPreferences {
    /// Get the preferences file path
    fn get_prefs_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("MoleculeViz");
            p.push("preferences.xml");
            p
        })
    }

    /// Load preferences from config directory
    pub fn load() -> Self {
        let Some(path) = Self::get_prefs_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_xml(&contents).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save preferences to config directory
    pub fn save(&self) -> Result<(), SettingsError> {
        let Some(path) = Self::get_prefs_path() else {
            return Err(SettingsError::NoConfigDir);
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, self.to_xml()?)?;
        Ok(())
    }

    /// Parse preferences from an XML document
    pub fn from_xml(xml: &str) -> Result<Self, SettingsError> {
        let mut prefs: Self = from_str(xml)?;
        prefs.viewport_width = prefs.viewport_width.max(1);
        prefs.viewport_height = prefs.viewport_height.max(1);
        if !(prefs.frame_ms > 0.0) {
            prefs.frame_ms = default_frame_ms();
        }
        Ok(prefs)
    }

    /// Serialize preferences to an XML document
    pub fn to_xml(&self) -> Result<String, SettingsError> {
        let xml = to_string(self)?;
        Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml))
    }

    /// Remember the last loaded snapshot and save
    pub fn set_last_snapshot(&mut self, path: &std::path::Path) {
        self.last_snapshot = Some(path.to_string_lossy().to_string());
        if let Err(e) = self.save() {
            tracing::warn!("Failed to save preferences: {}", e);
        }
    }
}

/// Settings-related errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::DeError),
    #[error("XML write error: {0}")]
    XmlWrite(#[from] quick_xml::SeError),
    #[error("Could not find config directory")]
    NoConfigDir,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_settings() {
        let settings = VisualisationSettings::default();
        assert!(!settings.debug);
        assert!(settings.animate);
        assert_eq!(settings.quality_level, Percent::FULL);
        assert_eq!(settings.transition_duration_ms, 1000);
        assert_eq!(settings.mode, Mode::View);
    }

    #[test]
    fn test_settings_from_partial() {
        let partial = json!({"debug": true, "qualityLevel": 50, "mode": "EDIT", "seed": 7});
        let settings = VisualisationSettings::from_partial(Some(&partial));
        assert!(settings.debug);
        assert_eq!(settings.quality_level, Percent(50.0));
        assert_eq!(settings.mode, Mode::Edit);
        assert_eq!(settings.seed, Some(7));
        assert!(settings.animate);
    }

    #[test]
    fn test_quality_level_is_clamped_on_load() {
        let partial = json!({"qualityLevel": 250, "showGizmos": true});
        let settings = VisualisationSettings::from_partial(Some(&partial));
        assert_eq!(settings.quality_level, Percent::FULL);
        assert!(settings.show_gizmos);
    }

    #[test]
    fn test_settings_bad_enum_falls_back_per_field() {
        let partial = json!({"mode": "PAINT", "debug": true});
        let settings = VisualisationSettings::from_partial(Some(&partial));
        assert_eq!(settings.mode, Mode::View);
        assert!(settings.debug);
    }

    #[test]
    fn test_preferences_xml_roundtrip() {
        let prefs = RunnerPreferences {
            viewport_width: 529,
            viewport_height: 1137,
            frames: 12,
            frame_ms: 20.0,
            last_snapshot: Some("thyroid.json".to_string()),
        };
        let xml = prefs.to_xml().unwrap();
        assert_eq!(RunnerPreferences::from_xml(&xml).unwrap(), prefs);
    }

    #[test]
    fn test_preferences_defaults_for_missing_fields() {
        let prefs = RunnerPreferences::from_xml("<MoleculeVizPreferences></MoleculeVizPreferences>").unwrap();
        assert_eq!(prefs, RunnerPreferences::default());
    }
}
