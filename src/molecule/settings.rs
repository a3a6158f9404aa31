//! Molecule settings record

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::settings::decode_settings;
use crate::units::{Color, Percent};

/// Full settings of one molecule.
///
/// `x`/`y` are the local offset from the owning emitter's origin.
/// Keys this record does not know are kept in `extra` and exported again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MoleculeSettings {
    pub color: Color,
    pub x: f32,
    pub y: f32,
    /// Endpoint radius
    pub radius: f32,
    /// Endpoint-to-endpoint span
    pub size: f32,
    pub line_thickness: f32,
    /// Share of the endpoint gap covered by the connecting segment
    pub line_length_scale: Percent,
    /// Alpha (0-1)
    pub opacity: f32,
    /// Radians
    pub rotation: f32,
    /// Uniform multiplier
    pub scale: f32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for MoleculeSettings {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            x: 0.0,
            y: 0.0,
            radius: 2.0,
            size: 20.0,
            line_thickness: 1.0,
            line_length_scale: Percent::FULL,
            opacity: 1.0,
            rotation: 0.0,
            scale: 1.0,
            extra: Map::new(),
        }
    }
}

impl MoleculeSettings {
    /// Merge a partial settings object onto the defaults
    pub fn from_partial(partial: Option<&Value>) -> Self {
        decode_settings(partial)
    }
}
