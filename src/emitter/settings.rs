//! Emitter settings record

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::settings::decode_settings;
use crate::units::{Color, Percent};

/// Full settings of one emitter.
///
/// The `molecule*` fields and `color` are the template every generated
/// molecule starts from. Jitters are percentages; the per-molecule values they
/// produce (`scale`, `opacity`) are fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmitterSettings {
    /// World position of the emitter origin
    pub x: f32,
    pub y: f32,
    /// Radius of the sampling disc around the origin
    pub spawn_radius: f32,
    /// Target population size
    pub molecule_amount: u32,
    pub molecule_size: f32,
    pub molecule_line_length_scale: Percent,
    pub molecule_line_thickness: f32,
    pub molecule_point_radius: f32,
    /// Maximum opacity reduction per molecule
    pub opacity_jitter: Percent,
    /// Maximum scale reduction per molecule
    pub size_jitter: Percent,
    pub color: Color,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for EmitterSettings {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            spawn_radius: 100.0,
            molecule_amount: 10,
            molecule_size: 20.0,
            molecule_line_length_scale: Percent::FULL,
            molecule_line_thickness: 1.0,
            molecule_point_radius: 2.0,
            opacity_jitter: Percent::ZERO,
            size_jitter: Percent::ZERO,
            color: Color::BLACK,
            extra: Map::new(),
        }
    }
}

impl EmitterSettings {
    /// Merge a partial settings object onto the defaults
    pub fn from_partial(partial: Option<&Value>) -> Self {
        decode_settings(partial)
    }
}
