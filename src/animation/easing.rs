//! Easing curves for transitions

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// Easing curve applied to normalized transition progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    Linear,
    EaseInQuad,
    EaseOutQuad,
    #[default]
    EaseInOutSine,
    EaseInOutCubic,
}

impl Easing {
    /// Map linear progress (0-1) to eased progress (0-1)
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => t * (2.0 - t),
            Easing::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }

    /// Get display name
    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "Linear",
            Easing::EaseInQuad => "Ease In (Quad)",
            Easing::EaseOutQuad => "Ease Out (Quad)",
            Easing::EaseInOutSine => "Ease In/Out (Sine)",
            Easing::EaseInOutCubic => "Ease In/Out (Cubic)",
        }
    }

    /// Get all easing curves
    pub fn all() -> &'static [Easing] {
        &[
            Easing::Linear,
            Easing::EaseInQuad,
            Easing::EaseOutQuad,
            Easing::EaseInOutSine,
            Easing::EaseInOutCubic,
        ]
    }
}
