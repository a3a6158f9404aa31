//! Quantity types shared by molecules, emitters and the scene
//!
//! Percentages (0-100) and fractions (0-1) are easy to transpose, so every
//! percentage-valued setting is a `Percent` and only converts to a fraction
//! explicitly.

use serde::{Deserialize, Serialize};

/// A percentage in the 0-100 range.
///
/// Deserialized values are clamped the same way `Percent::new` clamps.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct Percent(pub f32);

impl From<f32> for Percent {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

impl From<Percent> for f32 {
    fn from(percent: Percent) -> Self {
        percent.0
    }
}

impl Percent {
    /// 100%
    pub const FULL: Percent = Percent(100.0);
    /// 0%
    pub const ZERO: Percent = Percent(0.0);

    /// Create a percentage, clamped to 0-100
    pub fn new(value: f32) -> Self {
        Self(value.clamp(0.0, 100.0))
    }

    /// Raw percentage value
    pub fn value(self) -> f32 {
        self.0
    }

    /// Convert to a 0-1 fraction
    pub fn fraction(self) -> f32 {
        self.0 / 100.0
    }

    /// Whether this percentage is strictly positive
    pub fn is_positive(self) -> bool {
        self.0 > 0.0
    }
}

/// 24-bit RGB color stored as `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0x000000);
    pub const WHITE: Color = Color(0xFFFFFF);

    /// Create a color, masking anything above 24 bits
    pub fn new(rgb: u32) -> Self {
        Self(rgb & 0xFF_FFFF)
    }

    /// Create a color from its components
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Split into (r, g, b)
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }

    /// Normalized RGBA for renderers (alpha is always 1.0)
    pub fn to_rgba_f32(self) -> [f32; 4] {
        let (r, g, b) = self.rgb();
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
    }

    /// Per-channel linear blend toward `other`
    pub fn mix(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let (r0, g0, b0) = self.rgb();
        let (r1, g1, b1) = other.rgb();
        let channel = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color::from_rgb(channel(r0, r1), channel(g0, g1), channel(b0, b1))
    }
}
