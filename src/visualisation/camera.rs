//! Camera transform and zoom targets

use glam::{Affine2, Vec2};

use crate::animation::Interpolate;

/// Pan/zoom of the whole scene.
///
/// A world point `p` lands on screen at `position + (p - pivot) * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    /// Screen point the pivot is drawn at
    pub position: Vec2,
    /// World point the scale is applied around
    pub pivot: Vec2,
    /// Uniform zoom factor
    pub scale: f32,
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            pivot: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl CameraTransform {
    pub fn new(position: Vec2, pivot: Vec2, scale: f32) -> Self {
        Self { position, pivot, scale }
    }

    /// World-to-screen affine transform
    pub fn to_affine(&self) -> Affine2 {
        Affine2::from_translation(self.position)
            * Affine2::from_scale(Vec2::splat(self.scale))
            * Affine2::from_translation(-self.pivot)
    }

    /// Project a world point to the screen
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.to_affine().transform_point2(world)
    }

    /// Project a screen point back into the world; `None` at zero scale
    pub fn screen_to_world(&self, screen: Vec2) -> Option<Vec2> {
        if self.scale.abs() <= f32::EPSILON {
            return None;
        }
        Some(self.pivot + (screen - self.position) / self.scale)
    }

    /// Whether two transforms are equal within a small tolerance
    pub fn approx_eq(&self, other: &Self) -> bool {
        const EPS: f32 = 1e-4;
        self.position.abs_diff_eq(other.position, EPS)
            && self.pivot.abs_diff_eq(other.pivot, EPS)
            && (self.scale - other.scale).abs() <= EPS
    }
}

impl Interpolate for CameraTransform {
    fn interpolate(self, to: Self, t: f32) -> Self {
        Self {
            position: self.position.interpolate(to.position, t),
            pivot: self.pivot.interpolate(to.pivot, t),
            scale: self.scale.interpolate(to.scale, t),
        }
    }
}

/// Where to zoom: `(x, y)` is the world point, offsets shift it from the
/// viewport centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTarget {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub duration_ms: f32,
}

impl ZoomTarget {
    /// Zoom on a world point with no offset and the default duration
    pub fn new(x: f32, y: f32, scale: f32) -> Self {
        Self {
            x,
            y,
            scale,
            offset_x: 0.0,
            offset_y: 0.0,
            duration_ms: crate::settings::DEFAULT_TRANSITION_MS as f32,
        }
    }

    pub fn with_offset(mut self, offset_x: f32, offset_y: f32) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }

    pub fn with_duration(mut self, duration_ms: f32) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// World point that ends up at the viewport centre
    pub fn pivot(&self) -> Vec2 {
        Vec2::new(self.x - self.offset_x, self.y - self.offset_y)
    }
}
