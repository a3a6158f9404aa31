//! Molecule shape geometry
//!
//! A molecule is two endpoint circles joined by a segment, laid out
//! horizontally in local space:
//!
//! ```text
//!   (r, r)                                  (size - r, r)
//!     ( o )---------------------------------( o )
//!        ^ segment from 2r to size - 2r, scaled around its midpoint
//! ```

use glam::Vec2;

use crate::render::Bounds;
use crate::units::Percent;

/// Local geometry derived from radius, size and line settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoleculeGeometry {
    /// Endpoint circle radius
    pub radius: f32,
    /// Endpoint-to-endpoint span
    pub size: f32,
    /// Connecting segment thickness
    pub line_thickness: f32,
    /// Center of the first endpoint
    pub start_point: Vec2,
    /// Center of the second endpoint
    pub end_point: Vec2,
    /// Segment start (may lie right of `segment_end` for degenerate shapes)
    pub segment_start: Vec2,
    /// Segment end
    pub segment_end: Vec2,
    /// Rotation and scale pivot (center of the shape)
    pub pivot: Vec2,
}

impl MoleculeGeometry {
    /// Derive the shape.
    ///
    /// Never fails: when `size <= radius * 4` the raw segment length is zero or
    /// negative and the segment collapses onto (or inverts around) its midpoint.
    pub fn derive(radius: f32, size: f32, line_thickness: f32, line_length_scale: Percent) -> Self {
        let start_x = radius * 2.0;
        let raw_line_size = size - radius * 4.0;
        let scaled_line_size = raw_line_size * line_length_scale.fraction();
        let diff = scaled_line_size - raw_line_size;

        Self {
            radius,
            size,
            line_thickness,
            start_point: Vec2::new(radius, radius),
            end_point: Vec2::new(size - radius, radius),
            segment_start: Vec2::new(start_x - diff / 2.0, radius),
            segment_end: Vec2::new(start_x + raw_line_size + diff / 2.0, radius),
            pivot: Vec2::new(size / 2.0, radius),
        }
    }

    /// Signed segment length (negative for inverted degenerate shapes)
    pub fn segment_length(&self) -> f32 {
        self.segment_end.x - self.segment_start.x
    }

    /// Segment midpoint
    pub fn segment_midpoint(&self) -> Vec2 {
        (self.segment_start + self.segment_end) / 2.0
    }

    /// Unrotated, unscaled bounds in local space
    pub fn local_bounds(&self) -> Bounds {
        let half_line = self.line_thickness / 2.0;
        let half_height = self.radius.abs().max(half_line);
        let left = 0.0_f32
            .min(self.segment_start.x)
            .min(self.segment_end.x)
            .min(self.start_point.x - self.radius.abs());
        let right = self
            .size
            .max(self.segment_start.x)
            .max(self.segment_end.x)
            .max(self.end_point.x + self.radius.abs());
        Bounds::from_corners(
            Vec2::new(left, self.radius - half_height),
            Vec2::new(right, self.radius + half_height),
        )
    }
}
