//! Render port
//!
//! The core never draws. Emitters and molecules compute their visual state and
//! push it through a `RenderPort`, which owns whatever drawable representation
//! the host uses (a GPU scene graph, an SVG tree, a test recorder).

pub mod recording;

use glam::Vec2;

use crate::molecule::MoleculeGeometry;
use crate::units::Color;
use crate::visualisation::CameraTransform;

pub use recording::{NullRenderer, RecordingRenderer, RenderCall};

/// Axis-aligned rectangle in local or screen units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Smallest rectangle containing both corners
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Everything a renderer needs to draw one molecule
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeVisual {
    /// Molecule id (unique within its emitter)
    pub id: String,
    /// Current offset from the emitter origin
    pub position: Vec2,
    /// Current rotation in radians, around `geometry.pivot`
    pub rotation: f32,
    /// Current uniform scale
    pub scale: f32,
    /// Current alpha (0-1)
    pub opacity: f32,
    /// Current tint of both endpoints and the connecting segment
    pub tint: Color,
    /// Hidden molecules stay attached but are not drawn
    pub visible: bool,
    /// Local shape geometry
    pub geometry: MoleculeGeometry,
}

/// Drawable side of the visualisation.
///
/// Population changes map to add/remove calls; per-frame changes map to
/// `update_molecule`. Implementations must tolerate removal of unknown ids.
pub trait RenderPort {
    /// An emitter was attached at a world position
    fn add_emitter(&mut self, emitter_id: &str, position: Vec2);

    /// An emitter was detached (its molecules were removed first)
    fn remove_emitter(&mut self, emitter_id: &str);

    /// An emitter moved
    fn set_emitter_position(&mut self, emitter_id: &str, position: Vec2);

    /// A molecule was attached to an emitter
    fn add_molecule(&mut self, emitter_id: &str, visual: &MoleculeVisual);

    /// A molecule was detached from an emitter
    fn remove_molecule(&mut self, emitter_id: &str, molecule_id: &str);

    /// A molecule's visual state or geometry changed
    fn update_molecule(&mut self, emitter_id: &str, visual: &MoleculeVisual);

    /// The camera transform changed
    fn set_camera(&mut self, camera: &CameraTransform);

    /// Measure the on-screen bounds of an attached molecule, if supported
    fn measure_bounds(&mut self, _emitter_id: &str, _molecule_id: &str) -> Option<Bounds> {
        None
    }

    /// Show (`Some`) or hide (`None`) a debug overlay around a molecule
    fn set_debug_overlay(&mut self, _emitter_id: &str, _molecule_id: &str, _bounds: Option<Bounds>) {}

    /// Show the spawn-radius gizmo of an emitter (`Some(radius)`) or hide it (`None`)
    fn set_emitter_gizmo(&mut self, _emitter_id: &str, _spawn_radius: Option<f32>) {}

    /// Highlight or unhighlight an emitter
    fn set_emitter_highlight(&mut self, _emitter_id: &str, _highlighted: bool) {}
}
