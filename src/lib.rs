//! Molecule Visualisation Core
//!
//! Procedurally generated fields of animated two-point "molecule" shapes
//! grouped into emitters. The core computes geometry, eased transitions and
//! snapshot state; drawing is delegated to a `RenderPort`.

pub mod animation;
pub mod editor;
pub mod emitter;
pub mod error;
pub mod molecule;
pub mod render;
pub mod settings;
pub mod telemetry;
pub mod units;
pub mod visualisation;

pub use editor::{Editor, EmitterEdit};
pub use emitter::{Emitter, EmitterSettings};
pub use error::{Result, VisualisationError};
pub use molecule::{Molecule, MoleculeGeometry, MoleculeSettings};
pub use render::{Bounds, MoleculeVisual, NullRenderer, RecordingRenderer, RenderPort};
pub use settings::{Mode, RunnerPreferences, VisualisationSettings};
pub use units::{Color, Percent};
pub use visualisation::{CameraTransform, Dimension, Snapshot, Visualisation, ZoomTarget};
