//! In-memory render ports
//!
//! `NullRenderer` discards everything. `RecordingRenderer` keeps the call log
//! and a mirror of the attached tree, which is what the headless runner and
//! the tests inspect.

use std::collections::BTreeMap;

use glam::Vec2;

use super::{Bounds, MoleculeVisual, RenderPort};
use crate::visualisation::CameraTransform;

/// Render port that ignores every call
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl RenderPort for NullRenderer {
    fn add_emitter(&mut self, _emitter_id: &str, _position: Vec2) {}
    fn remove_emitter(&mut self, _emitter_id: &str) {}
    fn set_emitter_position(&mut self, _emitter_id: &str, _position: Vec2) {}
    fn add_molecule(&mut self, _emitter_id: &str, _visual: &MoleculeVisual) {}
    fn remove_molecule(&mut self, _emitter_id: &str, _molecule_id: &str) {}
    fn update_molecule(&mut self, _emitter_id: &str, _visual: &MoleculeVisual) {}
    fn set_camera(&mut self, _camera: &CameraTransform) {}
}

/// A single call received by the `RecordingRenderer`
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    AddEmitter { emitter: String },
    RemoveEmitter { emitter: String },
    MoveEmitter { emitter: String, position: Vec2 },
    AddMolecule { emitter: String, molecule: String },
    RemoveMolecule { emitter: String, molecule: String },
    UpdateMolecule { emitter: String, molecule: String },
    SetCamera { camera: CameraTransform },
    DebugOverlay { emitter: String, molecule: String, shown: bool },
    Gizmo { emitter: String, spawn_radius: Option<f32> },
    Highlight { emitter: String, highlighted: bool },
}

/// Attached emitter as seen by the recorder
#[derive(Debug, Clone, Default)]
pub struct RecordedEmitter {
    pub position: Vec2,
    pub molecules: BTreeMap<String, MoleculeVisual>,
    pub overlays: BTreeMap<String, Bounds>,
    /// Spawn radius drawn by the gizmo, if shown
    pub gizmo: Option<f32>,
    pub highlighted: bool,
}

/// Render port that records calls and mirrors the attached tree
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    calls: Vec<RenderCall>,
    emitters: BTreeMap<String, RecordedEmitter>,
    camera: Option<CameraTransform>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call received so far
    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    /// Forget the call log (the mirrored tree is kept)
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Count calls matching a predicate
    pub fn count(&self, predicate: impl Fn(&RenderCall) -> bool) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }

    /// Attached emitter ids
    pub fn emitter_ids(&self) -> Vec<&str> {
        self.emitters.keys().map(String::as_str).collect()
    }

    /// Attached emitter by id
    pub fn emitter(&self, emitter_id: &str) -> Option<&RecordedEmitter> {
        self.emitters.get(emitter_id)
    }

    /// Number of molecules attached to an emitter
    pub fn molecule_count(&self, emitter_id: &str) -> usize {
        self.emitters.get(emitter_id).map(|e| e.molecules.len()).unwrap_or(0)
    }

    /// Total attached molecules across emitters
    pub fn total_molecules(&self) -> usize {
        self.emitters.values().map(|e| e.molecules.len()).sum()
    }

    /// Attached molecules the renderer was told to draw
    pub fn visible_molecules(&self, emitter_id: &str) -> usize {
        self.emitters
            .get(emitter_id)
            .map(|e| e.molecules.values().filter(|m| m.visible).count())
            .unwrap_or(0)
    }

    /// Last camera transform received
    pub fn camera(&self) -> Option<&CameraTransform> {
        self.camera.as_ref()
    }
}

impl RenderPort for RecordingRenderer {
    fn add_emitter(&mut self, emitter_id: &str, position: Vec2) {
        self.calls.push(RenderCall::AddEmitter {
            emitter: emitter_id.to_string(),
        });
        self.emitters.insert(
            emitter_id.to_string(),
            RecordedEmitter {
                position,
                ..Default::default()
            },
        );
    }

    fn remove_emitter(&mut self, emitter_id: &str) {
        self.calls.push(RenderCall::RemoveEmitter {
            emitter: emitter_id.to_string(),
        });
        self.emitters.remove(emitter_id);
    }

    fn set_emitter_position(&mut self, emitter_id: &str, position: Vec2) {
        self.calls.push(RenderCall::MoveEmitter {
            emitter: emitter_id.to_string(),
            position,
        });
        if let Some(emitter) = self.emitters.get_mut(emitter_id) {
            emitter.position = position;
        }
    }

    fn add_molecule(&mut self, emitter_id: &str, visual: &MoleculeVisual) {
        self.calls.push(RenderCall::AddMolecule {
            emitter: emitter_id.to_string(),
            molecule: visual.id.clone(),
        });
        self.emitters
            .entry(emitter_id.to_string())
            .or_default()
            .molecules
            .insert(visual.id.clone(), visual.clone());
    }

    fn remove_molecule(&mut self, emitter_id: &str, molecule_id: &str) {
        self.calls.push(RenderCall::RemoveMolecule {
            emitter: emitter_id.to_string(),
            molecule: molecule_id.to_string(),
        });
        if let Some(emitter) = self.emitters.get_mut(emitter_id) {
            emitter.molecules.remove(molecule_id);
            emitter.overlays.remove(molecule_id);
        }
    }

    fn update_molecule(&mut self, emitter_id: &str, visual: &MoleculeVisual) {
        self.calls.push(RenderCall::UpdateMolecule {
            emitter: emitter_id.to_string(),
            molecule: visual.id.clone(),
        });
        if let Some(slot) = self
            .emitters
            .get_mut(emitter_id)
            .and_then(|e| e.molecules.get_mut(&visual.id))
        {
            *slot = visual.clone();
        }
    }

    fn set_camera(&mut self, camera: &CameraTransform) {
        self.calls.push(RenderCall::SetCamera { camera: *camera });
        self.camera = Some(*camera);
    }

    fn set_debug_overlay(&mut self, emitter_id: &str, molecule_id: &str, bounds: Option<Bounds>) {
        self.calls.push(RenderCall::DebugOverlay {
            emitter: emitter_id.to_string(),
            molecule: molecule_id.to_string(),
            shown: bounds.is_some(),
        });
        if let Some(emitter) = self.emitters.get_mut(emitter_id) {
            match bounds {
                Some(bounds) => {
                    emitter.overlays.insert(molecule_id.to_string(), bounds);
                }
                None => {
                    emitter.overlays.remove(molecule_id);
                }
            }
        }
    }

    fn set_emitter_gizmo(&mut self, emitter_id: &str, spawn_radius: Option<f32>) {
        self.calls.push(RenderCall::Gizmo {
            emitter: emitter_id.to_string(),
            spawn_radius,
        });
        if let Some(emitter) = self.emitters.get_mut(emitter_id) {
            emitter.gizmo = spawn_radius;
        }
    }

    fn set_emitter_highlight(&mut self, emitter_id: &str, highlighted: bool) {
        self.calls.push(RenderCall::Highlight {
            emitter: emitter_id.to_string(),
            highlighted,
        });
        if let Some(emitter) = self.emitters.get_mut(emitter_id) {
            emitter.highlighted = highlighted;
        }
    }
}
