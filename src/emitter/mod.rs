//! Emitter entity
//!
//! An emitter owns a population of molecules sampled around its origin and the
//! template parameters they were generated from. It regenerates that
//! population on demand and reconciles it against incoming snapshot state by
//! molecule id.

mod generator;
mod settings;

pub use generator::{generate_molecule_settings, jitter_value, sample_position};
pub use settings::EmitterSettings;

use std::collections::HashSet;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};

use crate::error::{Result, VisualisationError};
use crate::molecule::{Molecule, MoleculeSettings};
use crate::render::RenderPort;
use crate::settings::{conform, merge_deep, to_settings_map, VisualisationSettings};
use crate::units::{Color, Percent};
use crate::visualisation::{EmitterState, MoleculeState};

/// A spawn region owning a population of molecules
#[derive(Debug)]
pub struct Emitter {
    id: String,
    settings: EmitterSettings,
    molecules: Vec<Molecule>,
    rng: StdRng,
    gizmo_shown: bool,
    highlighted: bool,
}

impl Emitter {
    /// Create an emitter. No molecules are generated until asked.
    pub fn new(id: impl Into<String>, partial: Option<&Value>, context: &VisualisationSettings) -> Self {
        let id = id.into();
        let rng = emitter_rng(&id, context.seed);
        Self {
            id,
            settings: EmitterSettings::from_partial(partial),
            molecules: Vec::new(),
            rng,
            gizmo_shown: false,
            highlighted: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn settings(&self) -> &EmitterSettings {
        &self.settings
    }

    /// World position of the emitter origin
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.settings.x, self.settings.y)
    }

    pub fn molecules(&self) -> &[Molecule] {
        &self.molecules
    }

    /// Get a molecule by id
    pub fn molecule(&self, molecule_id: &str) -> Option<&Molecule> {
        self.molecules.iter().find(|m| m.id() == molecule_id)
    }

    /// Get a mutable molecule by id
    pub fn molecule_mut(&mut self, molecule_id: &str) -> Option<&mut Molecule> {
        self.molecules.iter_mut().find(|m| m.id() == molecule_id)
    }

    /// Number of molecules currently shown
    pub fn visible_count(&self) -> usize {
        self.molecules.iter().filter(|m| m.is_visible()).count()
    }

    /// Fresh id drawn from this emitter's generator
    pub fn next_id(&mut self) -> String {
        uuid::Builder::from_random_bytes(self.rng.random())
            .into_uuid()
            .to_string()
    }

    /// Derive settings for one new molecule from the template
    pub fn generate_molecule_settings(&mut self) -> MoleculeSettings {
        generate_molecule_settings(&self.settings, &mut self.rng)
    }

    // ========== Attachment ==========

    /// Attach the emitter node and any live molecules
    pub fn attach(&mut self, port: &mut dyn RenderPort, context: &VisualisationSettings) {
        port.add_emitter(&self.id, self.position());
        let id = &self.id;
        for molecule in &mut self.molecules {
            molecule.attach(id, port, context);
        }
        if context.show_gizmos {
            self.show_gizmo(true, port);
        }
    }

    /// Detach every molecule, then the emitter node
    pub fn detach(&mut self, port: &mut dyn RenderPort) {
        self.clear_molecules(port);
        port.remove_emitter(&self.id);
    }

    fn clear_molecules(&mut self, port: &mut dyn RenderPort) {
        for mut molecule in self.molecules.drain(..) {
            molecule.detach(&self.id, port);
        }
    }

    fn spawn(&mut self, mut molecule: Molecule, port: &mut dyn RenderPort, context: &VisualisationSettings) {
        molecule.attach(&self.id, port, context);
        self.molecules.push(molecule);
    }

    // ========== Population ==========

    /// Replace the whole population.
    ///
    /// A non-empty `preconfigured` list yields exactly one molecule per entry
    /// and becomes the new `moleculeAmount`; otherwise `moleculeAmount`
    /// molecules are generated from the template.
    pub fn init_molecules(
        &mut self,
        preconfigured: &[MoleculeState],
        context: &VisualisationSettings,
        port: &mut dyn RenderPort,
    ) {
        self.clear_molecules(port);

        if preconfigured.is_empty() {
            for _ in 0..self.settings.molecule_amount {
                self.spawn_generated(context, port);
            }
        } else {
            let mut seen: HashSet<String> = HashSet::with_capacity(preconfigured.len());
            for state in preconfigured {
                let id = match &state.id {
                    Some(id) if seen.contains(id.as_str()) => {
                        tracing::warn!(emitter = %self.id, molecule = %id, "Duplicate molecule id, assigning a new one");
                        self.next_id()
                    }
                    Some(id) => id.clone(),
                    None => self.next_id(),
                };
                seen.insert(id.clone());
                let partial = Value::Object(state.settings.clone());
                self.spawn(Molecule::new(id, Some(&partial), context), port, context);
            }
            self.settings.molecule_amount = self.molecules.len() as u32;
        }

        self.apply_visibility(context.quality_level, port);
        tracing::debug!(
            emitter = %self.id,
            count = self.molecules.len(),
            preconfigured = !preconfigured.is_empty(),
            "Initialized molecules"
        );
    }

    fn spawn_generated(&mut self, context: &VisualisationSettings, port: &mut dyn RenderPort) {
        let id = self.next_id();
        let settings = self.generate_molecule_settings();
        self.spawn(Molecule::from_settings(id, settings, context), port, context);
    }

    /// Throw away the population and generate a new one
    pub fn recreate_molecules(&mut self, context: &VisualisationSettings, port: &mut dyn RenderPort) {
        self.init_molecules(&[], context, port);
    }

    /// Generate missing molecules or drop extras until the live count matches `moleculeAmount`
    pub fn converge_population(&mut self, context: &VisualisationSettings, port: &mut dyn RenderPort) {
        let target = self.settings.molecule_amount as usize;
        while self.molecules.len() > target {
            if let Some(mut molecule) = self.molecules.pop() {
                molecule.detach(&self.id, port);
            }
        }
        while self.molecules.len() < target {
            self.spawn_generated(context, port);
        }
        self.apply_visibility(context.quality_level, port);
    }

    /// Reconcile the population against incoming molecule state.
    ///
    /// Matching ids are updated in place, unknown ids are created and live
    /// molecules missing from `states` are removed. Entries without an id are
    /// always created.
    pub fn set_state_molecules(
        &mut self,
        states: &[MoleculeState],
        context: &VisualisationSettings,
        port: &mut dyn RenderPort,
    ) {
        let incoming: HashSet<&str> = states.iter().filter_map(|s| s.id.as_deref()).collect();

        let mut removed = 0;
        let mut kept = Vec::with_capacity(self.molecules.len());
        for mut molecule in self.molecules.drain(..) {
            if incoming.contains(molecule.id()) {
                kept.push(molecule);
            } else {
                molecule.detach(&self.id, port);
                removed += 1;
            }
        }
        self.molecules = kept;

        let mut created = 0;
        for state in states {
            let existing = state
                .id
                .as_deref()
                .and_then(|id| self.molecules.iter().position(|m| m.id() == id));

            match existing {
                Some(index) => self.molecules[index].set_state(&state.settings),
                None => {
                    let id = match &state.id {
                        Some(id) => id.clone(),
                        None => self.next_id(),
                    };
                    let partial = Value::Object(state.settings.clone());
                    self.spawn(Molecule::new(id, Some(&partial), context), port, context);
                    created += 1;
                }
            }
        }

        self.settings.molecule_amount = self.molecules.len() as u32;
        self.apply_visibility(context.quality_level, port);
        tracing::debug!(
            emitter = %self.id,
            updated = states.len() - created,
            created,
            removed,
            "Reconciled molecules"
        );
    }

    /// Apply an incoming emitter entry.
    ///
    /// Emitter-level settings are taken over without pushing template values
    /// to existing molecules. An empty molecule list converges the population
    /// to `moleculeAmount` instead of clearing it.
    pub fn set_state(&mut self, state: &EmitterState, context: &VisualisationSettings, port: &mut dyn RenderPort) {
        let previous = self.position();
        let current = Value::Object(to_settings_map(&self.settings));
        let incoming = Value::Object(state.settings.clone());
        let merged = merge_deep(&current, Some(&conform(&current, &incoming)));
        self.settings = EmitterSettings::from_partial(Some(&merged));

        if self.position() != previous {
            port.set_emitter_position(&self.id, self.position());
        }

        if state.molecules.is_empty() {
            self.converge_population(context, port);
        } else {
            self.set_state_molecules(&state.molecules, context, port);
        }
    }

    /// Snapshot of this emitter and its molecules
    pub fn export_state(&self) -> EmitterState {
        EmitterState {
            id: Some(self.id.clone()),
            settings: to_settings_map(&self.settings),
            molecules: self.molecules.iter().map(Molecule::export_state).collect(),
        }
    }

    /// Apply incoming state to one molecule by id
    pub fn update_molecule(&mut self, molecule_id: &str, settings: &Map<String, Value>) -> Result<()> {
        match self.molecule_mut(molecule_id) {
            Some(molecule) => {
                molecule.set_state(settings);
                Ok(())
            }
            None => {
                tracing::warn!(emitter = %self.id, molecule = %molecule_id, "Molecule not found");
                Err(VisualisationError::MoleculeNotFound {
                    emitter: self.id.clone(),
                    molecule: molecule_id.to_string(),
                })
            }
        }
    }

    /// Show the first `round(amount * quality)` molecules and hide the rest.
    ///
    /// Changed molecules are pushed to the renderer right away.
    pub fn apply_visibility(&mut self, quality: Percent, port: &mut dyn RenderPort) {
        let limit = (self.settings.molecule_amount as f32 * quality.fraction()).round().max(0.0) as usize;
        let id = &self.id;
        for (index, molecule) in self.molecules.iter_mut().enumerate() {
            molecule.set_visible(index < limit);
            molecule.sync(id, port);
        }
    }

    /// Move every molecule to a freshly sampled position (eased)
    pub fn randomize_positions(&mut self) {
        for molecule in &mut self.molecules {
            let position = sample_position(self.settings.spawn_radius, &mut self.rng);
            molecule.set_position(position);
        }
    }

    // ========== Setters ==========

    pub fn set_x(&mut self, x: f32, port: &mut dyn RenderPort) {
        self.set_position(Vec2::new(x, self.settings.y), port);
    }

    pub fn set_y(&mut self, y: f32, port: &mut dyn RenderPort) {
        self.set_position(Vec2::new(self.settings.x, y), port);
    }

    /// Move the emitter origin. Molecule local offsets are unchanged.
    pub fn set_position(&mut self, position: Vec2, port: &mut dyn RenderPort) {
        if position == self.position() {
            return;
        }
        self.settings.x = position.x;
        self.settings.y = position.y;
        port.set_emitter_position(&self.id, position);
    }

    /// Change the sampling radius and regenerate the population
    pub fn set_spawn_radius(&mut self, radius: f32, context: &VisualisationSettings, port: &mut dyn RenderPort) {
        self.settings.spawn_radius = radius;
        self.recreate_molecules(context, port);
        if self.gizmo_shown {
            port.set_emitter_gizmo(&self.id, Some(radius));
        }
    }

    /// Change the target population size and regenerate the population
    pub fn set_molecule_amount(&mut self, amount: u32, context: &VisualisationSettings, port: &mut dyn RenderPort) {
        self.settings.molecule_amount = amount;
        self.recreate_molecules(context, port);
    }

    pub fn set_molecule_size(&mut self, size: f32) {
        self.settings.molecule_size = size;
        for molecule in &mut self.molecules {
            molecule.set_size(size);
        }
    }

    pub fn set_molecule_point_radius(&mut self, radius: f32) {
        self.settings.molecule_point_radius = radius;
        for molecule in &mut self.molecules {
            molecule.set_radius(radius);
        }
    }

    pub fn set_molecule_line_thickness(&mut self, thickness: f32) {
        self.settings.molecule_line_thickness = thickness;
        for molecule in &mut self.molecules {
            molecule.set_line_thickness(thickness);
        }
    }

    pub fn set_molecule_line_length_scale(&mut self, scale: Percent) {
        self.settings.molecule_line_length_scale = scale;
        for molecule in &mut self.molecules {
            molecule.set_line_length_scale(scale);
        }
    }

    pub fn set_color(&mut self, color: Color) {
        self.settings.color = color;
        for molecule in &mut self.molecules {
            molecule.set_color(color);
        }
    }

    /// Draw a new opacity for every molecule
    pub fn set_opacity_jitter(&mut self, jitter: Percent) {
        self.settings.opacity_jitter = jitter;
        for molecule in &mut self.molecules {
            molecule.set_opacity(jitter_value(jitter, &mut self.rng));
        }
    }

    /// Draw a new scale for every molecule
    pub fn set_size_jitter(&mut self, jitter: Percent) {
        self.settings.size_jitter = jitter;
        for molecule in &mut self.molecules {
            molecule.set_scale(jitter_value(jitter, &mut self.rng));
        }
    }

    // ========== Frame update ==========

    pub fn is_gizmo_shown(&self) -> bool {
        self.gizmo_shown
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// Show or hide the spawn-radius gizmo
    pub fn show_gizmo(&mut self, shown: bool, port: &mut dyn RenderPort) {
        self.gizmo_shown = shown;
        port.set_emitter_gizmo(&self.id, shown.then_some(self.settings.spawn_radius));
    }

    /// Mark the emitter as the selected one (or clear the mark)
    pub fn set_highlighted(&mut self, highlighted: bool, port: &mut dyn RenderPort) {
        if self.highlighted == highlighted {
            return;
        }
        self.highlighted = highlighted;
        port.set_emitter_highlight(&self.id, highlighted);
    }

    /// Show or hide debug overlays on every molecule
    pub fn show_debug(&mut self, shown: bool, port: &mut dyn RenderPort) {
        let id = &self.id;
        for molecule in &mut self.molecules {
            molecule.show_debug(id, port, shown);
        }
    }

    /// Advance every molecule and push changes to the renderer
    pub fn render(&mut self, elapsed_ms: f32, context: &VisualisationSettings, port: &mut dyn RenderPort) {
        let id = &self.id;
        for molecule in &mut self.molecules {
            molecule.render(elapsed_ms, context);
            molecule.sync(id, port);
        }
    }
}

/// Per-emitter generator: derived from the scene seed and the emitter id, or
/// from OS entropy when no seed is configured
fn emitter_rng(id: &str, seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ fnv1a_64(id.as_bytes())),
        None => StdRng::from_os_rng(),
    }
}

/// FNV-1a 64-bit hash, stable across builds and platforms
fn fnv1a_64(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
