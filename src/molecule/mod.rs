//! Molecule entity
//!
//! A molecule keeps two views of itself: `settings` holds the target values
//! (what gets exported), `visual` holds what is currently on screen. Setters
//! update the settings and either request an eased transition of the visual
//! state or, for shape parameters, re-derive the geometry synchronously.

mod geometry;
mod settings;

pub use geometry::MoleculeGeometry;
pub use settings::MoleculeSettings;

use glam::Vec2;
use serde_json::{Map, Value};

use crate::animation::{Easing, TweenSlot};
use crate::render::{Bounds, MoleculeVisual, RenderPort};
use crate::settings::{to_settings_map, VisualisationSettings};
use crate::units::{Color, Percent};
use crate::visualisation::MoleculeState;

/// Animated container-level state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualState {
    pub position: Vec2,
    pub rotation: f32,
    pub scale: f32,
    pub opacity: f32,
    pub tint: Color,
}

/// One transition slot per animated property
#[derive(Debug, Default)]
pub struct MoleculeTransitions {
    pub position: TweenSlot<Vec2>,
    pub tint: TweenSlot<Color>,
    pub opacity: TweenSlot<f32>,
    pub scale: TweenSlot<f32>,
    pub rotation: TweenSlot<f32>,
}

impl MoleculeTransitions {
    /// Whether any transition is live
    pub fn any_active(&self) -> bool {
        self.position.is_active()
            || self.tint.is_active()
            || self.opacity.is_active()
            || self.scale.is_active()
            || self.rotation.is_active()
    }

    /// Total transitions requested across all properties
    pub fn total_requests(&self) -> u64 {
        self.position.requests()
            + self.tint.requests()
            + self.opacity.requests()
            + self.scale.requests()
            + self.rotation.requests()
    }

    fn cancel_all(&mut self) {
        self.position.cancel();
        self.tint.cancel();
        self.opacity.cancel();
        self.scale.cancel();
        self.rotation.cancel();
    }
}

/// A two-endpoint shape with a connecting segment
#[derive(Debug)]
pub struct Molecule {
    id: String,
    settings: MoleculeSettings,
    geometry: MoleculeGeometry,
    visual: VisualState,
    visible: bool,
    transitions: MoleculeTransitions,
    duration_ms: f32,
    easing: Easing,
    debug_bounds: Option<Bounds>,
    dirty: bool,
}

impl Molecule {
    /// Create a molecule from a partial settings object
    pub fn new(id: impl Into<String>, partial: Option<&Value>, context: &VisualisationSettings) -> Self {
        Self::from_settings(id, MoleculeSettings::from_partial(partial), context)
    }

    /// Create a molecule from a complete settings record.
    ///
    /// Position, rotation, scale, opacity and color apply immediately.
    pub fn from_settings(id: impl Into<String>, settings: MoleculeSettings, context: &VisualisationSettings) -> Self {
        let geometry = Self::derive_geometry(&settings);
        let visual = VisualState {
            position: Vec2::new(settings.x, settings.y),
            rotation: settings.rotation,
            scale: settings.scale,
            opacity: settings.opacity,
            tint: settings.color,
        };

        Self {
            id: id.into(),
            settings,
            geometry,
            visual,
            visible: true,
            transitions: MoleculeTransitions::default(),
            duration_ms: context.transition_duration_ms as f32,
            easing: context.easing,
            debug_bounds: None,
            dirty: false,
        }
    }

    fn derive_geometry(settings: &MoleculeSettings) -> MoleculeGeometry {
        MoleculeGeometry::derive(
            settings.radius,
            settings.size,
            settings.line_thickness,
            settings.line_length_scale,
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn settings(&self) -> &MoleculeSettings {
        &self.settings
    }

    pub fn geometry(&self) -> &MoleculeGeometry {
        &self.geometry
    }

    pub fn visual_state(&self) -> &VisualState {
        &self.visual
    }

    pub fn transitions(&self) -> &MoleculeTransitions {
        &self.transitions
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide without detaching
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.dirty = true;
        }
    }

    /// Snapshot of what a renderer should draw
    pub fn visual(&self) -> MoleculeVisual {
        MoleculeVisual {
            id: self.id.clone(),
            position: self.visual.position,
            rotation: self.visual.rotation,
            scale: self.visual.scale,
            opacity: self.visual.opacity,
            tint: self.visual.tint,
            visible: self.visible,
            geometry: self.geometry,
        }
    }

    // ========== Position and color (eased) ==========

    pub fn set_x(&mut self, x: f32) {
        self.set_position(Vec2::new(x, self.settings.y));
    }

    pub fn set_y(&mut self, y: f32) {
        self.set_position(Vec2::new(self.settings.x, y));
    }

    /// Ease the local offset toward a new position
    pub fn set_position(&mut self, position: Vec2) {
        if position == Vec2::new(self.settings.x, self.settings.y) {
            return;
        }
        self.settings.x = position.x;
        self.settings.y = position.y;
        self.transitions
            .position
            .start(self.visual.position, position, self.duration_ms, self.easing);
    }

    /// Ease the tint of both endpoints and the segment toward a new color
    pub fn set_color(&mut self, color: Color) {
        if color == self.settings.color {
            return;
        }
        self.settings.color = color;
        self.transitions
            .tint
            .start(self.visual.tint, color, self.duration_ms, self.easing);
    }

    // ========== Shape parameters (synchronous geometry re-derivation) ==========

    pub fn set_radius(&mut self, radius: f32) {
        if radius == self.settings.radius {
            return;
        }
        self.settings.radius = radius;
        self.rebuild_geometry();
    }

    pub fn set_size(&mut self, size: f32) {
        if size == self.settings.size {
            return;
        }
        self.settings.size = size;
        self.rebuild_geometry();
    }

    pub fn set_line_thickness(&mut self, thickness: f32) {
        if thickness == self.settings.line_thickness {
            return;
        }
        self.settings.line_thickness = thickness;
        self.rebuild_geometry();
    }

    pub fn set_line_length_scale(&mut self, scale: Percent) {
        if scale == self.settings.line_length_scale {
            return;
        }
        self.settings.line_length_scale = scale;
        self.rebuild_geometry();
    }

    fn rebuild_geometry(&mut self) {
        self.geometry = Self::derive_geometry(&self.settings);
        self.dirty = true;
    }

    // ========== Container transform and alpha (eased) ==========

    pub fn set_opacity(&mut self, opacity: f32) {
        self.set_opacity_over(opacity, self.duration_ms);
    }

    pub fn set_opacity_over(&mut self, opacity: f32, duration_ms: f32) {
        if opacity == self.settings.opacity {
            return;
        }
        self.settings.opacity = opacity;
        self.transitions
            .opacity
            .start(self.visual.opacity, opacity, duration_ms, self.easing);
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.set_scale_over(scale, self.duration_ms);
    }

    pub fn set_scale_over(&mut self, scale: f32, duration_ms: f32) {
        if scale == self.settings.scale {
            return;
        }
        self.settings.scale = scale;
        self.transitions
            .scale
            .start(self.visual.scale, scale, duration_ms, self.easing);
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.set_rotation_over(rotation, self.duration_ms);
    }

    pub fn set_rotation_over(&mut self, rotation: f32, duration_ms: f32) {
        if rotation == self.settings.rotation {
            return;
        }
        self.settings.rotation = rotation;
        self.transitions
            .rotation
            .start(self.visual.rotation, rotation, duration_ms, self.easing);
    }

    /// Stop every running transition, leaving the visual state where it is
    pub fn cancel_transitions(&mut self) {
        self.transitions.cancel_all();
    }

    // ========== Frame update ==========

    /// Advance transitions and ambient rotation. Returns true if anything changed.
    pub fn render(&mut self, elapsed_ms: f32, context: &VisualisationSettings) -> bool {
        let mut changed = false;

        if let Some(position) = self.transitions.position.tick(elapsed_ms) {
            self.visual.position = position;
            changed = true;
        }
        if let Some(tint) = self.transitions.tint.tick(elapsed_ms) {
            self.visual.tint = tint;
            changed = true;
        }
        if let Some(opacity) = self.transitions.opacity.tick(elapsed_ms) {
            self.visual.opacity = opacity;
            changed = true;
        }
        if let Some(scale) = self.transitions.scale.tick(elapsed_ms) {
            self.visual.scale = scale;
            changed = true;
        }

        if let Some(rotation) = self.transitions.rotation.tick(elapsed_ms) {
            self.visual.rotation = rotation;
            changed = true;
        } else if context.animate && elapsed_ms > 0.0 {
            // Ambient spin; the explicit rotation transition owns the value while live.
            let delta = context.rotation_speed * self.visual.scale * elapsed_ms / 1000.0;
            if delta != 0.0 {
                self.visual.rotation -= delta;
                self.settings.rotation = self.visual.rotation;
                changed = true;
            }
        }

        if changed {
            self.dirty = true;
        }
        changed
    }

    // ========== Render port plumbing ==========

    /// Attach to the renderer under `emitter_id`
    pub fn attach(&mut self, emitter_id: &str, port: &mut dyn RenderPort, context: &VisualisationSettings) {
        port.add_molecule(emitter_id, &self.visual());
        self.dirty = false;
        if context.debug {
            self.show_debug(emitter_id, port, true);
        }
    }

    /// Detach from the renderer
    pub fn detach(&mut self, emitter_id: &str, port: &mut dyn RenderPort) {
        self.transitions.cancel_all();
        if self.debug_bounds.is_some() {
            port.set_debug_overlay(emitter_id, &self.id, None);
        }
        port.remove_molecule(emitter_id, &self.id);
    }

    /// Push pending visual changes to the renderer
    pub fn sync(&mut self, emitter_id: &str, port: &mut dyn RenderPort) {
        if self.dirty {
            port.update_molecule(emitter_id, &self.visual());
            self.dirty = false;
        }
    }

    /// Show or hide the debug bounds overlay.
    ///
    /// Bounds are measured once through the renderer, falling back to the
    /// local geometry bounds when the renderer cannot measure.
    pub fn show_debug(&mut self, emitter_id: &str, port: &mut dyn RenderPort, shown: bool) {
        if shown {
            let bounds = match self.debug_bounds {
                Some(bounds) => bounds,
                None => port
                    .measure_bounds(emitter_id, &self.id)
                    .unwrap_or_else(|| self.geometry.local_bounds()),
            };
            self.debug_bounds = Some(bounds);
            port.set_debug_overlay(emitter_id, &self.id, Some(bounds));
        } else if self.debug_bounds.is_some() {
            port.set_debug_overlay(emitter_id, &self.id, None);
        }
    }

    pub fn debug_bounds(&self) -> Option<Bounds> {
        self.debug_bounds
    }

    // ========== State import/export ==========

    /// Deep copy of the current settings keyed by id
    pub fn export_state(&self) -> MoleculeState {
        MoleculeState {
            id: Some(self.id.clone()),
            settings: to_settings_map(&self.settings),
        }
    }

    /// Apply every recognized, correctly typed field through its setter.
    ///
    /// Unknown or mistyped fields are ignored.
    pub fn set_state(&mut self, settings: &Map<String, Value>) {
        let x = number_field(settings, "x");
        let y = number_field(settings, "y");
        if x.is_some() || y.is_some() {
            self.set_position(Vec2::new(
                x.unwrap_or(self.settings.x),
                y.unwrap_or(self.settings.y),
            ));
        }

        if let Some(color) = settings.get("color").and_then(color_value) {
            self.set_color(color);
        }
        if let Some(radius) = number_field(settings, "radius") {
            self.set_radius(radius);
        }
        if let Some(size) = number_field(settings, "size") {
            self.set_size(size);
        }
        if let Some(thickness) = number_field(settings, "lineThickness") {
            self.set_line_thickness(thickness);
        }
        if let Some(scale) = number_field(settings, "lineLengthScale") {
            self.set_line_length_scale(Percent::new(scale));
        }
        if let Some(opacity) = number_field(settings, "opacity") {
            self.set_opacity(opacity);
        }
        if let Some(scale) = number_field(settings, "scale") {
            self.set_scale(scale);
        }
        if let Some(rotation) = number_field(settings, "rotation") {
            self.set_rotation(rotation);
        }
    }
}

fn number_field(settings: &Map<String, Value>, key: &str) -> Option<f32> {
    settings.get(key).and_then(Value::as_f64).map(|v| v as f32)
}

/// Decode a 24-bit color from an integral JSON number
fn color_value(value: &Value) -> Option<Color> {
    if let Some(rgb) = value.as_u64() {
        return u32::try_from(rgb).ok().map(Color::new);
    }
    let float = value.as_f64()?;
    (float.fract() == 0.0 && float >= 0.0 && float <= u32::MAX as f64).then(|| Color::new(float as u32))
}
