//! Visualisation root
//!
//! Owns the emitters, the viewport and the camera. Imports, reconciles and
//! exports snapshots, and runs at most one camera transition at a time.

mod camera;
mod snapshot;

pub use camera::{CameraTransform, ZoomTarget};
pub use snapshot::{Dimension, EmitterState, MoleculeState, Snapshot};

use std::collections::HashSet;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use crate::animation::{TweenHandle, TweenSlot};
use crate::emitter::Emitter;
use crate::error::{Result, VisualisationError};
use crate::render::{NullRenderer, RenderPort};
use crate::settings::{Mode, VisualisationSettings};
use crate::units::Percent;

/// The scene: emitters, viewport and camera
pub struct Visualisation<R: RenderPort = NullRenderer> {
    settings: VisualisationSettings,
    emitters: Vec<Emitter>,
    renderer: R,
    viewport: Dimension,
    camera: CameraTransform,
    default_camera: CameraTransform,
    default_scale: f32,
    camera_transition: TweenSlot<CameraTransform>,
    rng: StdRng,
}

impl Visualisation<NullRenderer> {
    /// Create a scene that draws nothing
    pub fn new(settings: VisualisationSettings, width: f32, height: f32) -> Self {
        Self::with_renderer(settings, width, height, NullRenderer)
    }
}

impl<R: RenderPort> Visualisation<R> {
    /// Create a scene drawing through `renderer`
    pub fn with_renderer(settings: VisualisationSettings, width: f32, height: f32, renderer: R) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            settings,
            emitters: Vec::new(),
            renderer,
            viewport: Dimension::new(width, height),
            camera: CameraTransform::default(),
            default_camera: CameraTransform::default(),
            default_scale: 1.0,
            camera_transition: TweenSlot::new(),
            rng,
        }
    }

    // ========== Accessors ==========

    pub fn settings(&self) -> &VisualisationSettings {
        &self.settings
    }

    pub fn mode(&self) -> Mode {
        self.settings.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.settings.mode = mode;
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn viewport(&self) -> Dimension {
        self.viewport
    }

    pub fn camera(&self) -> &CameraTransform {
        &self.camera
    }

    /// Scale recorded by the last `import_default_state`
    pub fn default_scale(&self) -> f32 {
        self.default_scale
    }

    /// Whether a camera transition is running
    pub fn is_camera_animating(&self) -> bool {
        self.camera_transition.is_active()
    }

    /// Camera transitions requested so far
    pub fn camera_requests(&self) -> u64 {
        self.camera_transition.requests()
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    /// Get an emitter by id
    pub fn emitter(&self, id: &str) -> Option<&Emitter> {
        self.emitters.iter().find(|e| e.id() == id)
    }

    /// Get a mutable emitter by id
    pub fn emitter_mut(&mut self, id: &str) -> Option<&mut Emitter> {
        self.emitters.iter_mut().find(|e| e.id() == id)
    }

    /// Run an operation on one emitter with the scene settings and renderer
    pub fn with_emitter<T>(
        &mut self,
        id: &str,
        op: impl FnOnce(&mut Emitter, &VisualisationSettings, &mut dyn RenderPort) -> T,
    ) -> Result<T> {
        let Some(emitter) = self.emitters.iter_mut().find(|e| e.id() == id) else {
            tracing::warn!(emitter = %id, "Emitter not found");
            return Err(VisualisationError::EmitterNotFound(id.to_string()));
        };
        Ok(op(emitter, &self.settings, &mut self.renderer))
    }

    fn next_id(&mut self) -> String {
        uuid::Builder::from_random_bytes(self.rng.random())
            .into_uuid()
            .to_string()
    }

    // ========== Emitters ==========

    /// Create an emitter with a generated population. Returns its id.
    pub fn add_emitter(&mut self, partial: Option<&Value>) -> String {
        let id = self.next_id();
        let mut emitter = Emitter::new(id.clone(), partial, &self.settings);
        emitter.attach(&mut self.renderer, &self.settings);
        emitter.init_molecules(&[], &self.settings, &mut self.renderer);
        tracing::debug!(emitter = %id, "Added emitter");
        self.emitters.push(emitter);
        id
    }

    /// Detach and drop an emitter
    pub fn remove_emitter(&mut self, id: &str) -> Result<()> {
        let Some(index) = self.emitters.iter().position(|e| e.id() == id) else {
            tracing::warn!(emitter = %id, "Cannot remove unknown emitter");
            return Err(VisualisationError::EmitterNotFound(id.to_string()));
        };
        let mut emitter = self.emitters.remove(index);
        emitter.detach(&mut self.renderer);
        tracing::debug!(emitter = %id, "Removed emitter");
        Ok(())
    }

    fn clear_emitters(&mut self) {
        for mut emitter in self.emitters.drain(..) {
            emitter.detach(&mut self.renderer);
        }
    }

    fn import_emitter(&mut self, state: &EmitterState) {
        let id = match &state.id {
            Some(id) => id.clone(),
            None => self.next_id(),
        };
        let partial = Value::Object(state.settings.clone());
        let mut emitter = Emitter::new(id, Some(&partial), &self.settings);
        emitter.attach(&mut self.renderer, &self.settings);
        emitter.init_molecules(&state.molecules, &self.settings, &mut self.renderer);
        self.emitters.push(emitter);
    }

    // ========== Snapshots ==========

    /// Replace every emitter with the snapshot's emitters
    pub fn import_state(&mut self, snapshot: &Snapshot) {
        self.clear_emitters();
        for state in &snapshot.emitters {
            self.import_emitter(state);
        }
        tracing::info!(
            emitters = self.emitters.len(),
            molecules = self.molecule_count(),
            "Imported snapshot"
        );
    }

    /// Reconcile the live scene against a snapshot by emitter id.
    ///
    /// Emitters missing from the snapshot are removed, matching ids are
    /// updated in place and unknown ids are imported.
    pub fn set_state(&mut self, snapshot: &Snapshot) {
        let incoming: HashSet<&str> = snapshot.emitters.iter().filter_map(|e| e.id.as_deref()).collect();

        let mut removed = 0;
        let mut kept = Vec::with_capacity(self.emitters.len());
        for mut emitter in self.emitters.drain(..) {
            if incoming.contains(emitter.id()) {
                kept.push(emitter);
            } else {
                emitter.detach(&mut self.renderer);
                removed += 1;
            }
        }
        self.emitters = kept;

        let mut created = 0;
        for state in &snapshot.emitters {
            let existing = state
                .id
                .as_deref()
                .and_then(|id| self.emitters.iter().position(|e| e.id() == id));
            match existing {
                Some(index) => self.emitters[index].set_state(state, &self.settings, &mut self.renderer),
                None => {
                    self.import_emitter(state);
                    created += 1;
                }
            }
        }

        tracing::debug!(
            updated = snapshot.emitters.len() - created,
            created,
            removed,
            "Reconciled emitters"
        );
    }

    /// Snapshot of the scene, stamped with the current viewport size
    pub fn export_state(&self) -> Snapshot {
        Snapshot {
            original_dimension: self.viewport,
            emitters: self.emitters.iter().map(Emitter::export_state).collect(),
        }
    }

    /// Import a snapshot and fit it to the current viewport.
    ///
    /// The scale is uniform (the smaller of the two axis ratios) and the
    /// snapshot's original centre is drawn at the viewport centre. The scale
    /// becomes the target of `reset_zoom`.
    pub fn import_default_state(&mut self, snapshot: &Snapshot) {
        let original = snapshot.original_dimension;
        let scale = if original.is_valid() {
            (self.viewport.height / original.height).min(self.viewport.width / original.width)
        } else {
            tracing::warn!("Snapshot has no usable original dimension, keeping scale 1");
            1.0
        };

        self.import_state(snapshot);

        let pivot = if original.is_valid() {
            Vec2::new(original.width, original.height) / 2.0
        } else {
            self.viewport_center()
        };
        self.camera_transition.cancel();
        self.default_scale = scale;
        self.default_camera = CameraTransform::new(self.viewport_center(), pivot, scale);
        self.camera = self.default_camera;
        self.renderer.set_camera(&self.camera);
        tracing::info!(scale, "Applied default scale");
    }

    /// Total molecules across emitters
    pub fn molecule_count(&self) -> usize {
        self.emitters.iter().map(|e| e.molecules().len()).sum()
    }

    // ========== Camera ==========

    fn viewport_center(&self) -> Vec2 {
        Vec2::new(self.viewport.width, self.viewport.height) / 2.0
    }

    /// World coordinates currently shown at the viewport centre
    pub fn center_coordinates(&self) -> Vec2 {
        let center = self.viewport_center();
        self.camera.screen_to_world(center).unwrap_or(center)
    }

    /// Project a world point to the screen
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.camera.world_to_screen(world)
    }

    /// Ease the camera so `target.pivot()` is drawn at the viewport centre.
    ///
    /// Any running camera transition is cancelled first.
    pub fn zoom_on_coordinates(&mut self, target: ZoomTarget) -> TweenHandle {
        let to = CameraTransform::new(self.viewport_center(), target.pivot(), target.scale);
        tracing::debug!(x = target.x, y = target.y, scale = target.scale, "Zooming");
        self.camera_transition
            .start(self.camera, to, target.duration_ms, self.settings.easing)
    }

    /// Ease the camera back to the default transform.
    ///
    /// `on_done` runs immediately when the camera is already there, otherwise
    /// when the transition completes. It does not run if the transition is
    /// superseded.
    pub fn reset_zoom(&mut self, duration_ms: f32, on_done: impl FnOnce() + 'static) -> Option<TweenHandle> {
        if self.camera.approx_eq(&self.default_camera) {
            self.camera_transition.cancel();
            self.camera = self.default_camera;
            on_done();
            return None;
        }
        Some(self.camera_transition.start_with_completion(
            self.camera,
            self.default_camera,
            duration_ms,
            self.settings.easing,
            on_done,
        ))
    }

    /// Pan to an emitter at the current zoom
    pub fn center_on_emitter_with_id(&mut self, id: &str, offset_x: f32, offset_y: f32) -> Result<TweenHandle> {
        let scale = self.camera.scale;
        self.zoom_on_emitter_with_id(id, scale, offset_x, offset_y)
    }

    /// Pan and zoom to an emitter
    pub fn zoom_on_emitter_with_id(&mut self, id: &str, scale: f32, offset_x: f32, offset_y: f32) -> Result<TweenHandle> {
        let Some(position) = self.emitter(id).map(Emitter::position) else {
            tracing::warn!(emitter = %id, "Cannot zoom on unknown emitter");
            return Err(VisualisationError::EmitterNotFound(id.to_string()));
        };
        let target = ZoomTarget::new(position.x, position.y, scale)
            .with_offset(offset_x, offset_y)
            .with_duration(self.settings.transition_duration_ms as f32);
        Ok(self.zoom_on_coordinates(target))
    }

    /// Change the viewport size, keeping the view centred
    pub fn resize(&mut self, width: f32, height: f32) {
        let old_center = self.viewport_center();
        self.viewport = Dimension::new(width, height);
        let shift = self.viewport_center() - old_center;
        self.camera.position += shift;
        self.default_camera.position += shift;
        self.renderer.set_camera(&self.camera);
        tracing::debug!(width, height, "Resized viewport");
    }

    // ========== Scene-wide operations ==========

    /// Set the quality level and reapply every visibility limit
    pub fn set_quality_level(&mut self, quality: Percent) {
        let quality = Percent::new(quality.value());
        self.settings.quality_level = quality;
        for emitter in &mut self.emitters {
            emitter.apply_visibility(quality, &mut self.renderer);
        }
    }

    /// Flip debug overlays. Returns the new state.
    pub fn toggle_debug(&mut self) -> bool {
        self.settings.debug = !self.settings.debug;
        for emitter in &mut self.emitters {
            emitter.show_debug(self.settings.debug, &mut self.renderer);
        }
        self.settings.debug
    }

    /// Flip every emitter's spawn-radius gizmo. Returns the new state.
    pub fn toggle_gizmos(&mut self) -> bool {
        self.settings.show_gizmos = !self.settings.show_gizmos;
        for emitter in &mut self.emitters {
            emitter.show_gizmo(self.settings.show_gizmos, &mut self.renderer);
        }
        self.settings.show_gizmos
    }

    /// Flip ambient rotation. Returns the new state.
    pub fn toggle_animation(&mut self) -> bool {
        self.settings.animate = !self.settings.animate;
        self.settings.animate
    }

    /// Regenerate every emitter's population
    pub fn recreate_molecules(&mut self) {
        for emitter in &mut self.emitters {
            emitter.recreate_molecules(&self.settings, &mut self.renderer);
        }
    }

    /// Move every molecule to a new sampled position
    pub fn randomize_positions(&mut self) {
        for emitter in &mut self.emitters {
            emitter.randomize_positions();
        }
    }

    /// Advance one frame
    pub fn render(&mut self, elapsed_ms: f32) {
        if let Some(camera) = self.camera_transition.tick(elapsed_ms) {
            self.camera = camera;
            self.renderer.set_camera(&camera);
        }
        for emitter in &mut self.emitters {
            emitter.render(elapsed_ms, &self.settings, &mut self.renderer);
        }
        tracing::trace!(elapsed_ms, "Rendered frame");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingRenderer;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    fn scene() -> Visualisation<RecordingRenderer> {
        let settings = VisualisationSettings {
            animate: false,
            ..VisualisationSettings::seeded(5)
        };
        Visualisation::with_renderer(settings, 800.0, 600.0, RecordingRenderer::new())
    }

    fn snapshot(json: Value) -> Snapshot {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_export_import_roundtrip() {
        let mut a = scene();
        a.add_emitter(Some(&json!({"x": 10, "moleculeAmount": 4})));
        a.add_emitter(Some(&json!({"x": 20, "moleculeAmount": 3, "wobble": true})));
        let exported = a.export_state();

        let mut b = scene();
        b.import_state(&exported);
        let again = b.export_state();
        assert_eq!(again.emitters, exported.emitters);
        assert_eq!(b.renderer().total_molecules(), 7);
    }

    #[test]
    fn test_set_state_reconciles_by_id() {
        let mut vis = scene();
        vis.import_state(&snapshot(json!({
            "emitters": [
                {"id": "A", "settings": {"x": 1}, "molecules": [{"id": "a1", "settings": {"x": 0}}]},
                {"id": "B", "settings": {"x": 2}, "molecules": [{"id": "b1", "settings": {}}]}
            ]
        })));

        vis.set_state(&snapshot(json!({
            "emitters": [
                {"id": "A", "settings": {"x": 9}, "molecules": [{"id": "a1", "settings": {"x": 3}}]},
                {"id": "C", "settings": {}, "molecules": [{"id": "c1", "settings": {}}]}
            ]
        })));

        let ids: Vec<&str> = vis.emitters().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert!(vis.renderer().emitter("B").is_none());
        let a1 = vis.emitter("A").and_then(|e| e.molecule("a1")).unwrap();
        assert_eq!(a1.transitions().position.requests(), 1);
        assert_eq!(a1.settings().x, 3.0);
        assert_eq!(vis.emitter("A").unwrap().position().x, 9.0);
    }

    #[test]
    fn test_default_state_scales_uniformly() {
        let mut vis = scene();
        vis.import_default_state(&snapshot(json!({
            "originalDimension": {"width": 400, "height": 200},
            "emitters": []
        })));
        // min(600/200, 800/400)
        assert_eq!(vis.default_scale(), 2.0);
        let center = vis.world_to_screen(Vec2::new(200.0, 100.0));
        assert!(center.abs_diff_eq(Vec2::new(400.0, 300.0), 1e-4));
        assert_eq!(vis.renderer().camera().map(|c| c.scale), Some(2.0));
    }

    #[test]
    fn test_single_flight_zoom() {
        let mut vis = scene();
        let first = vis.zoom_on_coordinates(ZoomTarget::new(100.0, 100.0, 3.0));
        vis.render(300.0);
        let second = vis.zoom_on_coordinates(ZoomTarget::new(-50.0, 20.0, 0.5).with_duration(500.0));
        assert!(first.is_cancelled());
        assert!(second.is_running());

        vis.render(600.0);
        let expected = CameraTransform::new(Vec2::new(400.0, 300.0), Vec2::new(-50.0, 20.0), 0.5);
        assert!(vis.camera().approx_eq(&expected));
        assert!(!vis.is_camera_animating());
        assert_eq!(vis.camera_requests(), 2);
    }

    #[test]
    fn test_reset_zoom_at_default_is_synchronous() {
        let mut vis = scene();
        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        let handle = vis.reset_zoom(1000.0, move || flag.set(true));
        assert!(handle.is_none());
        assert!(done.get());
    }

    #[test]
    fn test_reset_zoom_completes_after_transition() {
        let mut vis = scene();
        vis.zoom_on_coordinates(ZoomTarget::new(10.0, 10.0, 4.0).with_duration(0.0));
        vis.render(16.0);

        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        let handle = vis.reset_zoom(200.0, move || flag.set(true));
        assert!(handle.is_some());
        vis.render(100.0);
        assert!(!done.get());
        vis.render(100.0);
        assert!(done.get());
        assert!(vis.camera().approx_eq(&CameraTransform::default()));
    }

    #[test]
    fn test_superseded_reset_never_calls_back() {
        let mut vis = scene();
        vis.zoom_on_coordinates(ZoomTarget::new(10.0, 10.0, 4.0).with_duration(0.0));
        vis.render(16.0);

        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        vis.reset_zoom(200.0, move || flag.set(true));
        vis.zoom_on_coordinates(ZoomTarget::new(0.0, 0.0, 2.0));
        vis.render(5000.0);
        assert!(!done.get());
    }

    #[test]
    fn test_zoom_on_unknown_emitter() {
        let mut vis = scene();
        let result = vis.zoom_on_emitter_with_id("ghost", 2.0, 0.0, 0.0);
        assert!(matches!(result, Err(VisualisationError::EmitterNotFound(_))));
        assert_eq!(vis.camera_requests(), 0);
    }

    #[test]
    fn test_center_on_emitter() {
        let mut vis = scene();
        let id = vis.add_emitter(Some(&json!({"x": 120, "y": 80, "moleculeAmount": 1})));
        vis.center_on_emitter_with_id(&id, 20.0, 0.0).unwrap();
        vis.render(2000.0);
        assert!(vis.camera().pivot.abs_diff_eq(Vec2::new(100.0, 80.0), 1e-4));
        assert_eq!(vis.camera().scale, 1.0);
    }

    #[test]
    fn test_remove_emitter() {
        let mut vis = scene();
        let id = vis.add_emitter(None);
        assert_eq!(vis.renderer().molecule_count(&id), 10);
        vis.remove_emitter(&id).unwrap();
        assert!(vis.emitters().is_empty());
        assert_eq!(vis.renderer().total_molecules(), 0);
        assert!(vis.remove_emitter(&id).is_err());
    }

    #[test]
    fn test_quality_level_reapplies_visibility() {
        let mut vis = scene();
        let id = vis.add_emitter(Some(&json!({"moleculeAmount": 10})));
        vis.set_quality_level(Percent(30.0));
        assert_eq!(vis.emitter(&id).unwrap().visible_count(), 3);
        assert_eq!(vis.emitter(&id).unwrap().molecules().len(), 10);
        vis.set_quality_level(Percent(150.0));
        assert_eq!(vis.settings().quality_level, Percent::FULL);
        assert_eq!(vis.emitter(&id).unwrap().visible_count(), 10);
    }

    #[test]
    fn test_quality_level_reaches_renderer_without_a_frame() {
        let mut vis = scene();
        vis.set_quality_level(Percent(50.0));
        let id = vis.add_emitter(Some(&json!({"moleculeAmount": 8})));
        assert_eq!(vis.renderer().visible_molecules(&id), 4);

        vis.set_quality_level(Percent(25.0));
        assert_eq!(vis.emitter(&id).unwrap().visible_count(), 2);
        assert_eq!(vis.renderer().visible_molecules(&id), 2);

        vis.set_quality_level(Percent::FULL);
        assert_eq!(vis.renderer().visible_molecules(&id), 8);
    }

    #[test]
    fn test_excess_jitter_import_keeps_unit_range() {
        let mut vis = scene();
        vis.import_state(&snapshot(json!({
            "emitters": [{"id": "J", "settings": {"sizeJitter": 300, "opacityJitter": 250, "moleculeAmount": 50}}]
        })));
        let emitter = vis.emitter("J").unwrap();
        assert_eq!(emitter.molecules().len(), 50);
        for molecule in emitter.molecules() {
            assert!((0.0..=1.0).contains(&molecule.settings().scale));
            assert!((0.0..=1.0).contains(&molecule.settings().opacity));
        }
    }

    #[test]
    fn test_toggle_gizmos_shows_spawn_radius() {
        let mut vis = scene();
        let id = vis.add_emitter(Some(&json!({"moleculeAmount": 2, "spawnRadius": 40})));
        assert_eq!(vis.renderer().emitter(&id).unwrap().gizmo, None);

        assert!(vis.toggle_gizmos());
        assert_eq!(vis.renderer().emitter(&id).unwrap().gizmo, Some(40.0));

        // Emitters added while gizmos are on show theirs on attach
        let later = vis.add_emitter(Some(&json!({"moleculeAmount": 1, "spawnRadius": 15})));
        assert_eq!(vis.renderer().emitter(&later).unwrap().gizmo, Some(15.0));

        assert!(!vis.toggle_gizmos());
        assert_eq!(vis.renderer().emitter(&id).unwrap().gizmo, None);
        assert!(!vis.emitter(&later).unwrap().is_gizmo_shown());
    }

    #[test]
    fn test_toggle_debug_shows_overlays() {
        let mut vis = scene();
        let id = vis.add_emitter(Some(&json!({"moleculeAmount": 3})));
        assert!(vis.toggle_debug());
        assert_eq!(vis.renderer().emitter(&id).unwrap().overlays.len(), 3);
        assert!(!vis.toggle_debug());
        assert!(vis.renderer().emitter(&id).unwrap().overlays.is_empty());
    }

    #[test]
    fn test_resize_keeps_view_centred() {
        let mut vis = scene();
        vis.import_default_state(&snapshot(json!({"originalDimension": {"width": 800, "height": 600}})));
        vis.resize(1000.0, 600.0);
        let center = vis.world_to_screen(Vec2::new(400.0, 300.0));
        assert!(center.abs_diff_eq(Vec2::new(500.0, 300.0), 1e-4));
        assert!(vis.center_coordinates().abs_diff_eq(Vec2::new(400.0, 300.0), 1e-4));
    }
}
