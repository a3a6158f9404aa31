//! Editor-facing emitter placement and parameter editing
//!
//! The editor keeps a template for new emitters and remembers which placed
//! emitter is selected. The selected emitter is highlighted. Each parameter
//! edit updates the template and is dispatched to the selected emitter as the
//! operation it implies; spawn-radius edits show the radius gizmo until the
//! edit is finished.

use glam::Vec2;
use serde_json::Value;

use crate::emitter::EmitterSettings;
use crate::error::{Result, VisualisationError};
use crate::render::RenderPort;
use crate::settings::{to_settings_map, Mode};
use crate::units::{Color, Percent};
use crate::visualisation::Visualisation;

/// A single emitter parameter change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmitterEdit {
    /// Population size (1-150), regenerates
    MoleculeAmount(u32),
    /// Sampling radius (0-400), regenerates
    SpawnRadius(f32),
    /// Endpoint span (0-500)
    MoleculeSize(f32),
    /// Endpoint radius (0-250)
    PointRadius(f32),
    LineLengthScale(Percent),
    /// Segment thickness (0-100)
    LineThickness(f32),
    OpacityJitter(Percent),
    SizeJitter(Percent),
    Color(Color),
    Position(Vec2),
}

impl EmitterEdit {
    /// Clamp the value to the range the editor exposes
    pub fn clamped(self) -> Self {
        match self {
            Self::MoleculeAmount(n) => Self::MoleculeAmount(n.clamp(1, 150)),
            Self::SpawnRadius(r) => Self::SpawnRadius(r.clamp(0.0, 400.0)),
            Self::MoleculeSize(s) => Self::MoleculeSize(s.clamp(0.0, 500.0)),
            Self::PointRadius(r) => Self::PointRadius(r.clamp(0.0, 250.0)),
            Self::LineLengthScale(p) => Self::LineLengthScale(Percent::new(p.value())),
            Self::LineThickness(t) => Self::LineThickness(t.clamp(0.0, 100.0)),
            Self::OpacityJitter(p) => Self::OpacityJitter(Percent::new(p.value())),
            Self::SizeJitter(p) => Self::SizeJitter(Percent::new(p.value())),
            Self::Color(c) => Self::Color(Color::new(c.0)),
            Self::Position(p) => Self::Position(p),
        }
    }

    fn apply_to_template(self, template: &mut EmitterSettings) {
        match self {
            Self::MoleculeAmount(n) => template.molecule_amount = n,
            Self::SpawnRadius(r) => template.spawn_radius = r,
            Self::MoleculeSize(s) => template.molecule_size = s,
            Self::PointRadius(r) => template.molecule_point_radius = r,
            Self::LineLengthScale(p) => template.molecule_line_length_scale = p,
            Self::LineThickness(t) => template.molecule_line_thickness = t,
            Self::OpacityJitter(p) => template.opacity_jitter = p,
            Self::SizeJitter(p) => template.size_jitter = p,
            Self::Color(c) => template.color = c,
            // Placement position is chosen per emitter
            Self::Position(_) => {}
        }
    }
}

/// Emitter editor state
#[derive(Debug, Clone, Default)]
pub struct Editor {
    template: EmitterSettings,
    selected: Option<String>,
}

impl Editor {
    /// Create an editor and switch the scene into edit mode
    pub fn new<R: RenderPort>(vis: &mut Visualisation<R>) -> Self {
        vis.set_mode(Mode::Edit);
        Self::default()
    }

    /// Create an editor with a custom template for new emitters
    pub fn with_template<R: RenderPort>(vis: &mut Visualisation<R>, template: EmitterSettings) -> Self {
        vis.set_mode(Mode::Edit);
        Self {
            template,
            selected: None,
        }
    }

    pub fn template(&self) -> &EmitterSettings {
        &self.template
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Place a new emitter built from the template and select it.
    ///
    /// Without coordinates the emitter lands at the scene centre.
    pub fn place_emitter<R: RenderPort>(&mut self, vis: &mut Visualisation<R>, at: Option<Vec2>) -> String {
        let position = at.unwrap_or_else(|| vis.center_coordinates());
        let mut settings = self.template.clone();
        settings.x = position.x;
        settings.y = position.y;

        let partial = Value::Object(to_settings_map(&settings));
        let id = vis.add_emitter(Some(&partial));
        tracing::info!(emitter = %id, x = position.x, y = position.y, "Placed emitter");
        self.change_selection(vis, &id);
        id
    }

    /// Select a placed emitter, highlighting it and unhighlighting the previous one
    pub fn select_emitter<R: RenderPort>(&mut self, vis: &mut Visualisation<R>, id: &str) -> Result<()> {
        if vis.emitter(id).is_none() {
            tracing::warn!(emitter = %id, "Cannot select unknown emitter");
            return Err(VisualisationError::EmitterNotFound(id.to_string()));
        }
        self.change_selection(vis, id);
        Ok(())
    }

    fn change_selection<R: RenderPort>(&mut self, vis: &mut Visualisation<R>, id: &str) {
        if self.selected.as_deref() == Some(id) {
            return;
        }
        if let Some(previous) = self.selected.take() {
            // The previous selection may have been removed through the scene directly
            let _ = vis.with_emitter(&previous, |emitter, _, port| emitter.set_highlighted(false, port));
        }
        let _ = vis.with_emitter(id, |emitter, _, port| emitter.set_highlighted(true, port));
        self.selected = Some(id.to_string());
    }

    /// Remove the selected emitter. Returns its id if one was selected.
    pub fn remove_selected_emitter<R: RenderPort>(&mut self, vis: &mut Visualisation<R>) -> Result<Option<String>> {
        let Some(id) = self.selected.take() else {
            return Ok(None);
        };
        vis.remove_emitter(&id)?;
        Ok(Some(id))
    }

    /// Apply a parameter change to the template and the selected emitter
    pub fn edit<R: RenderPort>(&mut self, vis: &mut Visualisation<R>, edit: EmitterEdit) -> Result<()> {
        let edit = edit.clamped();
        edit.apply_to_template(&mut self.template);

        let Some(id) = self.selected.clone() else {
            return Ok(());
        };

        vis.with_emitter(&id, |emitter, context, port| match edit {
            EmitterEdit::MoleculeAmount(n) => emitter.set_molecule_amount(n, context, port),
            EmitterEdit::SpawnRadius(r) => {
                if !emitter.is_gizmo_shown() {
                    emitter.show_gizmo(true, port);
                }
                emitter.set_spawn_radius(r, context, port);
            }
            EmitterEdit::MoleculeSize(s) => emitter.set_molecule_size(s),
            EmitterEdit::PointRadius(r) => emitter.set_molecule_point_radius(r),
            EmitterEdit::LineLengthScale(p) => emitter.set_molecule_line_length_scale(p),
            EmitterEdit::LineThickness(t) => emitter.set_molecule_line_thickness(t),
            EmitterEdit::OpacityJitter(p) => emitter.set_opacity_jitter(p),
            EmitterEdit::SizeJitter(p) => emitter.set_size_jitter(p),
            EmitterEdit::Color(c) => emitter.set_color(c),
            EmitterEdit::Position(p) => emitter.set_position(p, port),
        })
    }

    /// End an interactive edit of the selected emitter.
    ///
    /// The gizmo shown while dragging the spawn radius is hidden again unless
    /// gizmos are switched on for the whole scene.
    pub fn finish_edit<R: RenderPort>(&mut self, vis: &mut Visualisation<R>) -> Result<()> {
        let Some(id) = self.selected.clone() else {
            return Ok(());
        };
        vis.with_emitter(&id, |emitter, context, port| {
            if emitter.is_gizmo_shown() && !context.show_gizmos {
                emitter.show_gizmo(false, port);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingRenderer;
    use crate::settings::VisualisationSettings;

    fn scene() -> Visualisation<RecordingRenderer> {
        let settings = VisualisationSettings {
            animate: false,
            ..VisualisationSettings::seeded(21)
        };
        Visualisation::with_renderer(settings, 640.0, 480.0, RecordingRenderer::new())
    }

    #[test]
    fn test_editor_enters_edit_mode() {
        let mut vis = scene();
        let _editor = Editor::new(&mut vis);
        assert_eq!(vis.mode(), Mode::Edit);
    }

    #[test]
    fn test_place_emitter_defaults_to_centre() {
        let mut vis = scene();
        let mut editor = Editor::new(&mut vis);
        let id = editor.place_emitter(&mut vis, None);
        let emitter = vis.emitter(&id).unwrap();
        assert_eq!(emitter.position(), Vec2::new(320.0, 240.0));
        assert_eq!(emitter.molecules().len(), 10);
        assert_eq!(editor.selected(), Some(id.as_str()));
    }

    #[test]
    fn test_edit_amount_regenerates_selected() {
        let mut vis = scene();
        let mut editor = Editor::new(&mut vis);
        let id = editor.place_emitter(&mut vis, Some(Vec2::new(5.0, 5.0)));
        editor.edit(&mut vis, EmitterEdit::MoleculeAmount(500)).unwrap();
        assert_eq!(editor.template().molecule_amount, 150);
        assert_eq!(vis.emitter(&id).unwrap().molecules().len(), 150);
        assert_eq!(vis.renderer().molecule_count(&id), 150);
    }

    #[test]
    fn test_edit_size_pushes_to_molecules() {
        let mut vis = scene();
        let mut editor = Editor::new(&mut vis);
        let id = editor.place_emitter(&mut vis, None);
        editor.edit(&mut vis, EmitterEdit::MoleculeSize(42.0)).unwrap();
        let emitter = vis.emitter(&id).unwrap();
        assert!(emitter.molecules().iter().all(|m| m.geometry().size == 42.0));
    }

    #[test]
    fn test_template_applies_to_next_placement() {
        let mut vis = scene();
        let mut editor = Editor::new(&mut vis);
        editor.edit(&mut vis, EmitterEdit::MoleculeAmount(4)).unwrap();
        let id = editor.place_emitter(&mut vis, None);
        assert_eq!(vis.emitter(&id).unwrap().molecules().len(), 4);
    }

    #[test]
    fn test_remove_selected_emitter() {
        let mut vis = scene();
        let mut editor = Editor::new(&mut vis);
        let first = editor.place_emitter(&mut vis, None);
        let second = editor.place_emitter(&mut vis, Some(Vec2::new(1.0, 1.0)));
        editor.select_emitter(&mut vis, &first).unwrap();
        assert_eq!(editor.remove_selected_emitter(&mut vis).unwrap(), Some(first));
        assert_eq!(vis.emitters().len(), 1);
        assert_eq!(vis.emitters()[0].id(), second);
        assert_eq!(editor.remove_selected_emitter(&mut vis).unwrap(), None);
        assert!(editor.select_emitter(&mut vis, "missing").is_err());
    }

    #[test]
    fn test_selection_moves_highlight() {
        let mut vis = scene();
        let mut editor = Editor::new(&mut vis);
        let first = editor.place_emitter(&mut vis, None);
        assert!(vis.renderer().emitter(&first).unwrap().highlighted);

        let second = editor.place_emitter(&mut vis, Some(Vec2::new(1.0, 1.0)));
        assert!(!vis.renderer().emitter(&first).unwrap().highlighted);
        assert!(vis.renderer().emitter(&second).unwrap().highlighted);

        editor.select_emitter(&mut vis, &first).unwrap();
        assert!(vis.emitter(&first).unwrap().is_highlighted());
        assert!(!vis.emitter(&second).unwrap().is_highlighted());
    }

    #[test]
    fn test_spawn_radius_edit_shows_gizmo_until_finished() {
        let mut vis = scene();
        let mut editor = Editor::new(&mut vis);
        let id = editor.place_emitter(&mut vis, None);

        editor.edit(&mut vis, EmitterEdit::SpawnRadius(120.0)).unwrap();
        assert_eq!(vis.renderer().emitter(&id).unwrap().gizmo, Some(120.0));
        editor.edit(&mut vis, EmitterEdit::SpawnRadius(900.0)).unwrap();
        assert_eq!(vis.renderer().emitter(&id).unwrap().gizmo, Some(400.0));

        editor.finish_edit(&mut vis).unwrap();
        assert_eq!(vis.renderer().emitter(&id).unwrap().gizmo, None);
    }

    #[test]
    fn test_finish_edit_keeps_scene_gizmos() {
        let mut vis = scene();
        let mut editor = Editor::new(&mut vis);
        let id = editor.place_emitter(&mut vis, None);
        vis.toggle_gizmos();

        editor.edit(&mut vis, EmitterEdit::SpawnRadius(60.0)).unwrap();
        editor.finish_edit(&mut vis).unwrap();
        assert_eq!(vis.renderer().emitter(&id).unwrap().gizmo, Some(60.0));
    }
}
