//! Scene-level import, reconciliation and export through the public API

use std::path::PathBuf;

use glam::Vec2;
use molecule_viz::render::RenderCall;
use molecule_viz::{Color, Percent, RecordingRenderer, Snapshot, Visualisation, VisualisationSettings, ZoomTarget};
use serde_json::json;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn scene(width: f32, height: f32) -> Visualisation<RecordingRenderer> {
    let settings = VisualisationSettings {
        animate: false,
        ..VisualisationSettings::seeded(1234)
    };
    Visualisation::with_renderer(settings, width, height, RecordingRenderer::new())
}

#[test]
fn test_legacy_snapshot_imports() {
    let snapshot = Snapshot::load(&fixture("thyroid_excerpt.json")).unwrap();
    let mut vis = scene(529.0, 1137.0);
    vis.import_default_state(&snapshot);

    assert_eq!(vis.default_scale(), 1.0);
    assert_eq!(vis.emitters().len(), 1);
    let emitter = &vis.emitters()[0];
    assert!(!emitter.id().is_empty());
    assert_eq!(emitter.molecules().len(), 3);
    assert_eq!(emitter.settings().molecule_amount, 3);
    assert_eq!(emitter.settings().color, Color(16515072));

    let first = &emitter.molecules()[0];
    assert_eq!(first.settings().size, 10.0);
    assert!((first.settings().x - 3.578_924_6).abs() < 1e-5);
    assert!((first.visual_state().scale - 0.816_919_6).abs() < 1e-5);
    assert_eq!(vis.renderer().total_molecules(), 3);
}

#[test]
fn test_legacy_unknown_keys_survive_export() {
    let snapshot = Snapshot::load(&fixture("thyroid_excerpt.json")).unwrap();
    let mut vis = scene(529.0, 1137.0);
    vis.import_state(&snapshot);

    let exported = vis.export_state();
    let emitter = &exported.emitters[0];
    assert_eq!(emitter.settings["moleculeMovementRadius"], json!(100));
    assert!(emitter.id.is_some());
    assert!(emitter.molecules.iter().all(|m| m.id.is_some()));
    assert_eq!(exported.original_dimension.width, 529.0);
}

#[test]
fn test_import_export_roundtrip_preserves_tree() {
    let snapshot = Snapshot::load(&fixture("thyroid_excerpt.json")).unwrap();
    let mut first = scene(529.0, 1137.0);
    first.import_state(&snapshot);
    let exported = first.export_state();

    let mut second = scene(529.0, 1137.0);
    second.import_state(&Snapshot::from_json(&exported.to_json_pretty().unwrap()).unwrap());
    assert_eq!(second.export_state(), exported);
}

#[test]
fn test_reconcile_keeps_identity_and_drops_missing() {
    let mut vis = scene(800.0, 600.0);
    let a = vis.add_emitter(Some(&json!({"x": 100, "moleculeAmount": 5})));
    let b = vis.add_emitter(Some(&json!({"x": 300, "moleculeAmount": 4})));

    let mut incoming = vis.export_state();
    incoming.emitters.retain(|e| e.id.as_deref() == Some(a.as_str()));
    let kept_id = incoming.emitters[0].molecules[0].id.clone().unwrap();
    incoming.emitters[0].molecules[0]
        .settings
        .insert("size".to_string(), json!(33));
    incoming.emitters[0].molecules.truncate(2);
    incoming.emitters.push(serde_json::from_value(json!({
        "id": "C", "settings": {"moleculeAmount": 2}, "molecules": []
    }))
    .unwrap());

    vis.renderer_mut().clear_calls();
    vis.set_state(&incoming);

    let ids: Vec<&str> = vis.emitters().iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec![a.as_str(), "C"]);
    assert!(vis.renderer().emitter(&b).is_none());

    let emitter_a = vis.emitter(&a).unwrap();
    assert_eq!(emitter_a.molecules().len(), 2);
    let kept = emitter_a.molecule(&kept_id).unwrap();
    assert_eq!(kept.settings().size, 33.0);
    assert_eq!(kept.geometry().size, 33.0);
    assert_eq!(vis.renderer().molecule_count(&a), 2);

    // The new emitter had no molecule entries, so it generated its target population
    assert_eq!(vis.emitter("C").unwrap().molecules().len(), 2);

    // Only the dropped molecules and emitter were removed; the kept ones were not re-added
    let re_added = vis
        .renderer()
        .count(|c| matches!(c, RenderCall::AddMolecule { emitter, .. } if emitter == &a));
    assert_eq!(re_added, 0);
}

#[test]
fn test_frames_advance_transitions_and_sync_renderer() {
    let mut vis = scene(800.0, 600.0);
    let id = vis.add_emitter(Some(&json!({"moleculeAmount": 6, "spawnRadius": 50})));
    vis.randomize_positions();

    for _ in 0..70 {
        vis.render(1000.0 / 60.0);
    }

    let emitter = vis.emitter(&id).unwrap();
    for molecule in emitter.molecules() {
        let target = Vec2::new(molecule.settings().x, molecule.settings().y);
        assert!(molecule.visual_state().position.abs_diff_eq(target, 1e-3));
        let drawn = &vis.renderer().emitter(&id).unwrap().molecules[molecule.id()];
        assert!(drawn.position.abs_diff_eq(target, 1e-3));
    }
}

#[test]
fn test_quality_throttle_survives_reconcile() {
    let mut vis = scene(800.0, 600.0);
    vis.set_quality_level(Percent(50.0));
    let id = vis.add_emitter(Some(&json!({"moleculeAmount": 8})));
    assert_eq!(vis.emitter(&id).unwrap().visible_count(), 4);
    assert_eq!(vis.renderer().visible_molecules(&id), 4);

    let snapshot = vis.export_state();
    vis.set_state(&snapshot);
    let emitter = vis.emitter(&id).unwrap();
    assert_eq!(emitter.molecules().len(), 8);
    assert_eq!(emitter.visible_count(), 4);
    assert_eq!(vis.renderer().visible_molecules(&id), 4);
}

#[test]
fn test_zoom_then_reset_returns_to_default() {
    let snapshot = Snapshot::load(&fixture("thyroid_excerpt.json")).unwrap();
    let mut vis = scene(1058.0, 1137.0);
    vis.import_default_state(&snapshot);
    let default_camera = *vis.camera();

    let emitter_id = vis.emitters()[0].id().to_string();
    vis.zoom_on_emitter_with_id(&emitter_id, 4.0, 0.0, 0.0).unwrap();
    vis.zoom_on_coordinates(ZoomTarget::new(10.0, 10.0, 2.0).with_duration(100.0));
    vis.render(200.0);
    assert_eq!(vis.camera().scale, 2.0);

    vis.reset_zoom(100.0, || {});
    vis.render(200.0);
    assert!(vis.camera().approx_eq(&default_camera));
}
