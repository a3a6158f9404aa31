//! Molecule Viz - headless runner
//!
//! Loads a snapshot, fits it to a viewport, advances a number of frames
//! against a recording renderer and writes the exported snapshot back out.
//!
//! Usage: molecule-viz <snapshot.json> [--width W] [--height H] [--frames N] [--frame-ms MS] [--out PATH]

use std::path::PathBuf;

use anyhow::{bail, Context};
use molecule_viz::render::RenderCall;
use molecule_viz::settings::{RunnerPreferences, VisualisationSettings};
use molecule_viz::telemetry::{init_logging, LogConfig};
use molecule_viz::{RecordingRenderer, Snapshot, Visualisation};

const USAGE: &str =
    "Usage: molecule-viz <snapshot.json> [--width W] [--height H] [--frames N] [--frame-ms MS] [--out PATH]";

/// Resolved runner options
#[derive(Debug)]
struct RunOptions {
    snapshot: PathBuf,
    width: u32,
    height: u32,
    frames: u32,
    frame_ms: f32,
    out: Option<PathBuf>,
}

fn parse_args(prefs: &RunnerPreferences) -> anyhow::Result<RunOptions> {
    let args: Vec<String> = std::env::args().collect();

    let mut snapshot = prefs.last_snapshot.as_ref().map(PathBuf::from);
    let mut width = prefs.viewport_width;
    let mut height = prefs.viewport_height;
    let mut frames = prefs.frames;
    let mut frame_ms = prefs.frame_ms;
    let mut out = None;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || -> anyhow::Result<String> {
            i += 1;
            args.get(i).cloned().with_context(|| format!("Missing value for {}", flag))
        };
        match flag {
            "--width" => width = value()?.parse().context("Invalid --width")?,
            "--height" => height = value()?.parse().context("Invalid --height")?,
            "--frames" => frames = value()?.parse().context("Invalid --frames")?,
            "--frame-ms" => frame_ms = value()?.parse().context("Invalid --frame-ms")?,
            "--out" => out = Some(PathBuf::from(value()?)),
            "--help" | "-h" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("Unknown argument: {}\n{}", other, USAGE),
            path => snapshot = Some(PathBuf::from(path)),
        }
        i += 1;
    }

    let Some(snapshot) = snapshot else {
        bail!("No snapshot given\n{}", USAGE);
    };
    if width == 0 || height == 0 {
        bail!("Viewport must be at least 1x1");
    }
    if !(frame_ms > 0.0) {
        bail!("--frame-ms must be positive");
    }

    Ok(RunOptions {
        snapshot,
        width,
        height,
        frames,
        frame_ms,
        out,
    })
}

fn main() -> anyhow::Result<()> {
    let _log_guard = init_logging(&LogConfig::from_env()).map_err(|e| anyhow::anyhow!(e))?;

    let mut prefs = RunnerPreferences::load();
    let options = parse_args(&prefs)?;
    tracing::debug!(?options, "Runner options");

    let snapshot = Snapshot::load(&options.snapshot)
        .with_context(|| format!("Failed to load snapshot {}", options.snapshot.display()))?;
    prefs.set_last_snapshot(&options.snapshot);

    let mut vis = Visualisation::with_renderer(
        VisualisationSettings::default(),
        options.width as f32,
        options.height as f32,
        RecordingRenderer::new(),
    );
    vis.import_default_state(&snapshot);

    for _ in 0..options.frames {
        vis.render(options.frame_ms);
    }

    let renderer = vis.renderer();
    let updates = renderer.count(|c| matches!(c, RenderCall::UpdateMolecule { .. }));
    let visible: usize = vis.emitters().iter().map(|e| e.visible_count()).sum();
    tracing::info!(
        emitters = vis.emitters().len(),
        molecules = vis.molecule_count(),
        visible,
        attached = renderer.total_molecules(),
        updates,
        frames = options.frames,
        scale = vis.default_scale(),
        "Run complete"
    );

    let exported = vis.export_state();
    match &options.out {
        Some(path) => {
            exported
                .save(path)
                .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
            tracing::info!(path = %path.display(), "Wrote snapshot");
        }
        None => println!("{}", exported.to_json_pretty()?),
    }

    Ok(())
}
