//! Headless camera tour
//!
//! Boots the orrery against a recording backend, flies the camera from Earth
//! out past the galaxy and back, and logs every regime and focus change.

use clap::Parser;
use glam::DVec3;
use orrery::prelude::*;
use orrery::units::SCENE_UNITS_PER_AU;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "tour")]
#[command(about = "Fly a scripted camera tour through the orrery without a window")]
struct Cli {
    /// JSON configuration file (defaults apply when absent)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 1800)]
    frames: usize,

    /// Generate placeholder textures instead of reading the asset tree
    #[arg(long)]
    synthetic_assets: bool,

    /// Frames per simulated second
    #[arg(long, default_value_t = 60.0)]
    fps: f64,
}

/// One scripted leg of the tour, as fractions of the total frame count
struct Leg {
    start: f64,
    end: f64,
    kind: LegKind,
}

enum LegKind {
    /// Focus a body and let the camera follow it
    Focus(&'static str),
    /// Move the camera geometrically between two distances (AU) above the origin
    Zoom { from_au: f64, to_au: f64 },
}

fn script(thresholds: &orrery::scale::ScaleThresholds) -> Vec<Leg> {
    let far = thresholds.interstellar_to_galactic * 1.5;
    vec![
        Leg {
            start: 0.0,
            end: 0.15,
            kind: LegKind::Focus("Earth"),
        },
        Leg {
            start: 0.15,
            end: 0.2,
            kind: LegKind::Focus("Jupiter"),
        },
        Leg {
            start: 0.2,
            end: 0.55,
            kind: LegKind::Zoom {
                from_au: 3.0,
                to_au: far,
            },
        },
        Leg {
            start: 0.7,
            end: 0.95,
            kind: LegKind::Zoom {
                from_au: thresholds.interstellar_to_galactic * 0.8,
                to_au: 3.0,
            },
        },
        Leg {
            start: 0.95,
            end: 1.0,
            kind: LegKind::Focus("Saturn"),
        },
    ]
}

fn load_config(cli: &Cli) -> Result<OrreryConfig, ConfigurationError> {
    match &cli.config {
        Some(path) => OrreryConfig::load_from_file(path),
        None => Ok(OrreryConfig::default()),
    }
}

fn bootstrap(cli: &Cli) -> Result<Orrery<RecordingBackend>, StartupError> {
    let config = load_config(cli)?;
    if cli.synthetic_assets {
        Orrery::bootstrap(config, RecordingBackend::new(), &SyntheticLoader)
    } else {
        Orrery::bootstrap(config, RecordingBackend::new(), &FileSystemLoader)
    }
}

fn main() -> ExitCode {
    orrery::init_logging();
    let cli = Cli::parse();
    info!(frames = cli.frames, synthetic = cli.synthetic_assets, "Starting tour");

    let mut orrery = match bootstrap(&cli) {
        Ok(orrery) => orrery,
        Err(err) => {
            error!("Startup failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    let legs = script(orrery.thresholds());
    let total = cli.frames.max(1) as f64;
    let fps = if cli.fps > 0.0 { cli.fps } else { 60.0 };

    orrery.set_pinned("Mars", true);
    let mut regime = orrery.regime();
    let mut focused: Option<String> = None;

    for frame in 0..cli.frames {
        let progress = frame as f64 / total;
        for leg in &legs {
            if progress < leg.start || progress >= leg.end {
                continue;
            }
            match leg.kind {
                LegKind::Focus(name) => {
                    if focused.as_deref() != Some(name) {
                        orrery.focus_by_name(name);
                    }
                }
                LegKind::Zoom { from_au, to_au } => {
                    let t = (progress - leg.start) / (leg.end - leg.start);
                    let au = from_au * (to_au / from_au).powf(t);
                    if !orrery.director().is_auto_zooming() {
                        orrery.clear_focus();
                        orrery.set_camera_rig(CameraRig::new(
                            DVec3::new(0.0, au * SCENE_UNITS_PER_AU, au * SCENE_UNITS_PER_AU * 0.2),
                            DVec3::ZERO,
                        ));
                    }
                }
            }
        }

        orrery.frame(frame as f64 / fps);

        if orrery.regime() != regime {
            regime = orrery.regime();
            info!(frame, regime = %regime, "{}", orrery.distance_readout());
        }
        let now_focused = orrery.focused_entity_summary().map(|summary| summary.name);
        if now_focused != focused {
            match &now_focused {
                Some(name) => info!(frame, name = %name, "Focus changed"),
                None => info!(frame, "Focus cleared"),
            }
            focused = now_focused;
        }
    }

    let backend = orrery.backend();
    info!(
        frames = backend.frames_rendered(),
        primitives = backend.primitive_count(),
        labels = backend.label_count(),
        regime = %orrery.regime(),
        "Tour complete"
    );
    ExitCode::SUCCESS
}
