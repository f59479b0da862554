//! Visibility blender
//!
//! Turns the regime and camera distance into a continuous opacity for every
//! layer. All fades are smoothsteps of distance, so opacities never jump
//! when the regime changes; the regime only gates which labels may show.

use crate::focus::FocusState;
use crate::galaxy::GalaxyLayer;
use crate::registry::{BodyKind, CelestialBody, EntityRegistry, Opacity};
use crate::scale::{ScaleThresholds, ViewRegime};
use crate::units::scene_to_au;
use tracing::trace;

const PLANET_ORBIT_OPACITY: f64 = 0.6;
const LIGHT_ON_THRESHOLD: f64 = 0.1;
const ASTEROID_VISIBLE_THRESHOLD: f64 = 0.01;
/// Fraction of the gap to the diagram toggle closed per frame
const DIAGRAM_EASE: f64 = 0.05;

/// Hermite smoothstep clamped to [0, 1]
///
/// Equal edges degrade to a step at `edge0`.
pub fn smoothstep(x: f64, edge0: f64, edge1: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Raw fade curves for one camera distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeFactors {
    pub planet: f64,
    pub system: f64,
    pub interstellar: f64,
    pub galactic: f64,
    pub planet_label: f64,
}

impl FadeFactors {
    pub fn compute(
        distance_to_target: f64,
        thresholds: &ScaleThresholds,
        planet_label_fade_au: [f64; 2],
    ) -> Self {
        let au = scene_to_au(distance_to_target);
        let p2s = thresholds.planet_to_system;
        let s2i = thresholds.system_to_interstellar;
        let i2g = thresholds.interstellar_to_galactic;
        Self {
            planet: smoothstep(distance_to_target, 0.8 * p2s, p2s),
            system: smoothstep(au, 0.8 * s2i, s2i),
            interstellar: smoothstep(au, s2i, i2g),
            galactic: smoothstep(au, 0.5 * i2g, 2.0 * i2g),
            planet_label: smoothstep(au, planet_label_fade_au[0], planet_label_fade_au[1]),
        }
    }

    /// Opacity of the local system's meshes
    pub fn local_system(&self) -> f64 {
        1.0 - self.system
    }

    /// Rises as the system fades out, falls as the galaxy takes over
    pub fn interstellar_bump(&self) -> f64 {
        self.system * (1.0 - self.interstellar)
    }
}

/// User toggles for optional layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerToggles {
    pub orbit_rings: bool,
    pub labels: bool,
    pub galaxy_diagram: bool,
    pub asteroids: bool,
}

impl Default for LayerToggles {
    fn default() -> Self {
        Self {
            orbit_rings: true,
            labels: true,
            galaxy_diagram: false,
            asteroids: true,
        }
    }
}

pub struct BlendContext<'a> {
    pub regime: ViewRegime,
    pub distance_to_target: f64,
    pub thresholds: &'a ScaleThresholds,
    pub planet_label_fade_au: [f64; 2],
    pub focus: &'a FocusState,
    pub toggles: LayerToggles,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GalaxyOpacities {
    /// Plain face-on texture
    pub texture: f32,
    /// Labelled diagram texture
    pub diagram: f32,
    layers: [f32; 4],
}

impl GalaxyOpacities {
    pub fn layer(&self, layer: GalaxyLayer) -> f32 {
        let index = GalaxyLayer::ALL
            .iter()
            .position(|&l| l == layer)
            .unwrap_or(0);
        self.layers[index]
    }
}

/// Opacities that do not belong to a single body
#[derive(Debug, Clone, PartialEq)]
pub struct SceneOpacities {
    pub fades: FadeFactors,
    pub galaxy: GalaxyOpacities,
    pub asteroid_belt_visible: bool,
    /// Indexed like [`EntityRegistry::all_systems`]; zero for single-star systems
    pub system_labels: Vec<f32>,
}

/// Writes an [`Opacity`] on every body each frame
#[derive(Debug, Clone, Default)]
pub struct VisibilityBlender {
    diagram_mix: f64,
}

impl VisibilityBlender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagram_mix(&self) -> f64 {
        self.diagram_mix
    }

    pub fn blend(&mut self, registry: &mut EntityRegistry, ctx: &BlendContext<'_>) -> SceneOpacities {
        let fades = FadeFactors::compute(
            ctx.distance_to_target,
            ctx.thresholds,
            ctx.planet_label_fade_au,
        );
        let interstellar_view = matches!(ctx.regime, ViewRegime::Interstellar | ViewRegime::Galactic);
        let local_system = ctx.focus.last_focused_system();

        for index in 0..registry.all_bodies().len() {
            let entity = registry.all_bodies()[index];
            let Some(body) = registry.body(entity).map(|b| (*b).clone()) else {
                continue;
            };
            let multi_star = registry
                .system(&body.system)
                .is_some_and(|system| system.is_multi_star());

            let opacity = if body.hidden {
                Opacity::default()
            } else {
                body_opacity(&body, entity, multi_star, &fades, interstellar_view, ctx, local_system)
            };
            if let Some(slot) = registry.query_one_mut::<&mut Opacity>(entity) {
                *slot = opacity;
            }
        }

        let bump = fades.interstellar_bump() as f32;
        let system_labels = registry
            .all_systems()
            .iter()
            .map(|system| {
                if !system.is_multi_star() {
                    0.0
                } else if ctx.focus.is_pinned(&system.name) {
                    1.0
                } else if interstellar_view {
                    bump
                } else {
                    0.0
                }
            })
            .collect();

        let target = if ctx.toggles.galaxy_diagram { 1.0 } else { 0.0 };
        self.diagram_mix += (target - self.diagram_mix) * DIAGRAM_EASE;
        let galaxy = GalaxyOpacities {
            texture: (fades.interstellar * (1.0 - self.diagram_mix)) as f32,
            diagram: (fades.interstellar * self.diagram_mix) as f32,
            layers: GalaxyLayer::ALL.map(|layer| fades.galactic as f32 * layer.opacity_weight()),
        };

        let asteroid_belt_visible = ctx.toggles.asteroids
            && local_system == registry.home_system()
            && fades.local_system() > ASTEROID_VISIBLE_THRESHOLD;

        trace!(
            system_fade = fades.system,
            interstellar_fade = fades.interstellar,
            galactic = fades.galactic,
            "Visibility blended"
        );

        SceneOpacities {
            fades,
            galaxy,
            asteroid_belt_visible,
            system_labels,
        }
    }
}

fn body_opacity(
    body: &CelestialBody,
    entity: hecs::Entity,
    multi_star: bool,
    fades: &FadeFactors,
    interstellar_view: bool,
    ctx: &BlendContext<'_>,
    local_system: &str,
) -> Opacity {
    let pinned = ctx.focus.is_pinned(&body.name);
    let local = body.system == local_system;

    match body.kind {
        BodyKind::Star => {
            let mesh = if local { fades.local_system() } else { 0.0 };
            let bump = fades.interstellar_bump();
            let sprite_label = if interstellar_view && !multi_star {
                bump
            } else {
                0.0
            };
            // A pinned star keeps the label of the scale it is shown at
            let (label, sprite_label) = match (pinned, interstellar_view) {
                (true, true) => (mesh, 1.0),
                (true, false) => (1.0, sprite_label),
                (false, _) => (mesh, sprite_label),
            };
            Opacity {
                mesh: mesh as f32,
                orbit: 0.0,
                label: label as f32,
                sprite: bump as f32,
                sprite_label: sprite_label as f32,
                light_on: local && mesh > LIGHT_ON_THRESHOLD,
            }
        }
        BodyKind::Planet => {
            let mesh = if local { fades.local_system() } else { 0.0 };
            let orbit = if ctx.toggles.orbit_rings {
                mesh * PLANET_ORBIT_OPACITY
            } else {
                0.0
            };
            let label = if pinned {
                1.0
            } else if local {
                1.0 - fades.planet_label
            } else {
                0.0
            };
            Opacity {
                mesh: mesh as f32,
                orbit: orbit as f32,
                label: label as f32,
                ..Default::default()
            }
        }
        BodyKind::Moon => {
            let focused = ctx.focus.is_focused(entity);
            let parent_focused = body
                .parent
                .is_some_and(|parent| ctx.focus.is_focused(parent));
            let mesh = if focused {
                1.0
            } else if ctx.regime == ViewRegime::Planet && parent_focused {
                1.0 - fades.planet
            } else {
                0.0
            };
            let orbit = if ctx.toggles.orbit_rings { mesh } else { 0.0 };
            let label = if pinned || focused { 1.0 } else { mesh };
            Opacity {
                mesh: mesh as f32,
                orbit: orbit as f32,
                label: label as f32,
                ..Default::default()
            }
        }
    }
}
