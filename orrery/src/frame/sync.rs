//! Pushes per-frame state to the render backend
//!
//! Every position crosses the boundary camera-relative, so the renderer
//! only ever sees `f32` values near the origin.

use crate::camera::{Camera, CameraRig, Viewport};
use crate::coordinates::{to_render_space, WorldTransform};
use crate::galaxy::{AsteroidBelt, GalaxyLayer, GalaxyScene};
use crate::registry::{CelestialBody, EntityRegistry, Opacity, Orbit, Proxies};
use crate::render::{
    LabelHandle, LabelState, PrimitiveDesc, PrimitiveKind, PrimitiveState, RenderBackend,
    RenderHandle,
};
use crate::visibility::{LayerToggles, SceneOpacities};
use glam::{DVec3, Quat};
use std::collections::HashSet;
use tracing::trace;

/// Labels fainter than this are not laid out
const LABEL_VISIBLE_THRESHOLD: f32 = 0.01;
/// Labels at least this opaque accept clicks
const LABEL_CLICKABLE_THRESHOLD: f32 = 0.5;

/// Primitives that belong to the scene rather than to a body
#[derive(Debug, Clone)]
pub struct SceneProxies {
    pub galaxy_layers: Vec<(GalaxyLayer, RenderHandle)>,
    pub galaxy_texture: RenderHandle,
    pub galaxy_diagram: RenderHandle,
    pub asteroids: RenderHandle,
}

impl SceneProxies {
    pub fn create<B: RenderBackend + ?Sized>(
        backend: &mut B,
        galaxy: &GalaxyScene,
        belt: &AsteroidBelt,
    ) -> Self {
        let galaxy_layers = galaxy
            .clouds()
            .iter()
            .map(|cloud| {
                let handle = backend.create_primitive(PrimitiveDesc {
                    name: cloud.layer.name().to_string(),
                    kind: PrimitiveKind::Points {
                        positions: cloud.positions.clone(),
                        color: cloud.layer.color(),
                        size: cloud.layer.point_size(),
                    },
                });
                (cloud.layer, handle)
            })
            .collect();

        let size = GalaxyScene::texture_size() as f32;
        let galaxy_texture = backend.create_primitive(PrimitiveDesc {
            name: "galaxy texture".to_string(),
            kind: PrimitiveKind::Plane {
                size,
                texture: "galaxy".to_string(),
            },
        });
        let galaxy_diagram = backend.create_primitive(PrimitiveDesc {
            name: "galaxy diagram".to_string(),
            kind: PrimitiveKind::Plane {
                size,
                texture: "galaxy_labeled".to_string(),
            },
        });
        let asteroids = backend.create_primitive(PrimitiveDesc {
            name: "asteroid belt".to_string(),
            kind: PrimitiveKind::AsteroidField {
                orbits: belt.orbits().to_vec(),
                texture: "asteroid".to_string(),
            },
        });

        Self {
            galaxy_layers,
            galaxy_texture,
            galaxy_diagram,
            asteroids,
        }
    }
}

/// A label awaiting screen placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingLabel {
    pub handle: LabelHandle,
    pub anchor: DVec3,
    pub opacity: f32,
}

/// Project labels and stack them farthest-first
///
/// Labels behind the camera or below the visibility threshold are hidden.
/// With `labels_enabled` off every label is hidden but keeps its opacity.
pub fn layout_labels(
    camera: &Camera,
    rig: &CameraRig,
    viewport: Viewport,
    labels_enabled: bool,
    pending: &[PendingLabel],
) -> Vec<(LabelHandle, LabelState)> {
    let mut placed: Vec<(LabelHandle, LabelState, f64)> = pending
        .iter()
        .map(|label| {
            let screen = camera.project_to_screen(rig, label.anchor, viewport);
            let visible =
                labels_enabled && label.opacity > LABEL_VISIBLE_THRESHOLD && screen.in_front;
            let state = LabelState {
                x: screen.x as f32,
                y: screen.y as f32,
                z_order: 0,
                opacity: label.opacity,
                visible,
                clickable: visible && label.opacity > LABEL_CLICKABLE_THRESHOLD,
            };
            (label.handle, state, label.anchor.distance(rig.position))
        })
        .collect();

    let mut visible: Vec<usize> = (0..placed.len()).filter(|&i| placed[i].1.visible).collect();
    visible.sort_by(|&a, &b| placed[b].2.total_cmp(&placed[a].2));
    for (rank, index) in visible.into_iter().enumerate() {
        placed[index].1.z_order = rank as u32 + 1;
    }

    placed
        .into_iter()
        .map(|(handle, state, _)| (handle, state))
        .collect()
}

pub struct SyncInput<'a> {
    pub registry: &'a EntityRegistry,
    pub camera: &'a Camera,
    pub rig: &'a CameraRig,
    pub viewport: Viewport,
    pub opacities: &'a SceneOpacities,
    pub toggles: LayerToggles,
    pub galaxy: &'a GalaxyScene,
    pub belt: &'a AsteroidBelt,
}

/// Push every body proxy, scene primitive and label for one frame
///
/// Returns the labels that accept clicks until the next push.
pub fn push_frame<B: RenderBackend + ?Sized>(
    backend: &mut B,
    scene: &SceneProxies,
    input: &SyncInput<'_>,
) -> HashSet<LabelHandle> {
    let camera_position = input.rig.position;
    let mut labels = Vec::new();

    for &entity in input.registry.all_bodies() {
        let Some(body) = input.registry.get::<CelestialBody>(entity) else {
            continue;
        };
        if body.hidden {
            continue;
        }
        let (Some(transform), Some(proxies), Some(opacity)) = (
            input.registry.get::<WorldTransform>(entity),
            input.registry.get::<Proxies>(entity),
            input.registry.get::<Opacity>(entity),
        ) else {
            continue;
        };

        let render = transform.to_camera_relative(camera_position);
        let body_state = |alpha: f32| PrimitiveState {
            position: render.position,
            orientation: render.rotation,
            opacity: alpha,
            visible: alpha > 0.0,
            animation_time: 0.0,
        };

        for handle in [proxies.mesh, proxies.ring, proxies.atmosphere].into_iter().flatten() {
            backend.update_primitive(handle, &body_state(opacity.mesh));
        }
        if let Some(handle) = proxies.sprite {
            backend.update_primitive(handle, &body_state(opacity.sprite));
        }
        if let Some(handle) = proxies.light {
            backend.update_primitive(
                handle,
                &PrimitiveState {
                    opacity: 1.0,
                    visible: opacity.light_on,
                    ..body_state(1.0)
                },
            );
        }
        if let Some(handle) = proxies.orbit {
            let centre = body
                .parent
                .and_then(|parent| input.registry.position(parent))
                .unwrap_or(DVec3::ZERO);
            let orientation = input
                .registry
                .get::<Orbit>(entity)
                .map(|orbit| orbit.elements.orientation().as_quat())
                .unwrap_or(Quat::IDENTITY);
            backend.update_primitive(
                handle,
                &PrimitiveState {
                    position: to_render_space(centre, camera_position),
                    orientation,
                    opacity: opacity.orbit,
                    visible: opacity.orbit > 0.0,
                    animation_time: 0.0,
                },
            );
        }

        if let Some(handle) = proxies.label {
            // Star labels sit on top of the star rather than at its centre
            let lift = if body.is_star() { body.render_radius() } else { 0.0 };
            labels.push(PendingLabel {
                handle,
                anchor: transform.position + DVec3::new(0.0, lift, 0.0),
                opacity: opacity.label,
            });
        }
        if let Some(handle) = proxies.sprite_label {
            labels.push(PendingLabel {
                handle,
                anchor: transform.position,
                opacity: opacity.sprite_label,
            });
        }
    }

    for (system, &opacity) in input
        .registry
        .all_systems()
        .iter()
        .zip(&input.opacities.system_labels)
    {
        if let Some(handle) = system.label {
            labels.push(PendingLabel {
                handle,
                anchor: system.center,
                opacity,
            });
        }
    }

    push_scene(backend, scene, input);

    let laid_out = layout_labels(
        input.camera,
        input.rig,
        input.viewport,
        input.toggles.labels,
        &labels,
    );
    for (handle, state) in &laid_out {
        backend.update_label(*handle, state);
    }
    trace!(labels = laid_out.len(), "Frame synced");

    laid_out
        .into_iter()
        .filter(|(_, state)| state.clickable)
        .map(|(handle, _)| handle)
        .collect()
}

fn push_scene<B: RenderBackend + ?Sized>(
    backend: &mut B,
    scene: &SceneProxies,
    input: &SyncInput<'_>,
) {
    let galactic_centre = to_render_space(DVec3::ZERO, input.rig.position);
    let opacities = &input.opacities.galaxy;

    for &(layer, handle) in &scene.galaxy_layers {
        let alpha = opacities.layer(layer);
        backend.update_primitive(
            handle,
            &PrimitiveState {
                position: galactic_centre,
                orientation: input.galaxy.layer_orientation(layer),
                opacity: alpha,
                visible: alpha > 0.0,
                animation_time: 0.0,
            },
        );
    }

    for (handle, alpha) in [
        (scene.galaxy_texture, opacities.texture),
        (scene.galaxy_diagram, opacities.diagram),
    ] {
        backend.update_primitive(
            handle,
            &PrimitiveState {
                position: galactic_centre,
                orientation: input.galaxy.orientation(),
                opacity: alpha,
                visible: alpha > 0.0,
                animation_time: 0.0,
            },
        );
    }

    let home_star = input
        .registry
        .system(input.registry.home_system())
        .map(|system| system.center)
        .unwrap_or(DVec3::ZERO);
    let belt_visible = input.opacities.asteroid_belt_visible;
    backend.update_primitive(
        scene.asteroids,
        &PrimitiveState {
            position: to_render_space(home_star, input.rig.position),
            orientation: Quat::IDENTITY,
            opacity: if belt_visible { 1.0 } else { 0.0 },
            visible: belt_visible,
            animation_time: input.belt.time() as f32,
        },
    );
}
