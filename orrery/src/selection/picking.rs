//! Pointer picking against the pick spheres of visible bodies

use crate::camera::Ray;
use crate::registry::{CelestialBody, EntityRegistry, Opacity, PickShape};
use crate::render::LabelHandle;
use glam::DVec3;
use hecs::Entity;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub entity: Entity,
    /// Distance along the ray, scene units
    pub distance: f64,
}

/// Nearest non-negative intersection of `ray` with a sphere
pub fn ray_sphere(ray: &Ray, center: DVec3, radius: f64) -> Option<f64> {
    if radius <= 0.0 || !radius.is_finite() {
        return None;
    }
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 || !discriminant.is_finite() {
        return None;
    }
    let root = discriminant.sqrt();
    let near = -b - root;
    let far = -b + root;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        // Ray starts inside the sphere
        Some(0.0)
    } else {
        None
    }
}

/// Nearest body under `ray` whose mesh or sprite opacity exceeds `min_opacity`
pub fn hit_test(registry: &EntityRegistry, ray: &Ray, min_opacity: f32) -> Option<PickHit> {
    let mut nearest: Option<PickHit> = None;

    for (entity, (body, opacity, shape)) in registry
        .world()
        .query::<(&CelestialBody, &Opacity, &PickShape)>()
        .iter()
    {
        if body.hidden {
            continue;
        }
        let Some(center) = registry.position(entity) else {
            continue;
        };

        let mesh_hit = (opacity.mesh > min_opacity)
            .then(|| ray_sphere(ray, center, shape.mesh_radius))
            .flatten();
        let sprite_hit = shape
            .sprite_radius
            .filter(|_| opacity.sprite > min_opacity)
            .and_then(|radius| ray_sphere(ray, center, radius));

        let distance = match (mesh_hit, sprite_hit) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => continue,
        };
        if nearest.map_or(true, |hit| distance < hit.distance) {
            nearest = Some(PickHit { entity, distance });
        }
    }

    nearest
}

/// Body a clicked label stands for
///
/// Body labels resolve to their body; a system label resolves to the
/// system's first member star.
pub fn label_target(registry: &EntityRegistry, label: LabelHandle) -> Option<Entity> {
    if let Some(system) = registry
        .all_systems()
        .iter()
        .find(|system| system.label == Some(label))
    {
        return system.members.first().copied();
    }

    registry.all_bodies().iter().copied().find(|&entity| {
        registry
            .get::<crate::registry::Proxies>(entity)
            .is_some_and(|proxies| {
                proxies.label == Some(label) || proxies.sprite_label == Some(label)
            })
    })
}
