//! Per-tick orbit integration and repositioning

use super::components::{CelestialBody, Orbit, Spin};
use super::world::EntityRegistry;
use crate::coordinates::WorldTransform;
use crate::kinematics::{advance_phase, spin_orientation};
use std::f64::consts::TAU;
use tracing::trace;

/// Advance every orbital phase and spin angle by one tick
pub fn advance_orbits(registry: &mut EntityRegistry, base_time_step: f64, speed: f64) {
    for (_, (orbit, spin)) in registry.world_mut().query_mut::<(&mut Orbit, &mut Spin)>() {
        orbit.phase = advance_phase(orbit.phase, orbit.rate, base_time_step, speed);
        let angle = (spin.angle + spin.rotation_rate * speed).rem_euclid(TAU);
        if angle.is_finite() {
            spin.angle = angle;
        }
    }
}

/// Recompute world transforms of orbiting bodies from their parents
///
/// Walks bodies in registration order so a parent is always placed before
/// its children. Non-finite results keep the previous position.
pub fn update_positions(registry: &mut EntityRegistry) {
    let order = registry.all_bodies().to_vec();
    for entity in order {
        let Some((parent, orbit, spin)) = orbit_of(registry, entity) else {
            continue;
        };
        let Some(parent_position) = registry.position(parent) else {
            continue;
        };

        let position = parent_position + orbit.elements.position_at(orbit.phase);
        if let Some(transform) = registry.query_one_mut::<&mut WorldTransform>(entity) {
            if position.is_finite() {
                transform.position = position;
            } else {
                trace!(?entity, "Discarded non-finite orbital position");
            }
            transform.rotation = spin_orientation(spin.axial_tilt, spin.angle);
        }
    }
}

fn orbit_of(registry: &EntityRegistry, entity: hecs::Entity) -> Option<(hecs::Entity, Orbit, Spin)> {
    let parent = registry.get::<CelestialBody>(entity)?.parent?;
    let orbit = *registry.get::<Orbit>(entity)?;
    let spin = *registry.get::<Spin>(entity)?;
    Some((parent, orbit, spin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::OrbitalElements;
    use crate::registry::{OrbitingRegistration, Registration, StarRegistration, SystemRegistration};
    use crate::render::RecordingBackend;
    use glam::DVec3;

    fn registry_with_moon() -> EntityRegistry {
        let mut backend = RecordingBackend::new();
        let mut registry = EntityRegistry::new("S");
        registry
            .register(
                Registration::Star(StarRegistration {
                    name: "S".to_string(),
                    system: "S".to_string(),
                    spectral_class: "G2V".to_string(),
                    radius: 1.0,
                    position: DVec3::new(100.0, 0.0, 0.0),
                    distance_ly: 0.0,
                    color: 0xFFFFFF,
                    sprite_scale: 10.0,
                    surface_texture: "sun".to_string(),
                    sprite_texture: "star".to_string(),
                }),
                &mut backend,
            )
            .unwrap();
        registry
            .register(
                Registration::System(SystemRegistration {
                    name: "S".to_string(),
                    members: vec!["S".to_string()],
                }),
                &mut backend,
            )
            .unwrap();
        let body = |name: &str, parent: &str, distance: f64, rate: f64| OrbitingRegistration {
            name: name.to_string(),
            system: "S".to_string(),
            parent: parent.to_string(),
            visual_class: String::new(),
            radius: 1.0,
            elements: OrbitalElements::circular(distance),
            phase: 0.0,
            orbit_rate: rate,
            axial_tilt: 0.0,
            rotation_rate: 0.5,
            texture: "earth".to_string(),
            atmosphere_texture: None,
            ring_texture: None,
            albedo: 0.3,
            hidden: false,
        };
        registry
            .register(Registration::Planet(body("P", "S", 35.0, 1.0)), &mut backend)
            .unwrap();
        registry
            .register(Registration::Moon(body("M", "P", 2.0, 2.0)), &mut backend)
            .unwrap();
        registry
    }

    #[test]
    fn test_children_follow_parents() {
        let mut registry = registry_with_moon();
        let planet = registry.lookup_by_name("P").unwrap();
        let moon = registry.lookup_by_name("M").unwrap();

        for _ in 0..10 {
            advance_orbits(&mut registry, 0.1, 1.0);
            update_positions(&mut registry);
        }

        let star_position = DVec3::new(100.0, 0.0, 0.0);
        let planet_position = registry.position(planet).unwrap();
        let moon_position = registry.position(moon).unwrap();
        assert!((planet_position.distance(star_position) - 35.0).abs() < 1e-9);
        assert!((moon_position.distance(planet_position) - 2.0).abs() < 1e-9);

        let phase = registry.get::<Orbit>(planet).unwrap().phase;
        assert!((phase - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_speed_freezes_orbits() {
        let mut registry = registry_with_moon();
        let planet = registry.lookup_by_name("P").unwrap();
        update_positions(&mut registry);
        let before = registry.position(planet).unwrap();
        advance_orbits(&mut registry, 0.1, 0.0);
        update_positions(&mut registry);
        assert_eq!(registry.position(planet).unwrap(), before);
    }

    #[test]
    fn test_spin_accumulates_with_speed() {
        let mut registry = registry_with_moon();
        let planet = registry.lookup_by_name("P").unwrap();
        advance_orbits(&mut registry, 0.1, 2.0);
        let spin = *registry.get::<Spin>(planet).unwrap();
        assert!((spin.angle - 1.0).abs() < 1e-12);
    }
}
