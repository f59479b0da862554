//! Entity registry
//!
//! Owns every star, planet and moon together with the stellar systems that
//! group them. Registration validates each body against what is already
//! registered, so a parent must always be registered before its children.

use super::components::{
    light_power, star_sprite_texture, star_surface_texture, BodyKind, CelestialBody, Opacity,
    Orbit, PickShape, Proxies, Spin, StarProfile,
};
use crate::assets::TextureSet;
use crate::catalog::sky::{parse_declination, parse_right_ascension, sky_to_cartesian};
use crate::catalog::{Catalog, OrbitConfig, StarConfig};
use crate::coordinates::WorldTransform;
use crate::error::ConfigurationError;
use crate::kinematics::{orbit_path, spin_orientation, OrbitalElements, ORBIT_PATH_SEGMENTS};
use crate::render::{LabelHandle, PrimitiveDesc, PrimitiveKind, RenderBackend};
use crate::units::{au_to_scene, light_years_to_scene};
use glam::{DVec3, Vec3};
use hecs::Entity;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::f64::consts::TAU;
use tracing::{debug, info, warn};

const PLANET_ORBIT_COLOR: u32 = 0x5A6A8A;
const MOON_ORBIT_COLOR: u32 = 0x4A4A4A;
const ATMOSPHERE_SCALE: f64 = 1.02;
const RING_INNER_SCALE: f64 = 1.2;
const RING_OUTER_SCALE: f64 = 2.0;

/// A group of stars sharing a name and a center
#[derive(Debug, Clone)]
pub struct StellarSystem {
    pub name: String,
    /// Mean position of the member stars
    pub center: DVec3,
    pub members: Vec<Entity>,
    /// Only multi-star systems get a system label
    pub label: Option<LabelHandle>,
}

impl StellarSystem {
    pub fn is_multi_star(&self) -> bool {
        self.members.len() > 1
    }
}

#[derive(Debug, Clone)]
pub struct StarRegistration {
    pub name: String,
    pub system: String,
    pub spectral_class: String,
    /// Solar radii
    pub radius: f64,
    pub position: DVec3,
    pub distance_ly: f64,
    pub color: u32,
    pub sprite_scale: f64,
    pub surface_texture: String,
    pub sprite_texture: String,
}

/// Planets and moons share one shape; the variant decides the parent kind
#[derive(Debug, Clone)]
pub struct OrbitingRegistration {
    pub name: String,
    pub system: String,
    pub parent: String,
    pub visual_class: String,
    /// Earth radii
    pub radius: f64,
    pub elements: OrbitalElements,
    pub phase: f64,
    pub orbit_rate: f64,
    pub axial_tilt: f64,
    pub rotation_rate: f64,
    pub texture: String,
    pub atmosphere_texture: Option<String>,
    pub ring_texture: Option<String>,
    pub albedo: f64,
    pub hidden: bool,
}

#[derive(Debug, Clone)]
pub struct SystemRegistration {
    pub name: String,
    /// Names of already registered stars
    pub members: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum Registration {
    Star(StarRegistration),
    System(SystemRegistration),
    Planet(OrbitingRegistration),
    Moon(OrbitingRegistration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    Body(Entity),
    /// Index into [`EntityRegistry::all_systems`]
    System(usize),
}

pub struct EntityRegistry {
    world: hecs::World,
    /// Registration order; parents always precede children
    order: Vec<Entity>,
    by_name: HashMap<String, Entity>,
    systems: Vec<StellarSystem>,
    system_index: HashMap<String, usize>,
    home_system: String,
}

impl std::fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("order", &self.order)
            .field("by_name", &self.by_name)
            .field("systems", &self.systems)
            .field("system_index", &self.system_index)
            .field("home_system", &self.home_system)
            .finish_non_exhaustive()
    }
}

impl EntityRegistry {
    pub fn new(home_system: impl Into<String>) -> Self {
        Self {
            world: hecs::World::new(),
            order: Vec::new(),
            by_name: HashMap::new(),
            systems: Vec::new(),
            system_index: HashMap::new(),
            home_system: home_system.into(),
        }
    }

    /// Register a whole catalog
    ///
    /// Each system registers its stars, then the system itself, then every
    /// planet followed by its moons. Initial phases missing from the catalog
    /// are drawn from a generator seeded with `seed`.
    pub fn build<B: RenderBackend + ?Sized>(
        catalog: &Catalog,
        textures: &TextureSet,
        backend: &mut B,
        seed: u64,
    ) -> Result<Self, ConfigurationError> {
        if catalog.system(&catalog.home_system).is_none() {
            return Err(ConfigurationError::UnknownSystem(
                catalog.home_system.clone(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut registry = Self::new(catalog.home_system.clone());

        for system in &catalog.systems {
            if system.stars.is_empty() {
                return Err(ConfigurationError::EmptySystem(system.name.clone()));
            }
            let is_home = system.name == catalog.home_system;

            let mut members = Vec::with_capacity(system.stars.len());
            for star in &system.stars {
                let surface_texture = star_surface_texture(&star.spectral_class);
                let sprite_texture = star_sprite_texture(&star.spectral_class);
                require_texture(textures, &star.name, surface_texture)?;
                require_texture(textures, &star.name, sprite_texture)?;

                registry.register(
                    Registration::Star(StarRegistration {
                        name: star.name.clone(),
                        system: system.name.clone(),
                        spectral_class: star.spectral_class.clone(),
                        radius: star.radius,
                        position: star_position(star, is_home)?,
                        distance_ly: star.distance_ly,
                        color: star.color,
                        sprite_scale: star.sprite_scale,
                        surface_texture: surface_texture.to_string(),
                        sprite_texture: sprite_texture.to_string(),
                    }),
                    backend,
                )?;
                members.push(star.name.clone());
            }

            registry.register(
                Registration::System(SystemRegistration {
                    name: system.name.clone(),
                    members,
                }),
                backend,
            )?;

            for planet in &system.planets {
                require_texture(textures, &planet.name, &planet.texture)?;
                for key in [&planet.atmosphere_texture, &planet.ring_texture]
                    .into_iter()
                    .flatten()
                {
                    require_texture(textures, &planet.name, key)?;
                }

                registry.register(
                    Registration::Planet(OrbitingRegistration {
                        name: planet.name.clone(),
                        system: system.name.clone(),
                        parent: planet.parent.clone(),
                        visual_class: planet.class.clone(),
                        radius: planet.radius,
                        elements: elements_from(&planet.orbit, au_to_scene(planet.distance_au)),
                        phase: initial_phase(&planet.orbit, &mut rng),
                        orbit_rate: planet.orbit.orbit_speed,
                        axial_tilt: planet.orbit.axial_tilt_deg.to_radians(),
                        rotation_rate: planet.orbit.rotation_speed,
                        texture: planet.texture.clone(),
                        atmosphere_texture: planet.atmosphere_texture.clone(),
                        ring_texture: planet.ring_texture.clone(),
                        albedo: planet.albedo,
                        hidden: planet.hidden,
                    }),
                    backend,
                )?;

                for moon in &planet.moons {
                    require_texture(textures, &moon.name, &moon.texture)?;
                    registry.register(
                        Registration::Moon(OrbitingRegistration {
                            name: moon.name.clone(),
                            system: system.name.clone(),
                            parent: planet.name.clone(),
                            visual_class: moon.class.clone(),
                            radius: moon.radius,
                            elements: elements_from(&moon.orbit, moon.distance),
                            phase: initial_phase(&moon.orbit, &mut rng),
                            orbit_rate: moon.orbit.orbit_speed,
                            axial_tilt: moon.orbit.axial_tilt_deg.to_radians(),
                            rotation_rate: moon.orbit.rotation_speed,
                            texture: moon.texture.clone(),
                            atmosphere_texture: None,
                            ring_texture: None,
                            albedo: moon.albedo,
                            hidden: planet.hidden,
                        }),
                        backend,
                    )?;
                }
            }
        }

        info!(
            bodies = registry.len(),
            systems = registry.systems.len(),
            home = %registry.home_system,
            "Registry built"
        );
        Ok(registry)
    }

    /// Validate and add one entry, creating its render proxies
    pub fn register<B: RenderBackend + ?Sized>(
        &mut self,
        registration: Registration,
        backend: &mut B,
    ) -> Result<Registered, ConfigurationError> {
        match registration {
            Registration::Star(star) => self.register_star(star, backend).map(Registered::Body),
            Registration::System(system) => {
                self.register_system(system, backend).map(Registered::System)
            }
            Registration::Planet(planet) => self
                .register_orbiting(planet, BodyKind::Planet, backend)
                .map(Registered::Body),
            Registration::Moon(moon) => self
                .register_orbiting(moon, BodyKind::Moon, backend)
                .map(Registered::Body),
        }
    }

    fn register_star<B: RenderBackend + ?Sized>(
        &mut self,
        star: StarRegistration,
        backend: &mut B,
    ) -> Result<Entity, ConfigurationError> {
        self.ensure_unique(&star.name)?;
        ensure_positive("radius", &star.name, star.radius)?;
        ensure_positive("sprite_scale", &star.name, star.sprite_scale)?;
        if !star.position.is_finite() {
            return Err(ConfigurationError::InvalidValue {
                field: "position",
                reason: format!("`{}` has a non-finite position", star.name),
            });
        }

        let power = light_power(star.radius);
        let profile = StarProfile {
            spectral_class: star.spectral_class,
            distance_ly: star.distance_ly,
            color: star.color,
            sprite_scale: star.sprite_scale,
            light_power: power,
        };

        let proxies = Proxies {
            mesh: Some(backend.create_primitive(PrimitiveDesc {
                name: star.name.clone(),
                kind: PrimitiveKind::Mesh {
                    radius: star.radius as f32,
                    texture: star.surface_texture,
                    albedo: 1.0,
                },
            })),
            label: Some(backend.create_label(&star.name)),
            sprite: Some(backend.create_primitive(PrimitiveDesc {
                name: format!("{} sprite", star.name),
                kind: PrimitiveKind::Sprite {
                    texture: star.sprite_texture,
                    size: profile.sprite_size() as f32,
                    color: star.color,
                },
            })),
            sprite_label: Some(backend.create_label(&star.name)),
            light: Some(backend.create_primitive(PrimitiveDesc {
                name: format!("{} light", star.name),
                kind: PrimitiveKind::PointLight {
                    color: star.color,
                    power: power as f32,
                },
            })),
            ..Default::default()
        };
        let pick = PickShape {
            mesh_radius: star.radius,
            sprite_radius: Some(profile.sprite_size() / 2.0),
        };

        let body = CelestialBody {
            name: star.name.clone(),
            kind: BodyKind::Star,
            parent: None,
            parent_name: None,
            system: star.system,
            radius: star.radius,
            visual_class: profile.classification(),
            hidden: false,
        };

        let entity = self.world.spawn((
            body,
            WorldTransform::from_position(star.position),
            profile,
            proxies,
            pick,
            Opacity::default(),
        ));
        debug!(name = %star.name, position = ?star.position, "Registered star");
        Ok(self.track(star.name, entity))
    }

    fn register_system<B: RenderBackend + ?Sized>(
        &mut self,
        system: SystemRegistration,
        backend: &mut B,
    ) -> Result<usize, ConfigurationError> {
        if self.system_index.contains_key(&system.name) {
            return Err(ConfigurationError::DuplicateName(system.name));
        }
        if system.members.is_empty() {
            return Err(ConfigurationError::EmptySystem(system.name));
        }

        let mut members = Vec::with_capacity(system.members.len());
        let mut center = DVec3::ZERO;
        for member in &system.members {
            let entity = self.by_name.get(member).copied().ok_or_else(|| {
                ConfigurationError::UnresolvedParent {
                    child: system.name.clone(),
                    parent: member.clone(),
                }
            })?;
            let body = self.body_ref(entity)?;
            if body.kind != BodyKind::Star {
                return Err(ConfigurationError::WrongParentKind {
                    child: system.name.clone(),
                    parent: member.clone(),
                    expected: BodyKind::Star,
                    found: body.kind,
                });
            }
            if body.system != system.name {
                return Err(ConfigurationError::ForeignParent {
                    child: member.clone(),
                    parent: system.name.clone(),
                    system: body.system.clone(),
                    parent_system: system.name.clone(),
                });
            }
            drop(body);
            center += self.position(entity).unwrap_or(DVec3::ZERO);
            members.push(entity);
        }
        center /= members.len() as f64;

        let label = (members.len() > 1).then(|| backend.create_label(&system.name));
        let index = self.systems.len();
        self.system_index.insert(system.name.clone(), index);
        debug!(name = %system.name, stars = members.len(), "Registered system");
        self.systems.push(StellarSystem {
            name: system.name,
            center,
            members,
            label,
        });
        Ok(index)
    }

    fn register_orbiting<B: RenderBackend + ?Sized>(
        &mut self,
        entry: OrbitingRegistration,
        kind: BodyKind,
        backend: &mut B,
    ) -> Result<Entity, ConfigurationError> {
        self.ensure_unique(&entry.name)?;
        ensure_positive("radius", &entry.name, entry.radius)?;
        ensure_positive(
            "semi_major_axis",
            &entry.name,
            entry.elements.semi_major_axis,
        )?;
        let eccentricity = entry.elements.eccentricity;
        if !(0.0..1.0).contains(&eccentricity) {
            return Err(ConfigurationError::InvalidEccentricity {
                name: entry.name,
                eccentricity,
            });
        }
        for (field, value) in [
            ("orbit_speed", entry.orbit_rate),
            ("rotation_speed", entry.rotation_rate),
            ("phase", entry.phase),
            ("axial_tilt", entry.axial_tilt),
            ("inclination", entry.elements.inclination),
            (
                "longitude_of_ascending_node",
                entry.elements.longitude_of_ascending_node,
            ),
        ] {
            if !value.is_finite() {
                return Err(ConfigurationError::InvalidValue {
                    field,
                    reason: format!("`{}` has non-finite {field}", entry.name),
                });
            }
        }

        let expected = match kind {
            BodyKind::Moon => BodyKind::Planet,
            BodyKind::Planet | BodyKind::Star => BodyKind::Star,
        };
        let parent = self.by_name.get(&entry.parent).copied().ok_or_else(|| {
            ConfigurationError::UnresolvedParent {
                child: entry.name.clone(),
                parent: entry.parent.clone(),
            }
        })?;
        {
            let parent_body = self.body_ref(parent)?;
            if parent_body.kind != expected {
                return Err(ConfigurationError::WrongParentKind {
                    child: entry.name,
                    parent: entry.parent,
                    expected,
                    found: parent_body.kind,
                });
            }
            if parent_body.system != entry.system {
                return Err(ConfigurationError::ForeignParent {
                    child: entry.name,
                    parent: entry.parent,
                    system: entry.system,
                    parent_system: parent_body.system.clone(),
                });
            }
        }

        let parent_position = self.position(parent).unwrap_or(DVec3::ZERO);
        let position = parent_position + entry.elements.position_at(entry.phase);
        let render_radius = entry.radius * crate::units::PLANET_SCALE_FACTOR;

        let proxies = if entry.hidden {
            Proxies::default()
        } else {
            let orbit_points: Vec<Vec3> = orbit_path(&entry.elements, ORBIT_PATH_SEGMENTS)
                .into_iter()
                .map(|point| point.as_vec3())
                .collect();
            Proxies {
                mesh: Some(backend.create_primitive(PrimitiveDesc {
                    name: entry.name.clone(),
                    kind: PrimitiveKind::Mesh {
                        radius: render_radius as f32,
                        texture: entry.texture.clone(),
                        albedo: entry.albedo as f32,
                    },
                })),
                label: Some(backend.create_label(&entry.name)),
                orbit: Some(backend.create_primitive(PrimitiveDesc {
                    name: format!("{} orbit", entry.name),
                    kind: PrimitiveKind::Line {
                        points: orbit_points,
                        color: match kind {
                            BodyKind::Moon => MOON_ORBIT_COLOR,
                            BodyKind::Planet | BodyKind::Star => PLANET_ORBIT_COLOR,
                        },
                    },
                })),
                ring: entry.ring_texture.clone().map(|texture| {
                    backend.create_primitive(PrimitiveDesc {
                        name: format!("{} ring", entry.name),
                        kind: PrimitiveKind::Ring {
                            inner_radius: (render_radius * RING_INNER_SCALE) as f32,
                            outer_radius: (render_radius * RING_OUTER_SCALE) as f32,
                            texture,
                        },
                    })
                }),
                atmosphere: entry.atmosphere_texture.clone().map(|texture| {
                    backend.create_primitive(PrimitiveDesc {
                        name: format!("{} atmosphere", entry.name),
                        kind: PrimitiveKind::Mesh {
                            radius: (render_radius * ATMOSPHERE_SCALE) as f32,
                            texture,
                            albedo: entry.albedo as f32,
                        },
                    })
                }),
                ..Default::default()
            }
        };

        let body = CelestialBody {
            name: entry.name.clone(),
            kind,
            parent: Some(parent),
            parent_name: Some(entry.parent),
            system: entry.system,
            radius: entry.radius,
            visual_class: entry.visual_class,
            hidden: entry.hidden,
        };
        let transform = WorldTransform {
            position,
            rotation: spin_orientation(entry.axial_tilt, 0.0),
        };

        let entity = self.world.spawn((
            body,
            transform,
            Orbit {
                elements: entry.elements,
                phase: entry.phase,
                rate: entry.orbit_rate,
            },
            Spin {
                axial_tilt: entry.axial_tilt,
                rotation_rate: entry.rotation_rate,
                angle: 0.0,
            },
            proxies,
            PickShape {
                mesh_radius: render_radius,
                sprite_radius: None,
            },
            Opacity::default(),
        ));
        debug!(name = %entry.name, kind = %kind, "Registered orbiting body");
        Ok(self.track(entry.name, entity))
    }

    fn ensure_unique(&self, name: &str) -> Result<(), ConfigurationError> {
        if self.by_name.contains_key(name) {
            return Err(ConfigurationError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    fn body_ref(&self, entity: Entity) -> Result<hecs::Ref<'_, CelestialBody>, ConfigurationError> {
        self.world
            .get::<&CelestialBody>(entity)
            .map_err(|err| ConfigurationError::InvalidValue {
                field: "parent",
                reason: err.to_string(),
            })
    }

    fn track(&mut self, name: String, entity: Entity) -> Entity {
        self.by_name.insert(name, entity);
        self.order.push(entity);
        entity
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<Entity> {
        self.by_name.get(name).copied()
    }

    /// Every body in registration order
    pub fn all_bodies(&self) -> &[Entity] {
        &self.order
    }

    pub fn all_systems(&self) -> &[StellarSystem] {
        &self.systems
    }

    pub fn system(&self, name: &str) -> Option<&StellarSystem> {
        self.system_index
            .get(name)
            .and_then(|&index| self.systems.get(index))
    }

    pub fn home_system(&self) -> &str {
        &self.home_system
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Get a component of a registered body
    pub fn get<T: hecs::Component>(&self, entity: Entity) -> Option<hecs::Ref<'_, T>> {
        self.world.get::<&T>(entity).ok()
    }

    pub fn body(&self, entity: Entity) -> Option<hecs::Ref<'_, CelestialBody>> {
        self.get::<CelestialBody>(entity)
    }

    pub fn position(&self, entity: Entity) -> Option<DVec3> {
        self.get::<WorldTransform>(entity).map(|t| t.position)
    }

    /// Query a single body for mutable components
    pub fn query_one_mut<Q: hecs::Query>(
        &mut self,
        entity: Entity,
    ) -> Option<Q::Item<'_>> {
        self.world.query_one_mut::<Q>(entity).ok()
    }

    pub fn world(&self) -> &hecs::World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut hecs::World {
        &mut self.world
    }
}

fn require_texture(textures: &TextureSet, body: &str, key: &str) -> Result<(), ConfigurationError> {
    if textures.contains(key) {
        Ok(())
    } else {
        Err(ConfigurationError::UnknownTexture {
            body: body.to_string(),
            key: key.to_string(),
        })
    }
}

fn ensure_positive(field: &'static str, name: &str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidValue {
            field,
            reason: format!("`{name}` has {field} {value}, expected a positive number"),
        })
    }
}

fn elements_from(orbit: &OrbitConfig, semi_major_axis: f64) -> OrbitalElements {
    OrbitalElements::from_degrees(
        semi_major_axis,
        orbit.eccentricity,
        orbit.inclination_deg,
        orbit.lan_deg,
    )
}

fn initial_phase(orbit: &OrbitConfig, rng: &mut StdRng) -> f64 {
    match orbit.phase_deg {
        Some(degrees) => degrees.to_radians(),
        None => rng.gen_range(0.0..TAU),
    }
}

/// Home system stars sit at the origin; others are placed from their sky coordinates
fn star_position(star: &StarConfig, is_home: bool) -> Result<DVec3, ConfigurationError> {
    let offset = DVec3::X * star.companion_offset.unwrap_or(0.0);
    if is_home {
        return Ok(offset);
    }

    let (ra, dec) = match (&star.ra, &star.dec) {
        (Some(ra), Some(dec)) => (ra, dec),
        (None, None) => {
            warn!(name = %star.name, "Star has no sky coordinates, placing at origin");
            return Ok(offset);
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(ConfigurationError::SkyCoordinate {
                name: star.name.clone(),
                value: String::new(),
            })
        }
    };

    let right_ascension =
        parse_right_ascension(ra).ok_or_else(|| ConfigurationError::SkyCoordinate {
            name: star.name.clone(),
            value: ra.clone(),
        })?;
    let declination = parse_declination(dec).ok_or_else(|| ConfigurationError::SkyCoordinate {
        name: star.name.clone(),
        value: dec.clone(),
    })?;

    let distance = light_years_to_scene(star.distance_ly);
    Ok(sky_to_cartesian(right_ascension, declination, distance) + offset)
}
