//! Components attached to registered bodies

use crate::kinematics::OrbitalElements;
use crate::render::{LabelHandle, RenderHandle};
use crate::units::PLANET_SCALE_FACTOR;
use hecs::Entity;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    Star,
    Planet,
    Moon,
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BodyKind::Star => "Star",
            BodyKind::Planet => "Planet",
            BodyKind::Moon => "Moon",
        };
        f.write_str(name)
    }
}

/// Identity and hierarchy of a star, planet or moon
#[derive(Debug, Clone)]
pub struct CelestialBody {
    pub name: String,
    pub kind: BodyKind,
    /// Star for planets, planet for moons, none for stars
    pub parent: Option<Entity>,
    pub parent_name: Option<String>,
    pub system: String,
    /// Solar radii for stars, Earth radii for planets and moons
    pub radius: f64,
    pub visual_class: String,
    /// Animated but never rendered, picked or searched
    pub hidden: bool,
}

impl CelestialBody {
    /// Radius in scene units
    pub fn render_radius(&self) -> f64 {
        match self.kind {
            BodyKind::Star => self.radius,
            BodyKind::Planet | BodyKind::Moon => self.radius * PLANET_SCALE_FACTOR,
        }
    }

    pub fn is_star(&self) -> bool {
        self.kind == BodyKind::Star
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Orbit {
    pub elements: OrbitalElements,
    /// True anomaly, radians
    pub phase: f64,
    /// Phase advance per tick before time step and speed scaling
    pub rate: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Spin {
    pub axial_tilt: f64,
    pub rotation_rate: f64,
    pub angle: f64,
}

#[derive(Debug, Clone)]
pub struct StarProfile {
    pub spectral_class: String,
    pub distance_ly: f64,
    pub color: u32,
    pub sprite_scale: f64,
    pub light_power: f64,
}

impl StarProfile {
    /// World size of the interstellar sprite
    pub fn sprite_size(&self) -> f64 {
        self.sprite_scale * 10.0
    }

    /// e.g. `Yellow Dwarf (G2V)`
    pub fn classification(&self) -> String {
        format!(
            "{} ({})",
            star_type_name(&self.spectral_class),
            self.spectral_class
        )
    }
}

/// Descriptive name for the leading letter of a spectral class
pub fn star_type_name(spectral_class: &str) -> &'static str {
    match spectral_class
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase())
    {
        Some('O') => "Blue Supergiant",
        Some('B') => "Blue-white Giant",
        Some('A') => "Blue-white Star",
        Some('F') => "White Star",
        Some('G') => "Yellow Dwarf",
        Some('K') => "Orange Dwarf",
        Some('M') => "Red Dwarf",
        Some('D') => "White Dwarf",
        Some('L' | 'T' | 'Y') => "Brown Dwarf",
        _ => "Star",
    }
}

/// Surface texture for the system-scale star mesh
pub fn star_surface_texture(spectral_class: &str) -> &'static str {
    match spectral_class.chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('D') => "sun_white",
        Some('O' | 'B' | 'A') => "sun_blue",
        Some('K') => "sun_orange",
        Some('M' | 'L' | 'T' | 'Y') => "sun_red",
        _ => "sun",
    }
}

/// Texture for the interstellar sprite
pub fn star_sprite_texture(spectral_class: &str) -> &'static str {
    match spectral_class.chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('D') => "sun_white",
        Some('O' | 'B' | 'A') => "star_blue",
        _ => "star",
    }
}

/// Point light power for a star of the given radius (solar radii)
pub fn light_power(radius: f64) -> f64 {
    4.0 * PI * 1e5 * radius * radius
}

/// Render proxies owned by a body, created once at registration
#[derive(Debug, Clone, Default)]
pub struct Proxies {
    pub mesh: Option<RenderHandle>,
    pub label: Option<LabelHandle>,
    /// Orbit line, centred on the parent
    pub orbit: Option<RenderHandle>,
    pub ring: Option<RenderHandle>,
    pub atmosphere: Option<RenderHandle>,
    pub sprite: Option<RenderHandle>,
    pub sprite_label: Option<LabelHandle>,
    pub light: Option<RenderHandle>,
}

/// Opacities written by the visibility blender each frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Opacity {
    pub mesh: f32,
    pub orbit: f32,
    pub label: f32,
    pub sprite: f32,
    pub sprite_label: f32,
    pub light_on: bool,
}

/// Spheres used for pointer picking, scene units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickShape {
    pub mesh_radius: f64,
    pub sprite_radius: Option<f64>,
}
