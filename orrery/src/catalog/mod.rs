//! Static catalog of stellar systems
//!
//! The catalog is plain data: systems hold stars and planets, planets hold
//! moons. Validation and cross-references are resolved by the registry when
//! the catalog is registered.

pub mod sky;

use crate::error::ConfigurationError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::info;

const BUILTIN_CATALOG: &str = include_str!("builtin.json");

fn default_home_system() -> String {
    "Sol".to_string()
}

fn default_albedo() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// System placed at the origin and treated as local at startup
    #[serde(default = "default_home_system")]
    pub home_system: String,
    pub systems: Vec<SystemConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    pub name: String,
    pub stars: Vec<StarConfig>,
    #[serde(default)]
    pub planets: Vec<PlanetConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarConfig {
    pub name: String,
    /// Spectral class code such as `G2V` or `DA2`
    pub spectral_class: String,
    /// Radius in solar radii
    pub radius: f64,
    #[serde(default)]
    pub distance_ly: f64,
    #[serde(default)]
    pub ra: Option<String>,
    #[serde(default)]
    pub dec: Option<String>,
    /// Packed 0xRRGGBB; the catalog may also write `"#RRGGBB"`
    #[serde(deserialize_with = "deserialize_color")]
    pub color: u32,
    pub sprite_scale: f64,
    /// Companions sit at a fixed +X offset (scene units) from the computed sky position
    #[serde(default)]
    pub companion_offset: Option<f64>,
}

/// Orbit and spin values shared by planets and moons
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbitConfig {
    #[serde(default)]
    pub eccentricity: f64,
    #[serde(default)]
    pub inclination_deg: f64,
    #[serde(default)]
    pub lan_deg: f64,
    #[serde(default)]
    pub axial_tilt_deg: f64,
    pub orbit_speed: f64,
    #[serde(default)]
    pub rotation_speed: f64,
    /// Initial true anomaly; random when absent
    #[serde(default)]
    pub phase_deg: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanetConfig {
    pub name: String,
    /// Star this planet orbits
    pub parent: String,
    #[serde(default)]
    pub class: String,
    /// Radius in Earth radii
    pub radius: f64,
    pub distance_au: f64,
    #[serde(flatten)]
    pub orbit: OrbitConfig,
    pub texture: String,
    #[serde(default)]
    pub atmosphere_texture: Option<String>,
    #[serde(default = "default_albedo")]
    pub albedo: f64,
    #[serde(default)]
    pub ring_texture: Option<String>,
    /// Registered and animated, but never rendered or searchable
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub moons: Vec<MoonConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoonConfig {
    pub name: String,
    #[serde(default)]
    pub class: String,
    /// Radius in Earth radii
    pub radius: f64,
    /// Distance from the planet in scene units
    pub distance: f64,
    #[serde(flatten)]
    pub orbit: OrbitConfig,
    pub texture: String,
    #[serde(default = "default_albedo")]
    pub albedo: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Packed(u32),
    Hex(String),
}

fn deserialize_color<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    match ColorRepr::deserialize(deserializer)? {
        ColorRepr::Packed(value) => Ok(value),
        ColorRepr::Hex(text) => u32::from_str_radix(text.trim_start_matches('#'), 16)
            .map_err(|err| serde::de::Error::custom(format!("invalid color `{text}`: {err}"))),
    }
}

impl Catalog {
    /// The catalog shipped with the crate: Sol and its nearest neighbours
    pub fn builtin() -> Result<Self, ConfigurationError> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        info!(path = ?path, "Loading catalog from file");

        let json = fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn system(&self, name: &str) -> Option<&SystemConfig> {
        self.systems.iter().find(|system| system.name == name)
    }

    /// Texture keys referenced by planets and moons
    pub fn texture_keys(&self) -> BTreeSet<&str> {
        let mut keys = BTreeSet::new();
        for planet in self.systems.iter().flat_map(|system| &system.planets) {
            keys.insert(planet.texture.as_str());
            for key in [&planet.atmosphere_texture, &planet.ring_texture]
                .into_iter()
                .flatten()
            {
                keys.insert(key.as_str());
            }
            for moon in &planet.moons {
                keys.insert(moon.texture.as_str());
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.home_system, "Sol");

        let sol = catalog.system("Sol").unwrap();
        assert_eq!(sol.stars.len(), 1);
        let names: Vec<_> = sol.planets.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"Earth"));
        assert!(names.contains(&"Neptune"));

        let jupiter = sol.planets.iter().find(|p| p.name == "Jupiter").unwrap();
        assert_eq!(jupiter.moons.len(), 4);

        let alpha = catalog.system("Alpha Centauri").unwrap();
        assert_eq!(alpha.stars.len(), 3);
        let sirius = catalog.system("Sirius").unwrap();
        assert_eq!(sirius.stars[1].companion_offset, Some(30.0));
        assert_eq!(sirius.stars[0].color, 0xCAD7FF);
    }

    #[test]
    fn test_orbit_fields_flatten() {
        let catalog = Catalog::from_json_str(
            r#"{
                "systems": [{
                    "name": "Test",
                    "stars": [{ "name": "T", "spectral_class": "G2V", "radius": 1.0, "color": 16777215, "sprite_scale": 10.0 }],
                    "planets": [{
                        "name": "P", "parent": "T", "radius": 1.0, "distance_au": 2.0,
                        "eccentricity": 0.1, "orbit_speed": 0.01, "texture": "earth"
                    }]
                }]
            }"#,
        )
        .unwrap();
        let planet = &catalog.systems[0].planets[0];
        assert_eq!(catalog.home_system, "Sol");
        assert_eq!(planet.orbit.eccentricity, 0.1);
        assert_eq!(planet.orbit.phase_deg, None);
        assert_eq!(planet.albedo, 0.5);
        assert!(!planet.hidden);
    }

    #[test]
    fn test_texture_keys() {
        let catalog = Catalog::builtin().unwrap();
        let keys = catalog.texture_keys();
        assert!(keys.contains("earth"));
        assert!(keys.contains("moon"));
        assert!(keys.contains("venus_atmosphere"));
        assert!(keys.contains("saturn_ring"));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let err = Catalog::from_json_str("{ \"systems\": 3 }").unwrap_err();
        assert!(matches!(err, ConfigurationError::Json(_)));
    }
}
