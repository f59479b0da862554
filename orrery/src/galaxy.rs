//! Procedural galaxy point clouds and the home asteroid belt
//!
//! The galaxy is four point-cloud layers centred on the origin: a thin and a
//! thick disk shaped by a spiral density map, a flattened Gaussian bulge and
//! a sparse spherical halo. Each layer is generated from its own seeded
//! generator, so layers can be built in parallel and stay reproducible.

use crate::config::GalaxyConfig;
use crate::units::{au_to_scene, light_years_to_scene};
use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::f64::consts::TAU;
use tracing::{debug, warn};

pub const GALAXY_DIAMETER_LY: f64 = 100_000.0;
/// Radians per tick at unit speed
pub const GALAXY_ROTATION_RATE: f64 = 0.000_05;

const THIN_DISK_HEIGHT_LY: f64 = 800.0;
const THICK_DISK_HEIGHT_LY: f64 = 3_000.0;
const BULGE_SIGMA_LY: f64 = 4_000.0;
const BULGE_FLATTENING: f64 = 0.5625;
const HALO_RADIUS_LY: f64 = 120_000.0;

/// Rejection sampling gives up after this many candidates per requested star
const MAX_ATTEMPTS_PER_STAR: usize = 200;

const BELT_INNER_AU: f64 = 2.1;
const BELT_OUTER_AU: f64 = 3.3;
const BELT_HEIGHT: f64 = 5.0;
/// Belt animation time advanced per tick at unit speed
const BELT_TIME_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GalaxyLayer {
    ThinDisk,
    ThickDisk,
    Bulge,
    Halo,
}

impl GalaxyLayer {
    pub const ALL: [GalaxyLayer; 4] = [
        GalaxyLayer::ThinDisk,
        GalaxyLayer::ThickDisk,
        GalaxyLayer::Bulge,
        GalaxyLayer::Halo,
    ];

    /// Share of the galactic opacity this layer receives
    pub fn opacity_weight(self) -> f32 {
        match self {
            GalaxyLayer::ThinDisk | GalaxyLayer::Bulge => 1.0,
            GalaxyLayer::ThickDisk => 0.7,
            GalaxyLayer::Halo => 0.3,
        }
    }

    pub fn color(self) -> u32 {
        match self {
            GalaxyLayer::ThinDisk => 0xD0E0FF,
            GalaxyLayer::ThickDisk => 0xFFF0D9,
            GalaxyLayer::Bulge => 0xFFE082,
            GalaxyLayer::Halo => 0xCAD7FF,
        }
    }

    pub fn point_size(self) -> f32 {
        match self {
            GalaxyLayer::ThinDisk | GalaxyLayer::Halo => 15_000.0,
            GalaxyLayer::ThickDisk => 12_000.0,
            GalaxyLayer::Bulge => 25_000.0,
        }
    }

    /// The halo is spherical and does not turn with the disk
    pub fn rotates(self) -> bool {
        self != GalaxyLayer::Halo
    }

    pub fn name(self) -> &'static str {
        match self {
            GalaxyLayer::ThinDisk => "galaxy thin disk",
            GalaxyLayer::ThickDisk => "galaxy thick disk",
            GalaxyLayer::Bulge => "galaxy bulge",
            GalaxyLayer::Halo => "galaxy halo",
        }
    }

    fn requested(self, config: &GalaxyConfig) -> usize {
        match self {
            GalaxyLayer::ThinDisk => config.thin_disk_stars,
            GalaxyLayer::ThickDisk => config.thick_disk_stars,
            GalaxyLayer::Bulge => config.bulge_stars,
            GalaxyLayer::Halo => config.halo_stars,
        }
    }

    fn seed_offset(self) -> u64 {
        match self {
            GalaxyLayer::ThinDisk => 1,
            GalaxyLayer::ThickDisk => 2,
            GalaxyLayer::Bulge => 3,
            GalaxyLayer::Halo => 4,
        }
    }
}

/// Face-on brightness of the galactic disk
///
/// A logarithmic spiral with a bright core, sampled on the unit square with
/// the galactic centre at (0.5, 0.5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityMap {
    pub arms: u32,
    /// Spiral pitch angle, radians
    pub pitch: f64,
    /// Larger values give narrower arms
    pub arm_sharpness: f64,
    /// Core radius as a fraction of the disk radius
    pub core_radius: f64,
}

impl DensityMap {
    pub fn milky_way() -> Self {
        Self {
            arms: 4,
            pitch: 12.0_f64.to_radians(),
            arm_sharpness: 4.0,
            core_radius: 0.15,
        }
    }

    /// Brightness in [0, 1] at texture coordinates `(u, v)`
    pub fn brightness(&self, u: f64, v: f64) -> f64 {
        let dx = (u - 0.5) * 2.0;
        let dz = (v - 0.5) * 2.0;
        let r = (dx * dx + dz * dz).sqrt();
        if r >= 1.0 {
            return 0.0;
        }

        let core = (-(r / self.core_radius).powi(2)).exp();
        let winding = r.max(1e-3).ln() / self.pitch.tan();
        let phase = self.arms as f64 * (dz.atan2(dx) - winding);
        let arm = ((1.0 + phase.cos()) * 0.5).powf(self.arm_sharpness);
        let falloff = (-r / 0.6).exp() * (1.0 - r);
        (core + arm * falloff).clamp(0.0, 1.0)
    }
}

impl Default for DensityMap {
    fn default() -> Self {
        Self::milky_way()
    }
}

#[derive(Debug, Clone)]
pub struct LayerCloud {
    pub layer: GalaxyLayer,
    /// Relative to the galactic centre, scene units
    pub positions: Vec<Vec3>,
}

/// Standard normal sample via Box-Muller
fn gaussian(rng: &mut StdRng) -> f64 {
    let u = 1.0 - rng.gen::<f64>();
    let v = rng.gen::<f64>();
    (-2.0 * u.ln()).sqrt() * (TAU * v).cos()
}

/// Exponential height above or below the disk plane
fn disk_height(rng: &mut StdRng, scale_height: f64) -> f64 {
    let magnitude = -(1.0 - rng.gen::<f64>()).ln() * scale_height;
    if rng.gen_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}

fn generate_disk(
    count: usize,
    density: &DensityMap,
    rng: &mut StdRng,
    height_ly: f64,
    falloff_divisor: f64,
    accept: impl Fn(f64) -> f64,
) -> Vec<Vec3> {
    let size = light_years_to_scene(GALAXY_DIAMETER_LY);
    let thickness = light_years_to_scene(height_ly);
    let max_attempts = count.saturating_mul(MAX_ATTEMPTS_PER_STAR);

    let mut positions = Vec::with_capacity(count);
    let mut attempts = 0;
    while positions.len() < count && attempts < max_attempts {
        attempts += 1;
        let r = rng.gen::<f64>() * size / 2.0;
        let angle = rng.gen::<f64>() * TAU;
        let x = r * angle.cos();
        let z = r * angle.sin();

        let brightness = density.brightness(x / size + 0.5, z / size + 0.5);
        if rng.gen::<f64>() > accept(brightness) {
            continue;
        }

        let scale_height = thickness * (-r / (size / falloff_divisor)).exp();
        let y = disk_height(rng, scale_height);
        positions.push(Vec3::new(x as f32, y as f32, z as f32));
    }

    if positions.len() < count {
        warn!(
            requested = count,
            generated = positions.len(),
            "Density map too sparse, disk layer truncated"
        );
    }
    positions
}

/// Generate one layer from its own generator
pub fn generate_layer(
    layer: GalaxyLayer,
    count: usize,
    density: &DensityMap,
    rng: &mut StdRng,
) -> Vec<Vec3> {
    match layer {
        GalaxyLayer::ThinDisk => {
            generate_disk(count, density, rng, THIN_DISK_HEIGHT_LY, 5.0, |b| b * b)
        }
        GalaxyLayer::ThickDisk => {
            generate_disk(count, density, rng, THICK_DISK_HEIGHT_LY, 4.0, f64::sqrt)
        }
        GalaxyLayer::Bulge => {
            let sigma = light_years_to_scene(BULGE_SIGMA_LY);
            (0..count)
                .map(|_| {
                    let x = gaussian(rng) * sigma;
                    let y = gaussian(rng) * sigma * BULGE_FLATTENING;
                    let z = gaussian(rng) * sigma;
                    Vec3::new(x as f32, y as f32, z as f32)
                })
                .collect()
        }
        GalaxyLayer::Halo => {
            let radius = light_years_to_scene(HALO_RADIUS_LY);
            (0..count)
                .map(|_| {
                    let theta = rng.gen::<f64>() * TAU;
                    let phi = (2.0 * rng.gen::<f64>() - 1.0).acos();
                    let r = radius * rng.gen::<f64>().cbrt();
                    Vec3::new(
                        (r * phi.sin() * theta.cos()) as f32,
                        (r * phi.sin() * theta.sin()) as f32,
                        (r * phi.cos()) as f32,
                    )
                })
                .collect()
        }
    }
}

/// The volumetric galaxy and its slow rotation
#[derive(Debug, Clone)]
pub struct GalaxyScene {
    clouds: Vec<LayerCloud>,
    rotation: f64,
}

impl GalaxyScene {
    pub fn generate(config: &GalaxyConfig, density: &DensityMap, seed: u64) -> Self {
        let clouds: Vec<LayerCloud> = GalaxyLayer::ALL
            .par_iter()
            .map(|&layer| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(layer.seed_offset()));
                let positions = generate_layer(layer, layer.requested(config), density, &mut rng);
                debug!(layer = layer.name(), stars = positions.len(), "Generated galaxy layer");
                LayerCloud { layer, positions }
            })
            .collect();
        Self {
            clouds,
            rotation: 0.0,
        }
    }

    pub fn clouds(&self) -> &[LayerCloud] {
        &self.clouds
    }

    pub fn cloud(&self, layer: GalaxyLayer) -> Option<&LayerCloud> {
        self.clouds.iter().find(|cloud| cloud.layer == layer)
    }

    pub fn advance(&mut self, speed: f64) {
        let next = (self.rotation + GALAXY_ROTATION_RATE * speed).rem_euclid(TAU);
        if next.is_finite() {
            self.rotation = next;
        }
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Orientation shared by the rotating layers and the galaxy textures
    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.rotation as f32)
    }

    pub fn layer_orientation(&self, layer: GalaxyLayer) -> Quat {
        if layer.rotates() {
            self.orientation()
        } else {
            Quat::IDENTITY
        }
    }

    /// Edge length of the face-on galaxy texture planes
    pub fn texture_size() -> f64 {
        light_years_to_scene(GALAXY_DIAMETER_LY)
    }
}

/// One asteroid's circular orbit and tumble
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsteroidOrbit {
    pub radius: f32,
    /// Radians per unit of belt time
    pub speed: f32,
    pub initial_angle: f32,
    pub y_offset: f32,
    pub tumble_axis: Vec3,
    pub tumble_speed: f32,
    pub scale: Vec3,
}

impl AsteroidOrbit {
    /// Position relative to the home star at belt time `time`
    pub fn position_at(&self, time: f32) -> Vec3 {
        let angle = self.initial_angle + time * self.speed;
        Vec3::new(
            self.radius * angle.cos(),
            self.y_offset,
            self.radius * angle.sin(),
        )
    }
}

/// Instanced asteroids between Mars and Jupiter
///
/// The renderer animates instances from [`AsteroidBelt::time`]; only the clock
/// lives here.
#[derive(Debug, Clone)]
pub struct AsteroidBelt {
    orbits: Vec<AsteroidOrbit>,
    time: f64,
}

impl AsteroidBelt {
    pub fn generate(count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let inner = au_to_scene(BELT_INNER_AU);
        let outer = au_to_scene(BELT_OUTER_AU);

        let orbits = (0..count)
            .map(|_| {
                let radius = rng.gen_range(inner..outer);
                let z: f64 = rng.gen_range(-1.0..1.0);
                let theta = rng.gen::<f64>() * TAU;
                let ring = (1.0 - z * z).sqrt();
                let base: f32 = rng.gen_range(0.5..1.5);
                AsteroidOrbit {
                    radius: radius as f32,
                    speed: ((1.0 / radius).sqrt() * 0.5) as f32,
                    initial_angle: (rng.gen::<f64>() * TAU) as f32,
                    y_offset: ((rng.gen::<f64>() - 0.5) * BELT_HEIGHT) as f32,
                    tumble_axis: Vec3::new(
                        (ring * theta.cos()) as f32,
                        (ring * theta.sin()) as f32,
                        z as f32,
                    ),
                    tumble_speed: rng.gen_range(0.1..0.5),
                    scale: Vec3::new(
                        base * rng.gen_range(1.0..2.5),
                        base * rng.gen_range(0.7..1.2),
                        base * rng.gen_range(0.7..1.2),
                    ),
                }
            })
            .collect();

        Self { orbits, time: 0.0 }
    }

    pub fn advance(&mut self, speed: f64) {
        let next = self.time + BELT_TIME_STEP * speed;
        if next.is_finite() {
            self.time = next;
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn orbits(&self) -> &[AsteroidOrbit] {
        &self.orbits
    }

    pub fn len(&self) -> usize {
        self.orbits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orbits.is_empty()
    }

    /// Current asteroid positions, mainly for inspection
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        let time = self.time as f32;
        self.orbits.iter().map(move |orbit| orbit.position_at(time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> GalaxyConfig {
        GalaxyConfig {
            thin_disk_stars: 400,
            thick_disk_stars: 300,
            bulge_stars: 200,
            halo_stars: 100,
            asteroid_count: 50,
        }
    }

    #[test]
    fn test_density_map_is_bounded() {
        let map = DensityMap::milky_way();
        for i in 0..=20 {
            for j in 0..=20 {
                let b = map.brightness(i as f64 / 20.0, j as f64 / 20.0);
                assert!((0.0..=1.0).contains(&b));
            }
        }
        assert!(map.brightness(0.5, 0.5) > 0.9);
        assert_eq!(map.brightness(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_layers_have_requested_sizes() {
        let scene = GalaxyScene::generate(&small_config(), &DensityMap::milky_way(), 3);
        assert_eq!(scene.clouds().len(), 4);
        assert_eq!(scene.cloud(GalaxyLayer::Bulge).unwrap().positions.len(), 200);
        assert_eq!(scene.cloud(GalaxyLayer::Halo).unwrap().positions.len(), 100);
        assert_eq!(scene.cloud(GalaxyLayer::ThinDisk).unwrap().positions.len(), 400);
    }

    #[test]
    fn test_generation_is_reproducible() {
        let a = GalaxyScene::generate(&small_config(), &DensityMap::milky_way(), 9);
        let b = GalaxyScene::generate(&small_config(), &DensityMap::milky_way(), 9);
        for layer in GalaxyLayer::ALL {
            assert_eq!(
                a.cloud(layer).unwrap().positions,
                b.cloud(layer).unwrap().positions
            );
        }
    }

    #[test]
    fn test_halo_stays_inside_its_sphere() {
        let scene = GalaxyScene::generate(&small_config(), &DensityMap::milky_way(), 5);
        let limit = light_years_to_scene(HALO_RADIUS_LY) as f32 * 1.0001;
        for point in &scene.cloud(GalaxyLayer::Halo).unwrap().positions {
            assert!(point.length() <= limit);
        }
    }

    #[test]
    fn test_thin_disk_is_flatter_than_wide() {
        let scene = GalaxyScene::generate(&small_config(), &DensityMap::milky_way(), 5);
        let cloud = &scene.cloud(GalaxyLayer::ThinDisk).unwrap().positions;
        let n = cloud.len() as f32;
        let mean_height = cloud.iter().map(|p| p.y.abs()).sum::<f32>() / n;
        let mean_radius = cloud
            .iter()
            .map(|p| (p.x * p.x + p.z * p.z).sqrt())
            .sum::<f32>()
            / n;
        assert!(mean_height * 3.0 < mean_radius);
    }

    #[test]
    fn test_rejection_gives_up() {
        let mut rng = StdRng::seed_from_u64(1);
        let points = generate_disk(10, &DensityMap::milky_way(), &mut rng, 800.0, 5.0, |_| 0.0);
        assert!(points.is_empty());
    }

    #[test]
    fn test_halo_does_not_rotate() {
        let mut scene = GalaxyScene::generate(&small_config(), &DensityMap::milky_way(), 5);
        scene.advance(1000.0);
        assert!((scene.rotation() - 0.05).abs() < 1e-12);
        assert_eq!(scene.layer_orientation(GalaxyLayer::Halo), Quat::IDENTITY);
        assert_ne!(scene.layer_orientation(GalaxyLayer::ThinDisk), Quat::IDENTITY);
    }

    #[test]
    fn test_asteroid_belt_lies_between_mars_and_jupiter() {
        let mut belt = AsteroidBelt::generate(200, 4);
        assert_eq!(belt.len(), 200);
        for orbit in belt.orbits() {
            assert!(orbit.radius >= 73.5 && orbit.radius < 115.5);
            assert!(orbit.y_offset.abs() <= 2.5);
            assert!((orbit.tumble_axis.length() - 1.0).abs() < 1e-4);
        }
        belt.advance(2.0);
        assert!((belt.time() - 0.2).abs() < 1e-12);

        let first = belt.orbits()[0];
        let position = belt.positions().next().unwrap();
        assert_eq!(position, first.position_at(0.2));
    }
}
