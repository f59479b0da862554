//! Frame driver
//!
//! [`Orrery`] owns every subsystem and runs one synchronous update-then-render
//! pass per call to [`Orrery::frame`]. External intent arrives as
//! [`Command`]s, queued by the setters and applied at the start of the next
//! frame.

pub mod sync;

use crate::assets::{load_all, AssetLoader, AssetManifest};
use crate::camera::{Camera, CameraDirector, CameraRig, Viewport};
use crate::catalog::Catalog;
use crate::config::OrreryConfig;
use crate::error::StartupError;
use crate::focus::{FocusState, FocusTarget};
use crate::galaxy::{AsteroidBelt, DensityMap, GalaxyScene};
use crate::input::{InputEvent, Key, PointerTracker, SpeedControl};
use crate::registry::{
    advance_orbits, update_positions, BodyKind, CelestialBody, EntityRegistry, StarProfile,
};
use crate::render::{FrameView, LabelHandle, RenderBackend};
use crate::scale::{ScaleClassifier, ScaleInput, ScaleThresholds, ViewRegime};
use crate::selection::{hit_test, label_target, search, SearchFilter, SearchResult};
use crate::units::{DistanceReadout, EARTH_RADIUS_KM, SUN_RADIUS_KM};
use crate::visibility::{BlendContext, LayerToggles, SceneOpacities, VisibilityBlender};
use hecs::Entity;
use std::collections::{HashSet, VecDeque};
use sync::{push_frame, SceneProxies, SyncInput};
use tracing::{debug, info, trace, warn};

/// Radians of camera orbit per dragged pixel
const ORBIT_RADIANS_PER_PX: f64 = 0.005;
/// Dolly factor exponent per wheel unit
const DOLLY_PER_WHEEL_UNIT: f64 = 0.002;

/// Deferred external intent
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetPinned { name: String, pinned: bool },
    SetSpeedMultiplier(f64),
    SetPaused(bool),
    SetOrbitRingsVisible(bool),
    SetLabelsVisible(bool),
    SetLockToFocus(bool),
    SetGalaxyDiagramVisible(bool),
    SetAsteroidsVisible(bool),
    FocusByName(String),
    ClearFocus,
    SetCameraRig(CameraRig),
    Resize(Viewport),
    Input(InputEvent),
}

/// What an info panel shows for the focused body
#[derive(Debug, Clone, PartialEq)]
pub struct FocusSummary {
    pub name: String,
    pub kind: BodyKind,
    pub parent_name: Option<String>,
    pub system_name: String,
    /// Solar radii for stars, Earth radii otherwise
    pub radius: f64,
    pub radius_km: f64,
    pub classification: String,
    pub distance_ly: Option<f64>,
}

pub struct Orrery<B: RenderBackend> {
    config: OrreryConfig,
    backend: B,
    registry: EntityRegistry,
    classifier: ScaleClassifier,
    blender: VisibilityBlender,
    director: CameraDirector,
    camera: Camera,
    viewport: Viewport,
    focus: FocusState,
    speed: SpeedControl,
    toggles: LayerToggles,
    pointer: PointerTracker,
    last_pointer: Option<(f32, f32)>,
    galaxy: GalaxyScene,
    belt: AsteroidBelt,
    scene: SceneProxies,
    commands: VecDeque<Command>,
    opacities: Option<SceneOpacities>,
    clickable_labels: HashSet<LabelHandle>,
    frames: u64,
}

impl<B: RenderBackend> Orrery<B> {
    /// Load assets, build the registry and create every render proxy
    ///
    /// Textures are loaded as one barrier before anything else is built; any
    /// failure aborts startup.
    pub fn bootstrap<L: AssetLoader + ?Sized>(
        config: OrreryConfig,
        mut backend: B,
        loader: &L,
    ) -> Result<Self, StartupError> {
        config.validate()?;
        info!("Bootstrapping orrery");

        let textures = load_all(&AssetManifest::standard(), &config.assets, loader)?;
        let catalog = match config.assets.catalog_path() {
            Some(path) => Catalog::load_from_file(path)?,
            None => Catalog::builtin()?,
        };

        let registry =
            EntityRegistry::build(&catalog, &textures, &mut backend, config.simulation.seed)?;
        let classifier = ScaleClassifier::new(config.scale.thresholds(), config.scale.hysteresis)?;

        let galaxy = GalaxyScene::generate(
            &config.galaxy,
            &DensityMap::milky_way(),
            config.simulation.seed,
        );
        let belt = AsteroidBelt::generate(config.galaxy.asteroid_count, config.simulation.seed);
        let scene = SceneProxies::create(&mut backend, &galaxy, &belt);

        let viewport = Viewport::from(config.viewport);
        let orrery = Self {
            backend,
            classifier,
            blender: VisibilityBlender::new(),
            director: CameraDirector::new(&config.camera),
            camera: Camera::from_config(&config.camera, viewport),
            viewport,
            focus: FocusState::new(registry.home_system()),
            speed: SpeedControl::new(config.simulation.speed_level, config.simulation.start_paused),
            toggles: LayerToggles::default(),
            pointer: PointerTracker::new(config.camera.drag_threshold_px as f32),
            last_pointer: None,
            galaxy,
            belt,
            scene,
            commands: VecDeque::new(),
            opacities: None,
            clickable_labels: HashSet::new(),
            frames: 0,
            registry,
            config,
        };
        info!(
            bodies = orrery.registry.len(),
            systems = orrery.registry.all_systems().len(),
            "Orrery ready"
        );
        Ok(orrery)
    }

    /// One update-then-render pass; `now` is the host clock in seconds
    pub fn frame(&mut self, now: f64) {
        self.apply_commands(now);

        let speed = self.speed.effective();
        advance_orbits(&mut self.registry, self.config.simulation.base_time_step, speed);
        self.galaxy.advance(speed);
        self.belt.advance(speed);
        update_positions(&mut self.registry);

        if !self.director.is_auto_zooming() {
            let input = ScaleInput {
                distance_to_target: self.director.distance_to_target(),
                body_focused: self.is_body_focused(),
            };
            if let Some(change) = self.classifier.classify(&input) {
                if let Some(request) = change.auto_zoom {
                    self.director.auto_zoom(request, now);
                }
            }
        }

        let opacities = self.blender.blend(
            &mut self.registry,
            &BlendContext {
                regime: self.classifier.regime(),
                distance_to_target: self.director.distance_to_target(),
                thresholds: self.classifier.thresholds(),
                planet_label_fade_au: self.config.scale.planet_label_fade_au,
                focus: &self.focus,
                toggles: self.toggles,
            },
        );

        self.director.advance(now);
        self.director.follow(&mut self.focus, &self.registry);

        let rig = *self.director.rig();
        self.clickable_labels = push_frame(
            &mut self.backend,
            &self.scene,
            &SyncInput {
                registry: &self.registry,
                camera: &self.camera,
                rig: &rig,
                viewport: self.viewport,
                opacities: &opacities,
                toggles: self.toggles,
                galaxy: &self.galaxy,
                belt: &self.belt,
            },
        );
        self.backend.render(&FrameView {
            camera_position: rig.position,
            view: Camera::view_matrix(&rig).as_mat4(),
            projection: self.camera.projection_matrix().as_mat4(),
            viewport: self.viewport,
            regime: self.classifier.regime(),
        });

        self.opacities = Some(opacities);
        self.frames += 1;
        trace!(frame = self.frames, "Frame complete");
    }

    pub fn enqueue(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        self.enqueue(Command::Input(event));
    }

    pub fn set_pinned(&mut self, name: &str, pinned: bool) {
        self.enqueue(Command::SetPinned {
            name: name.to_string(),
            pinned,
        });
    }

    pub fn set_global_speed_multiplier(&mut self, multiplier: f64) {
        self.enqueue(Command::SetSpeedMultiplier(multiplier));
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.enqueue(Command::SetPaused(paused));
    }

    pub fn set_orbit_rings_visible(&mut self, visible: bool) {
        self.enqueue(Command::SetOrbitRingsVisible(visible));
    }

    pub fn set_labels_visible(&mut self, visible: bool) {
        self.enqueue(Command::SetLabelsVisible(visible));
    }

    pub fn set_lock_camera_to_focus(&mut self, locked: bool) {
        self.enqueue(Command::SetLockToFocus(locked));
    }

    pub fn set_galaxy_diagram_visible(&mut self, visible: bool) {
        self.enqueue(Command::SetGalaxyDiagramVisible(visible));
    }

    pub fn set_asteroids_visible(&mut self, visible: bool) {
        self.enqueue(Command::SetAsteroidsVisible(visible));
    }

    pub fn focus_by_name(&mut self, name: &str) {
        self.enqueue(Command::FocusByName(name.to_string()));
    }

    pub fn clear_focus(&mut self) {
        self.enqueue(Command::ClearFocus);
    }

    pub fn set_camera_rig(&mut self, rig: CameraRig) {
        self.enqueue(Command::SetCameraRig(rig));
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.enqueue(Command::Resize(Viewport::new(width, height)));
    }

    pub fn search(&self, query: &str, filter: SearchFilter) -> Vec<SearchResult> {
        search(&self.registry, query, filter)
    }

    pub fn is_pinned(&self, name: &str) -> bool {
        self.focus.is_pinned(name)
    }

    pub fn pinned_names(&self) -> Vec<String> {
        self.focus.pinned_names().map(str::to_string).collect()
    }

    pub fn regime(&self) -> ViewRegime {
        self.classifier.regime()
    }

    pub fn thresholds(&self) -> &ScaleThresholds {
        self.classifier.thresholds()
    }

    pub fn distance_readout(&self) -> DistanceReadout {
        DistanceReadout::from_scene_units(self.director.distance_to_target())
    }

    pub fn focused_entity_summary(&self) -> Option<FocusSummary> {
        let entity = self.focus.focused_entity()?;
        let body = self.registry.get::<CelestialBody>(entity)?;
        let profile = self.registry.get::<StarProfile>(entity);

        let radius_km = match body.kind {
            BodyKind::Star => body.radius * SUN_RADIUS_KM,
            BodyKind::Planet | BodyKind::Moon => body.radius * EARTH_RADIUS_KM,
        };
        let classification = match &profile {
            Some(profile) => profile.classification(),
            None if body.visual_class.is_empty() => body.kind.to_string(),
            None => body.visual_class.clone(),
        };

        Some(FocusSummary {
            name: body.name.clone(),
            kind: body.kind,
            parent_name: body.parent_name.clone(),
            system_name: body.system.clone(),
            radius: body.radius,
            radius_km,
            classification,
            distance_ly: profile.map(|profile| profile.distance_ly),
        })
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn focus(&self) -> &FocusState {
        &self.focus
    }

    pub fn director(&self) -> &CameraDirector {
        &self.director
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn speed(&self) -> &SpeedControl {
        &self.speed
    }

    pub fn toggles(&self) -> LayerToggles {
        self.toggles
    }

    pub fn galaxy(&self) -> &GalaxyScene {
        &self.galaxy
    }

    pub fn asteroid_belt(&self) -> &AsteroidBelt {
        &self.belt
    }

    /// Opacities computed by the last frame
    pub fn scene_opacities(&self) -> Option<&SceneOpacities> {
        self.opacities.as_ref()
    }

    /// Whether the last frame left `label` opaque enough to click
    pub fn is_label_clickable(&self, label: LabelHandle) -> bool {
        self.clickable_labels.contains(&label)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn is_body_focused(&self) -> bool {
        self.focus
            .focused_entity()
            .and_then(|entity| self.registry.body(entity))
            .is_some_and(|body| matches!(body.kind, BodyKind::Planet | BodyKind::Moon))
    }

    fn apply_commands(&mut self, now: f64) {
        while let Some(command) = self.commands.pop_front() {
            trace!(?command, "Applying command");
            match command {
                Command::SetPinned { name, pinned } => self.focus.set_pinned(&name, pinned),
                Command::SetSpeedMultiplier(multiplier) => self.speed.set_multiplier(multiplier),
                Command::SetPaused(paused) => self.speed.set_paused(paused),
                Command::SetOrbitRingsVisible(visible) => self.toggles.orbit_rings = visible,
                Command::SetLabelsVisible(visible) => self.toggles.labels = visible,
                Command::SetLockToFocus(locked) => self.director.set_lock_to_focus(locked),
                Command::SetGalaxyDiagramVisible(visible) => self.toggles.galaxy_diagram = visible,
                Command::SetAsteroidsVisible(visible) => self.toggles.asteroids = visible,
                Command::FocusByName(name) => self.apply_focus_by_name(&name, now),
                Command::ClearFocus => {
                    self.focus.clear();
                }
                Command::SetCameraRig(rig) => self.director.set_rig(rig),
                Command::Resize(viewport) => {
                    self.viewport = viewport;
                    self.camera.set_aspect_ratio(viewport.aspect_ratio());
                }
                Command::Input(event) => self.apply_input(event, now),
            }
        }
    }

    fn apply_focus_by_name(&mut self, name: &str, now: f64) {
        let Some(entity) = self.registry.lookup_by_name(name) else {
            warn!(name, "Cannot focus unknown body");
            self.focus.clear();
            return;
        };
        let Some(system) = self
            .registry
            .body(entity)
            .filter(|body| !body.hidden)
            .map(|body| body.system.clone())
        else {
            warn!(name, "Cannot focus hidden body");
            self.focus.clear();
            return;
        };

        if system != self.focus.last_focused_system() && !self.focus.is_focused(entity) {
            self.classifier.force(ViewRegime::Interstellar);
        }
        self.focus_entity(entity, now);
    }

    fn focus_entity(&mut self, entity: Entity, now: f64) {
        let (Some(name), Some(position)) = (
            self.registry.body(entity).map(|body| body.name.clone()),
            self.registry.position(entity),
        ) else {
            return;
        };
        self.director
            .focus(&mut self.focus, FocusTarget { entity, name }, position, now);
    }

    fn apply_input(&mut self, event: InputEvent, now: f64) {
        match event {
            InputEvent::PointerDown { x, y } => {
                self.pointer.down(x, y);
                self.last_pointer = Some((x, y));
            }
            InputEvent::PointerMove { x, y } => {
                if self.pointer.moved(x, y) {
                    self.director.cancel_on_user_input();
                }
                if self.pointer.is_dragging() {
                    if let Some((last_x, last_y)) = self.last_pointer {
                        self.director.orbit(
                            f64::from(x - last_x) * ORBIT_RADIANS_PER_PX,
                            f64::from(y - last_y) * ORBIT_RADIANS_PER_PX,
                        );
                    }
                }
                self.last_pointer = Some((x, y));
            }
            InputEvent::PointerUp { x, y } => {
                self.pointer.up(x, y);
                self.last_pointer = None;
            }
            InputEvent::Click { x, y } => {
                if self.pointer.accept_click() {
                    self.apply_click(f64::from(x), f64::from(y), now);
                } else {
                    debug!(x, y, "Click after drag ignored");
                }
            }
            InputEvent::Wheel { delta } => {
                self.director.cancel_on_user_input();
                self.director
                    .dolly((f64::from(delta) * DOLLY_PER_WHEEL_UNIT).exp());
            }
            InputEvent::KeyDown(Key::ArrowRight) => self.speed.faster(),
            InputEvent::KeyDown(Key::ArrowLeft) => self.speed.slower(),
            InputEvent::KeyDown(Key::Other(_)) => {}
            InputEvent::CameraInteraction => self.director.cancel_on_user_input(),
            InputEvent::LabelClick(label) => self.apply_label_click(label, now),
        }
    }

    fn apply_click(&mut self, x: f64, y: f64, now: f64) {
        let ray = self
            .camera
            .screen_ray(self.director.rig(), x, y, self.viewport);
        match hit_test(
            &self.registry,
            &ray,
            self.config.camera.pick_opacity_threshold,
        ) {
            Some(hit) => self.focus_entity(hit.entity, now),
            None => {
                self.focus.clear();
            }
        }
    }

    fn apply_label_click(&mut self, label: LabelHandle, now: f64) {
        if !self.clickable_labels.contains(&label) {
            debug!(?label, "Click on a label that is not clickable");
            return;
        }
        match label_target(&self.registry, label) {
            Some(entity) => self.focus_entity(entity, now),
            None => debug!(?label, "Click on unknown label"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::SyntheticLoader;
    use crate::config::GalaxyConfig;
    use crate::render::RecordingBackend;

    fn small_config() -> OrreryConfig {
        OrreryConfig {
            galaxy: GalaxyConfig {
                thin_disk_stars: 200,
                thick_disk_stars: 100,
                bulge_stars: 100,
                halo_stars: 50,
                asteroid_count: 50,
            },
            ..Default::default()
        }
    }

    fn orrery() -> Orrery<RecordingBackend> {
        Orrery::bootstrap(small_config(), RecordingBackend::new(), &SyntheticLoader).unwrap()
    }

    #[test]
    fn test_commands_apply_next_frame() {
        let mut orrery = orrery();
        orrery.set_pinned("Mars", true);
        orrery.set_paused(true);
        assert!(!orrery.is_pinned("Mars"));
        assert!(!orrery.speed().is_paused());

        orrery.frame(0.0);
        assert!(orrery.is_pinned("Mars"));
        assert!(orrery.speed().is_paused());
        assert_eq!(orrery.pinned_names(), ["Mars"]);
    }

    #[test]
    fn test_each_frame_renders_once() {
        let mut orrery = orrery();
        for i in 0..3 {
            orrery.frame(i as f64 / 60.0);
        }
        assert_eq!(orrery.frames_rendered(), 3);
        assert_eq!(orrery.backend().frames_rendered(), 3);
        assert_eq!(orrery.backend().last_frame().unwrap().regime, ViewRegime::System);
    }

    #[test]
    fn test_unknown_focus_clears() {
        let mut orrery = orrery();
        orrery.focus_by_name("Earth");
        orrery.frame(0.0);
        assert_eq!(orrery.focused_entity_summary().unwrap().name, "Earth");

        orrery.focus_by_name("Vulcan");
        orrery.frame(0.1);
        assert!(orrery.focused_entity_summary().is_none());
    }

    #[test]
    fn test_star_summary() {
        let mut orrery = orrery();
        orrery.focus_by_name("Sol");
        orrery.frame(0.0);
        let summary = orrery.focused_entity_summary().unwrap();
        assert_eq!(summary.kind, BodyKind::Star);
        assert_eq!(summary.classification, "Yellow Dwarf (G2V)");
        assert!((summary.radius_km - SUN_RADIUS_KM).abs() < 1.0);
        assert!(summary.parent_name.is_none());
    }

    #[test]
    fn test_arrow_keys_step_speed() {
        let mut orrery = orrery();
        orrery.handle_input(InputEvent::KeyDown(Key::ArrowRight));
        orrery.frame(0.0);
        assert_eq!(orrery.speed().multiplier(), 2.0);
        orrery.handle_input(InputEvent::KeyDown(Key::ArrowLeft));
        orrery.handle_input(InputEvent::KeyDown(Key::ArrowLeft));
        orrery.frame(0.1);
        assert_eq!(orrery.speed().label(), "Slow");
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut orrery = orrery();
        orrery.resize(1000, 500);
        orrery.frame(0.0);
        assert_eq!(orrery.viewport(), Viewport::new(1000, 500));
        assert!((orrery.camera().aspect_ratio - 2.0).abs() < 1e-12);
    }
}
