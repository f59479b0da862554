//! Focus selection, fly-to transitions and follow behaviour

use glam::DVec3;
use orrery::assets::SyntheticLoader;
use orrery::camera::{CameraMotion, CameraRig};
use orrery::config::{GalaxyConfig, OrreryConfig};
use orrery::frame::Orrery;
use orrery::input::InputEvent;
use orrery::registry::BodyKind;
use orrery::render::{LabelHandle, RecordingBackend};
use orrery::scale::ViewRegime;
use orrery::units::SCENE_UNITS_PER_AU;

fn config() -> OrreryConfig {
    OrreryConfig {
        galaxy: GalaxyConfig {
            thin_disk_stars: 300,
            thick_disk_stars: 100,
            bulge_stars: 100,
            halo_stars: 10,
            asteroid_count: 50,
        },
        ..Default::default()
    }
}

fn orrery() -> Orrery<RecordingBackend> {
    Orrery::bootstrap(config(), RecordingBackend::new(), &SyntheticLoader)
        .expect("bootstrap with synthetic assets")
}

fn position_of(orrery: &Orrery<RecordingBackend>, name: &str) -> DVec3 {
    let entity = orrery.registry().lookup_by_name(name).unwrap();
    orrery.registry().position(entity).unwrap()
}

/// Run frames at 60 Hz from `start` for `seconds`, returning the final time
fn run_for(orrery: &mut Orrery<RecordingBackend>, start: f64, seconds: f64) -> f64 {
    let frames = (seconds * 60.0).ceil() as usize;
    let mut now = start;
    for _ in 0..frames {
        now += 1.0 / 60.0;
        orrery.frame(now);
    }
    now
}

#[test]
fn test_transition_lands_on_target_with_same_offset() {
    let mut orrery = orrery();
    orrery.set_paused(true);
    orrery.frame(0.0);
    let offset_before = orrery.director().rig().offset();

    orrery.focus_by_name("Mars");
    orrery.frame(0.1);
    assert!(matches!(
        orrery.director().motion(),
        CameraMotion::Transition(_)
    ));

    run_for(&mut orrery, 0.1, 2.0);
    assert!(orrery.director().motion().is_idle());

    let mars = position_of(&orrery, "Mars");
    let rig = orrery.director().rig();
    assert!(
        (rig.target - mars).length() < 1e-6,
        "Target {:?} should sit on Mars {:?}",
        rig.target,
        mars
    );
    assert!((rig.offset() - offset_before).length() < 1e-6);
}

#[test]
fn test_follow_preserves_distance() {
    let mut orrery = orrery();
    orrery.frame(0.0);
    let distance = orrery.director().distance_to_target();

    orrery.focus_by_name("Earth");
    let now = run_for(&mut orrery, 0.0, 2.0);
    run_for(&mut orrery, now, 5.0);

    let earth = position_of(&orrery, "Earth");
    let rig = orrery.director().rig();
    assert!(
        (rig.distance() - distance).abs() < 1e-6,
        "Follow changed the orbit distance from {} to {}",
        distance,
        rig.distance()
    );
    // Earth moves a little every tick; the target trails it closely
    assert!((rig.target - earth).length() < 1.0);
}

#[test]
fn test_locked_follow_snaps_without_transition() {
    let mut orrery = orrery();
    orrery.frame(0.0);
    let distance = orrery.director().distance_to_target();

    orrery.set_lock_camera_to_focus(true);
    orrery.focus_by_name("Jupiter");
    orrery.frame(0.1);

    assert!(orrery.director().motion().is_idle());
    let jupiter = position_of(&orrery, "Jupiter");
    let rig = orrery.director().rig();
    assert!((rig.target - jupiter).length() < 1e-9);
    assert!((rig.distance() - distance).abs() < 1e-6);

    run_for(&mut orrery, 0.1, 1.0);
    let jupiter = position_of(&orrery, "Jupiter");
    assert!((orrery.director().rig().target - jupiter).length() < 1e-9);
}

#[test]
fn test_refocus_same_entity_is_noop() {
    let mut orrery = orrery();
    orrery.focus_by_name("Earth");
    orrery.frame(0.0);
    orrery.handle_input(InputEvent::CameraInteraction);
    orrery.frame(0.1);
    assert!(orrery.director().motion().is_idle());

    orrery.focus_by_name("Earth");
    orrery.frame(0.2);
    assert!(
        orrery.director().motion().is_idle(),
        "Focusing the focused body again must not restart the transition"
    );
}

#[test]
fn test_interaction_cancels_transition() {
    let mut orrery = orrery();
    orrery.set_paused(true);
    orrery.frame(0.0);
    let before = *orrery.director().rig();

    orrery.focus_by_name("Neptune");
    orrery.handle_input(InputEvent::CameraInteraction);
    orrery.frame(0.1);

    assert!(orrery.director().motion().is_idle());
    let rig = orrery.director().rig();
    // Only the first follow step has been taken toward Neptune
    let neptune = position_of(&orrery, "Neptune");
    let expected_target = before.target + (neptune - before.target) * 0.1;
    assert!((rig.target - expected_target).length() < 1e-6);
}

#[test]
fn test_click_on_planet_focuses_it() {
    let mut orrery = orrery();
    orrery.set_paused(true);
    orrery.frame(0.0);

    let earth = position_of(&orrery, "Earth");
    let rig = CameraRig::new(earth + DVec3::new(0.0, 0.3, 2.0), earth);
    orrery.set_camera_rig(rig);
    orrery.frame(0.1);

    let viewport = orrery.viewport();
    let screen = orrery.camera().project_to_screen(&rig, earth, viewport);
    assert!(screen.in_front);

    orrery.handle_input(InputEvent::PointerDown {
        x: screen.x as f32,
        y: screen.y as f32,
    });
    orrery.handle_input(InputEvent::PointerUp {
        x: screen.x as f32,
        y: screen.y as f32,
    });
    orrery.handle_input(InputEvent::Click {
        x: screen.x as f32,
        y: screen.y as f32,
    });
    orrery.frame(0.2);

    let summary = orrery.focused_entity_summary().expect("Earth focused");
    assert_eq!(summary.name, "Earth");
    assert_eq!(summary.kind, BodyKind::Planet);
    assert_eq!(summary.parent_name.as_deref(), Some("Sol"));
    assert_eq!(summary.system_name, "Sol");
}

#[test]
fn test_click_on_empty_space_clears_focus() {
    let mut orrery = orrery();
    orrery.focus_by_name("Earth");
    orrery.frame(0.0);
    assert!(orrery.focused_entity_summary().is_some());

    orrery.set_camera_rig(CameraRig::new(DVec3::new(0.0, 500.0, 0.0), DVec3::ZERO));
    orrery.handle_input(InputEvent::Click { x: 1.0, y: 1.0 });
    orrery.frame(0.1);
    assert!(orrery.focused_entity_summary().is_none());
}

#[test]
fn test_drag_then_click_is_ignored() {
    let mut orrery = orrery();
    orrery.focus_by_name("Earth");
    orrery.frame(0.0);

    orrery.handle_input(InputEvent::PointerDown { x: 100.0, y: 100.0 });
    orrery.handle_input(InputEvent::PointerMove { x: 130.0, y: 100.0 });
    orrery.handle_input(InputEvent::PointerUp { x: 130.0, y: 100.0 });
    orrery.handle_input(InputEvent::Click { x: 130.0, y: 100.0 });
    orrery.frame(0.1);

    assert_eq!(orrery.focused_entity_summary().unwrap().name, "Earth");
    assert!(
        orrery.director().motion().is_idle(),
        "Starting a drag cancels the transition"
    );
}

/// Camera looking straight down at a system from `au` astronomical units
fn rig_above_system(orrery: &Orrery<RecordingBackend>, system: &str, au: f64) -> CameraRig {
    let center = orrery.registry().system(system).unwrap().center;
    CameraRig::new(center + DVec3::new(0.0, au * SCENE_UNITS_PER_AU, 0.0), center)
}

fn system_label(orrery: &Orrery<RecordingBackend>, system: &str) -> LabelHandle {
    orrery
        .registry()
        .system(system)
        .and_then(|system| system.label)
        .expect("multi-star systems own a label")
}

#[test]
fn test_system_label_click_focuses_first_star() {
    let mut orrery = orrery();
    orrery.set_paused(true);
    orrery.frame(0.0);

    let s2i = orrery.thresholds().system_to_interstellar;
    let rig = rig_above_system(&orrery, "Alpha Centauri", s2i * 2.0);
    orrery.set_camera_rig(rig);
    orrery.frame(0.1);
    assert_eq!(orrery.regime(), ViewRegime::Interstellar);

    let label = system_label(&orrery, "Alpha Centauri");
    assert!(orrery.is_label_clickable(label));
    orrery.handle_input(InputEvent::LabelClick(label));
    orrery.frame(0.2);

    let summary = orrery.focused_entity_summary().unwrap();
    assert_eq!(summary.name, "Alpha Centauri A");
    assert_eq!(summary.kind, BodyKind::Star);
    assert!(summary.distance_ly.unwrap() > 4.0);

    run_for(&mut orrery, 0.2, 2.0);
    assert_eq!(orrery.focus().last_focused_system(), "Alpha Centauri");
}

#[test]
fn test_click_on_invisible_label_is_ignored() {
    let mut orrery = orrery();
    orrery.frame(0.0);
    assert_eq!(orrery.regime(), ViewRegime::System);

    // System labels only show in the interstellar view
    let label = system_label(&orrery, "Alpha Centauri");
    assert!(!orrery.is_label_clickable(label));
    orrery.handle_input(InputEvent::LabelClick(label));
    orrery.frame(0.1);

    assert!(orrery.focused_entity_summary().is_none());
    assert_eq!(orrery.focus().last_focused_system(), "Sol");
}

#[test]
fn test_local_system_switches_after_fly_to_lands() {
    let mut orrery = orrery();
    orrery.set_paused(true);
    orrery.frame(0.0);

    orrery.focus_by_name("Sirius A");
    orrery.frame(0.1);
    assert!(matches!(
        orrery.director().motion(),
        CameraMotion::Transition(_)
    ));
    assert_eq!(
        orrery.focus().last_focused_system(),
        "Sol",
        "The home system stays local while the camera is in flight"
    );

    run_for(&mut orrery, 0.1, 2.0);
    assert!(orrery.director().motion().is_idle());
    assert_eq!(orrery.focus().last_focused_system(), "Sirius");
}

#[test]
fn test_pinned_label_stays_opaque() {
    let mut orrery = orrery();
    orrery.set_pinned("Mars", true);
    orrery.set_camera_rig(CameraRig::new(DVec3::new(0.0, 1e5, 0.0), DVec3::ZERO));
    orrery.frame(0.0);

    let mars = orrery.registry().lookup_by_name("Mars").unwrap();
    let label = orrery
        .registry()
        .get::<orrery::registry::Opacity>(mars)
        .unwrap()
        .label;
    assert_eq!(label, 1.0);

    let earth = orrery.registry().lookup_by_name("Earth").unwrap();
    let earth_label = orrery
        .registry()
        .get::<orrery::registry::Opacity>(earth)
        .unwrap()
        .label;
    assert_eq!(earth_label, 0.0, "Unpinned planet labels fade out far away");
}
