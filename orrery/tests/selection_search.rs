//! Text search and pointer picking against a built registry

use glam::DVec3;
use orrery::assets::{load_all, AssetManifest, SyntheticLoader};
use orrery::camera::Ray;
use orrery::catalog::Catalog;
use orrery::config::{AssetConfig, GalaxyConfig, OrreryConfig};
use orrery::frame::Orrery;
use orrery::registry::{BodyKind, EntityRegistry, Opacity};
use orrery::render::RecordingBackend;
use orrery::selection::{hit_test, search, SearchFilter};
use std::fs;

fn builtin_registry() -> EntityRegistry {
    let textures = load_all(
        &AssetManifest::standard(),
        &AssetConfig::default(),
        &SyntheticLoader,
    )
    .unwrap();
    let mut backend = RecordingBackend::new();
    EntityRegistry::build(&Catalog::builtin().unwrap(), &textures, &mut backend, 7).unwrap()
}

fn set_mesh_opacity(registry: &mut EntityRegistry, name: &str, mesh: f32) {
    let entity = registry.lookup_by_name(name).unwrap();
    let opacity = registry.query_one_mut::<&mut Opacity>(entity).unwrap();
    opacity.mesh = mesh;
}

fn ray_at(registry: &EntityRegistry, name: &str) -> Ray {
    let entity = registry.lookup_by_name(name).unwrap();
    let position = registry.position(entity).unwrap();
    let origin = position + DVec3::new(0.0, 0.0, 5.0);
    Ray {
        origin,
        direction: (position - origin).normalize(),
    }
}

#[test]
fn test_search_is_case_insensitive_substring() {
    let registry = builtin_registry();
    let names: Vec<String> = search(&registry, "mar", SearchFilter::All)
        .into_iter()
        .map(|result| result.name)
        .collect();
    assert_eq!(names, ["Mars"]);

    let upper: Vec<String> = search(&registry, "MAR", SearchFilter::All)
        .into_iter()
        .map(|result| result.name)
        .collect();
    assert_eq!(upper, names);
}

#[test]
fn test_search_keeps_registry_order_and_filters() {
    let registry = builtin_registry();

    let stars: Vec<String> = search(&registry, "centauri", SearchFilter::Star)
        .into_iter()
        .map(|result| result.name)
        .collect();
    assert_eq!(
        stars,
        ["Alpha Centauri A", "Alpha Centauri B", "Proxima Centauri"]
    );

    let planets = search(&registry, "centauri", SearchFilter::Planet);
    assert!(planets.iter().all(|result| result.kind == BodyKind::Planet));
    assert_eq!(planets.len(), 2);
    assert!(planets.iter().all(|result| result.system == "Alpha Centauri"));

    let moons: Vec<String> = search(&registry, "o", SearchFilter::Moon)
        .into_iter()
        .map(|result| result.name)
        .collect();
    assert_eq!(moons, ["Io", "Europa", "Callisto"]);
}

#[test]
fn test_empty_query_returns_nothing() {
    let registry = builtin_registry();
    assert!(search(&registry, "", SearchFilter::All).is_empty());
    assert!(search(&registry, "zzz", SearchFilter::All).is_empty());
}

#[test]
fn test_hidden_bodies_are_not_searchable() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("catalog.json"),
        r#"{
            "home_system": "Sol",
            "systems": [{
                "name": "Sol",
                "stars": [{ "name": "Sol", "spectral_class": "G2V", "radius": 1.0,
                            "color": "FFF4D5", "sprite_scale": 50000 }],
                "planets": [
                    { "name": "Earth", "parent": "Sol", "radius": 1.0, "distance_au": 1.0,
                      "orbit_speed": 0.01, "texture": "earth" },
                    { "name": "Nemesis", "parent": "Sol", "radius": 2.0, "distance_au": 3.0,
                      "orbit_speed": 0.005, "texture": "mars", "hidden": true,
                      "moons": [{ "name": "Nemesis I", "radius": 0.2, "distance": 1.5,
                                  "orbit_speed": 0.1, "texture": "moon" }] }
                ]
            }]
        }"#,
    )
    .unwrap();

    let config = OrreryConfig {
        assets: AssetConfig {
            asset_root: dir.path().to_path_buf(),
            catalog_file: Some("catalog.json".into()),
            ..Default::default()
        },
        galaxy: GalaxyConfig {
            thin_disk_stars: 10,
            thick_disk_stars: 10,
            bulge_stars: 10,
            halo_stars: 10,
            asteroid_count: 10,
        },
        ..Default::default()
    };
    let mut orrery = Orrery::bootstrap(config, RecordingBackend::new(), &SyntheticLoader).unwrap();
    orrery.frame(0.0);

    assert!(orrery.registry().lookup_by_name("Nemesis").is_some());
    assert!(orrery.search("nemesis", SearchFilter::All).is_empty());
    assert_eq!(orrery.search("e", SearchFilter::All).len(), 1);

    orrery.focus_by_name("Nemesis");
    orrery.frame(0.1);
    assert!(
        orrery.focused_entity_summary().is_none(),
        "Hidden bodies cannot take focus"
    );
}

#[test]
fn test_hit_test_respects_opacity_threshold() {
    let mut registry = builtin_registry();
    let ray = ray_at(&registry, "Earth");

    set_mesh_opacity(&mut registry, "Earth", 0.1);
    assert!(hit_test(&registry, &ray, 0.1).is_none());

    set_mesh_opacity(&mut registry, "Earth", 0.11);
    let hit = hit_test(&registry, &ray, 0.1).expect("Earth is visible enough");
    assert_eq!(Some(hit.entity), registry.lookup_by_name("Earth"));
    assert!((hit.distance - (5.0 - 0.1)).abs() < 1e-9);
}

#[test]
fn test_hit_test_prefers_nearest() {
    let mut registry = builtin_registry();
    for name in ["Earth", "Luna"] {
        set_mesh_opacity(&mut registry, name, 1.0);
    }

    let earth = registry.position(registry.lookup_by_name("Earth").unwrap()).unwrap();
    let luna = registry.position(registry.lookup_by_name("Luna").unwrap()).unwrap();

    // Looking from beyond Luna toward Earth, through Luna
    let direction = (earth - luna).normalize();
    let ray = Ray {
        origin: luna - direction * 3.0,
        direction,
    };
    let hit = hit_test(&registry, &ray, 0.1).unwrap();
    assert_eq!(Some(hit.entity), registry.lookup_by_name("Luna"));
}
