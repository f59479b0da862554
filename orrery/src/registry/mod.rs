//! Canonical set of bodies and stellar systems

pub mod components;
pub mod system;
pub mod world;

pub use components::{
    BodyKind, CelestialBody, Opacity, Orbit, PickShape, Proxies, Spin, StarProfile,
};
pub use system::{advance_orbits, update_positions};
pub use world::{
    EntityRegistry, OrbitingRegistration, Registered, Registration, StarRegistration,
    StellarSystem, SystemRegistration,
};
