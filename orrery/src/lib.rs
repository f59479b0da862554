//! Multi-scale orrery core
//!
//! Keeps a scene spanning planetary radii to galactic radii numerically
//! stable and smoothly navigable. Bodies live in 64-bit world space and reach
//! the renderer camera-relative; the view regime, layer opacities and camera
//! framing are all derived from the camera-to-target distance each frame.

pub mod assets;
pub mod camera;
pub mod catalog;
pub mod config;
pub mod coordinates;
pub mod error;
pub mod focus;
pub mod frame;
pub mod galaxy;
pub mod input;
pub mod kinematics;
pub mod registry;
pub mod render;
pub mod scale;
pub mod selection;
pub mod units;
pub mod visibility;

// Re-export commonly used types
pub mod prelude {
    pub use crate::assets::{AssetLoader, FileSystemLoader, SyntheticLoader};
    pub use crate::camera::{Camera, CameraDirector, CameraMotion, CameraRig, Viewport};
    pub use crate::catalog::Catalog;
    pub use crate::config::OrreryConfig;
    pub use crate::error::{AssetLoadError, ConfigurationError, StartupError};
    pub use crate::frame::{Command, FocusSummary, Orrery};
    pub use crate::input::{InputEvent, Key};
    pub use crate::registry::{BodyKind, CelestialBody, EntityRegistry};
    pub use crate::render::{RecordingBackend, RenderBackend};
    pub use crate::scale::ViewRegime;
    pub use crate::selection::SearchFilter;
    pub use crate::units::DistanceReadout;

    pub use glam::{DVec3, Vec3};
}

/// Initialize logging for the orrery
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
