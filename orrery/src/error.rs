//! Error taxonomy for startup and configuration
//!
//! Only startup can fail. Once the registry is built, per-frame work is
//! infallible: lookups return `Option` and bad numeric results are clamped.

use crate::registry::BodyKind;
use std::path::PathBuf;

/// Malformed or unresolvable static configuration. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate body name `{0}`")]
    DuplicateName(String),

    #[error("`{child}` references unknown parent `{parent}`")]
    UnresolvedParent { child: String, parent: String },

    #[error("`{child}` must orbit a {expected:?}, but `{parent}` is a {found:?}")]
    WrongParentKind {
        child: String,
        parent: String,
        expected: BodyKind,
        found: BodyKind,
    },

    #[error("`{child}` is declared in system `{system}` but its parent `{parent}` belongs to `{parent_system}`")]
    ForeignParent {
        child: String,
        parent: String,
        system: String,
        parent_system: String,
    },

    #[error("`{name}` has eccentricity {eccentricity}, expected a value in [0, 1)")]
    InvalidEccentricity { name: String, eccentricity: f64 },

    #[error("system `{0}` has no stars")]
    EmptySystem(String),

    #[error("unknown system `{0}`")]
    UnknownSystem(String),

    #[error("invalid sky coordinate `{value}` for `{name}`")]
    SkyCoordinate { name: String, value: String },

    #[error("`{body}` uses texture `{key}` which is not part of the asset manifest")]
    UnknownTexture { body: String, key: String },

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("asset path `{0}` escapes the asset root")]
    UnsafePath(String),
}

/// A required asset could not be loaded. Fatal to the startup barrier.
#[derive(Debug, thiserror::Error)]
pub enum AssetLoadError {
    #[error("failed to load asset {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("asset {0:?} is empty")]
    Empty(PathBuf),

    #[error("asset directory {0:?} does not exist")]
    MissingDirectory(PathBuf),
}

/// Everything that can abort [`crate::frame::Orrery::bootstrap`].
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Asset(#[from] AssetLoadError),
}
