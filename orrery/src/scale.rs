//! Scale classifier
//!
//! A small state machine that derives the current [`ViewRegime`] from the
//! camera-to-target distance. Exit thresholds are widened by a hysteresis
//! ratio so the regime does not flap when the camera hovers near a boundary.

use crate::error::ConfigurationError;
use crate::units::{light_years_to_scene, scene_to_au, SCENE_UNITS_PER_AU};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Camera height above the galactic centre after entering the galactic regime
pub const GALACTIC_VIEW_DISTANCE_LY: f64 = 100.0;

/// Fraction of the galactic threshold used when flying back to interstellar
const INTERSTELLAR_RETURN_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewRegime {
    Planet,
    #[default]
    System,
    Interstellar,
    Galactic,
}

impl fmt::Display for ViewRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewRegime::Planet => "Planet",
            ViewRegime::System => "System",
            ViewRegime::Interstellar => "Interstellar",
            ViewRegime::Galactic => "Galactic",
        };
        f.write_str(name)
    }
}

/// Regime boundaries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleThresholds {
    /// Scene units
    pub planet_to_system: f64,
    /// AU
    pub system_to_interstellar: f64,
    /// AU
    pub interstellar_to_galactic: f64,
}

impl ScaleThresholds {
    /// Interstellar from about one light year, galactic from about 300
    pub fn realistic() -> Self {
        Self {
            planet_to_system: 50.0,
            system_to_interstellar: 63_241.0,
            interstellar_to_galactic: 18_972_300.0,
        }
    }

    /// Compressed boundaries for quicker tours
    pub fn cinematic() -> Self {
        Self {
            planet_to_system: 50.0,
            system_to_interstellar: 10_000.0,
            interstellar_to_galactic: 632_410.0,
        }
    }
}

impl Default for ScaleThresholds {
    fn default() -> Self {
        Self::realistic()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleInput {
    /// Camera to target, scene units
    pub distance_to_target: f64,
    /// The focused entity is a planet or moon
    pub body_focused: bool,
}

impl ScaleInput {
    pub fn distance_in_au(&self) -> f64 {
        scene_to_au(self.distance_to_target)
    }
}

/// Camera flight requested by a regime change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoZoomRequest {
    /// Height above `focus`, scene units
    pub distance: f64,
    pub focus: DVec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeChange {
    pub from: ViewRegime,
    pub to: ViewRegime,
    pub auto_zoom: Option<AutoZoomRequest>,
}

/// Single writer of the view regime
#[derive(Debug, Clone)]
pub struct ScaleClassifier {
    regime: ViewRegime,
    thresholds: ScaleThresholds,
    hysteresis: f64,
}

impl ScaleClassifier {
    pub fn new(thresholds: ScaleThresholds, hysteresis: f64) -> Result<Self, ConfigurationError> {
        if !hysteresis.is_finite() || hysteresis <= 1.0 {
            return Err(ConfigurationError::InvalidValue {
                field: "scale.hysteresis",
                reason: format!("{hysteresis} must be greater than 1"),
            });
        }
        let ordered = thresholds.planet_to_system > 0.0
            && thresholds.system_to_interstellar > 0.0
            && thresholds.interstellar_to_galactic > thresholds.system_to_interstellar;
        if !ordered {
            return Err(ConfigurationError::InvalidValue {
                field: "scale.thresholds",
                reason: "thresholds must be positive and increasing".to_string(),
            });
        }
        Ok(Self {
            regime: ViewRegime::System,
            thresholds,
            hysteresis,
        })
    }

    pub fn regime(&self) -> ViewRegime {
        self.regime
    }

    pub fn thresholds(&self) -> &ScaleThresholds {
        &self.thresholds
    }

    pub fn hysteresis(&self) -> f64 {
        self.hysteresis
    }

    /// Camera height above the galactic centre once the galactic regime is entered
    ///
    /// Never closer than the widened exit threshold, so the regime holds
    /// after the flight lands.
    pub fn galactic_view_distance(&self) -> f64 {
        let floor_au = self.thresholds.interstellar_to_galactic * self.hysteresis;
        light_years_to_scene(GALACTIC_VIEW_DISTANCE_LY)
            .max(floor_au * SCENE_UNITS_PER_AU)
    }

    /// Evaluate one pass of the state machine; at most one transition per call
    pub fn classify(&mut self, input: &ScaleInput) -> Option<RegimeChange> {
        let t = &self.thresholds;
        let distance = input.distance_to_target;
        let au = input.distance_in_au();

        let (to, auto_zoom) = match self.regime {
            ViewRegime::System if input.body_focused && distance < t.planet_to_system => {
                (ViewRegime::Planet, None)
            }
            ViewRegime::Planet
                if !input.body_focused || distance > t.planet_to_system * self.hysteresis =>
            {
                (ViewRegime::System, None)
            }
            ViewRegime::System if au > t.system_to_interstellar * self.hysteresis => {
                (ViewRegime::Interstellar, None)
            }
            ViewRegime::Interstellar if au < t.system_to_interstellar => {
                (ViewRegime::System, None)
            }
            ViewRegime::Interstellar if au > t.interstellar_to_galactic => (
                ViewRegime::Galactic,
                Some(AutoZoomRequest {
                    distance: self.galactic_view_distance(),
                    focus: DVec3::ZERO,
                }),
            ),
            ViewRegime::Galactic if au < t.interstellar_to_galactic => (
                ViewRegime::Interstellar,
                Some(AutoZoomRequest {
                    distance: t.interstellar_to_galactic
                        * INTERSTELLAR_RETURN_FRACTION
                        * SCENE_UNITS_PER_AU,
                    focus: DVec3::ZERO,
                }),
            ),
            _ => return None,
        };

        Some(self.transition(to, auto_zoom))
    }

    /// Jump straight to `regime`, e.g. when focus moves to another system
    pub fn force(&mut self, regime: ViewRegime) -> Option<RegimeChange> {
        if self.regime == regime {
            return None;
        }
        Some(self.transition(regime, None))
    }

    fn transition(&mut self, to: ViewRegime, auto_zoom: Option<AutoZoomRequest>) -> RegimeChange {
        let from = self.regime;
        self.regime = to;
        info!(from = %from, to = %to, auto_zoom = auto_zoom.is_some(), "Scale regime changed");
        RegimeChange {
            from,
            to,
            auto_zoom,
        }
    }
}
