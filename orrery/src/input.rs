//! Input events, drag detection and simulation speed control

use crate::render::LabelHandle;
use tracing::{debug, trace, warn};

/// Platform-neutral input delivered by the host
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp { x: f32, y: f32 },
    /// A click as reported by the host, after the matching pointer up
    Click { x: f32, y: f32 },
    /// Positive values zoom out
    Wheel { delta: f32 },
    KeyDown(Key),
    /// The host's camera controls started a drag, zoom or pan
    CameraInteraction,
    LabelClick(LabelHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Other(char),
}

/// Distinguishes clicks from drags
#[derive(Debug, Clone)]
pub struct PointerTracker {
    threshold: f32,
    down_at: Option<(f32, f32)>,
    dragging: bool,
    suppress_click: bool,
}

impl PointerTracker {
    pub fn new(threshold_px: f32) -> Self {
        Self {
            threshold: threshold_px,
            down_at: None,
            dragging: false,
            suppress_click: false,
        }
    }

    pub fn down(&mut self, x: f32, y: f32) {
        self.down_at = Some((x, y));
        self.dragging = false;
        self.suppress_click = false;
    }

    /// Returns true on the move that turns a press into a drag
    pub fn moved(&mut self, x: f32, y: f32) -> bool {
        match self.down_at {
            Some(start) if !self.dragging && self.exceeds(start, (x, y)) => {
                self.dragging = true;
                trace!(x, y, "Drag started");
                true
            }
            _ => false,
        }
    }

    pub fn up(&mut self, x: f32, y: f32) {
        if let Some(start) = self.down_at.take() {
            self.suppress_click = self.dragging || self.exceeds(start, (x, y));
        }
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Whether a click should be handled; a click ending a drag is swallowed
    pub fn accept_click(&mut self) -> bool {
        !std::mem::take(&mut self.suppress_click)
    }

    fn exceeds(&self, start: (f32, f32), end: (f32, f32)) -> bool {
        let dx = end.0 - start.0;
        let dy = end.1 - start.1;
        (dx * dx + dy * dy).sqrt() > self.threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedLevel {
    pub name: &'static str,
    pub multiplier: f64,
}

pub const SPEED_LEVELS: [SpeedLevel; 5] = [
    SpeedLevel {
        name: "Very Slow",
        multiplier: 0.1,
    },
    SpeedLevel {
        name: "Slow",
        multiplier: 0.5,
    },
    SpeedLevel {
        name: "Normal",
        multiplier: 1.0,
    },
    SpeedLevel {
        name: "Fast",
        multiplier: 2.0,
    },
    SpeedLevel {
        name: "Very Fast",
        multiplier: 5.0,
    },
];

/// Global simulation speed
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedControl {
    multiplier: f64,
    paused: bool,
}

impl SpeedControl {
    pub fn new(level: usize, paused: bool) -> Self {
        let level = level.min(SPEED_LEVELS.len() - 1);
        Self {
            multiplier: SPEED_LEVELS[level].multiplier,
            paused,
        }
    }

    /// Step up to the next named level and unpause
    pub fn faster(&mut self) {
        let next = SPEED_LEVELS
            .iter()
            .find(|level| level.multiplier > self.multiplier)
            .unwrap_or(&SPEED_LEVELS[SPEED_LEVELS.len() - 1]);
        self.multiplier = next.multiplier;
        self.paused = false;
        debug!(speed = %self.label(), "Speed increased");
    }

    /// Step down to the previous named level and unpause
    pub fn slower(&mut self) {
        let next = SPEED_LEVELS
            .iter()
            .rev()
            .find(|level| level.multiplier < self.multiplier)
            .unwrap_or(&SPEED_LEVELS[0]);
        self.multiplier = next.multiplier;
        self.paused = false;
        debug!(speed = %self.label(), "Speed decreased");
    }

    /// Set an arbitrary multiplier; negative or non-finite values are ignored
    pub fn set_multiplier(&mut self, multiplier: f64) {
        if !multiplier.is_finite() || multiplier < 0.0 {
            warn!(multiplier, "Ignoring invalid speed multiplier");
            return;
        }
        self.multiplier = multiplier;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Multiplier applied this tick; zero while paused
    pub fn effective(&self) -> f64 {
        if self.paused {
            0.0
        } else {
            self.multiplier
        }
    }

    /// Named level matching the current multiplier
    pub fn level(&self) -> Option<&'static SpeedLevel> {
        SPEED_LEVELS
            .iter()
            .find(|level| (level.multiplier - self.multiplier).abs() < 1e-9)
    }

    pub fn label(&self) -> String {
        if self.paused {
            return "Paused".to_string();
        }
        match self.level() {
            Some(level) => level.name.to_string(),
            None => format!("Custom (x{})", self.multiplier),
        }
    }
}

impl Default for SpeedControl {
    fn default() -> Self {
        Self::new(2, false)
    }
}
