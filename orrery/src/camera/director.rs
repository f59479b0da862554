//! Focus transitions, follow and auto-zoom
//!
//! At most one [`CameraMotion`] drives the rig at a time. Starting a new one
//! replaces the previous; user interaction cancels it.

use super::projection::CameraRig;
use crate::config::CameraConfig;
use crate::focus::{FocusState, FocusTarget};
use crate::registry::EntityRegistry;
use crate::scale::AutoZoomRequest;
use glam::DVec3;
use std::f64::consts::PI;
use tracing::{debug, info, trace, warn};

/// Smallest distance the camera may dolly to
const MIN_DISTANCE: f64 = 1e-3;
/// Keeps orbiting away from the poles
const POLE_EPSILON: f64 = 1e-4;

pub fn ease_out_cubic(progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

/// A timed, eased move of both camera and target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFlight {
    pub start_time: f64,
    pub duration: f64,
    pub start_position: DVec3,
    pub end_position: DVec3,
    pub start_target: DVec3,
    pub end_target: DVec3,
}

impl CameraFlight {
    pub fn new(start_time: f64, duration: f64, from: CameraRig, to: CameraRig) -> Self {
        Self {
            start_time,
            duration,
            start_position: from.position,
            end_position: to.position,
            start_target: from.target,
            end_target: to.target,
        }
    }

    pub fn progress(&self, now: f64) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.start_time) / self.duration).clamp(0.0, 1.0)
    }

    /// Rig at `now`, and whether the flight is over
    pub fn sample(&self, now: f64) -> (CameraRig, bool) {
        let progress = self.progress(now);
        let eased = ease_out_cubic(progress);
        let rig = CameraRig::new(
            self.start_position.lerp(self.end_position, eased),
            self.start_target.lerp(self.end_target, eased),
        );
        (rig, progress >= 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CameraMotion {
    #[default]
    Idle,
    /// Fly-to after a focus change
    Transition(CameraFlight),
    /// Regime-driven zoom; scale classification pauses while active
    AutoZoom(CameraFlight),
}

impl CameraMotion {
    pub fn is_idle(&self) -> bool {
        matches!(self, CameraMotion::Idle)
    }
}

#[derive(Debug, Clone)]
pub struct CameraDirector {
    rig: CameraRig,
    motion: CameraMotion,
    desired_distance: f64,
    lock_to_focus: bool,
    transition_seconds: f64,
    auto_zoom_seconds: f64,
    follow_lerp: f64,
}

impl CameraDirector {
    pub fn new(config: &CameraConfig) -> Self {
        let rig = CameraRig::new(config.initial_position, config.initial_target);
        Self {
            rig,
            motion: CameraMotion::Idle,
            desired_distance: rig.distance(),
            lock_to_focus: config.lock_to_focus,
            transition_seconds: config.transition_seconds,
            auto_zoom_seconds: config.auto_zoom_seconds,
            follow_lerp: config.follow_lerp,
        }
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn motion(&self) -> &CameraMotion {
        &self.motion
    }

    pub fn is_auto_zooming(&self) -> bool {
        matches!(self.motion, CameraMotion::AutoZoom(_))
    }

    pub fn distance_to_target(&self) -> f64 {
        self.rig.distance()
    }

    pub fn desired_distance(&self) -> f64 {
        self.desired_distance
    }

    pub fn lock_to_focus(&self) -> bool {
        self.lock_to_focus
    }

    pub fn set_lock_to_focus(&mut self, locked: bool) {
        if locked && !self.lock_to_focus {
            self.desired_distance = self.rig.distance();
        }
        self.lock_to_focus = locked;
    }

    /// Place the rig directly, dropping any motion
    pub fn set_rig(&mut self, rig: CameraRig) {
        if !rig.is_finite() {
            warn!(?rig, "Ignoring non-finite camera rig");
            return;
        }
        self.rig = rig;
        self.desired_distance = rig.distance();
        self.motion = CameraMotion::Idle;
    }

    /// Focus an entity and fly to it unless the camera is locked
    ///
    /// Returns false when the entity was already focused.
    pub fn focus(
        &mut self,
        state: &mut FocusState,
        target: FocusTarget,
        entity_position: DVec3,
        now: f64,
    ) -> bool {
        let name = target.name.clone();
        if !state.set(target) {
            return false;
        }
        info!(name = %name, "Focused");

        if !self.lock_to_focus {
            self.fly_to(entity_position, now);
        }
        true
    }

    /// Start a transition that keeps the camera-to-target offset
    pub fn fly_to(&mut self, entity_position: DVec3, now: f64) {
        let end = CameraRig::new(self.rig.offset() + entity_position, entity_position);
        if !end.is_finite() {
            warn!(?entity_position, "Ignoring transition to non-finite position");
            return;
        }
        self.motion = CameraMotion::Transition(CameraFlight::new(
            now,
            self.transition_seconds,
            self.rig,
            end,
        ));
    }

    /// Keep the focused entity framed
    ///
    /// Does nothing while a motion is active or nothing is focused.
    pub fn follow(&mut self, state: &mut FocusState, registry: &EntityRegistry) {
        let Some(entity) = state.focused_entity() else {
            return;
        };
        // The local system switches once the camera has arrived
        if !self.motion.is_idle() {
            return;
        }
        let Some(body) = registry.body(entity) else {
            return;
        };
        state.set_last_focused_system(&body.system);
        drop(body);

        let Some(entity_position) = registry.position(entity) else {
            return;
        };

        let next = if self.lock_to_focus {
            let direction = self.rig.offset().normalize_or(DVec3::Y);
            CameraRig::new(entity_position + direction * self.desired_distance, entity_position)
        } else {
            let delta = (entity_position - self.rig.target) * self.follow_lerp;
            CameraRig::new(self.rig.position + delta, self.rig.target + delta)
        };

        if next.is_finite() {
            self.rig = next;
        } else {
            warn!(?entity_position, "Discarding non-finite follow step");
        }
    }

    /// Fly to `distance` above `focus`
    pub fn auto_zoom(&mut self, request: AutoZoomRequest, now: f64) {
        let end = CameraRig::new(
            request.focus + DVec3::new(0.0, request.distance, 0.0),
            request.focus,
        );
        if !end.is_finite() {
            warn!(?request, "Ignoring non-finite auto-zoom");
            return;
        }
        debug!(distance = request.distance, "Auto-zoom started");
        self.motion = CameraMotion::AutoZoom(CameraFlight::new(
            now,
            self.auto_zoom_seconds,
            self.rig,
            end,
        ));
    }

    /// Called when the user starts dragging, zooming or panning
    pub fn cancel_on_user_input(&mut self) {
        if !self.motion.is_idle() {
            debug!(motion = ?self.motion, "Camera motion cancelled");
            self.motion = CameraMotion::Idle;
        }
    }

    /// Step the active motion; returns true when it finished this call
    pub fn advance(&mut self, now: f64) -> bool {
        let flight = match self.motion {
            CameraMotion::Idle => return false,
            CameraMotion::Transition(flight) | CameraMotion::AutoZoom(flight) => flight,
        };

        let (rig, done) = flight.sample(now);
        if !rig.is_finite() {
            warn!(?rig, "Discarding non-finite camera motion");
            self.motion = CameraMotion::Idle;
            return true;
        }
        trace!(progress = flight.progress(now), "Camera motion");
        self.rig = rig;
        if done {
            self.desired_distance = rig.distance();
            self.motion = CameraMotion::Idle;
        }
        done
    }

    /// Scale the camera-to-target distance by `factor`
    pub fn dolly(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let offset = self.rig.offset();
        let distance = (offset.length() * factor).max(MIN_DISTANCE);
        let position = self.rig.target + offset.normalize_or(DVec3::Y) * distance;
        if position.is_finite() {
            self.rig.position = position;
            self.desired_distance = distance;
        }
    }

    /// Rotate the camera around the target by yaw and pitch in radians
    pub fn orbit(&mut self, yaw: f64, pitch: f64) {
        let offset = self.rig.offset();
        let radius = offset.length();
        if radius <= 0.0 || !yaw.is_finite() || !pitch.is_finite() {
            return;
        }
        let theta = offset.x.atan2(offset.z) - yaw;
        let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() - pitch)
            .clamp(POLE_EPSILON, PI - POLE_EPSILON);
        let offset = DVec3::new(
            phi.sin() * theta.sin(),
            phi.cos(),
            phi.sin() * theta.cos(),
        ) * radius;
        self.rig.position = self.rig.target + offset;
    }
}
