//! Orbital kinematics
//!
//! Bodies follow fixed ellipses in polar form, `r(θ) = a(1 − e²) / (1 + e·cos θ)`,
//! with the true anomaly advanced at a constant rate. There is no Kepler
//! equation solve; the motion is illustrative, not physical.

use glam::{DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Segments used when sampling orbit lines
pub const ORBIT_PATH_SEGMENTS: usize = 256;

const MIN_DENOMINATOR: f64 = 1e-9;

/// Shape and orientation of an orbit. Angles are in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub longitude_of_ascending_node: f64,
}

impl OrbitalElements {
    /// Build elements from catalog values given in degrees
    pub fn from_degrees(
        semi_major_axis: f64,
        eccentricity: f64,
        inclination_deg: f64,
        longitude_of_ascending_node_deg: f64,
    ) -> Self {
        Self {
            semi_major_axis,
            eccentricity,
            inclination: inclination_deg.to_radians(),
            longitude_of_ascending_node: longitude_of_ascending_node_deg.to_radians(),
        }
    }

    pub fn circular(radius: f64) -> Self {
        Self {
            semi_major_axis: radius,
            eccentricity: 0.0,
            inclination: 0.0,
            longitude_of_ascending_node: 0.0,
        }
    }

    /// Distance from the focus at true anomaly `theta`
    pub fn radius_at(&self, theta: f64) -> f64 {
        let e = self.eccentricity;
        let mut denominator = 1.0 + e * theta.cos();
        if denominator.abs() < MIN_DENOMINATOR {
            denominator = MIN_DENOMINATOR.copysign(denominator);
        }
        self.semi_major_axis * (1.0 - e * e) / denominator
    }

    pub fn periapsis(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity)
    }

    pub fn apoapsis(&self) -> f64 {
        self.semi_major_axis * (1.0 + self.eccentricity)
    }

    /// Rotation from the reference plane into the orbital plane
    ///
    /// Ascending node about +Y is applied outermost, inclination about +X
    /// inside it.
    pub fn orientation(&self) -> DQuat {
        DQuat::from_euler(
            EulerRot::YXZ,
            self.longitude_of_ascending_node,
            self.inclination,
            0.0,
        )
    }

    /// Position relative to the parent at true anomaly `theta`
    pub fn position_at(&self, theta: f64) -> DVec3 {
        orbital_position(self, theta)
    }
}

/// Position relative to the parent body at true anomaly `theta`
pub fn orbital_position(elements: &OrbitalElements, theta: f64) -> DVec3 {
    let r = elements.radius_at(theta);
    let in_plane = DVec3::new(r * theta.cos(), 0.0, r * theta.sin());
    elements.orientation() * in_plane
}

/// Advance a phase by one tick, wrapped into [0, 2π)
///
/// A non-finite result leaves the phase unchanged.
pub fn advance_phase(phase: f64, rate: f64, base_time_step: f64, speed: f64) -> f64 {
    let next = (phase + rate * base_time_step * speed).rem_euclid(TAU);
    if next.is_finite() {
        next
    } else {
        phase
    }
}

/// Closed polyline of `segments + 1` points around the orbit, relative to the parent
pub fn orbit_path(elements: &OrbitalElements, segments: usize) -> Vec<DVec3> {
    let segments = segments.max(1);
    let orientation = elements.orientation();
    (0..=segments)
        .map(|j| {
            let theta = j as f64 / segments as f64 * TAU;
            let r = elements.radius_at(theta);
            orientation * DVec3::new(r * theta.cos(), 0.0, r * theta.sin())
        })
        .collect()
}

/// Render orientation of a spinning, tilted body
///
/// Spin is about the body's own axis, which is then tilted about +Z.
pub fn spin_orientation(axial_tilt: f64, spin: f64) -> DQuat {
    DQuat::from_rotation_z(axial_tilt) * DQuat::from_rotation_y(spin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_periapsis_on_x_axis() {
        let elements = OrbitalElements::from_degrees(35.0, 0.2, 0.0, 0.0);
        let p = orbital_position(&elements, 0.0);
        assert!((p - DVec3::new(28.0, 0.0, 0.0)).length() < EPS);
    }

    #[test]
    fn test_apsides() {
        let elements = OrbitalElements::from_degrees(10.0, 0.5, 0.0, 0.0);
        assert!((elements.radius_at(0.0) - elements.periapsis()).abs() < EPS);
        assert!((elements.radius_at(PI) - elements.apoapsis()).abs() < EPS);
        assert!((elements.periapsis() - 5.0).abs() < EPS);
        assert!((elements.apoapsis() - 15.0).abs() < EPS);
    }

    #[test]
    fn test_circle_when_eccentricity_zero() {
        let elements = OrbitalElements::circular(12.0);
        for step in 0..32 {
            let theta = step as f64 * TAU / 32.0;
            assert!((orbital_position(&elements, theta).length() - 12.0).abs() < EPS);
        }
    }

    #[test]
    fn test_trajectory_is_bounded() {
        for &e in &[0.0, 0.3, 0.9, 0.999] {
            let elements = OrbitalElements::from_degrees(1.0, e, 30.0, 45.0);
            for step in 0..360 {
                let r = orbital_position(&elements, (step as f64).to_radians()).length();
                assert!(r.is_finite());
                assert!(r >= elements.periapsis() - 1e-6);
                assert!(r <= elements.apoapsis() + 1e-6);
            }
        }
    }

    #[test]
    fn test_inclination_tilts_about_x() {
        // Ninety degrees of inclination turns the +Z in-plane point into +/-Y
        let elements = OrbitalElements::from_degrees(1.0, 0.0, 90.0, 0.0);
        let p = orbital_position(&elements, PI / 2.0);
        assert!(p.x.abs() < EPS);
        assert!((p.y.abs() - 1.0).abs() < EPS);
        assert!(p.z.abs() < EPS);
    }

    #[test]
    fn test_ascending_node_rotates_about_y() {
        let elements = OrbitalElements::from_degrees(1.0, 0.0, 0.0, 90.0);
        let p = orbital_position(&elements, 0.0);
        assert!(p.y.abs() < EPS);
        assert!((p.length() - 1.0).abs() < EPS);
        assert!(p.x.abs() < EPS);
    }

    #[test]
    fn test_advance_phase_wraps() {
        let phase = advance_phase(TAU - 0.01, 1.0, 0.1, 1.0);
        assert!((phase - 0.09).abs() < 1e-12);
        assert_eq!(advance_phase(1.0, f64::NAN, 0.1, 1.0), 1.0);
        assert_eq!(advance_phase(1.0, 5.0, 0.1, 0.0), 1.0);
    }

    #[test]
    fn test_orbit_path_closes() {
        let elements = OrbitalElements::from_degrees(35.0, 0.2, 7.0, 48.3);
        let path = orbit_path(&elements, ORBIT_PATH_SEGMENTS);
        assert_eq!(path.len(), ORBIT_PATH_SEGMENTS + 1);
        assert!((path[0] - path[ORBIT_PATH_SEGMENTS]).length() < 1e-9);
        assert!((path[0] - orbital_position(&elements, 0.0)).length() < 1e-9);
    }

    #[test]
    fn test_spin_orientation_tilts_axis() {
        let tilt = 23.4_f64.to_radians();
        let axis = spin_orientation(tilt, 1.3) * DVec3::Y;
        assert!((axis.angle_between(DVec3::Y) - tilt).abs() < 1e-9);
    }
}
