//! High-precision world transforms
//!
//! Body positions span planetary radii to galactic radii, far beyond what
//! 32-bit floats hold. World state is kept in 64-bit and converted to
//! camera-relative 32-bit values only when handed to the renderer.

use glam::{DQuat, DVec3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// World-space transform with 64-bit precision
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WorldTransform {
    pub position: DVec3,
    pub rotation: DQuat,
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
        }
    }
}

/// Camera-relative transform ready for the GPU
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTransform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl WorldTransform {
    pub fn from_position(position: DVec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Convert to a camera-relative transform for rendering
    ///
    /// Subtraction happens in 64-bit, so the cast only loses precision far
    /// from the camera where it is not visible.
    pub fn to_camera_relative(&self, camera_world_position: DVec3) -> RenderTransform {
        RenderTransform {
            position: to_render_space(self.position, camera_world_position),
            rotation: self.rotation.as_quat(),
        }
    }

    pub fn distance_to(&self, other: &WorldTransform) -> f64 {
        self.position.distance(other.position)
    }

    pub fn translate(&mut self, offset: DVec3) {
        self.position += offset;
    }
}

/// Camera-relative position of a world point
pub fn to_render_space(point: DVec3, camera_world_position: DVec3) -> Vec3 {
    (point - camera_world_position).as_vec3()
}
