//! Perspective projection and screen-space helpers
//!
//! Matrices are built in 64-bit with the camera at the origin, matching the
//! camera-relative positions handed to the renderer.

use crate::config::{CameraConfig, ViewportConfig};
use glam::{DMat4, DVec3, DVec4};
use serde::{Deserialize, Serialize};

/// Drawable area in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl From<ViewportConfig> for Viewport {
    fn from(config: ViewportConfig) -> Self {
        Self::new(config.width, config.height)
    }
}

/// Camera position and the point it orbits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraRig {
    pub position: DVec3,
    pub target: DVec3,
}

impl CameraRig {
    pub fn new(position: DVec3, target: DVec3) -> Self {
        Self { position, target }
    }

    /// Target to camera
    pub fn offset(&self) -> DVec3 {
        self.position - self.target
    }

    pub fn distance(&self) -> f64 {
        self.offset().length()
    }

    /// Unit vector the camera looks along
    pub fn forward(&self) -> DVec3 {
        (self.target - self.position).normalize_or(DVec3::NEG_Z)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.target.is_finite()
    }
}

/// Up vector, swapped out when looking straight along the Y axis
fn up_for(forward: DVec3) -> DVec3 {
    if forward.cross(DVec3::Y).length_squared() < 1e-12 {
        DVec3::NEG_Z
    } else {
        DVec3::Y
    }
}

/// Half-line from the camera through a pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    /// Unit length
    pub direction: DVec3,
}

impl Ray {
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }
}

/// A world point projected to the screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// Pixels from the left edge
    pub x: f64,
    /// Pixels from the top edge
    pub y: f64,
    /// Normalized device depth
    pub depth: f64,
    pub in_front: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub fov_y_radians: f64,
    pub aspect_ratio: f64,
    pub z_near: f64,
    pub z_far: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(45.0, 16.0 / 9.0, 0.1, 1e12)
    }
}

impl Camera {
    pub fn perspective(fov_y_degrees: f64, aspect_ratio: f64, z_near: f64, z_far: f64) -> Self {
        Self {
            fov_y_radians: fov_y_degrees.to_radians(),
            aspect_ratio,
            z_near,
            z_far,
        }
    }

    pub fn from_config(config: &CameraConfig, viewport: Viewport) -> Self {
        Self::perspective(
            config.fov_y_degrees,
            viewport.aspect_ratio(),
            config.z_near,
            config.z_far,
        )
    }

    pub fn projection_matrix(&self) -> DMat4 {
        DMat4::perspective_rh(self.fov_y_radians, self.aspect_ratio, self.z_near, self.z_far)
    }

    /// View matrix with the camera at the origin
    pub fn view_matrix(rig: &CameraRig) -> DMat4 {
        let forward = rig.forward();
        DMat4::look_to_rh(DVec3::ZERO, forward, up_for(forward))
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f64) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Project a world point to pixel coordinates
    pub fn project_to_screen(&self, rig: &CameraRig, point: DVec3, viewport: Viewport) -> ScreenPoint {
        let relative = point - rig.position;
        let clip = self.projection_matrix()
            * Self::view_matrix(rig)
            * DVec4::new(relative.x, relative.y, relative.z, 1.0);

        if clip.w.abs() < f64::EPSILON {
            return ScreenPoint {
                x: 0.0,
                y: 0.0,
                depth: 0.0,
                in_front: false,
            };
        }

        let ndc = clip.truncate() / clip.w;
        ScreenPoint {
            x: (ndc.x + 1.0) * 0.5 * viewport.width as f64,
            y: (1.0 - ndc.y) * 0.5 * viewport.height as f64,
            depth: ndc.z,
            in_front: clip.w > 0.0,
        }
    }

    /// Ray from the camera through pixel `(x, y)`
    ///
    /// Built from the camera basis rather than by inverting the projection,
    /// which loses precision with a far plane this distant.
    pub fn screen_ray(&self, rig: &CameraRig, x: f64, y: f64, viewport: Viewport) -> Ray {
        let ndc_x = 2.0 * x / viewport.width as f64 - 1.0;
        let ndc_y = 1.0 - 2.0 * y / viewport.height as f64;

        let forward = rig.forward();
        let right = forward.cross(up_for(forward)).normalize();
        let up = right.cross(forward);
        let tan_half = (self.fov_y_radians * 0.5).tan();

        let direction = forward
            + right * (ndc_x * tan_half * self.aspect_ratio)
            + up * (ndc_y * tan_half);
        Ray {
            origin: rig.position,
            direction: direction.normalize(),
        }
    }
}
