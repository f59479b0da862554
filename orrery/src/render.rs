//! Renderer collaborator
//!
//! The viewer never draws anything itself. It describes primitives once at
//! startup, pushes their per-frame state, and asks the backend to render.
//! All positions handed across this boundary are camera-relative `f32`.

use crate::camera::Viewport;
use crate::galaxy::AsteroidOrbit;
use crate::scale::ViewRegime;
use glam::{DVec3, Mat4, Quat, Vec3};

/// Opaque handle to a renderable primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderHandle(pub u32);

/// Opaque handle to a screen-space label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelHandle(pub u32);

/// What a primitive is. Geometry is fixed at creation.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveKind {
    /// Point cloud with a shared color and size
    Points {
        positions: Vec<Vec3>,
        color: u32,
        size: f32,
    },
    /// Polyline in the primitive's local space
    Line { points: Vec<Vec3>, color: u32 },
    /// Textured sphere
    Mesh {
        radius: f32,
        texture: String,
        albedo: f32,
    },
    /// Flat annulus around a mesh
    Ring {
        inner_radius: f32,
        outer_radius: f32,
        texture: String,
    },
    /// Camera-facing quad with additive blending
    Sprite {
        texture: String,
        size: f32,
        color: u32,
    },
    /// Square textured plane in the XZ plane
    Plane { size: f32, texture: String },
    PointLight { color: u32, power: f32 },
    /// Instanced asteroids animated by `PrimitiveState::animation_time`
    AsteroidField {
        orbits: Vec<AsteroidOrbit>,
        texture: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveDesc {
    pub name: String,
    pub kind: PrimitiveKind,
}

/// Per-frame state of a primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveState {
    /// Camera-relative position
    pub position: Vec3,
    pub orientation: Quat,
    pub opacity: f32,
    pub visible: bool,
    pub animation_time: f32,
}

impl Default for PrimitiveState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            opacity: 0.0,
            visible: false,
            animation_time: 0.0,
        }
    }
}

/// Per-frame state of a label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelState {
    /// Screen position in pixels, origin top-left
    pub x: f32,
    pub y: f32,
    /// Higher values draw on top
    pub z_order: u32,
    pub opacity: f32,
    pub visible: bool,
    pub clickable: bool,
}

impl Default for LabelState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z_order: 0,
            opacity: 0.0,
            visible: false,
            clickable: false,
        }
    }
}

/// Camera data for one rendered frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    pub camera_position: DVec3,
    /// View matrix with the camera at the origin
    pub view: Mat4,
    pub projection: Mat4,
    pub viewport: Viewport,
    pub regime: ViewRegime,
}

/// External renderer
pub trait RenderBackend {
    fn create_primitive(&mut self, desc: PrimitiveDesc) -> RenderHandle;
    fn update_primitive(&mut self, handle: RenderHandle, state: &PrimitiveState);
    fn create_label(&mut self, text: &str) -> LabelHandle;
    fn update_label(&mut self, handle: LabelHandle, state: &LabelState);
    fn render(&mut self, view: &FrameView);
}

#[derive(Debug, Clone)]
pub struct RecordedPrimitive {
    pub desc: PrimitiveDesc,
    pub state: PrimitiveState,
    pub updates: u64,
}

#[derive(Debug, Clone)]
pub struct RecordedLabel {
    pub text: String,
    pub state: LabelState,
}

/// Backend that keeps the latest state of everything it is given
///
/// Used by the headless host and by tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    primitives: Vec<RecordedPrimitive>,
    labels: Vec<RecordedLabel>,
    frames: usize,
    last_view: Option<FrameView>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primitive(&self, handle: RenderHandle) -> Option<&RecordedPrimitive> {
        self.primitives.get(handle.0 as usize)
    }

    pub fn label(&self, handle: LabelHandle) -> Option<&RecordedLabel> {
        self.labels.get(handle.0 as usize)
    }

    /// First primitive created under `name`
    pub fn primitive_named(&self, name: &str) -> Option<&RecordedPrimitive> {
        self.primitives.iter().find(|p| p.desc.name == name)
    }

    /// All labels showing `text`; stars own one per scale
    pub fn labels_with_text<'a>(
        &'a self,
        text: &'a str,
    ) -> impl Iterator<Item = &'a RecordedLabel> + 'a {
        self.labels.iter().filter(move |label| label.text == text)
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn frames_rendered(&self) -> usize {
        self.frames
    }

    pub fn last_frame(&self) -> Option<&FrameView> {
        self.last_view.as_ref()
    }
}

impl RenderBackend for RecordingBackend {
    fn create_primitive(&mut self, desc: PrimitiveDesc) -> RenderHandle {
        let handle = RenderHandle(self.primitives.len() as u32);
        self.primitives.push(RecordedPrimitive {
            desc,
            state: PrimitiveState::default(),
            updates: 0,
        });
        handle
    }

    fn update_primitive(&mut self, handle: RenderHandle, state: &PrimitiveState) {
        if let Some(primitive) = self.primitives.get_mut(handle.0 as usize) {
            primitive.state = *state;
            primitive.updates += 1;
        }
    }

    fn create_label(&mut self, text: &str) -> LabelHandle {
        let handle = LabelHandle(self.labels.len() as u32);
        self.labels.push(RecordedLabel {
            text: text.to_string(),
            state: LabelState::default(),
        });
        handle
    }

    fn update_label(&mut self, handle: LabelHandle, state: &LabelState) {
        if let Some(label) = self.labels.get_mut(handle.0 as usize) {
            label.state = *state;
        }
    }

    fn render(&mut self, view: &FrameView) {
        self.frames += 1;
        self.last_view = Some(*view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_backend_tracks_state() {
        let mut backend = RecordingBackend::new();
        let handle = backend.create_primitive(PrimitiveDesc {
            name: "Earth".to_string(),
            kind: PrimitiveKind::Mesh {
                radius: 0.1,
                texture: "earth".to_string(),
                albedo: 0.31,
            },
        });
        let state = PrimitiveState {
            opacity: 0.5,
            visible: true,
            ..Default::default()
        };
        backend.update_primitive(handle, &state);

        let recorded = backend.primitive(handle).unwrap();
        assert_eq!(recorded.state.opacity, 0.5);
        assert_eq!(recorded.updates, 1);
        assert!(backend.primitive_named("Earth").is_some());
    }

    #[test]
    fn test_unknown_handles_are_ignored() {
        let mut backend = RecordingBackend::new();
        backend.update_primitive(RenderHandle(42), &PrimitiveState::default());
        backend.update_label(LabelHandle(7), &LabelState::default());
        assert_eq!(backend.primitive_count(), 0);
        assert_eq!(backend.label_count(), 0);
    }
}
