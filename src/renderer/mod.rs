//! Rendering module
//!
//! The engine only talks to a [`RenderBackend`]. The browser build uses the
//! WebGPU SDF pipeline; tests and the native demo use [`HeadlessBackend`].

pub mod frame;
pub mod sdf_pipeline;

pub use frame::{FrameData, RingInstance, SpriteInstance, build_frame};
pub use sdf_pipeline::{GpuBackend, SdfRenderState};

use crate::sim::camera::{Camera, Viewport};
use crate::sim::scene::Scene;

/// Limits shared by every backend (the GPU buffers are sized from these)
pub const MAX_RINGS: usize = 16;
pub const MAX_SPRITES: usize = 1024;

pub trait RenderBackend {
    /// Host element resized (CSS pixels, non-degenerate)
    fn resize(&mut self, viewport: Viewport);

    /// Draw the scene from the camera. `time` is the host timestamp (ms).
    fn render(&mut self, scene: &Scene, camera: &Camera, time: f64);

    /// Release GPU resources; later calls to `render` are no-ops
    fn dispose(&mut self);
}

/// Renderer that builds frames without drawing them
#[derive(Debug)]
pub struct HeadlessBackend {
    viewport: Viewport,
    frames: u64,
    last_frame: FrameData,
    disposed: bool,
}

impl HeadlessBackend {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            frames: 0,
            last_frame: FrameData::default(),
            disposed: false,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_frame(&self) -> &FrameData {
        &self.last_frame
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl RenderBackend for HeadlessBackend {
    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn render(&mut self, scene: &Scene, camera: &Camera, _time: f64) {
        if self.disposed {
            return;
        }
        self.last_frame = build_frame(scene, camera, self.viewport, MAX_RINGS, MAX_SPRITES);
        self.frames += 1;
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.last_frame = FrameData::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_stops_after_dispose() {
        let viewport = Viewport::new(640.0, 480.0);
        let camera = Camera::new(viewport);
        let scene = Scene::new();
        let mut backend = HeadlessBackend::new(viewport);

        backend.render(&scene, &camera, 0.0);
        assert_eq!(backend.frames(), 1);
        backend.dispose();
        backend.render(&scene, &camera, 16.0);
        assert_eq!(backend.frames(), 1);
        assert!(backend.is_disposed());
    }
}
