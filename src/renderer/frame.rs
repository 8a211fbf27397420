//! Scene projection into pixel space
//!
//! Backends never walk the scene themselves: the scene is flattened here into
//! screen-space ring and sprite instances (element-relative pixels, y down).

use glam::Vec2;

use crate::consts::CAMERA_Z;
use crate::sim::camera::{Camera, Viewport};
use crate::sim::scene::{Node, Scene};

/// A target face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingInstance {
    pub center: Vec2,
    pub radius: f32,
}

/// One particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteInstance {
    pub position: Vec2,
    /// Diameter in pixels
    pub size: f32,
    pub color: [f32; 3],
    pub opacity: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameData {
    pub rings: Vec<RingInstance>,
    pub sprites: Vec<SpriteInstance>,
}

impl FrameData {
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty() && self.sprites.is_empty()
    }
}

/// Flatten `scene` for `camera`, keeping at most `max_rings` / `max_sprites`
pub fn build_frame(
    scene: &Scene,
    camera: &Camera,
    viewport: Viewport,
    max_rings: usize,
    max_sprites: usize,
) -> FrameData {
    let mut frame = FrameData::default();
    if viewport.is_degenerate() {
        return frame;
    }
    let pixels_per_unit = camera.pixels_per_unit(viewport);
    let eye_z = camera.position().z;

    for (_, node) in scene.nodes() {
        match node {
            Node::Target(visual) => {
                if frame.rings.len() >= max_rings {
                    continue;
                }
                if let Some(center) = camera.world_to_screen(visual.center, viewport) {
                    frame.rings.push(RingInstance {
                        center,
                        radius: visual.radius * pixels_per_unit,
                    });
                }
            }
            Node::Particles(cloud) => {
                if cloud.opacity <= 0.0 || cloud.size <= 0.0 {
                    continue;
                }
                for (position, color) in cloud.positions.iter().zip(&cloud.colors) {
                    if frame.sprites.len() >= max_sprites {
                        break;
                    }
                    let depth = eye_z - position.z;
                    if depth <= 0.0 {
                        continue;
                    }
                    let Some(screen) = camera.world_to_screen(*position, viewport) else {
                        continue;
                    };
                    // Size attenuation relative to the target plane
                    let attenuation = CAMERA_Z / depth;
                    frame.sprites.push(SpriteInstance {
                        position: screen,
                        size: cloud.size * pixels_per_unit * attenuation,
                        color: *color,
                        opacity: cloud.opacity,
                    });
                }
            }
        }
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::scene::{ParticleCloud, TargetVisual};
    use glam::Vec3;

    #[test]
    fn test_target_at_origin_is_screen_center() {
        let viewport = Viewport::new(800.0, 600.0);
        let camera = Camera::new(viewport);
        let mut scene = Scene::new();
        scene.add(Node::Target(TargetVisual {
            center: Vec3::ZERO,
            radius: 0.6,
        }));

        let frame = build_frame(&scene, &camera, viewport, 16, 16);
        assert_eq!(frame.rings.len(), 1);
        let ring = frame.rings[0];
        assert!((ring.center - Vec2::new(400.0, 300.0)).length() < 1e-3);
        assert!((ring.radius - 0.6 * camera.pixels_per_unit(viewport)).abs() < 1e-3);
    }

    #[test]
    fn test_limits_and_invisible_clouds() {
        let viewport = Viewport::new(800.0, 600.0);
        let camera = Camera::new(viewport);
        let mut scene = Scene::new();
        scene.add(Node::Particles(ParticleCloud::at(Vec3::ZERO, 40, [1.0; 3], 0.08)));
        let mut faded = ParticleCloud::at(Vec3::ZERO, 10, [1.0; 3], 0.08);
        faded.opacity = 0.0;
        scene.add(Node::Particles(faded));

        let frame = build_frame(&scene, &camera, viewport, 16, 32);
        assert_eq!(frame.sprites.len(), 32);
    }

    #[test]
    fn test_degenerate_viewport_draws_nothing() {
        let camera = Camera::new(Viewport::new(800.0, 600.0));
        let mut scene = Scene::new();
        scene.add(Node::Target(TargetVisual {
            center: Vec3::ZERO,
            radius: 0.6,
        }));
        assert!(build_frame(&scene, &camera, Viewport::new(0.0, 0.0), 16, 16).is_empty());
    }
}
