//! Perspective camera looking at the target plane
//!
//! The camera sits on +Z looking down -Z at the z=0 plane where every target
//! lives. Besides projection it owns the recoil shake, which is applied as a
//! small decaying offset to the eye position.

use glam::{Mat4, Vec2, Vec3};
use rand::Rng;

use super::raycast::Ray;
use crate::consts::{CAMERA_FAR, CAMERA_FOV_DEG, CAMERA_NEAR, CAMERA_Z};

/// Host element size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Zero, negative or non-finite sizes cannot be projected
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width >= 1.0 && self.height >= 1.0)
    }

    pub fn aspect(&self) -> Option<f32> {
        if self.is_degenerate() {
            None
        } else {
            Some(self.width / self.height)
        }
    }
}

/// Half extents of the spawn area on the z=0 plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleBounds {
    pub half_width: f32,
    pub half_height: f32,
}

impl VisibleBounds {
    pub const fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            half_width,
            half_height,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x.abs() <= self.half_width && point.y.abs() <= self.half_height
    }

    pub fn aspect(&self) -> f32 {
        if self.half_height > 0.0 {
            self.half_width / self.half_height
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Shake {
    intensity: f32,
    duration: f32,
    elapsed: f32,
}

#[derive(Debug, Clone)]
pub struct Camera {
    base_position: Vec3,
    /// Current shake displacement (x/y)
    offset: Vec2,
    /// Vertical field of view (radians)
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    shake: Option<Shake>,
}

impl Camera {
    pub fn new(viewport: Viewport) -> Self {
        let aspect = viewport.aspect().unwrap_or(1.0);
        Self {
            base_position: Vec3::new(0.0, 0.0, CAMERA_Z),
            offset: Vec2::ZERO,
            fov_y: CAMERA_FOV_DEG.to_radians(),
            aspect,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            shake: None,
        }
    }

    /// Eye position including shake
    pub fn position(&self) -> Vec3 {
        self.base_position + self.offset.extend(0.0)
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    /// Recompute the projection. Returns false (and keeps the old aspect)
    /// for a degenerate viewport.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        match viewport.aspect() {
            Some(aspect) => {
                self.aspect = aspect;
                true
            }
            None => false,
        }
    }

    /// Visible area at z=0, scaled by `padding`
    pub fn visible_bounds(&self, padding: f32) -> VisibleBounds {
        let distance = self.base_position.z;
        let half_height = (self.fov_y * 0.5).tan() * distance;
        let half_width = half_height * self.aspect;
        VisibleBounds::new(half_width * padding, half_height * padding)
    }

    /// Start a shake; a new shake replaces the running one
    pub fn shake(&mut self, intensity: f32, duration: f32) {
        if duration <= 0.0 {
            return;
        }
        self.shake = Some(Shake {
            intensity,
            duration,
            elapsed: 0.0,
        });
    }

    pub fn is_shaking(&self) -> bool {
        self.shake.is_some()
    }

    /// Advance the shake, jittering the eye with linearly decaying amplitude
    pub fn update(&mut self, dt: f32, rng: &mut impl Rng) {
        let Some(shake) = self.shake.as_mut() else {
            return;
        };

        shake.elapsed += dt;
        if shake.elapsed >= shake.duration {
            self.shake = None;
            self.offset = Vec2::ZERO;
            return;
        }

        let amplitude = shake.intensity * (1.0 - shake.elapsed / shake.duration);
        self.offset = Vec2::new(
            rng.random_range(-1.0f32..=1.0) * amplitude,
            rng.random_range(-1.0f32..=1.0) * amplitude,
        );
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position(), Vec3::NEG_Z, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World ray through a point in normalized device coordinates
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let tan_half = (self.fov_y * 0.5).tan();
        let direction = Vec3::new(ndc.x * tan_half * self.aspect, ndc.y * tan_half, -1.0).normalize();
        Ray::new(self.position(), direction)
    }

    /// Project a world point to element-relative pixels.
    /// `None` when the point is behind the camera.
    pub fn world_to_screen(&self, point: Vec3, viewport: Viewport) -> Option<Vec2> {
        let clip = self.view_projection() * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.width,
            (1.0 - ndc.y) * 0.5 * viewport.height,
        ))
    }

    /// World-space length at the z=0 plane converted to pixels
    pub fn pixels_per_unit(&self, viewport: Viewport) -> f32 {
        let distance = self.position().z;
        let visible_height = 2.0 * (self.fov_y * 0.5).tan() * distance;
        viewport.height / visible_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SPAWN_PADDING;
    use crate::screen_to_ndc;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_center_ray_points_down_z() {
        let camera = Camera::new(Viewport::new(800.0, 600.0));
        let ray = camera.ray_from_ndc(Vec2::ZERO);
        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, CAMERA_Z));
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_projection_round_trip() {
        let viewport = Viewport::new(1280.0, 720.0);
        let camera = Camera::new(viewport);
        let world = Vec3::new(1.5, -0.75, 0.0);
        let screen = camera.world_to_screen(world, viewport).unwrap();

        let ray = camera.ray_from_ndc(screen_to_ndc(screen, viewport.width, viewport.height));
        let t = -ray.origin.z / ray.direction.z;
        let back = ray.at(t);
        assert!((back - world).length() < 1e-3, "{back:?}");
    }

    #[test]
    fn test_visible_bounds_follow_aspect() {
        let mut camera = Camera::new(Viewport::new(1000.0, 500.0));
        let wide = camera.visible_bounds(1.0);
        assert!((wide.aspect() - 2.0).abs() < 1e-5);
        // tan(25deg) * 8
        assert!((wide.half_height - 3.7304).abs() < 1e-3);

        camera.resize(Viewport::new(400.0, 800.0));
        let narrow = camera.visible_bounds(SPAWN_PADDING);
        assert!(narrow.half_width < narrow.half_height);
    }

    #[test]
    fn test_degenerate_resize_keeps_projection() {
        let mut camera = Camera::new(Viewport::new(800.0, 400.0));
        assert!(!camera.resize(Viewport::new(0.0, 400.0)));
        assert!(!camera.resize(Viewport::new(800.0, 0.0)));
        assert_eq!(camera.aspect(), 2.0);

        // Degenerate at construction falls back to square
        let square = Camera::new(Viewport::new(0.0, 0.0));
        assert_eq!(square.aspect(), 1.0);
    }

    #[test]
    fn test_shake_decays_to_rest() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut camera = Camera::new(Viewport::new(800.0, 600.0));
        camera.shake(0.012, 0.06);
        camera.update(0.016, &mut rng);
        let offset = camera.position() - Vec3::new(0.0, 0.0, CAMERA_Z);
        assert!(offset.x.abs() <= 0.012 && offset.y.abs() <= 0.012);
        assert!(camera.is_shaking());

        for _ in 0..5 {
            camera.update(0.016, &mut rng);
        }
        assert!(!camera.is_shaking());
        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, CAMERA_Z));
    }
}
