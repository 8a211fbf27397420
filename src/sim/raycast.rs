//! Ray casting against target hit proxies
//!
//! Every live target exposes an invisible disc facing the camera. A fire
//! event is turned into a camera ray and intersected with those discs; the
//! closest intersection wins.

use glam::{Vec2, Vec3};

use super::camera::{Camera, Viewport};
use super::target::TargetId;
use crate::consts::{CAMERA_FAR, CAMERA_NEAR};
use crate::screen_to_ndc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Invisible hit-test disc tagged with the target it stands for.
/// The disc lies in the plane `z = center.z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitProxy {
    pub target_id: TargetId,
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub target_id: TargetId,
    /// Exact world-space intersection
    pub point: Vec3,
    /// Distance along the ray
    pub distance: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Raycaster {
    near: f32,
    far: f32,
}

impl Default for Raycaster {
    fn default() -> Self {
        Self {
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
        }
    }
}

impl Raycaster {
    pub fn new(near: f32, far: f32) -> Self {
        Self { near, far }
    }

    /// Cast from the camera through an element-relative screen point
    pub fn cast(
        &self,
        camera: &Camera,
        screen: Vec2,
        viewport: Viewport,
        proxies: &[HitProxy],
    ) -> Option<RayHit> {
        if viewport.is_degenerate() {
            return None;
        }
        let ndc = screen_to_ndc(screen, viewport.width, viewport.height);
        self.cast_ray(&camera.ray_from_ndc(ndc), proxies, self.far)
    }

    /// Nearest proxy hit along an arbitrary ray within `[near, max_distance]`
    pub fn cast_ray(&self, ray: &Ray, proxies: &[HitProxy], max_distance: f32) -> Option<RayHit> {
        let far = max_distance.min(self.far);
        let mut best: Option<(RayHit, f32)> = None;

        for proxy in proxies {
            let Some((hit, offset)) = intersect_disc(ray, proxy) else {
                continue;
            };
            if hit.distance < self.near || hit.distance > far {
                continue;
            }

            let closer = match &best {
                None => true,
                Some((current, current_offset)) => {
                    hit.distance < current.distance
                        || (hit.distance == current.distance && offset < *current_offset)
                }
            };
            if closer {
                best = Some((hit, offset));
            }
        }

        best.map(|(hit, _)| hit)
    }
}

/// Ray/disc intersection. Returns the hit and its distance from the disc center.
fn intersect_disc(ray: &Ray, proxy: &HitProxy) -> Option<(RayHit, f32)> {
    let dz = ray.direction.z;
    if dz.abs() < f32::EPSILON {
        return None;
    }

    let t = (proxy.center.z - ray.origin.z) / dz;
    if t < 0.0 {
        return None;
    }

    let point = ray.at(t);
    let offset = point.truncate().distance(proxy.center.truncate());
    if offset > proxy.radius {
        return None;
    }

    Some((
        RayHit {
            target_id: proxy.target_id,
            point,
            distance: t,
        },
        offset,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::CAMERA_Z;

    fn proxy(id: u32, x: f32, y: f32, z: f32, radius: f32) -> HitProxy {
        HitProxy {
            target_id: TargetId(id),
            center: Vec3::new(x, y, z),
            radius,
        }
    }

    #[test]
    fn test_center_click_hits_center_target() {
        let viewport = Viewport::new(800.0, 600.0);
        let camera = Camera::new(viewport);
        let proxies = [proxy(1, 0.0, 0.0, 0.0, 0.5), proxy(2, 2.0, 0.0, 0.0, 0.5)];

        let hit = Raycaster::default()
            .cast(&camera, Vec2::new(400.0, 300.0), viewport, &proxies)
            .unwrap();
        assert_eq!(hit.target_id, TargetId(1));
        assert!(hit.point.truncate().length() < 1e-5);
        assert!((hit.distance - CAMERA_Z).abs() < 1e-4);
    }

    #[test]
    fn test_no_proxies_is_none() {
        let viewport = Viewport::new(800.0, 600.0);
        let camera = Camera::new(viewport);
        assert!(
            Raycaster::default()
                .cast(&camera, Vec2::new(10.0, 10.0), viewport, &[])
                .is_none()
        );
    }

    #[test]
    fn test_nearest_wins() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 8.0), Vec3::NEG_Z);
        let proxies = [proxy(1, 0.0, 0.0, 0.0, 1.0), proxy(2, 0.0, 0.0, 1.0, 1.0)];
        let hit = Raycaster::default().cast_ray(&ray, &proxies, 100.0).unwrap();
        assert_eq!(hit.target_id, TargetId(2));
    }

    #[test]
    fn test_tie_prefers_closest_center() {
        let ray = Ray::new(Vec3::new(0.1, 0.0, 8.0), Vec3::NEG_Z);
        let proxies = [proxy(1, 0.5, 0.0, 0.0, 1.0), proxy(2, 0.0, 0.0, 0.0, 1.0)];
        let hit = Raycaster::default().cast_ray(&ray, &proxies, 100.0).unwrap();
        assert_eq!(hit.target_id, TargetId(2));
    }

    #[test]
    fn test_respects_range_and_direction() {
        let caster = Raycaster::default();
        let proxies = [proxy(1, 0.0, 0.0, 0.0, 1.0)];

        let away = Ray::new(Vec3::new(0.0, 0.0, 8.0), Vec3::Z);
        assert!(caster.cast_ray(&away, &proxies, 100.0).is_none());

        let toward = Ray::new(Vec3::new(0.0, 0.0, 8.0), Vec3::NEG_Z);
        assert!(caster.cast_ray(&toward, &proxies, 5.0).is_none());

        let grazing = Ray::new(Vec3::new(0.0, 0.0, 8.0), Vec3::X);
        assert!(caster.cast_ray(&grazing, &proxies, 100.0).is_none());
    }
}
