//! Target entity
//!
//! A circular face on the z=0 plane. Position and radius are fixed at spawn;
//! the only thing that changes is how long it has been visible.

use glam::{Vec2, Vec3};

use super::raycast::HitProxy;
use super::scene::NodeId;
use super::scoring::{ShotResult, score_at};
use crate::error::RangeError;

/// Unique (per mode instance) target identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u32);

#[derive(Debug, Clone)]
pub struct Target {
    id: TargetId,
    position: Vec2,
    radius: f32,
    /// Seconds since spawn
    age: f32,
    /// Scene node for the visual (owned by whoever spawned the target)
    node: NodeId,
}

impl Target {
    pub fn new(id: TargetId, position: Vec2, radius: f32, node: NodeId) -> Result<Self, RangeError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(RangeError::InvalidTargetRadius { radius });
        }
        Ok(Self {
            id,
            position,
            radius,
            age: 0.0,
            node,
        })
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Center in world space (targets sit on z=0)
    pub fn center(&self) -> Vec3 {
        self.position.extend(0.0)
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Advance the visible timer, returns the new age
    pub fn tick(&mut self, dt: f32) -> f32 {
        self.age += dt;
        self.age
    }

    /// Decimal score for a world-space hit point
    pub fn score(&self, hit_point: Vec3) -> ShotResult {
        score_at(hit_point.truncate(), self.position, self.radius)
    }

    /// Invisible hit-test disc for the raycaster
    pub fn hit_proxy(&self) -> HitProxy {
        HitProxy {
            target_id: self.id,
            center: self.center(),
            radius: self.radius,
        }
    }
}
