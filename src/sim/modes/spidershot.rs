//! Spidershot: one target at a time, placed away from the previous one
//!
//! A hit is worth more the sooner it lands. After every hit or expiry the
//! mode waits out the round's spawn delay before placing the next target.

use glam::{Vec2, Vec3};

use super::{ModeContext, RangeMode, SpawnOutcome, TargetField};
use crate::sim::camera::VisibleBounds;
use crate::sim::raycast::HitProxy;
use crate::sim::scene::Scene;
use crate::sim::scoring::ShotResult;
use crate::sim::state::ModeKind;
use crate::sim::target::TargetId;

pub const TARGET_LIFETIME: f32 = 1.5;
pub const SIZE_FACTOR: f32 = 0.9;
/// Minimum distance from the previous target
pub const MIN_DISTANCE: f32 = 2.0;
const PLACEMENT_ATTEMPTS: u32 = 10;
/// Points per second left on the target's clock
const REACTION_BONUS_RATE: f32 = 0.5;

/// Extra score for hitting a target `age` seconds after it appeared
pub fn reaction_bonus(age: f32) -> f32 {
    ((TARGET_LIFETIME - age) * REACTION_BONUS_RATE).max(0.0)
}

#[derive(Debug, Default)]
pub struct Spidershot {
    field: TargetField,
    current: Option<TargetId>,
    /// Seconds until the next spawn
    cooldown: f32,
    last_position: Option<Vec2>,
}

impl Spidershot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<TargetId> {
        self.current
    }

    pub fn last_position(&self) -> Option<Vec2> {
        self.last_position
    }

    /// Rejection-sample a position away from the last one, keeping the final
    /// sample if every attempt lands too close
    fn pick_position(&self, ctx: &mut ModeContext<'_>) -> Vec2 {
        let mut position = self.field.random_position(ctx.rng);
        if let Some(last) = self.last_position {
            let mut attempts = 1;
            while position.distance(last) < MIN_DISTANCE && attempts < PLACEMENT_ATTEMPTS {
                position = self.field.random_position(ctx.rng);
                attempts += 1;
            }
        }
        position
    }

    fn spawn_next(&mut self, ctx: &mut ModeContext<'_>) {
        if !self.field.can_spawn(ctx.state) {
            return;
        }

        let position = self.pick_position(ctx);
        if let SpawnOutcome::Spawned(id) = self.field.spawn(ctx, position, SIZE_FACTOR) {
            self.last_position = Some(position);
            self.current = Some(id);
        }
    }
}

impl RangeMode for Spidershot {
    fn kind(&self) -> ModeKind {
        ModeKind::Spidershot
    }

    fn start(&mut self, ctx: &mut ModeContext<'_>) {
        self.field.activate();
        self.current = None;
        self.cooldown = 0.0;
        self.last_position = None;
        self.spawn_next(ctx);
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>, dt: f32) {
        if !self.field.is_active() {
            return;
        }

        if self.cooldown > 0.0 {
            self.cooldown -= dt;
            if self.cooldown <= 0.0 && self.current.is_none() {
                self.spawn_next(ctx);
            }
            return;
        }

        match self.current {
            Some(id) => {
                if self.field.expire(ctx, dt, TARGET_LIFETIME) > 0 {
                    log::trace!("Spidershot target {:?} expired", id);
                    self.current = None;
                    self.cooldown = ctx.state.config().spawn_delay_secs();
                }
            }
            // Zero spawn delay, or nothing was placed on an earlier tick
            None => self.spawn_next(ctx),
        }
    }

    fn on_hit(&mut self, ctx: &mut ModeContext<'_>, id: TargetId, point: Vec3) -> f32 {
        let Some(target) = self.field.get(id) else {
            return 0.0;
        };
        let result = target.score(point);
        if result.is_miss() {
            self.on_miss(ctx);
            return 0.0;
        }

        let boosted = ShotResult {
            score: result.score + reaction_bonus(target.age()),
            ..result
        };
        let points = ctx.state.record_hit(boosted);

        self.field.remove(ctx, id);
        self.current = None;
        if ctx.state.is_playing() {
            self.cooldown = ctx.state.config().spawn_delay_secs();
        }
        points
    }

    fn stop(&mut self, scene: &mut Scene) {
        self.field.stop(scene);
        self.current = None;
        self.cooldown = 0.0;
    }

    fn set_visible_bounds(&mut self, bounds: VisibleBounds) {
        self.field.set_bounds(bounds);
    }

    fn hit_test_objects(&self) -> Vec<HitProxy> {
        self.field.hit_proxies()
    }

    fn is_active(&self) -> bool {
        self.field.is_active()
    }

    fn live_targets(&self) -> usize {
        self.field.len()
    }
}
