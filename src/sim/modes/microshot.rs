//! Microshot: up to five small, well-spaced targets
//!
//! Hits pay 1.5x for precision. Replacements arrive after the round's spawn
//! delay, tracked as countdowns; a placement that finds no spot with enough
//! spacing is retried on the next tick.

use glam::{Vec2, Vec3};

use super::{ModeContext, RangeMode, SpawnOutcome, TargetField};
use crate::sim::camera::VisibleBounds;
use crate::sim::raycast::HitProxy;
use crate::sim::scene::Scene;
use crate::sim::scoring::ShotResult;
use crate::sim::state::ModeKind;
use crate::sim::target::TargetId;

pub const MAX_VISIBLE: usize = 5;
pub const TARGET_LIFETIME: f32 = 3.0;
pub const SIZE_FACTOR: f32 = 0.5;
/// Minimum center-to-center distance between live targets
pub const MIN_SPACING: f32 = 1.5;
pub const PRECISION_MULTIPLIER: f32 = 1.5;
const PLACEMENT_ATTEMPTS: u32 = 20;

#[derive(Debug, Default)]
pub struct Microshot {
    field: TargetField,
    /// Countdowns (seconds) for delayed replacements
    pending: Vec<f32>,
    /// Spawns due now that have not found room yet
    owed: usize,
}

impl Microshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_spawns(&self) -> usize {
        self.pending.len() + self.owed
    }

    fn find_position(&self, ctx: &mut ModeContext<'_>) -> Option<Vec2> {
        let existing: Vec<Vec2> = self.field.positions().collect();
        (0..PLACEMENT_ATTEMPTS)
            .map(|_| self.field.random_position(ctx.rng))
            .find(|candidate| existing.iter().all(|p| candidate.distance(*p) >= MIN_SPACING))
    }

    fn try_spawn(&mut self, ctx: &mut ModeContext<'_>) -> SpawnOutcome {
        if !self.field.can_spawn(ctx.state) || self.field.len() >= MAX_VISIBLE {
            return SpawnOutcome::Exhausted;
        }
        match self.find_position(ctx) {
            Some(position) => self.field.spawn(ctx, position, SIZE_FACTOR),
            None => {
                log::debug!("Microshot: placement attempts exhausted, retrying next tick");
                SpawnOutcome::NoRoom
            }
        }
    }

    /// Attempt `count` spawns, carrying failed placements over as owed
    fn spawn_batch(&mut self, ctx: &mut ModeContext<'_>, count: usize) {
        for _ in 0..count {
            if self.try_spawn(ctx) == SpawnOutcome::NoRoom {
                self.owed += 1;
            }
        }
    }

    fn schedule_replacement(&mut self, ctx: &ModeContext<'_>) {
        if ctx.state.is_playing() {
            self.pending.push(ctx.state.config().spawn_delay_secs());
        }
    }
}

impl RangeMode for Microshot {
    fn kind(&self) -> ModeKind {
        ModeKind::Microshot
    }

    fn start(&mut self, ctx: &mut ModeContext<'_>) {
        self.field.activate();
        self.pending.clear();
        self.owed = 0;
        self.spawn_batch(ctx, MAX_VISIBLE);
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>, dt: f32) {
        if !self.field.is_active() {
            return;
        }

        // Countdowns queued by this tick's expiries start on the next tick
        let queued = self.pending.len();
        let expired = self.field.expire(ctx, dt, TARGET_LIFETIME);
        for _ in 0..expired {
            self.schedule_replacement(ctx);
        }

        let before = self.pending.len();
        let mut index = 0;
        self.pending.retain_mut(|remaining| {
            if index < queued {
                *remaining -= dt;
            }
            index += 1;
            *remaining > 0.0
        });
        let due = before - self.pending.len() + std::mem::take(&mut self.owed);

        if due > 0 && ctx.state.is_playing() {
            self.spawn_batch(ctx, due);
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

        let points = ctx.state.record_hit(ShotResult {
            score: result.score * PRECISION_MULTIPLIER,
            is_x_ring: result.is_x_ring,
            bonus: result.bonus * PRECISION_MULTIPLIER,
        });

        self.field.remove(ctx, id);
        self.schedule_replacement(ctx);
        points
    }

    fn stop(&mut self, scene: &mut Scene) {
        self.field.stop(scene);
        self.pending.clear();
        self.owed = 0;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{BASE_TARGET_RADIUS, SIM_DT};
    use crate::sim::modes::test_support::{Rig, first_target};

    fn started(seed: u64, bounds: VisibleBounds) -> (Microshot, Rig) {
        let mut rig = Rig::new(ModeKind::Microshot, seed);
        let mut mode = Microshot::new();
        mode.set_visible_bounds(bounds);
        mode.start(&mut rig.ctx());
        (mode, rig)
    }

    fn wide() -> VisibleBounds {
        VisibleBounds::new(4.8, 2.9)
    }

    fn assert_spacing(mode: &Microshot) {
        let positions: Vec<Vec2> = mode.field.positions().collect();
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                assert!(a.distance(*b) >= MIN_SPACING, "{a:?} {b:?}");
            }
        }
    }

    #[test]
    fn test_start_spawns_small_spaced_targets() {
        let (mode, _rig) = started(31, wide());
        assert_eq!(mode.live_targets(), MAX_VISIBLE);
        assert_spacing(&mode);

        let radius = mode.hit_test_objects()[0].radius;
        assert!((radius - BASE_TARGET_RADIUS * 0.5 * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_precision_multiplier() {
        let (mut mode, mut rig) = started(32, wide());
        let proxy = first_target(&mode).unwrap();
        let points = mode.on_hit(&mut rig.ctx(), proxy.target_id, proxy.center);
        assert!((points - (10.9 + 2.0) * 1.5).abs() < 1e-4);
        assert!((rig.state.shot_scores()[0] - 16.35).abs() < 1e-4);
    }

    #[test]
    fn test_replacement_waits_for_delay() {
        let (mut mode, mut rig) = started(33, wide());
        let proxy = first_target(&mode).unwrap();
        mode.on_hit(&mut rig.ctx(), proxy.target_id, proxy.center);
        assert_eq!(mode.live_targets(), 4);
        assert_eq!(mode.pending_spawns(), 1);

        // 200ms delay
        rig.run(&mut mode, 0.15, |m| assert_eq!(m.live_targets(), 4));
        rig.run(&mut mode, 0.1, |_| {});
        assert_eq!(mode.live_targets(), MAX_VISIBLE);
        assert_spacing(&mode);
    }

    #[test]
    fn test_cramped_bounds_defer_spawns() {
        // Room for barely one target at 1.5 spacing
        let (mut mode, mut rig) = started(34, VisibleBounds::new(0.5, 0.5));
        assert_eq!(mode.live_targets(), 1);
        assert_eq!(mode.pending_spawns(), 4);

        rig.run(&mut mode, 0.5, |m| assert!(m.live_targets() <= MAX_VISIBLE));
        assert_eq!(mode.live_targets(), 1);

        // Widen the field: owed spawns land on the next tick
        mode.set_visible_bounds(wide());
        rig.run(&mut mode, SIM_DT, |_| {});
        assert_eq!(mode.live_targets(), MAX_VISIBLE);
        assert_eq!(mode.pending_spawns(), 0);
    }

    #[test]
    fn test_expiry_counts_miss_and_respawns() {
        let (mut mode, mut rig) = started(35, wide());
        rig.run(&mut mode, TARGET_LIFETIME + 0.05, |m| {
            assert!(m.live_targets() <= MAX_VISIBLE)
        });
        assert_eq!(rig.state.misses(), 5);
        assert_eq!(rig.state.score(), 0.0);

        rig.run(&mut mode, 0.25, |_| {});
        assert_eq!(mode.live_targets(), MAX_VISIBLE);
    }

    /// Ticks until the field is back to full strength
    fn ticks_to_refill(mode: &mut Microshot, rig: &mut Rig) -> u32 {
        let mut ticks = 0;
        while mode.live_targets() < MAX_VISIBLE {
            rig.run(&mut *mode, SIM_DT, |_| {});
            ticks += 1;
            assert!(ticks < 120, "field never refilled");
        }
        ticks
    }

    #[test]
    fn test_expiry_replacement_waits_full_delay() {
        let (mut hit_mode, mut hit_rig) = started(37, wide());
        let proxy = first_target(&hit_mode).unwrap();
        hit_mode.on_hit(&mut hit_rig.ctx(), proxy.target_id, proxy.center);
        let after_hit = ticks_to_refill(&mut hit_mode, &mut hit_rig);

        let (mut mode, mut rig) = started(37, wide());
        while rig.state.misses() == 0 {
            rig.run(&mut mode, SIM_DT, |_| {});
        }
        assert_eq!(mode.pending_spawns(), MAX_VISIBLE);
        let after_expiry = ticks_to_refill(&mut mode, &mut rig);

        assert!(after_hit > 1);
        assert_eq!(after_expiry, after_hit);
    }

    #[test]
    fn test_stop_drops_pending_respawns() {
        let (mut mode, mut rig) = started(36, wide());
        let proxy = first_target(&mode).unwrap();
        mode.on_hit(&mut rig.ctx(), proxy.target_id, proxy.center);
        mode.stop(&mut rig.scene);
        assert_eq!(mode.pending_spawns(), 0);

        rig.run(&mut mode, 1.0, |_| {});
        assert_eq!(mode.live_targets(), 0);
        assert!(rig.scene.is_empty());
    }
}
