//! Training modes
//!
//! A mode decides where and when targets appear, how long they stay, and
//! what a hit is worth. Each mode exclusively owns the targets it spawned
//! (and their scene nodes) through a [`TargetField`]; stopping a mode
//! releases all of them synchronously.
//!
//! Spawn delays are countdowns advanced in the mode's own `update`, so a
//! stopped mode can never spawn late.

pub mod gridshot;
pub mod microshot;
pub mod spidershot;

pub use gridshot::Gridshot;
pub use microshot::Microshot;
pub use spidershot::Spidershot;

use std::collections::BTreeMap;

use glam::{Vec2, Vec3};
use rand::Rng;
use rand_pcg::Pcg32;

use super::camera::VisibleBounds;
use super::raycast::HitProxy;
use super::scene::{Node, Scene, TargetVisual};
use super::state::{GameState, ModeKind};
use super::target::{Target, TargetId};
use crate::consts::BASE_TARGET_RADIUS;

/// Bounds used until the engine pushes real ones
const FALLBACK_BOUNDS: VisibleBounds = VisibleBounds::new(4.0, 3.0);

/// Everything a mode may touch while handling a tick or a shot
pub struct ModeContext<'a> {
    pub state: &'a mut GameState,
    pub scene: &'a mut Scene,
    pub rng: &'a mut Pcg32,
}

/// Common contract the engine drives every mode through
pub trait RangeMode {
    fn kind(&self) -> ModeKind;

    /// Activate and place the opening targets
    fn start(&mut self, ctx: &mut ModeContext<'_>);

    /// Age targets, expire them as misses, and run pending spawns
    fn update(&mut self, ctx: &mut ModeContext<'_>, dt: f32);

    /// A ray hit one of this mode's targets. Returns the points awarded.
    fn on_hit(&mut self, ctx: &mut ModeContext<'_>, id: TargetId, point: Vec3) -> f32;

    /// A shot hit nothing
    fn on_miss(&mut self, ctx: &mut ModeContext<'_>) {
        ctx.state.record_miss();
    }

    /// Deactivate and release every live target
    fn stop(&mut self, scene: &mut Scene);

    fn set_visible_bounds(&mut self, bounds: VisibleBounds);

    /// One hit proxy per live target
    fn hit_test_objects(&self) -> Vec<HitProxy>;

    fn is_active(&self) -> bool;

    fn live_targets(&self) -> usize;
}

/// Result of a spawn attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    Spawned(TargetId),
    /// Mode inactive or out of budget (also used for rejected geometry)
    Exhausted,
    /// No valid position this tick; try again later
    NoRoom,
}

/// Target storage and bookkeeping shared by every mode
#[derive(Debug)]
pub struct TargetField {
    targets: BTreeMap<TargetId, Target>,
    bounds: VisibleBounds,
    active: bool,
    next_id: u32,
}

impl Default for TargetField {
    fn default() -> Self {
        Self {
            targets: BTreeMap::new(),
            bounds: FALLBACK_BOUNDS,
            active: false,
            next_id: 0,
        }
    }
}

impl TargetField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn bounds(&self) -> VisibleBounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: VisibleBounds) {
        self.bounds = bounds;
    }

    /// Whether another target may be spawned this round
    pub fn can_spawn(&self, state: &GameState) -> bool {
        self.active && state.targets_spawned() < state.config().total_targets
    }

    /// Create a target and its visual. `size` is the mode's size factor.
    pub fn spawn(&mut self, ctx: &mut ModeContext<'_>, position: Vec2, size: f32) -> SpawnOutcome {
        if !self.can_spawn(ctx.state) {
            return SpawnOutcome::Exhausted;
        }

        let radius = BASE_TARGET_RADIUS * size * ctx.state.config().target_size;
        let id = TargetId(self.next_id);
        let node = ctx.scene.add(Node::Target(TargetVisual {
            center: position.extend(0.0),
            radius,
        }));

        let target = match Target::new(id, position, radius, node) {
            Ok(target) => target,
            Err(err) => {
                ctx.scene.remove(node);
                log::warn!("Target spawn rejected: {err}");
                return SpawnOutcome::Exhausted;
            }
        };

        self.next_id += 1;
        self.targets.insert(id, target);
        ctx.state.target_spawned();
        log::trace!("Spawned {:?} at ({:.2}, {:.2}) r={:.3}", id, position.x, position.y, radius);
        SpawnOutcome::Spawned(id)
    }

    /// Release a target's visual and drop it. `None` if it was already gone.
    pub fn remove(&mut self, ctx: &mut ModeContext<'_>, id: TargetId) -> Option<Target> {
        let target = self.targets.remove(&id)?;
        ctx.scene.remove(target.node());
        ctx.state.target_destroyed();
        Some(target)
    }

    /// Age every target; returns the ids whose lifetime ran out (by id order)
    pub fn tick(&mut self, dt: f32, lifetime: f32) -> Vec<TargetId> {
        self.targets
            .values_mut()
            .filter_map(|target| (target.tick(dt) >= lifetime).then_some(target.id()))
            .collect()
    }

    /// Remove expired targets, each one counting as a miss.
    /// Returns how many expired.
    pub fn expire(&mut self, ctx: &mut ModeContext<'_>, dt: f32, lifetime: f32) -> usize {
        let expired = self.tick(dt, lifetime);
        for id in &expired {
            if self.remove(ctx, *id).is_some() {
                ctx.state.record_miss();
            }
        }
        expired.len()
    }

    /// Deactivate and release every target
    pub fn stop(&mut self, scene: &mut Scene) {
        self.active = false;
        for target in std::mem::take(&mut self.targets).into_values() {
            scene.remove(target.node());
        }
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(&id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.targets.values().map(Target::position)
    }

    pub fn hit_proxies(&self) -> Vec<HitProxy> {
        self.targets.values().map(Target::hit_proxy).collect()
    }

    /// Uniform point inside the visible bounds
    pub fn random_position(&self, rng: &mut impl Rng) -> Vec2 {
        Vec2::new(
            (rng.random::<f32>() - 0.5) * self.bounds.half_width * 2.0,
            (rng.random::<f32>() - 0.5) * self.bounds.half_height * 2.0,
        )
    }
}

/// One instance of every mode, bounds kept in sync
pub struct ModeSet {
    gridshot: Gridshot,
    spidershot: Spidershot,
    microshot: Microshot,
}

impl Default for ModeSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeSet {
    pub fn new() -> Self {
        Self {
            gridshot: Gridshot::new(),
            spidershot: Spidershot::new(),
            microshot: Microshot::new(),
        }
    }

    pub fn get(&self, kind: ModeKind) -> &dyn RangeMode {
        match kind {
            ModeKind::Gridshot => &self.gridshot,
            ModeKind::Spidershot => &self.spidershot,
            ModeKind::Microshot => &self.microshot,
        }
    }

    pub fn get_mut(&mut self, kind: ModeKind) -> &mut dyn RangeMode {
        match kind {
            ModeKind::Gridshot => &mut self.gridshot,
            ModeKind::Spidershot => &mut self.spidershot,
            ModeKind::Microshot => &mut self.microshot,
        }
    }

    pub fn set_visible_bounds(&mut self, bounds: VisibleBounds) {
        for kind in ModeKind::ALL {
            self.get_mut(kind).set_visible_bounds(bounds);
        }
    }

    pub fn stop_all(&mut self, scene: &mut Scene) {
        for kind in ModeKind::ALL {
            self.get_mut(kind).stop(scene);
        }
    }

    /// Total live targets across every mode
    pub fn live_targets(&self) -> usize {
        ModeKind::ALL
            .iter()
            .map(|kind| self.get(*kind).live_targets())
            .sum()
    }
}
