//! Gridshot: three targets at a time on a fixed grid
//!
//! Candidate cells are laid out over the visible bounds (2x4 on portrait
//! viewports, 5x4 otherwise). Each target lives two seconds; a hit or an
//! expiry is replaced straight away on a free cell.

use glam::{Vec2, Vec3};
use rand::Rng;

use super::{ModeContext, RangeMode, SpawnOutcome, TargetField};
use crate::sim::camera::VisibleBounds;
use crate::sim::raycast::HitProxy;
use crate::sim::scene::Scene;
use crate::sim::state::ModeKind;
use crate::sim::target::TargetId;

pub const MAX_VISIBLE: usize = 3;
pub const TARGET_LIFETIME: f32 = 2.0;
pub const SIZE_FACTOR: f32 = 1.0;
/// Share of the bounds the grid spans
const GRID_FILL: f32 = 0.85;
const GRID_ROWS: usize = 4;
const COLS_PORTRAIT: usize = 2;
const COLS_LANDSCAPE: usize = 5;

/// Bounds rounded to two decimals: grid is rebuilt when this changes
type BoundsKey = (i64, i64);

fn bounds_key(bounds: VisibleBounds) -> BoundsKey {
    (
        (bounds.half_width * 100.0).round() as i64,
        (bounds.half_height * 100.0).round() as i64,
    )
}

/// Cells are compared at 0.1 precision
fn cell_key(point: Vec2) -> (i64, i64) {
    ((point.x * 10.0).round() as i64, (point.y * 10.0).round() as i64)
}

/// Grid cell centers, row by row from the bottom
pub fn build_grid(bounds: VisibleBounds) -> Vec<Vec2> {
    let cols = if bounds.aspect() < 1.0 {
        COLS_PORTRAIT
    } else {
        COLS_LANDSCAPE
    };
    let rows = GRID_ROWS;

    let spacing_x = bounds.half_width * 2.0 * GRID_FILL / (cols.max(2) - 1) as f32;
    let spacing_y = bounds.half_height * 2.0 * GRID_FILL / (rows.max(2) - 1) as f32;
    let offset_x = (cols - 1) as f32 * spacing_x / 2.0;
    let offset_y = (rows - 1) as f32 * spacing_y / 2.0;

    (0..rows)
        .flat_map(|row| {
            (0..cols).map(move |col| {
                Vec2::new(
                    col as f32 * spacing_x - offset_x,
                    row as f32 * spacing_y - offset_y,
                )
            })
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct Gridshot {
    field: TargetField,
    grid: Vec<Vec2>,
    grid_key: Option<BoundsKey>,
}

impl Gridshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid(&self) -> &[Vec2] {
        &self.grid
    }

    fn ensure_grid(&mut self) {
        let key = bounds_key(self.field.bounds());
        if self.grid_key != Some(key) {
            self.grid = build_grid(self.field.bounds());
            self.grid_key = Some(key);
            log::debug!("Gridshot grid rebuilt: {} cells", self.grid.len());
        }
    }

    fn spawn_random(&mut self, ctx: &mut ModeContext<'_>) -> SpawnOutcome {
        if !self.field.can_spawn(ctx.state) {
            return SpawnOutcome::Exhausted;
        }
        self.ensure_grid();

        let occupied: Vec<_> = self.field.positions().map(cell_key).collect();
        let free: Vec<Vec2> = self
            .grid
            .iter()
            .copied()
            .filter(|cell| !occupied.contains(&cell_key(*cell)))
            .collect();

        if free.is_empty() {
            log::debug!("Gridshot: no free cell, spawn deferred");
            return SpawnOutcome::NoRoom;
        }

        let cell = free[ctx.rng.random_range(0..free.len())];
        self.field.spawn(ctx, cell, SIZE_FACTOR)
    }

    /// Refill up to the visible cap; stops at the first spawn that cannot happen
    fn fill(&mut self, ctx: &mut ModeContext<'_>) {
        while self.field.len() < MAX_VISIBLE {
            if !matches!(self.spawn_random(ctx), SpawnOutcome::Spawned(_)) {
                break;
            }
        }
    }
}

impl RangeMode for Gridshot {
    fn kind(&self) -> ModeKind {
        ModeKind::Gridshot
    }

    fn start(&mut self, ctx: &mut ModeContext<'_>) {
        self.field.activate();
        self.ensure_grid();
        self.fill(ctx);
    }

    fn update(&mut self, ctx: &mut ModeContext<'_>, dt: f32) {
        if !self.field.is_active() {
            return;
        }

        self.field.expire(ctx, dt, TARGET_LIFETIME);

        // Replacements for expiries, plus any spawn skipped on an earlier tick
        if ctx.state.is_playing() {
            self.fill(ctx);
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

        let points = ctx.state.record_hit(result);
        self.field.remove(ctx, id);

        if ctx.state.is_playing() {
            self.fill(ctx);
        }
        points
    }

    fn stop(&mut self, scene: &mut Scene) {
        self.field.stop(scene);
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
