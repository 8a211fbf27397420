//! Hit feedback particles
//!
//! Purely cosmetic: effects copy the impact point at trigger time and never
//! look at game state again.

pub mod burst;
pub mod ripple;

pub use burst::Burst;
pub use ripple::Ripple;

use glam::Vec3;
use rand::Rng;

use super::scene::Scene;
use crate::consts::{
    BURST_PARTICLES, RIPPLE_MAX_RADIUS, RIPPLE_PARTICLES_PER_RING, RIPPLE_RINGS,
};

#[derive(Debug)]
pub enum Effect {
    Burst(Burst),
    Ripple(Ripple),
}

impl Effect {
    fn update(&mut self, dt: f32, scene: &mut Scene) {
        match self {
            Effect::Burst(burst) => burst.update(dt, scene),
            Effect::Ripple(ripple) => ripple.update(dt, scene),
        }
    }

    fn is_complete(&self) -> bool {
        match self {
            Effect::Burst(burst) => burst.is_complete(),
            Effect::Ripple(ripple) => ripple.is_complete(),
        }
    }

    fn dispose(&mut self, scene: &mut Scene) {
        match self {
            Effect::Burst(burst) => burst.dispose(scene),
            Effect::Ripple(ripple) => ripple.dispose(scene),
        }
    }
}

/// Owner of every live effect instance
#[derive(Debug, Default)]
pub struct ImpactEffects {
    active: Vec<Effect>,
}

impl ImpactEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a burst and a ripple at the impact point
    pub fn trigger(&mut self, scene: &mut Scene, point: Vec3, rng: &mut impl Rng) {
        self.active
            .push(Effect::Burst(Burst::spawn(scene, point, BURST_PARTICLES, rng)));
        self.active.push(Effect::Ripple(Ripple::spawn(
            scene,
            point,
            RIPPLE_RINGS,
            RIPPLE_PARTICLES_PER_RING,
            RIPPLE_MAX_RADIUS,
        )));
    }

    /// Advance every effect and release the finished ones
    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        for effect in &mut self.active {
            effect.update(dt, scene);
        }

        self.active.retain_mut(|effect| {
            if effect.is_complete() {
                effect.dispose(scene);
                false
            } else {
                true
            }
        });
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Drop every effect immediately
    pub fn dispose(&mut self, scene: &mut Scene) {
        for mut effect in self.active.drain(..) {
            effect.dispose(scene);
        }
    }
}
