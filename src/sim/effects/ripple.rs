//! Concentric rings expanding from the impact point
//!
//! Rings are spawned one after another, `lifetime / (rings + 1)` apart. Each
//! ring lives for the full lifetime on its own clock.

use std::f32::consts::TAU;

use glam::Vec3;

use crate::consts::{RIPPLE_COLOR, RIPPLE_LIFETIME, RIPPLE_PARTICLE_SIZE};
use crate::ease_out_quad;
use crate::sim::scene::{Node, NodeId, ParticleCloud, Scene};

#[derive(Debug)]
struct Ring {
    node: NodeId,
    age: f32,
}

#[derive(Debug)]
pub struct Ripple {
    origin: Vec3,
    ring_count: usize,
    particles_per_ring: usize,
    max_radius: f32,
    lifetime: f32,
    spawn_interval: f32,
    since_last_spawn: f32,
    rings: Vec<Ring>,
    complete: bool,
}

impl Ripple {
    /// Start a ripple; the first ring appears immediately
    pub fn spawn(
        scene: &mut Scene,
        origin: Vec3,
        ring_count: usize,
        particles_per_ring: usize,
        max_radius: f32,
    ) -> Self {
        let ring_count = ring_count.max(1);
        let mut ripple = Self {
            origin,
            ring_count,
            particles_per_ring,
            max_radius,
            lifetime: RIPPLE_LIFETIME,
            spawn_interval: RIPPLE_LIFETIME / (ring_count + 1) as f32,
            since_last_spawn: 0.0,
            rings: Vec::with_capacity(ring_count),
            complete: false,
        };
        ripple.spawn_ring(scene);
        ripple
    }

    fn spawn_ring(&mut self, scene: &mut Scene) {
        let cloud = ParticleCloud::at(
            self.origin,
            self.particles_per_ring,
            RIPPLE_COLOR,
            RIPPLE_PARTICLE_SIZE,
        );
        self.rings.push(Ring {
            node: scene.add(Node::Particles(cloud)),
            age: 0.0,
        });
    }

    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        if self.complete {
            return;
        }

        self.since_last_spawn += dt;
        if self.rings.len() < self.ring_count && self.since_last_spawn >= self.spawn_interval {
            self.spawn_ring(scene);
            self.since_last_spawn = 0.0;
        }

        let angle_step = TAU / self.particles_per_ring.max(1) as f32;
        let mut all_done = true;

        for ring in &mut self.rings {
            ring.age += dt;
            let progress = ring.age / self.lifetime;
            if progress >= 1.0 {
                continue;
            }
            all_done = false;

            let radius = ease_out_quad(progress) * self.max_radius;
            let Some(cloud) = scene.particles_mut(ring.node) else {
                continue;
            };
            for (i, position) in cloud.positions.iter_mut().enumerate() {
                let angle = i as f32 * angle_step;
                *position = self.origin + Vec3::new(angle.cos() * radius, angle.sin() * radius, 0.0);
            }
            cloud.opacity = 1.0 - progress;
        }

        if all_done && self.rings.len() >= self.ring_count {
            self.complete = true;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn rings_spawned(&self) -> usize {
        self.rings.len()
    }

    pub fn dispose(&mut self, scene: &mut Scene) {
        for ring in self.rings.drain(..) {
            scene.remove(ring.node);
        }
    }
}
