//! Particle burst thrown out of the impact point

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::Rng;

use crate::consts::{
    BURST_LIFETIME, BURST_PARTICLE_SIZE, BURST_PRIMARY, BURST_SECONDARY, BURST_SPEED_MAX,
    BURST_SPEED_MIN,
};
use crate::sim::scene::{Node, NodeId, ParticleCloud, Scene};
use crate::{ease_out_cubic, lerp_color};

/// Forward (toward camera) component scale
const FORWARD_SCALE: f32 = 0.3;
/// Downward drift, scaled by progress
const GRAVITY: f32 = 2.0;

#[derive(Debug)]
pub struct Burst {
    node: NodeId,
    velocities: Vec<Vec3>,
    age: f32,
    lifetime: f32,
    complete: bool,
}

impl Burst {
    pub fn spawn(scene: &mut Scene, origin: Vec3, count: usize, rng: &mut impl Rng) -> Self {
        let mut cloud = ParticleCloud::at(origin, count, BURST_PRIMARY, BURST_PARTICLE_SIZE);
        let mut velocities = Vec::with_capacity(count);

        for color in cloud.colors.iter_mut() {
            *color = lerp_color(BURST_PRIMARY, BURST_SECONDARY, rng.random::<f32>());

            // Hemisphere facing the camera
            let theta = rng.random::<f32>() * PI;
            let phi = rng.random::<f32>() * TAU;
            let speed = rng.random_range(BURST_SPEED_MIN..BURST_SPEED_MAX);
            velocities.push(Vec3::new(
                theta.sin() * phi.cos() * speed,
                theta.sin() * phi.sin() * speed,
                theta.cos().abs() * speed * FORWARD_SCALE,
            ));
        }

        Self {
            node: scene.add(Node::Particles(cloud)),
            velocities,
            age: 0.0,
            lifetime: BURST_LIFETIME,
            complete: false,
        }
    }

    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        if self.complete {
            return;
        }

        self.age += dt;
        if self.age >= self.lifetime {
            self.complete = true;
            return;
        }

        let progress = self.age / self.lifetime;
        let ease = ease_out_cubic(progress);
        let drag = 1.0 - ease;

        let Some(cloud) = scene.particles_mut(self.node) else {
            return;
        };

        for (position, velocity) in cloud.positions.iter_mut().zip(&self.velocities) {
            *position += *velocity * dt * drag;
            position.y -= GRAVITY * dt * progress;
        }

        cloud.opacity = 1.0 - ease;
        cloud.size = BURST_PARTICLE_SIZE * (1.0 - ease);
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn dispose(&mut self, scene: &mut Scene) {
        scene.remove(self.node);
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }
}
