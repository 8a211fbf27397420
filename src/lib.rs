//! Zeroed In - a browser aim trainer
//!
//! Core modules:
//! - `sim`: Simulation (scoring, session ledger, game modes, effects, fixed-step loop)
//! - `engine`: `RangeEngine` facade the host UI drives
//! - `renderer`: Render backends (WebGPU SDF pipeline, headless)
//! - `platform`: Clock, input capture and browser listener bookkeeping
//! - `settings`: Persisted player preferences

pub mod engine;
pub mod error;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use engine::RangeEngine;
pub use error::RangeError;
pub use settings::{PreloaderKind, Settings, SettingsPatch, SettingsStore};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Fixed timestep in milliseconds (accumulator unit)
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Largest wall-clock delta fed to the accumulator (spiral of death guard)
    pub const MAX_FRAME_MS: f64 = 100.0;

    /// Camera
    pub const CAMERA_FOV_DEG: f32 = 50.0;
    pub const CAMERA_NEAR: f32 = 0.1;
    pub const CAMERA_FAR: f32 = 100.0;
    pub const CAMERA_Z: f32 = 8.0;
    /// Fraction of the visible plane targets may spawn in
    pub const SPAWN_PADDING: f32 = 0.8;

    /// Recoil shake applied on every shot
    pub const SHAKE_INTENSITY: f32 = 0.012;
    pub const SHAKE_DURATION: f32 = 0.06;

    /// Target radius before mode and round size factors
    pub const BASE_TARGET_RADIUS: f32 = 0.6;
    /// Normalized distance inside which a hit counts as an X-ring
    pub const X_RING_THRESHOLD: f32 = 0.08;
    pub const X_RING_BONUS: f32 = 2.0;

    /// Burst effect
    pub const BURST_PARTICLES: usize = 50;
    pub const BURST_LIFETIME: f32 = 0.3;
    pub const BURST_PARTICLE_SIZE: f32 = 0.08;
    pub const BURST_SPEED_MIN: f32 = 4.0;
    pub const BURST_SPEED_MAX: f32 = 10.0;

    /// Ripple effect
    pub const RIPPLE_RINGS: usize = 3;
    pub const RIPPLE_PARTICLES_PER_RING: usize = 60;
    pub const RIPPLE_MAX_RADIUS: f32 = 1.2;
    pub const RIPPLE_LIFETIME: f32 = 0.4;
    pub const RIPPLE_PARTICLE_SIZE: f32 = 0.03;

    /// Colors (sRGB, 0-1)
    pub const BACKGROUND: [f32; 3] = [0.039, 0.039, 0.059];
    pub const BURST_PRIMARY: [f32; 3] = [1.0, 0.188, 0.188];
    pub const BURST_SECONDARY: [f32; 3] = [1.0, 0.314, 0.314];
    pub const RIPPLE_COLOR: [f32; 3] = [1.0, 0.251, 0.251];
}

/// Ease-out cubic: fast start, slow finish
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// Ease-out quadratic
#[inline]
pub fn ease_out_quad(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Linear interpolation between two colors
#[inline]
pub fn lerp_color(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Convert element-relative pixel coordinates to normalized device coordinates
/// (x right, y up, both in [-1, 1])
#[inline]
pub fn screen_to_ndc(screen: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(
        (screen.x / width) * 2.0 - 1.0,
        -(screen.y / height) * 2.0 + 1.0,
    )
}

/// Round to one decimal place (HUD precision)
#[inline]
pub fn round1(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(ease_out_quad(0.0), 0.0);
        assert_eq!(ease_out_quad(1.0), 1.0);
        // Ease-out curves run ahead of linear
        assert!(ease_out_cubic(0.5) > 0.5);
        assert!(ease_out_quad(0.5) > 0.5);
    }

    #[test]
    fn test_screen_to_ndc() {
        let center = screen_to_ndc(Vec2::new(400.0, 300.0), 800.0, 600.0);
        assert!(center.length() < 1e-6);

        let top_left = screen_to_ndc(Vec2::ZERO, 800.0, 600.0);
        assert_eq!(top_left, Vec2::new(-1.0, 1.0));
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(10.94), 10.9);
        assert_eq!(round1(3.25), 3.3);
        assert_eq!(round1(0.0), 0.0);
    }
}
