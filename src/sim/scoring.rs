//! Decimal target scoring
//!
//! The face is split into ten equal bands of 0.1 radius. The innermost band
//! scores 10.x, the outermost 1.x, and the decimal tracks how deep inside its
//! band the shot landed (10.9 dead center, 1.0 on the rim). Anything past
//! the rim is a miss.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{X_RING_BONUS, X_RING_THRESHOLD};
use crate::round1;

const BAND_COUNT: u32 = 10;
const BAND_WIDTH: f32 = 0.1;
/// Largest decimal inside a band
const BAND_DECIMAL: f32 = 0.9;

/// Outcome of a single shot against a target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotResult {
    /// Decimal score (1.0-10.9 on the face, 0 on a miss)
    pub score: f32,
    /// Inside the X-ring
    pub is_x_ring: bool,
    /// Flat bonus points (X-ring)
    pub bonus: f32,
}

impl ShotResult {
    pub const MISS: ShotResult = ShotResult {
        score: 0.0,
        is_x_ring: false,
        bonus: 0.0,
    };

    /// Score plus bonus
    pub fn total(&self) -> f32 {
        self.score + self.bonus
    }

    pub fn is_miss(&self) -> bool {
        self.score <= 0.0
    }
}

/// Score a hit point against a target center/radius
///
/// Distance is measured in the target plane (x/y only).
pub fn score_at(hit_point: Vec2, center: Vec2, radius: f32) -> ShotResult {
    if radius <= 0.0 || !radius.is_finite() {
        return ShotResult::MISS;
    }
    score_normalized(hit_point.distance(center) / radius)
}

/// Score a normalized distance (0 = center, 1 = rim)
///
/// The rim itself is inclusive: `nd == 1.0` scores 1.0, anything beyond misses.
pub fn score_normalized(nd: f32) -> ShotResult {
    if !(0.0..=1.0).contains(&nd) {
        return ShotResult::MISS;
    }

    let band = (0..BAND_COUNT)
        .find(|k| nd <= (k + 1) as f32 * BAND_WIDTH)
        .unwrap_or(BAND_COUNT - 1);

    let base = (BAND_COUNT - band) as f32;
    let within = (nd - band as f32 * BAND_WIDTH) / BAND_WIDTH;
    let decimal = (BAND_DECIMAL * (1.0 - within)).clamp(0.0, BAND_DECIMAL);

    let is_x_ring = nd <= X_RING_THRESHOLD;
    ShotResult {
        score: round1(base + decimal),
        is_x_ring,
        bonus: if is_x_ring { X_RING_BONUS } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dead_center() {
        let result = score_at(Vec2::new(1.0, 2.0), Vec2::new(1.0, 2.0), 0.6);
        assert_eq!(result.score, 10.9);
        assert!(result.is_x_ring);
        assert_eq!(result.bonus, X_RING_BONUS);
    }

    #[test]
    fn test_rim_is_inclusive() {
        let rim = score_normalized(1.0);
        assert_eq!(rim.score, 1.0);
        assert!(!rim.is_x_ring);
        assert_eq!(rim.bonus, 0.0);

        let past_rim = score_normalized(1.0001);
        assert_eq!(past_rim, ShotResult::MISS);
        assert!(past_rim.is_miss());
    }

    #[test]
    fn test_band_edges() {
        // Inside the 10 ring
        assert_eq!(score_normalized(0.02).score, 10.7);
        assert_eq!(score_normalized(0.1).score, 10.0);
        // Just inside the 9 ring
        assert_eq!(score_normalized(0.1001).score, 9.9);
        // The 5 ring spans 0.5-0.6
        assert_eq!(score_normalized(0.52).score, 5.7);
    }

    #[test]
    fn test_x_ring_threshold() {
        assert!(score_normalized(0.08).is_x_ring);
        assert!(!score_normalized(0.0801).is_x_ring);
        // Still in the 10 ring but no bonus
        let outside_x = score_normalized(0.09);
        assert_eq!(outside_x.bonus, 0.0);
        assert!(outside_x.score >= 10.0);
    }

    #[test]
    fn test_miss_outside_target() {
        let result = score_at(Vec2::new(2.0, 0.0), Vec2::ZERO, 0.6);
        assert_eq!(result, ShotResult::MISS);
    }

    #[test]
    fn test_degenerate_radius_misses() {
        assert_eq!(score_at(Vec2::ZERO, Vec2::ZERO, 0.0), ShotResult::MISS);
        assert_eq!(score_at(Vec2::ZERO, Vec2::ZERO, f32::NAN), ShotResult::MISS);
    }

    proptest! {
        #[test]
        fn prop_score_monotonic_on_face(a in 0.0f32..=1.0, b in 0.0f32..=1.0) {
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            let near_score = score_normalized(near).score;
            let far_score = score_normalized(far).score;
            prop_assert!(near_score >= far_score, "{near}->{near_score} vs {far}->{far_score}");
        }

        #[test]
        fn prop_face_scores_in_range(nd in 0.0f32..=1.0) {
            let result = score_normalized(nd);
            prop_assert!((1.0..=10.9).contains(&result.score));
        }

        #[test]
        fn prop_outside_face_misses(nd in 1.000_01f32..50.0) {
            let result = score_normalized(nd);
            prop_assert_eq!(result.score, 0.0);
            prop_assert_eq!(result.bonus, 0.0);
        }
    }
}
