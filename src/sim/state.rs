//! Session ledger and round configuration
//!
//! `GameState` is the single record of a round: score, hits, misses, streaks
//! and timing. It is only mutated through the operations below. Every change
//! queues a [`SessionEvent`]; the engine drains the queue and forwards it to
//! subscribers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::scoring::ShotResult;
use crate::error::RangeError;
use crate::platform::Clock;
use crate::round1;

/// One of the three training modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    #[default]
    Gridshot,
    Spidershot,
    Microshot,
}

impl ModeKind {
    pub const ALL: [ModeKind; 3] = [ModeKind::Gridshot, ModeKind::Spidershot, ModeKind::Microshot];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKind::Gridshot => "gridshot",
            ModeKind::Spidershot => "spidershot",
            ModeKind::Microshot => "microshot",
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeKind {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gridshot" => Ok(ModeKind::Gridshot),
            "spidershot" => Ok(ModeKind::Spidershot),
            "microshot" => Ok(ModeKind::Microshot),
            _ => Err(RangeError::UnknownMode(s.to_string())),
        }
    }
}

/// Round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Idle,
    /// Reserved, nothing enters it yet
    Countdown,
    Playing,
    Ended,
}

/// Fixed per-mode round rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundConfig {
    pub mode: ModeKind,
    /// Seconds
    pub time_limit: f32,
    pub total_targets: u32,
    /// Size factor applied on top of the mode's own factor
    pub target_size: f32,
    /// Milliseconds between a target leaving and its replacement
    pub spawn_delay: f32,
}

impl RoundConfig {
    pub const fn for_mode(mode: ModeKind) -> Self {
        match mode {
            ModeKind::Gridshot => RoundConfig {
                mode,
                time_limit: 30.0,
                total_targets: 30,
                target_size: 1.0,
                spawn_delay: 0.0,
            },
            ModeKind::Spidershot => RoundConfig {
                mode,
                time_limit: 30.0,
                total_targets: 30,
                target_size: 1.0,
                spawn_delay: 100.0,
            },
            ModeKind::Microshot => RoundConfig {
                mode,
                time_limit: 30.0,
                total_targets: 25,
                target_size: 0.5,
                spawn_delay: 200.0,
            },
        }
    }

    pub fn spawn_delay_secs(&self) -> f32 {
        self.spawn_delay / 1000.0
    }
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self::for_mode(ModeKind::default())
    }
}

/// HUD / results snapshot (rounded for display)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub status: GameStatus,
    pub mode: ModeKind,
    pub score: f32,
    pub hits: u32,
    pub misses: u32,
    /// Percent, one decimal
    pub accuracy: f32,
    pub streak: u32,
    pub best_streak: u32,
    pub x_ring_hits: u32,
    pub average_score: f32,
    pub targets_remaining: u32,
    pub total_targets: u32,
    pub time_elapsed: f32,
    pub time_limit: f32,
    /// Whole milliseconds
    pub average_reaction_time: u32,
    pub last_hit_score: Option<f32>,
    pub last_hit_x_ring: bool,
}

/// Notifications produced by the ledger
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Any observable change
    StatsChanged(GameStats),
    /// The round reached its time limit (once per round)
    RoundEnded(GameStats),
}

/// Points multiplier for the current streak: +10% per 5 consecutive hits
pub fn streak_multiplier(streak: u32) -> f32 {
    1.0 + (streak / 5) as f32 * 0.1
}

pub struct GameState {
    status: GameStatus,
    mode: ModeKind,
    config: RoundConfig,

    score: f32,
    hits: u32,
    misses: u32,
    streak: u32,
    best_streak: u32,
    x_ring_hits: u32,
    targets_spawned: u32,
    targets_remaining: u32,
    time_elapsed: f32,
    last_hit_score: Option<f32>,
    last_hit_x_ring: bool,
    shot_scores: Vec<f32>,
    reaction_times: Vec<f64>,
    /// Reaction-time baseline: the most recent spawn of any target
    last_spawn_ms: f64,

    clock: Box<dyn Clock>,
    events: Vec<SessionEvent>,
}

impl GameState {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            status: GameStatus::Idle,
            mode: ModeKind::default(),
            config: RoundConfig::default(),
            score: 0.0,
            hits: 0,
            misses: 0,
            streak: 0,
            best_streak: 0,
            x_ring_hits: 0,
            targets_spawned: 0,
            targets_remaining: 0,
            time_elapsed: 0.0,
            last_hit_score: None,
            last_hit_x_ring: false,
            shot_scores: Vec::new(),
            reaction_times: Vec::new(),
            last_spawn_ms: 0.0,
            clock,
            events: Vec::new(),
        }
    }

    /// Select the mode (and its fixed config) for the next round
    pub fn set_mode(&mut self, mode: ModeKind) {
        self.mode = mode;
        self.config = RoundConfig::for_mode(mode);
    }

    pub fn start_round(&mut self) {
        self.status = GameStatus::Playing;
        self.score = 0.0;
        self.hits = 0;
        self.misses = 0;
        self.streak = 0;
        self.best_streak = 0;
        self.x_ring_hits = 0;
        self.targets_spawned = 0;
        self.targets_remaining = 0;
        self.time_elapsed = 0.0;
        self.last_hit_score = None;
        self.last_hit_x_ring = false;
        self.shot_scores.clear();
        self.reaction_times.clear();
        self.last_spawn_ms = self.clock.now_ms();
        log::info!("Round started: {} ({}s)", self.mode, self.config.time_limit);
        self.notify();
    }

    /// Finalize the round; the end event fires only on the first call
    pub fn end_round(&mut self) {
        if self.status == GameStatus::Ended {
            return;
        }
        self.status = GameStatus::Ended;
        let stats = self.stats();
        log::info!(
            "Round ended: score {} ({} hits, {} misses)",
            stats.score,
            stats.hits,
            stats.misses
        );
        self.events.push(SessionEvent::RoundEnded(stats));
    }

    /// Drop back to idle without an end event (player quit)
    pub fn force_idle(&mut self) {
        self.status = GameStatus::Idle;
        self.notify();
    }

    /// Record a hit. Returns the points added (after streak multiplier).
    ///
    /// Ignored unless a round is playing.
    pub fn record_hit(&mut self, result: ShotResult) -> f32 {
        if self.status != GameStatus::Playing {
            log::debug!("record_hit ignored while {:?}", self.status);
            return 0.0;
        }

        self.hits += 1;
        self.shot_scores.push(result.score);
        self.last_hit_score = Some(result.score);
        self.last_hit_x_ring = result.is_x_ring;

        let points = result.total() * streak_multiplier(self.streak);
        self.score += points;

        if result.is_x_ring {
            self.x_ring_hits += 1;
        }

        self.streak += 1;
        self.best_streak = self.best_streak.max(self.streak);

        self.reaction_times
            .push(self.clock.now_ms() - self.last_spawn_ms);

        self.notify();
        points
    }

    /// Record a miss (stray shot or expired target). Ignored unless playing.
    pub fn record_miss(&mut self) {
        if self.status != GameStatus::Playing {
            log::debug!("record_miss ignored while {:?}", self.status);
            return;
        }
        self.misses += 1;
        self.streak = 0;
        self.last_hit_score = None;
        self.last_hit_x_ring = false;
        self.notify();
    }

    pub fn target_spawned(&mut self) {
        self.targets_spawned += 1;
        self.targets_remaining += 1;
        self.last_spawn_ms = self.clock.now_ms();
        self.notify();
    }

    pub fn target_destroyed(&mut self) {
        self.targets_remaining = self.targets_remaining.saturating_sub(1);
        self.notify();
    }

    /// Advance round time, ending the round at the time limit
    pub fn update(&mut self, dt: f32) {
        if self.status != GameStatus::Playing {
            return;
        }

        self.time_elapsed += dt;
        if self.time_elapsed >= self.config.time_limit {
            self.end_round();
        }

        self.notify();
    }

    /// Unrounded accuracy in percent (0 with no shots)
    pub fn accuracy(&self) -> f32 {
        let shots = self.hits + self.misses;
        if shots == 0 {
            0.0
        } else {
            self.hits as f32 / shots as f32 * 100.0
        }
    }

    pub fn stats(&self) -> GameStats {
        let average_score = if self.shot_scores.is_empty() {
            0.0
        } else {
            self.shot_scores.iter().sum::<f32>() / self.shot_scores.len() as f32
        };
        let average_reaction_time = if self.reaction_times.is_empty() {
            0.0
        } else {
            self.reaction_times.iter().sum::<f64>() / self.reaction_times.len() as f64
        }
        .round() as u32;

        GameStats {
            status: self.status,
            mode: self.mode,
            score: round1(self.score),
            hits: self.hits,
            misses: self.misses,
            accuracy: round1(self.accuracy()),
            streak: self.streak,
            best_streak: self.best_streak,
            x_ring_hits: self.x_ring_hits,
            average_score: round1(average_score),
            targets_remaining: self.targets_remaining,
            total_targets: self.config.total_targets,
            time_elapsed: round1(self.time_elapsed),
            time_limit: self.config.time_limit,
            average_reaction_time,
            last_hit_score: self.last_hit_score,
            last_hit_x_ring: self.last_hit_x_ring,
        }
    }

    pub fn time_remaining(&self) -> f32 {
        (self.config.time_limit - self.time_elapsed).max(0.0)
    }

    /// Take all queued notifications, oldest first
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn notify(&mut self) {
        let stats = self.stats();
        self.events.push(SessionEvent::StatsChanged(stats));
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == GameStatus::Playing
    }

    pub fn mode(&self) -> ModeKind {
        self.mode
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    /// Raw (unrounded) running score
    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    pub fn x_ring_hits(&self) -> u32 {
        self.x_ring_hits
    }

    pub fn targets_spawned(&self) -> u32 {
        self.targets_spawned
    }

    pub fn targets_remaining(&self) -> u32 {
        self.targets_remaining
    }

    pub fn time_elapsed(&self) -> f32 {
        self.time_elapsed
    }

    pub fn shot_scores(&self) -> &[f32] {
        &self.shot_scores
    }

    pub fn reaction_times(&self) -> &[f64] {
        &self.reaction_times
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ManualClock;
    use proptest::prelude::*;

    fn hit(score: f32) -> ShotResult {
        ShotResult {
            score,
            is_x_ring: false,
            bonus: 0.0,
        }
    }

    fn playing_state() -> (GameState, ManualClock) {
        let clock = ManualClock::new(1_000.0);
        let mut state = GameState::new(Box::new(clock.clone()));
        state.start_round();
        state.drain_events();
        (state, clock)
    }

    #[test]
    fn test_start_round_resets() {
        let (mut state, _) = playing_state();
        state.record_hit(hit(9.5));
        state.record_miss();
        state.update(3.0);

        state.start_round();
        assert_eq!(state.status(), GameStatus::Playing);
        assert_eq!(state.score(), 0.0);
        assert_eq!(state.hits(), 0);
        assert_eq!(state.misses(), 0);
        assert_eq!(state.time_elapsed(), 0.0);
        assert!(state.shot_scores().is_empty());
        assert!(state.reaction_times().is_empty());
    }

    #[test]
    fn test_record_hit_x_ring_and_bonus() {
        let (mut state, _) = playing_state();
        let points = state.record_hit(ShotResult {
            score: 10.9,
            is_x_ring: true,
            bonus: 2.0,
        });
        assert!((points - 12.9).abs() < 1e-5);
        assert_eq!(state.x_ring_hits(), 1);
        assert_eq!(state.stats().last_hit_score, Some(10.9));
        assert!(state.stats().last_hit_x_ring);
    }

    #[test]
    fn test_streak_multiplier_boundary() {
        let (mut state, _) = playing_state();
        // Hits 1-5 are scored with the streak before them (0..=4): no bonus
        for _ in 0..5 {
            let points = state.record_hit(hit(8.0));
            assert!((points - 8.0).abs() < 1e-5);
        }
        assert_eq!(state.streak(), 5);
        assert!((streak_multiplier(5) - 1.1).abs() < 1e-6);

        // With streak 5 the next hit earns 10% extra
        let points = state.record_hit(hit(8.0));
        assert!((points - 8.8).abs() < 1e-4);
        assert!((state.score() - 48.8).abs() < 1e-3);
    }

    #[test]
    fn test_miss_resets_streak_and_last_hit() {
        let (mut state, _) = playing_state();
        state.record_hit(hit(7.0));
        state.record_hit(hit(7.0));
        state.record_miss();
        assert_eq!(state.streak(), 0);
        assert_eq!(state.best_streak(), 2);
        let stats = state.stats();
        assert_eq!(stats.last_hit_score, None);
        assert!(!stats.last_hit_x_ring);
    }

    #[test]
    fn test_accuracy_and_averages() {
        let (mut state, clock) = playing_state();
        assert_eq!(state.stats().accuracy, 0.0);

        state.target_spawned();
        clock.advance(250.0);
        state.record_hit(hit(10.0));
        state.target_spawned();
        clock.advance(350.0);
        state.record_hit(hit(8.0));
        state.record_miss();

        let stats = state.stats();
        assert_eq!(stats.accuracy, 66.7);
        assert_eq!(stats.average_score, 9.0);
        assert_eq!(stats.average_reaction_time, 300);
    }

    #[test]
    fn test_reaction_baseline_is_last_spawn() {
        let (mut state, clock) = playing_state();
        state.target_spawned();
        clock.advance(400.0);
        // A second target appears; the next hit is measured from here
        state.target_spawned();
        clock.advance(100.0);
        state.record_hit(hit(9.0));
        assert_eq!(state.reaction_times(), &[100.0]);
    }

    #[test]
    fn test_target_counters_never_negative() {
        let (mut state, _) = playing_state();
        state.target_destroyed();
        assert_eq!(state.targets_remaining(), 0);
        state.target_spawned();
        state.target_spawned();
        state.target_destroyed();
        assert_eq!(state.targets_remaining(), 1);
        assert_eq!(state.targets_spawned(), 2);
    }

    #[test]
    fn test_round_ends_once_at_time_limit() {
        let (mut state, _) = playing_state();
        let limit = state.config().time_limit;
        state.update(limit - 0.5);
        assert!(state.is_playing());
        state.update(0.5);
        assert_eq!(state.status(), GameStatus::Ended);
        state.update(1.0);
        state.end_round();

        let ends = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::RoundEnded(_)))
            .count();
        assert_eq!(ends, 1);
        assert_eq!(state.time_remaining(), 0.0);
    }

    #[test]
    fn test_calls_outside_round_are_ignored() {
        let clock = ManualClock::new(0.0);
        let mut state = GameState::new(Box::new(clock));
        assert_eq!(state.record_hit(hit(10.0)), 0.0);
        state.record_miss();
        assert_eq!(state.hits(), 0);
        assert_eq!(state.misses(), 0);
        assert!(state.drain_events().is_empty());

        state.start_round();
        state.update(100.0);
        assert_eq!(state.status(), GameStatus::Ended);
        state.record_hit(hit(10.0));
        assert_eq!(state.hits(), 0);
    }

    #[test]
    fn test_force_idle_skips_end_event() {
        let (mut state, _) = playing_state();
        state.force_idle();
        assert_eq!(state.status(), GameStatus::Idle);
        assert!(
            state
                .drain_events()
                .iter()
                .all(|e| matches!(e, SessionEvent::StatsChanged(_)))
        );
    }

    #[test]
    fn test_set_mode_swaps_config_only() {
        let (mut state, _) = playing_state();
        state.record_hit(hit(9.0));
        state.set_mode(ModeKind::Microshot);
        assert_eq!(state.config().total_targets, 25);
        assert_eq!(state.config().target_size, 0.5);
        assert_eq!(state.hits(), 1);
        assert!((state.score() - 9.0).abs() < 1e-5);
    }

    #[test]
    fn test_mode_kind_parse() {
        assert_eq!("Spidershot".parse::<ModeKind>().unwrap(), ModeKind::Spidershot);
        assert!(matches!(
            "flickshot".parse::<ModeKind>(),
            Err(RangeError::UnknownMode(_))
        ));
        for mode in ModeKind::ALL {
            assert_eq!(mode.as_str().parse::<ModeKind>().unwrap(), mode);
        }
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let (state, _) = playing_state();
        let json = serde_json::to_string(&state.stats()).unwrap();
        assert!(json.contains("\"bestStreak\":0"));
        assert!(json.contains("\"mode\":\"gridshot\""));
        assert!(json.contains("\"status\":\"playing\""));
    }

    proptest! {
        #[test]
        fn prop_ledger_invariants(shots in proptest::collection::vec(any::<bool>(), 0..80)) {
            let (mut state, _) = playing_state();
            let mut best_seen = 0;
            for is_hit in shots {
                if is_hit {
                    state.record_hit(hit(5.0));
                } else {
                    state.record_miss();
                    prop_assert_eq!(state.streak(), 0);
                }
                prop_assert!(state.best_streak() >= best_seen);
                prop_assert!(state.best_streak() >= state.streak());
                best_seen = state.best_streak();

                let shots_taken = state.hits() + state.misses();
                let expected = if shots_taken == 0 {
                    0.0
                } else {
                    state.hits() as f32 / shots_taken as f32 * 100.0
                };
                prop_assert_eq!(state.accuracy(), expected);
            }
        }
    }
}
