//! Fixed-timestep scheduler
//!
//! The host calls [`GameLoop::frame`] once per animation frame with its
//! timestamp. Wall time is clamped, accumulated, and drained in exact
//! [`FRAME_MS`] steps, each one invoking the update callback with
//! [`SIM_DT`].

use crate::consts::{FRAME_MS, MAX_FRAME_MS, SIM_DT};

/// FPS window length (ms)
const FPS_WINDOW_MS: f64 = 1000.0;

#[derive(Debug, Default)]
pub struct GameLoop {
    running: bool,
    /// Timestamp of the previous frame, `None` until the first frame after start
    last_time: Option<f64>,
    accumulator: f64,
    fps: u32,
    frames_in_window: u32,
    window_start: f64,
}

impl GameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: f64) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_time = Some(now);
        self.accumulator = 0.0;
        self.frames_in_window = 0;
        self.window_start = now;
        log::debug!("Game loop started");
    }

    /// Stop scheduling. Pending accumulated time is discarded.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.last_time = None;
        self.accumulator = 0.0;
        log::debug!("Game loop stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames counted over the last complete one-second window
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Run one host frame, returning the number of fixed steps executed
    pub fn frame(&mut self, now: f64, mut step: impl FnMut(f32)) -> u32 {
        if !self.running {
            return 0;
        }

        let last = self.last_time.unwrap_or(now);
        let delta = (now - last).clamp(0.0, MAX_FRAME_MS);
        self.last_time = Some(now);
        self.accumulator += delta;

        let mut steps = 0;
        while self.accumulator >= FRAME_MS {
            step(SIM_DT);
            self.accumulator -= FRAME_MS;
            steps += 1;
        }

        self.frames_in_window += 1;
        if now - self.window_start >= FPS_WINDOW_MS {
            self.fps = self.frames_in_window;
            self.frames_in_window = 0;
            self.window_start = now;
        }

        steps
    }
}
