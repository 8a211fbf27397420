//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (millisecond clock used for reaction times)
//! - Input capture (pointer/touch -> fire events)
//! - DOM listener bookkeeping (web only)

pub mod input;
#[cfg(target_arch = "wasm32")]
pub mod web;

use std::cell::Cell;
use std::rc::Rc;

/// Monotonic millisecond clock
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Clock driven by hand (tests, headless runs)
///
/// Clones share the same time source.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// `performance.now()` in the browser
#[cfg(target_arch = "wasm32")]
pub struct PerformanceClock {
    performance: Option<web_sys::Performance>,
}

#[cfg(target_arch = "wasm32")]
impl PerformanceClock {
    pub fn new() -> Self {
        let performance = web_sys::window().and_then(|w| w.performance());
        if performance.is_none() {
            log::warn!("performance API unavailable, falling back to Date.now()");
        }
        Self { performance }
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for PerformanceClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
impl Clock for PerformanceClock {
    fn now_ms(&self) -> f64 {
        match &self.performance {
            Some(performance) => performance.now(),
            None => js_sys::Date::now(),
        }
    }
}

/// Wall clock relative to construction (native)
#[cfg(not(target_arch = "wasm32"))]
pub struct SystemClock {
    start: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// The platform's real clock
pub fn default_clock() -> Box<dyn Clock> {
    #[cfg(target_arch = "wasm32")]
    {
        Box::new(PerformanceClock::new())
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Box::new(SystemClock::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new(100.0);
        let handle = clock.clone();
        handle.advance(16.5);
        assert_eq!(clock.now_ms(), 116.5);
        clock.set(5.0);
        assert_eq!(handle.now_ms(), 5.0);
    }
}
