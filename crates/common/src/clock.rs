//! Clock and pacing utilities.
//!
//! Every timestamp Glide reasons about is a monotonic nanosecond offset
//! from a single epoch taken when the process started handling input.
//! This module provides:
//! - The shared monotonic clock
//! - Conversions between nanoseconds and milliseconds
//! - A rate controller for periodic work (device rescans, frames)

use std::time::{Duration, Instant};

/// A clock that provides monotonic timestamps relative to a fixed epoch.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    /// The instant the clock was started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string), for log correlation.
    epoch_wall: String,
}

impl MonotonicClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Get nanoseconds elapsed since the epoch.
    pub fn elapsed_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Wall-clock time at the epoch.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Convert a nanosecond value to fractional milliseconds.
    pub fn ns_to_ms(ns: u64) -> f64 {
        ns as f64 / 1_000_000.0
    }

    /// Convert milliseconds to nanoseconds.
    pub fn ms_to_ns(ms: f64) -> u64 {
        (ms.max(0.0) * 1_000_000.0) as u64
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::start()
    }
}

/// Period of a given rate, clamped to at least 1 Hz.
pub fn interval_for_hz(hz: u32) -> Duration {
    Duration::from_nanos(1_000_000_000 / u64::from(hz.max(1)))
}

/// Rate controller for periodic work driven from a polling loop.
#[derive(Debug)]
pub struct RateController {
    target_interval_ns: u64,
    last_tick_ns: Option<u64>,
}

impl RateController {
    /// Create a controller targeting the given Hz rate.
    pub fn new(target_hz: u32) -> Self {
        Self::with_interval(interval_for_hz(target_hz))
    }

    /// Create a controller firing at most once per `interval`.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            target_interval_ns: interval.as_nanos().max(1) as u64,
            last_tick_ns: None,
        }
    }

    /// Check if enough time has passed for the next tick.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, current_ns: u64) -> bool {
        match self.last_tick_ns {
            None => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            Some(last) if current_ns >= last.saturating_add(self.target_interval_ns) => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            _ => false,
        }
    }

    /// Forget the last tick so the next call fires immediately.
    pub fn reset(&mut self) {
        self.last_tick_ns = None;
    }

    /// Target interval in nanoseconds.
    pub fn interval_ns(&self) -> u64 {
        self.target_interval_ns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_elapsed() {
        let clock = MonotonicClock::start();
        assert!(clock.elapsed_ns() < 1_000_000_000);
        assert!(!clock.epoch_wall().is_empty());
    }

    #[test]
    fn test_ns_ms_conversion() {
        assert!((MonotonicClock::ns_to_ms(1_500_000) - 1.5).abs() < 1e-9);
        assert_eq!(MonotonicClock::ms_to_ns(2.0), 2_000_000);
        assert_eq!(MonotonicClock::ms_to_ns(-5.0), 0);
    }

    #[test]
    fn test_interval_for_hz() {
        assert_eq!(interval_for_hz(1000), Duration::from_millis(1));
        assert_eq!(interval_for_hz(0), Duration::from_secs(1));
    }

    #[test]
    fn test_rate_controller() {
        let mut ctrl = RateController::new(60);
        assert!(ctrl.should_tick(0)); // first tick always fires
        assert!(!ctrl.should_tick(1_000_000)); // 1ms later, too soon
        assert!(ctrl.should_tick(17_000_000)); // ~17ms later (60Hz ~ 16.67ms)
    }

    #[test]
    fn test_rate_controller_reset() {
        let mut ctrl = RateController::with_interval(Duration::from_secs(1));
        assert!(ctrl.should_tick(0));
        assert!(!ctrl.should_tick(10));
        ctrl.reset();
        assert!(ctrl.should_tick(10));
    }
}
