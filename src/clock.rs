//! Millisecond clock abstraction.
//!
//! The engine measures every debounce, hold and multiclick window against a
//! monotonic millisecond counter that wraps at `u32::MAX`, the same way
//! small embedded targets expose `millis()`. Elapsed time must therefore be
//! computed with wrapping subtraction, never with ordered comparison.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Monotonic millisecond counter with `u32` wraparound.
pub trait Clock: Send + Sync {
    fn millis(&self) -> u32;
}

/// Elapsed milliseconds between two counter samples, correct across
/// counter wraparound.
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Wall-clock backed implementation used by the binary.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn millis(&self) -> u32 {
        self.origin.elapsed().as_millis() as u32
    }
}

/// Manually advanced clock for tests and scripted simulations.
pub struct ManualClock {
    now: AtomicU32,
}

impl ManualClock {
    pub fn new(start: u32) -> Self {
        Self {
            now: AtomicU32::new(start),
        }
    }

    pub fn advance(&self, ms: u32) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u32) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn millis(&self) -> u32 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_handles_wraparound() {
        assert_eq!(elapsed_ms(100, 40), 60);
        assert_eq!(elapsed_ms(5, u32::MAX - 4), 10);
        assert_eq!(elapsed_ms(0, u32::MAX), 1);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(10);
        assert_eq!(clock.millis(), 10);
        clock.advance(25);
        assert_eq!(clock.millis(), 35);
        clock.set(5);
        assert_eq!(clock.millis(), 5);
    }
}
