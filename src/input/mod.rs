//! Physical-input abstraction and simulated pins.
//!
//! Real deployments implement [`DigitalInput`] over GPIO; the binary and
//! the tests drive [`SimulatedPin`]s instead, either directly or through a
//! scripted gesture sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A single digital input line.
pub trait DigitalInput: Send + Sync {
    fn is_high(&self) -> bool;
}

/// Settable input line backed by an atomic, safe to flip from any task.
pub struct SimulatedPin {
    level: AtomicBool,
}

impl SimulatedPin {
    pub fn new(initial_high: bool) -> Arc<Self> {
        Arc::new(Self {
            level: AtomicBool::new(initial_high),
        })
    }

    pub fn set_high(&self) {
        self.level.store(true, Ordering::SeqCst);
    }

    pub fn set_low(&self) {
        self.level.store(false, Ordering::SeqCst);
    }

    pub fn set_level(&self, high: bool) {
        self.level.store(high, Ordering::SeqCst);
    }
}

impl DigitalInput for SimulatedPin {
    fn is_high(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }
}

/// One step of a scripted gesture: drive the pin to `high` and keep it
/// there for `hold_ms`.
#[derive(Clone, Copy, Debug)]
pub struct GestureStep {
    pub high: bool,
    pub hold_ms: u32,
}

/// Scripted pin driver used by the demo binary to exercise the gesture
/// engine end to end. `advance` applies due steps against the supplied
/// clock and reports whether the script still has work.
pub struct GestureScript {
    pin: Arc<SimulatedPin>,
    steps: Vec<GestureStep>,
    position: usize,
    step_started_at: Option<u32>,
}

impl GestureScript {
    pub fn new(pin: Arc<SimulatedPin>, steps: Vec<GestureStep>) -> Self {
        Self {
            pin,
            steps,
            position: 0,
            step_started_at: None,
        }
    }

    /// Convenience: `count` press/release pairs of `press_ms` each,
    /// separated by `gap_ms`.
    pub fn clicks(pin: Arc<SimulatedPin>, count: u32, press_ms: u32, gap_ms: u32) -> Self {
        let mut steps = Vec::new();
        for _ in 0..count {
            steps.push(GestureStep {
                high: true,
                hold_ms: press_ms,
            });
            steps.push(GestureStep {
                high: false,
                hold_ms: gap_ms,
            });
        }
        Self::new(pin, steps)
    }

    pub fn advance(&mut self, now_ms: u32) -> bool {
        if self.position >= self.steps.len() {
            return false;
        }
        match self.step_started_at {
            None => {
                self.pin.set_level(self.steps[self.position].high);
                self.step_started_at = Some(now_ms);
            }
            Some(started) => {
                if now_ms.wrapping_sub(started) >= self.steps[self.position].hold_ms {
                    self.position += 1;
                    self.step_started_at = None;
                    if self.position < self.steps.len() {
                        self.pin.set_level(self.steps[self.position].high);
                        self.step_started_at = Some(now_ms);
                    }
                }
            }
        }
        self.position < self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_pin_levels() {
        let pin = SimulatedPin::new(false);
        assert!(!pin.is_high());
        pin.set_high();
        assert!(pin.is_high());
        pin.set_low();
        assert!(!pin.is_high());
    }

    #[test]
    fn test_gesture_script_drives_pin() {
        let pin = SimulatedPin::new(false);
        let mut script = GestureScript::clicks(pin.clone(), 1, 100, 50);

        assert!(script.advance(0));
        assert!(pin.is_high());
        assert!(script.advance(60)); // still pressing
        assert!(pin.is_high());
        assert!(script.advance(110)); // release step begins
        assert!(!pin.is_high());
        assert!(!script.advance(170)); // script exhausted
    }
}
