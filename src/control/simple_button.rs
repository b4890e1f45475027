//! Raw pin sampling with software noise filter and debounce.
//!
//! Two stages guard every level transition: a candidate level must stay
//! stable for the noise-filter window before it can be committed, and
//! commits are additionally rate-limited by the debounce window. All
//! timing is wrapping `u32` milliseconds sampled once per tick, so the
//! effective resolution is the tick period.

use crate::actions::{ActionRegistry, Event, LocalTrigger};
use crate::clock::elapsed_ms;
use crate::device::Element;
use crate::input::DigitalInput;
use parking_lot::Mutex;
use std::sync::Arc;

pub const DEFAULT_DEBOUNCE_MS: u32 = 50;
pub const DEFAULT_NOISE_FILTER_MS: u32 = 20;

/// Outcome of one sampling tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateUpdate {
    /// Stable pressed, no transition this tick.
    Pressed,
    /// Stable released, no transition this tick.
    Released,
    /// Confirmed released -> pressed transition.
    ToPressed,
    /// Confirmed pressed -> released transition.
    ToReleased,
    /// No confirmed level seen yet.
    Unknown,
}

/// Debounce/noise-filter state machine for one input line.
///
/// Works in "pressed" space: the raw level is translated through
/// `invert_logic` at the sampling point, everything downstream only sees
/// pressed/released.
pub struct PinStateMachine {
    debounce_ms: u32,
    noise_filter_ms: u32,
    invert_logic: bool,
    prev: Option<bool>,
    candidate: Option<bool>,
    debounce_stamp: u32,
    filter_stamp: u32,
}

impl PinStateMachine {
    pub fn new(invert_logic: bool) -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            noise_filter_ms: DEFAULT_NOISE_FILTER_MS,
            invert_logic,
            prev: None,
            candidate: None,
            debounce_stamp: 0,
            filter_stamp: 0,
        }
    }

    pub fn set_debounce_ms(&mut self, ms: u32) {
        self.debounce_ms = ms;
    }

    pub fn set_noise_filter_ms(&mut self, ms: u32) {
        self.noise_filter_ms = ms;
    }

    /// Flips the pressed-level interpretation. Detection state is cleared
    /// (the level space changed), timing windows are kept.
    pub fn set_invert_logic(&mut self, invert: bool) {
        self.invert_logic = invert;
        self.prev = None;
        self.candidate = None;
    }

    fn sample(&self, input: &dyn DigitalInput) -> bool {
        input.is_high() != self.invert_logic
    }

    /// Adopts the current level without reporting a transition. Called at
    /// element init so the resting state of the line does not produce a
    /// phantom press at startup.
    pub fn init(&mut self, now_ms: u32, input: &dyn DigitalInput) {
        let level = self.sample(input);
        self.prev = Some(level);
        self.candidate = Some(level);
        self.debounce_stamp = now_ms;
        self.filter_stamp = now_ms;
    }

    pub fn is_pressed(&self) -> bool {
        self.prev == Some(true)
    }

    pub fn update(&mut self, now_ms: u32, input: &dyn DigitalInput) -> StateUpdate {
        if self.debounce_ms == 0 || elapsed_ms(now_ms, self.debounce_stamp) > self.debounce_ms {
            let current = self.sample(input);
            if self.prev != Some(current) {
                let filter_passed = self.noise_filter_ms == 0
                    || (self.candidate == Some(current)
                        && elapsed_ms(now_ms, self.filter_stamp) > self.noise_filter_ms);
                if filter_passed {
                    self.debounce_stamp = now_ms;
                    self.prev = Some(current);
                    self.candidate = Some(current);
                    return if current {
                        StateUpdate::ToPressed
                    } else {
                        StateUpdate::ToReleased
                    };
                }
                if self.candidate != Some(current) {
                    self.candidate = Some(current);
                    self.filter_stamp = now_ms;
                }
            } else {
                // spurious excursion ended before the filter window, drop
                // the candidate
                self.candidate = self.prev;
            }
        }
        match self.prev {
            Some(true) => StateUpdate::Pressed,
            Some(false) => StateUpdate::Released,
            None => StateUpdate::Unknown,
        }
    }
}

/// Minimal button element: press/release only, no gesture classification.
pub struct SimpleButton {
    trigger: LocalTrigger,
    input: Arc<dyn DigitalInput>,
    state: Mutex<PinStateMachine>,
}

impl SimpleButton {
    pub fn new(registry: ActionRegistry, input: Arc<dyn DigitalInput>, invert_logic: bool) -> Self {
        Self {
            trigger: LocalTrigger::new(registry),
            input,
            state: Mutex::new(PinStateMachine::new(invert_logic)),
        }
    }

    pub fn trigger(&self) -> &LocalTrigger {
        &self.trigger
    }

    pub fn set_debounce_ms(&self, ms: u32) {
        self.state.lock().set_debounce_ms(ms);
    }

    pub fn set_noise_filter_ms(&self, ms: u32) {
        self.state.lock().set_noise_filter_ms(ms);
    }
}

impl Element for SimpleButton {
    fn on_init(&self, now_ms: u32) {
        self.state.lock().init(now_ms, &*self.input);
    }

    fn on_timer(&self, now_ms: u32) {
        let update = self.state.lock().update(now_ms, &*self.input);
        match update {
            StateUpdate::ToPressed => self.trigger.run_action(Event::Press),
            StateUpdate::ToReleased => self.trigger.run_action(Event::Release),
            _ => {}
        }
    }
}
