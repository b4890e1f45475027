//! Button gesture engine.
//!
//! Turns debounced level transitions into classified gestures: press,
//! release, change, hold (with optional repeat), N-times multiclick,
//! long-click-after-hold and the conditional event variants. Driven by a
//! fixed-period tick; every window is measured in wrapping milliseconds
//! against the last confirmed transition.
//!
//! Classification rules:
//! - every confirmed edge emits `Press`/`Release` plus `Change`;
//! - monostable buttons count presses as click units, bistable and
//!   motion-sensor buttons count every edge;
//! - a hold (monostable only) wins over multiclick: once `Hold` fires the
//!   sequence can only resolve to `LongClick(clicks - 1)`;
//! - when the click count reaches the highest multiplicity anyone listens
//!   for, the click event fires as soon as the gesture can no longer be
//!   reclassified (eager dispatch) and the rest of the sequence is
//!   swallowed until the window expires quietly;
//! - conditional events are sequence-scoped: `CondPress` on the edge that
//!   opens a sequence, `CondRelease` on the first release of a sequence
//!   with no hold fired, `CondChange` alongside either.

use crate::actions::{ActionRegistry, Event, LocalTrigger};
use crate::clock::elapsed_ms;
use crate::control::simple_button::{PinStateMachine, StateUpdate};
use crate::device::Element;
use crate::input::DigitalInput;
use crate::storage::ConfigStore;
use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;

/// Multiclick override accepted from the config store, milliseconds.
const MULTICLICK_CONFIG_RANGE: std::ops::RangeInclusive<u32> = 300..=10000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonKind {
    /// Returns to rest when released; supports hold and press/release
    /// pairing.
    Monostable,
    /// A switch whose level change itself is the gesture unit; no hold.
    Bistable,
    /// Counts like bistable, classified from occupancy edges.
    MotionSensor,
}

struct GestureState {
    pin: PinStateMachine,
    kind: ButtonKind,
    hold_ms: u32,
    multiclick_ms: u32,
    repeat_on_hold_ms: u32,
    repeat_enabled: bool,
    click_counter: u8,
    hold_sent: u32,
    /// Eager dispatch already resolved this sequence; swallow the rest.
    sequence_consumed: bool,
    cond_release_sent: bool,
    last_change_ms: Option<u32>,
    max_multiclick: u8,
    seen_registry_version: Option<u64>,
}

impl GestureState {
    fn reset_sequence(&mut self) {
        self.click_counter = 0;
        self.hold_sent = 0;
        self.sequence_consumed = false;
        self.cond_release_sent = false;
    }

    fn effective_repeat_ms(&self) -> u32 {
        if self.repeat_enabled {
            self.repeat_on_hold_ms
        } else {
            0
        }
    }
}

pub struct Button {
    trigger: LocalTrigger,
    input: Arc<dyn DigitalInput>,
    number: u8,
    state: Mutex<GestureState>,
}

impl Button {
    pub fn new(
        registry: ActionRegistry,
        input: Arc<dyn DigitalInput>,
        number: u8,
        kind: ButtonKind,
    ) -> Self {
        Self {
            trigger: LocalTrigger::new(registry),
            input,
            number,
            state: Mutex::new(GestureState {
                pin: PinStateMachine::new(false),
                kind,
                hold_ms: 0,
                multiclick_ms: 0,
                repeat_on_hold_ms: 0,
                repeat_enabled: true,
                click_counter: 0,
                hold_sent: 0,
                sequence_consumed: false,
                cond_release_sent: false,
                last_change_ms: None,
                max_multiclick: 0,
                seen_registry_version: None,
            }),
        }
    }

    pub fn trigger(&self) -> &LocalTrigger {
        &self.trigger
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn kind(&self) -> ButtonKind {
        self.state.lock().kind
    }

    pub fn set_button_kind(&self, kind: ButtonKind) {
        self.state.lock().kind = kind;
    }

    pub fn set_invert_logic(&self, invert: bool) {
        self.state.lock().pin.set_invert_logic(invert);
    }

    pub fn set_debounce_ms(&self, ms: u32) {
        self.state.lock().pin.set_debounce_ms(ms);
    }

    pub fn set_noise_filter_ms(&self, ms: u32) {
        self.state.lock().pin.set_noise_filter_ms(ms);
    }

    /// Hold detection threshold. Retained but inert for bistable and
    /// motion-sensor buttons, which have no hold concept.
    pub fn set_hold_time(&self, ms: u32) {
        self.state.lock().hold_ms = ms;
    }

    pub fn set_multiclick_time(&self, ms: u32) {
        self.state.lock().multiclick_ms = ms;
    }

    /// Re-emit `Hold` every `ms` while the button stays held.
    pub fn repeat_on_hold_every(&self, ms: u32) {
        self.state.lock().repeat_on_hold_ms = ms;
    }

    /// Suppresses hold repeats when the configured repeat period is below
    /// `threshold_ms` (0 disables unconditionally). Used when the server
    /// takes over hold handling and local repeats would double-fire.
    pub fn disable_repeat_on_hold(&self, threshold_ms: u32) {
        let mut st = self.state.lock();
        if threshold_ms == 0 || st.repeat_on_hold_ms < threshold_ms {
            st.repeat_enabled = false;
        }
    }

    pub fn enable_repeat_on_hold(&self) {
        self.state.lock().repeat_enabled = true;
    }

    pub fn is_pressed(&self) -> bool {
        self.state.lock().pin.is_pressed()
    }

    /// Highest click multiplicity any enabled handler listens for.
    pub fn max_multiclick_value(&self) -> u8 {
        self.trigger.max_multiclick()
    }

    fn classify(&self, now_ms: u32) -> Vec<Event> {
        let mut fire = Vec::new();
        let mut st = self.state.lock();

        // keep the eager-dispatch threshold in sync with the registry
        let version = self.trigger.registry().version();
        if st.seen_registry_version != Some(version) {
            st.max_multiclick = self.trigger.max_multiclick();
            st.seen_registry_version = Some(version);
        }

        let delta = st.last_change_ms.map(|t| elapsed_ms(now_ms, t));
        let update = st.pin.update(now_ms, &*self.input);

        match update {
            StateUpdate::ToPressed | StateUpdate::ToReleased => {
                let pressed_edge = update == StateUpdate::ToPressed;
                if pressed_edge {
                    fire.push(Event::Press);
                } else {
                    fire.push(Event::Release);
                }
                fire.push(Event::Change);

                if !st.sequence_consumed {
                    if pressed_edge {
                        if st.click_counter == 0 {
                            fire.push(Event::CondPress);
                            fire.push(Event::CondChange);
                        }
                    } else if st.hold_sent == 0 && !st.cond_release_sent {
                        fire.push(Event::CondRelease);
                        fire.push(Event::CondChange);
                        st.cond_release_sent = true;
                    }

                    let counts = match st.kind {
                        ButtonKind::Monostable => pressed_edge,
                        ButtonKind::Bistable | ButtonKind::MotionSensor => true,
                    };
                    if counts {
                        st.click_counter = st.click_counter.saturating_add(1);
                    }
                }
                st.last_change_ms = Some(now_ms);
            }
            StateUpdate::Pressed | StateUpdate::Released | StateUpdate::Unknown => {
                let Some(delta) = delta else {
                    return fire;
                };
                let pressed_now = update == StateUpdate::Pressed;

                if st.kind == ButtonKind::Monostable && pressed_now {
                    // hold detection: only before a multiclick sequence got
                    // past its first unit
                    if st.click_counter <= 1 && st.hold_ms > 0 {
                        let repeat = st.effective_repeat_ms();
                        let due = st
                            .hold_ms
                            .saturating_add((st.hold_sent).saturating_mul(repeat));
                        let may_fire = if repeat == 0 { st.hold_sent == 0 } else { true };
                        if may_fire && delta > due {
                            fire.push(Event::Hold);
                            st.hold_sent += 1;
                        }
                    }
                } else if st.multiclick_ms == 0 {
                    // no multiclick tracking: the sequence ends with the
                    // gesture itself
                    st.reset_sequence();
                } else {
                    // eager dispatch: once the highest registered
                    // multiplicity is reached and a hold can no longer
                    // reclassify the gesture, fire without waiting for the
                    // window
                    if !st.sequence_consumed
                        && st.hold_sent == 0
                        && st.max_multiclick > 0
                        && st.click_counter >= st.max_multiclick
                    {
                        debug!(
                            "button {}: eager click x{} dispatch",
                            self.number, st.click_counter
                        );
                        fire.push(Event::Click(st.click_counter));
                        st.sequence_consumed = true;
                    }

                    if delta > st.multiclick_ms
                        && (st.click_counter > 0 || st.hold_sent > 0 || st.sequence_consumed)
                    {
                        if !st.sequence_consumed {
                            if st.hold_sent == 0 {
                                if (1..=10).contains(&st.click_counter) {
                                    fire.push(Event::Click(st.click_counter));
                                }
                                if st.click_counter >= 10 {
                                    fire.push(Event::CrazyClicker);
                                }
                            } else if (1..=11).contains(&st.click_counter) {
                                // the hold consumed one click unit
                                fire.push(Event::LongClick(st.click_counter - 1));
                            }
                        }
                        st.reset_sequence();
                    }
                }
            }
        }
        fire
    }
}

impl Element for Button {
    fn on_init(&self, now_ms: u32) {
        let mut st = self.state.lock();
        st.pin.init(now_ms, &*self.input);
    }

    fn on_load_config(&self, store: &dyn ConfigStore) {
        let key = format!("{}_multiclick_ms", self.number);
        if let Some(value) = store.get_u32(&key)
            && MULTICLICK_CONFIG_RANGE.contains(&value)
        {
            debug!("button {}: multiclick override {} ms", self.number, value);
            self.set_multiclick_time(value);
        }
    }

    fn on_timer(&self, now_ms: u32) {
        // classification happens under the state lock, dispatch after it
        // is released so handlers may re-enter the engine
        for event in self.classify(now_ms) {
            debug!("button {}: {}", self.number, event);
            self.trigger.run_action(event);
        }
    }
}
