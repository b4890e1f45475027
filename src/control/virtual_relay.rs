//! Virtual relay: the canonical local consumer of button actions.

use crate::actions::{Action, ActionHandler, ActionRegistry, Event, LocalTrigger};
use crate::device::Element;
use crate::protocol::ProtocolLayer;
use log::{debug, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Software on/off state with no physical output. Re-emits `Change` on
/// its own trigger so other elements can chain off relay transitions.
pub struct VirtualRelay {
    name: String,
    on: AtomicBool,
    trigger: LocalTrigger,
    dirty: AtomicBool,
}

impl VirtualRelay {
    pub fn new(registry: ActionRegistry, name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            on: AtomicBool::new(false),
            trigger: LocalTrigger::new(registry),
            dirty: AtomicBool::new(false),
        })
    }

    pub fn trigger(&self) -> &LocalTrigger {
        &self.trigger
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::Relaxed)
    }

    pub fn turn_on(&self) {
        self.set(true);
    }

    pub fn turn_off(&self) {
        self.set(false);
    }

    pub fn toggle(&self) {
        let was = self.on.fetch_xor(true, Ordering::Relaxed);
        info!("Relay '{}' toggled {}", self.name, if was { "off" } else { "on" });
        self.dirty.store(true, Ordering::Relaxed);
        self.trigger.run_action(Event::Change);
    }

    fn set(&self, on: bool) {
        if self.on.swap(on, Ordering::Relaxed) != on {
            info!("Relay '{}' turned {}", self.name, if on { "on" } else { "off" });
            self.dirty.store(true, Ordering::Relaxed);
            self.trigger.run_action(Event::Change);
        }
    }
}

impl ActionHandler for VirtualRelay {
    fn handle_action(&self, event: Event, action: Action) {
        debug!("Relay '{}': {} on {}", self.name, action, event);
        match action {
            Action::TurnOn => self.turn_on(),
            Action::TurnOff => self.turn_off(),
            Action::Toggle => self.toggle(),
            _ => {}
        }
    }
}

impl Element for VirtualRelay {
    fn iterate_connected(&self, proto: &dyn ProtocolLayer) -> bool {
        if !self.dirty.load(Ordering::Relaxed) {
            return true;
        }
        let mut value = [0u8; 8];
        value[0] = self.is_on() as u8;
        if proto.send_channel_value(0, value) {
            self.dirty.store(false, Ordering::Relaxed);
        }
        false
    }
}
