//! Action trigger element.
//!
//! Bridges a button's gesture stream to the server: advertises which
//! gestures the channel can deliver, applies the server-granted subset,
//! and suppresses local handlers for gestures the server took over.
//! Recognized gestures queue on the channel and drain while connected.
//!
//! The press/click-1 switcheroo: a button whose only local binding sits on
//! a raw edge event (press, release, or the level change of a bistable
//! switch) gets that binding cloned onto `Click(1)` at init. While the
//! server subscription is live the clone handles local operation, so the
//! local action waits for multiclick resolution and stays consistent with
//! what the server sees; with no subscription the original edge binding
//! is restored.

use crate::actions::{Action, ActionHandler, BindingId, Event, HandlerId};
use crate::channels::{AtChannel, Capability, CapabilitySet};
use crate::control::button::{Button, ButtonKind};
use crate::device::{ChannelConfig, Element};
use crate::error::{BridgeError, Result};
use crate::protocol::ProtocolLayer;
use crate::storage::ConfigStore;
use log::{debug, info};
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

/// How server grants translate to publishing and local suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionHandlingPolicy {
    /// Publish and suppress exactly what the server granted.
    #[default]
    RelayOnSuplaServer,
    /// Publish every gesture; suppress only server-granted overlaps.
    PublishAllDisableNone,
    /// Publish every gesture and suppress all overlapping local handling.
    PublishAllDisableAll,
}

impl ActionHandlingPolicy {
    fn from_config(value: i32) -> Self {
        match value {
            1 => ActionHandlingPolicy::PublishAllDisableNone,
            2 => ActionHandlingPolicy::PublishAllDisableAll,
            _ => ActionHandlingPolicy::RelayOnSuplaServer,
        }
    }
}

fn capability_for_action(action: Action) -> Option<Capability> {
    match action {
        Action::SendTurnOn => Some(Capability::TurnOn),
        Action::SendTurnOff => Some(Capability::TurnOff),
        Action::SendToggle(n) => Some(Capability::Toggle(n)),
        Action::SendHold => Some(Capability::Hold),
        Action::SendShortPress(n) => Some(Capability::ShortPress(n)),
        _ => None,
    }
}

fn action_for_capability(cap: Capability) -> Action {
    match cap {
        Capability::TurnOn => Action::SendTurnOn,
        Capability::TurnOff => Action::SendTurnOff,
        Capability::Toggle(n) => Action::SendToggle(n),
        Capability::Hold => Action::SendHold,
        Capability::ShortPress(n) => Action::SendShortPress(n),
    }
}

fn event_for_capability(cap: Capability) -> Event {
    match cap {
        Capability::TurnOn => Event::Press,
        Capability::TurnOff => Event::Release,
        Capability::Hold => Event::Hold,
        Capability::Toggle(n) | Capability::ShortPress(n) => Event::Click(n),
    }
}

/// Events suppressed and restored together with the given one.
fn companion_events(event: Event) -> &'static [Event] {
    match event {
        Event::Press => &[Event::CondPress],
        Event::Release => &[Event::CondRelease],
        Event::Click(1) => &[Event::Change, Event::CondChange],
        _ => &[],
    }
}

#[derive(Clone, Copy)]
struct Switcheroo {
    /// The user's edge binding, live while no server subscription exists.
    original: BindingId,
    /// Its `Click(1)` clone, live while the subscription is active.
    clone: BindingId,
}

struct AtState {
    channel: AtChannel,
    policy: ActionHandlingPolicy,
    disabled_capabilities: CapabilitySet,
    storage_enabled: bool,
    switcheroo: Option<Switcheroo>,
    /// Channel value changed and has not reached the server yet.
    value_dirty: bool,
}

pub struct ActionTrigger {
    button: Arc<Button>,
    channel_number: u8,
    handler_id: OnceLock<HandlerId>,
    state: Mutex<AtState>,
}

impl ActionTrigger {
    /// Attaches to a button and registers itself as an action handler on
    /// the button's registry.
    pub fn new(button: Arc<Button>, channel_number: u8) -> Arc<Self> {
        let at = Arc::new(Self {
            button,
            channel_number,
            handler_id: OnceLock::new(),
            state: Mutex::new(AtState {
                channel: AtChannel::new(channel_number),
                policy: ActionHandlingPolicy::default(),
                disabled_capabilities: CapabilitySet::empty(),
                storage_enabled: false,
                switcheroo: None,
                value_dirty: false,
            }),
        });
        let id = at.button.trigger().registry().register_handler(at.clone());
        let _ = at.handler_id.set(id);
        at
    }

    fn handler_id(&self) -> Option<HandlerId> {
        self.handler_id.get().copied()
    }

    pub fn set_related_channel(&self, channel: u8) {
        let mut st = self.state.lock();
        st.channel.set_related_channel(channel);
        st.value_dirty = true;
    }

    /// Permanently removes a capability from the advertised set, before
    /// init. Later server grants for it have no effect.
    pub fn disable_at_capability(&self, cap: Capability) {
        self.state.lock().disabled_capabilities.insert(cap);
    }

    pub fn enable_state_storage(&self) {
        self.state.lock().storage_enabled = true;
    }

    pub fn func_list(&self) -> CapabilitySet {
        self.state.lock().channel.func_list()
    }

    pub fn disables_local_operation(&self) -> CapabilitySet {
        self.state.lock().channel.disables_local_operation()
    }

    pub fn active_actions(&self) -> CapabilitySet {
        self.state.lock().channel.active()
    }

    fn storage_key(&self) -> String {
        format!("{}_at_active", self.channel_number)
    }

    fn add_at_binding(&self, handler: HandlerId, cap: Capability) {
        let trigger = self.button.trigger();
        let action = action_for_capability(cap);
        let event = event_for_capability(cap);
        let binding = trigger.add_action(action, handler, event);
        trigger.registry().disable_binding(binding);
    }

    /// Looks for the single raw-edge local binding the switcheroo should
    /// manage and creates its disabled `Click(1)` clone.
    fn setup_switcheroo(&self, kind: ButtonKind) -> Option<Switcheroo> {
        let trigger = self.button.trigger();
        let chosen = match kind {
            ButtonKind::Monostable => {
                let press = trigger.is_event_used(Event::Press, false);
                let release = trigger.is_event_used(Event::Release, false);
                let cond_press = trigger.is_event_used(Event::CondPress, false);
                let cond_release = trigger.is_event_used(Event::CondRelease, false);
                match (press, release, cond_press, cond_release) {
                    (true, false, false, false) => Some(Event::Press),
                    (false, true, false, false) => Some(Event::Release),
                    (false, false, true, false) => Some(Event::CondPress),
                    (false, false, false, true) => Some(Event::CondRelease),
                    _ => None,
                }
            }
            ButtonKind::Bistable => {
                let change = trigger.is_event_used(Event::Change, false);
                let cond_change = trigger.is_event_used(Event::CondChange, false);
                match (change, cond_change) {
                    (true, false) => Some(Event::Change),
                    (false, true) => Some(Event::CondChange),
                    _ => None,
                }
            }
            // motion sensors always react to raw edges, subscription or not
            ButtonKind::MotionSensor => None,
        };

        let original = trigger.first_binding_for(&[chosen?])?;
        let info = trigger.registry().binding_info(original)?;
        let clone = trigger.add_action(info.action, info.handler, Event::Click(1));
        trigger.registry().disable_binding(clone);
        Some(Switcheroo { original, clone })
    }

    /// Applies the current active mask: flips the switcheroo, gates hold
    /// repeats, enables the channel's own bindings for granted gestures
    /// and suppresses or restores competing local handlers.
    fn parse_active_actions(&self) {
        let Some(handler) = self.handler_id() else {
            return;
        };
        let trigger = self.button.trigger();
        let registry = trigger.registry();

        let (policy, active, disables, switcheroo) = {
            let mut st = self.state.lock();
            if st.policy == ActionHandlingPolicy::PublishAllDisableAll {
                st.channel.set_active(CapabilitySet::all_bits());
            }
            (
                st.policy,
                st.channel.active(),
                st.channel.disables_local_operation(),
                st.switcheroo,
            )
        };
        let actions_to_disable = active.intersection(disables);

        let mut make_sure_clone_disabled = false;
        let mut make_sure_original_disabled = false;
        if let Some(sw) = switcheroo {
            if !active.is_empty() || policy == ActionHandlingPolicy::PublishAllDisableNone {
                registry.disable_binding(sw.original);
                registry.enable_binding(sw.clone);
                make_sure_original_disabled = true;
            } else {
                registry.enable_binding(sw.original);
                registry.disable_binding(sw.clone);
                make_sure_clone_disabled = true;
            }
        }

        if active.contains(Capability::Hold) {
            self.button.disable_repeat_on_hold(1000);
        } else {
            self.button.enable_repeat_on_hold();
        }

        for cap in Capability::all() {
            let event = event_for_capability(cap);
            let action = action_for_capability(cap);

            if active.contains(cap) || policy == ActionHandlingPolicy::PublishAllDisableNone {
                trigger.enable_action(Some(action), handler, Some(event));
            } else {
                trigger.disable_action(Some(action), handler, Some(event));
            }

            if actions_to_disable.contains(cap) {
                trigger.disable_other_clients(handler, event);
                for extra in companion_events(event) {
                    trigger.disable_other_clients(handler, *extra);
                }
            } else if disables.contains(cap) {
                trigger.enable_other_clients(handler, event);
                for extra in companion_events(event) {
                    trigger.enable_other_clients(handler, *extra);
                }
                // restoring Click(1) re-enabled both switcheroo bindings;
                // exactly one may stay live
                if event == Event::Click(1)
                    && let Some(sw) = switcheroo
                {
                    if make_sure_clone_disabled {
                        make_sure_clone_disabled = false;
                        registry.disable_binding(sw.clone);
                    }
                    if make_sure_original_disabled {
                        make_sure_original_disabled = false;
                        registry.disable_binding(sw.original);
                    }
                }
            }
        }
    }
}

impl ActionHandler for ActionTrigger {
    fn handle_action(&self, _event: Event, action: Action) {
        let Some(cap) = capability_for_action(action) else {
            return;
        };
        let mut st = self.state.lock();
        if st.channel.active().contains(cap)
            || st.policy != ActionHandlingPolicy::RelayOnSuplaServer
        {
            debug!("AT[{}]: queued {}", self.channel_number, cap);
            st.channel.push_trigger(cap);
        }
    }

    fn activate_action(&self, action: Action) {
        if let Some(cap) = capability_for_action(action) {
            self.state.lock().channel.add_capability(cap);
        }
    }
}

impl Element for ActionTrigger {
    fn channel_number(&self) -> Option<u8> {
        Some(self.channel_number)
    }

    fn on_load_config(&self, store: &dyn ConfigStore) {
        let key = format!("{}_mqtt_at", self.channel_number);
        let policy = ActionHandlingPolicy::from_config(store.get_i32(&key).unwrap_or(0));
        self.state.lock().policy = policy;
    }

    fn on_load_state(&self, store: &dyn ConfigStore) {
        let restored = {
            let mut st = self.state.lock();
            if !st.storage_enabled {
                return;
            }
            let Some(mask) = store.get_u32(&self.storage_key()) else {
                return;
            };
            st.channel.set_active(CapabilitySet::from_bits(mask));
            mask
        };
        if restored != 0 {
            info!(
                "AT[{}]: restored active actions {:#x}",
                self.channel_number, restored
            );
        }
    }

    fn on_save_state(&self, store: &dyn ConfigStore) {
        let st = self.state.lock();
        if st.storage_enabled {
            store.set_u32(&self.storage_key(), st.channel.active().bits());
        }
    }

    fn on_init(&self, _now_ms: u32) {
        let Some(handler) = self.handler_id() else {
            return;
        };
        let trigger = self.button.trigger();
        let kind = self.button.kind();
        let disabled = self.state.lock().disabled_capabilities;

        let switcheroo = self.setup_switcheroo(kind);

        let mut disables = CapabilitySet::empty();
        match kind {
            ButtonKind::Bistable => {
                if trigger.is_event_used(Event::Press, true)
                    || trigger.is_event_used(Event::CondPress, true)
                {
                    disables.insert(Capability::TurnOn);
                }
                if trigger.is_event_used(Event::Release, true)
                    || trigger.is_event_used(Event::CondRelease, true)
                {
                    disables.insert(Capability::TurnOff);
                }
                if trigger.is_event_used(Event::Click(1), true)
                    || trigger.is_event_used(Event::Change, true)
                    || trigger.is_event_used(Event::CondChange, true)
                {
                    disables.insert(Capability::Toggle(1));
                }
                for n in 2..=5 {
                    if trigger.is_event_used(Event::Click(n), true) {
                        disables.insert(Capability::Toggle(n));
                    }
                }

                for cap in [Capability::TurnOn, Capability::TurnOff] {
                    if !disabled.contains(cap) {
                        self.add_at_binding(handler, cap);
                    }
                }
                for n in 1..=5 {
                    if !disabled.contains(Capability::Toggle(n)) {
                        self.add_at_binding(handler, Capability::Toggle(n));
                    }
                }
            }
            ButtonKind::Monostable => {
                for cap in [Capability::TurnOn, Capability::TurnOff] {
                    if !disabled.contains(cap) {
                        self.add_at_binding(handler, cap);
                    }
                }

                if trigger.is_event_used(Event::Hold, true) {
                    disables.insert(Capability::Hold);
                }
                // the switcheroo clone counts into the x1 bit
                for n in 1..=5 {
                    if trigger.is_event_used(Event::Click(n), true) {
                        disables.insert(Capability::ShortPress(n));
                    }
                }

                if !disabled.contains(Capability::Hold) {
                    self.add_at_binding(handler, Capability::Hold);
                }
                for n in 1..=5 {
                    if !disabled.contains(Capability::ShortPress(n)) {
                        self.add_at_binding(handler, Capability::ShortPress(n));
                    }
                }
            }
            ButtonKind::MotionSensor => {
                if trigger.is_event_used(Event::Press, true) {
                    disables.insert(Capability::TurnOn);
                }
                if trigger.is_event_used(Event::Release, true) {
                    disables.insert(Capability::TurnOff);
                }
                for cap in [Capability::TurnOn, Capability::TurnOff] {
                    if !disabled.contains(cap) {
                        self.add_at_binding(handler, cap);
                    }
                }
            }
        }

        {
            let mut st = self.state.lock();
            st.switcheroo = switcheroo;
            st.channel.set_disables_local_operation(disables);
            st.value_dirty = true;
        }
        self.parse_active_actions();
    }

    fn iterate_connected(&self, proto: &dyn ProtocolLayer) -> bool {
        let (value_dirty, value) = {
            let st = self.state.lock();
            (st.value_dirty, st.channel.value())
        };
        if value_dirty {
            if proto.send_channel_value(self.channel_number, value) {
                self.state.lock().value_dirty = false;
            }
            return false;
        }

        let Some(cap) = self.state.lock().channel.pop_trigger() else {
            return true;
        };
        if proto.send_action_trigger(self.channel_number, cap) {
            !self.state.lock().channel.has_pending()
        } else {
            self.state.lock().channel.push_trigger(cap);
            false
        }
    }

    fn on_registered(&self) {
        // triggers recognized while offline are stale by now
        let mut st = self.state.lock();
        st.channel.clear_pending();
        st.value_dirty = true;
    }

    fn handle_channel_config(&self, config: &ChannelConfig, store: &dyn ConfigStore) -> Result<()> {
        if config.config_type != 0 {
            return Ok(());
        }
        let mask: [u8; 4] = config.payload.as_slice().try_into().map_err(|_| {
            BridgeError::ChannelConfigRejected(format!(
                "expected 4-byte active actions, got {} bytes",
                config.payload.len()
            ))
        })?;
        let active = u32::from_le_bytes(mask);
        debug!(
            "AT[{}] received config with active actions: {:#x}",
            self.channel_number, active
        );
        {
            let mut st = self.state.lock();
            st.channel.set_active(CapabilitySet::from_bits(active));
        }
        self.parse_active_actions();
        if self.state.lock().storage_enabled {
            store.schedule_save(2000);
        }
        Ok(())
    }
}
