//! Event/action binding registry.
//!
//! One registry instance is owned by the device context and handed (as a
//! cheap clone) to every trigger and element that needs it. A binding is a
//! record `(trigger, event) -> (handler, action)` with an enable flag;
//! `run_action` fans an event out to every enabled binding in insertion
//! order.
//!
//! Identity is carried by stable integer handles (`TriggerId`,
//! `HandlerId`, `BindingId`) rather than pointers. Bindings live in an
//! index-stable arena: removal tombstones the slot instead of compacting,
//! and dispatch walks a snapshot taken under the lock, so handlers are free
//! to add, disable or remove bindings from inside `handle_action` without
//! invalidating an iteration already in flight.

use super::condition::{ChannelValueSource, Condition, ConditionDecorator};
use super::handler::ActionHandler;
use super::{Action, Event};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u32);

/// Snapshot of one binding, for queries.
#[derive(Clone, Copy, Debug)]
pub struct BindingInfo {
    pub trigger: TriggerId,
    pub event: Event,
    pub handler: HandlerId,
    pub action: Action,
    pub enabled: bool,
    pub always_enabled: bool,
}

struct HandlerEntry {
    handler: Option<Arc<dyn ActionHandler>>,
    /// Set for registry-owned condition decorators: the handler the
    /// decorator forwards to, used for deletion-matching.
    unwraps_to: Option<HandlerId>,
}

struct Binding {
    trigger: TriggerId,
    event: Event,
    handler: HandlerId,
    action: Action,
    enabled: bool,
    always_enabled: bool,
    /// Soft-deleted handler reference: the binding stays in place (order
    /// and handles preserved) but never fires.
    nullified: bool,
    removed: bool,
}

#[derive(Default)]
struct Inner {
    handlers: Vec<HandlerEntry>,
    bindings: Vec<Binding>,
    next_trigger: u32,
    version: u64,
}

impl Inner {
    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Follows decorator indirection down to the terminal handler id.
    fn resolve(&self, id: HandlerId) -> HandlerId {
        let mut current = id;
        while let Some(entry) = self.handlers.get(current.0 as usize) {
            match entry.unwraps_to {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }
}

#[derive(Clone, Default)]
pub struct ActionRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_handler(&self, handler: Arc<dyn ActionHandler>) -> HandlerId {
        let mut inner = self.inner.write();
        let id = HandlerId(inner.handlers.len() as u32);
        inner.handlers.push(HandlerEntry {
            handler: Some(handler),
            unwraps_to: None,
        });
        id
    }

    pub fn register_trigger(&self) -> TriggerId {
        let mut inner = self.inner.write();
        let id = TriggerId(inner.next_trigger);
        inner.next_trigger += 1;
        id
    }

    /// Creates a binding. The handler's `activate_action` hook runs once,
    /// after the binding is in place and outside the registry lock.
    /// Duplicate bindings are permitted and all fire.
    pub fn add_action(
        &self,
        trigger: TriggerId,
        action: Action,
        handler: HandlerId,
        event: Event,
        always_enabled: bool,
    ) -> BindingId {
        let (id, hook) = {
            let mut inner = self.inner.write();
            let id = BindingId(inner.bindings.len() as u32);
            inner.bindings.push(Binding {
                trigger,
                event,
                handler,
                action,
                enabled: true,
                always_enabled,
                nullified: false,
                removed: false,
            });
            inner.bump();
            let hook = inner
                .handlers
                .get(handler.0 as usize)
                .and_then(|e| e.handler.clone());
            (id, hook)
        };
        if let Some(h) = hook {
            h.activate_action(action);
        }
        id
    }

    /// Creates a binding through a threshold condition. The decorator is
    /// owned by the registry and torn down together with the binding;
    /// deletion-matching sees the wrapped target, not the decorator.
    pub fn add_conditional_action(
        &self,
        trigger: TriggerId,
        action: Action,
        target: HandlerId,
        event: Event,
        condition: Condition,
        source: Arc<dyn ChannelValueSource>,
    ) -> BindingId {
        let decorator_id = {
            let mut inner = self.inner.write();
            let client = inner
                .handlers
                .get(target.0 as usize)
                .and_then(|e| e.handler.clone());
            let id = HandlerId(inner.handlers.len() as u32);
            inner.handlers.push(HandlerEntry {
                handler: client
                    .map(|c| Arc::new(ConditionDecorator::new(condition, source, c)) as _),
                unwraps_to: Some(target),
            });
            id
        };
        self.add_action(trigger, action, decorator_id, event, false)
    }

    /// Fans one event out to every enabled matching binding, in insertion
    /// order. Reentrant registry calls from inside the handlers are fine.
    pub fn run_action(&self, trigger: TriggerId, event: Event) {
        let snapshot: Vec<(Arc<dyn ActionHandler>, Action)> = {
            let inner = self.inner.read();
            inner
                .bindings
                .iter()
                .filter(|b| {
                    !b.removed
                        && !b.nullified
                        && b.enabled
                        && b.trigger == trigger
                        && b.event == event
                })
                .filter_map(|b| {
                    inner
                        .handlers
                        .get(b.handler.0 as usize)
                        .and_then(|e| e.handler.clone())
                        .map(|h| (h, b.action))
                })
                .collect()
        };
        for (handler, action) in snapshot {
            handler.handle_action(event, action);
        }
    }

    pub fn is_event_used(
        &self,
        trigger: TriggerId,
        event: Event,
        ignore_always_enabled: bool,
    ) -> bool {
        let inner = self.inner.read();
        inner.bindings.iter().any(|b| {
            !b.removed
                && b.trigger == trigger
                && b.event == event
                && !(ignore_always_enabled && b.always_enabled)
        })
    }

    /// Sets `enabled` on bindings matching the filter; `None` is a
    /// wildcard for action/event. Always-enabled bindings are immune to
    /// disabling. Missing matches are a silent no-op.
    pub fn set_action_enabled(
        &self,
        trigger: TriggerId,
        action: Option<Action>,
        handler: HandlerId,
        event: Option<Event>,
        enabled: bool,
    ) {
        let mut inner = self.inner.write();
        for b in inner.bindings.iter_mut().filter(|b| {
            !b.removed
                && b.trigger == trigger
                && b.handler == handler
                && action.is_none_or(|a| a == b.action)
                && event.is_none_or(|e| e == b.event)
        }) {
            if enabled || !b.always_enabled {
                b.enabled = enabled;
            }
        }
        inner.bump();
    }

    pub fn enable_action(
        &self,
        trigger: TriggerId,
        action: Option<Action>,
        handler: HandlerId,
        event: Option<Event>,
    ) {
        self.set_action_enabled(trigger, action, handler, event, true);
    }

    pub fn disable_action(
        &self,
        trigger: TriggerId,
        action: Option<Action>,
        handler: HandlerId,
        event: Option<Event>,
    ) {
        self.set_action_enabled(trigger, action, handler, event, false);
    }

    /// Flips `enabled` on every binding for `(trigger, event)` whose
    /// handler is NOT `handler`. Used by the action-trigger channel to
    /// suppress or restore competing local handlers for an event it took
    /// over. Always-enabled bindings are never disabled.
    pub fn set_other_clients_enabled(
        &self,
        trigger: TriggerId,
        handler: HandlerId,
        event: Event,
        enabled: bool,
    ) {
        let mut inner = self.inner.write();
        for b in inner.bindings.iter_mut().filter(|b| {
            !b.removed && b.trigger == trigger && b.event == event && b.handler != handler
        }) {
            if enabled || !b.always_enabled {
                b.enabled = enabled;
            }
        }
        inner.bump();
    }

    pub fn disable_other_clients(&self, trigger: TriggerId, handler: HandlerId, event: Event) {
        self.set_other_clients_enabled(trigger, handler, event, false);
    }

    pub fn enable_other_clients(&self, trigger: TriggerId, handler: HandlerId, event: Event) {
        self.set_other_clients_enabled(trigger, handler, event, true);
    }

    /// First live binding on `trigger` for any of `events`, scanning the
    /// event list in the order given.
    pub fn first_binding_for(&self, trigger: TriggerId, events: &[Event]) -> Option<BindingId> {
        let inner = self.inner.read();
        for event in events {
            if let Some(pos) = inner
                .bindings
                .iter()
                .position(|b| !b.removed && b.trigger == trigger && b.event == *event)
            {
                return Some(BindingId(pos as u32));
            }
        }
        None
    }

    /// First live binding on `trigger` for `(handler, event)`.
    pub fn binding_for(
        &self,
        trigger: TriggerId,
        handler: HandlerId,
        event: Event,
    ) -> Option<BindingId> {
        let inner = self.inner.read();
        inner
            .bindings
            .iter()
            .position(|b| {
                !b.removed && b.trigger == trigger && b.handler == handler && b.event == event
            })
            .map(|pos| BindingId(pos as u32))
    }

    pub fn binding_info(&self, id: BindingId) -> Option<BindingInfo> {
        let inner = self.inner.read();
        inner
            .bindings
            .get(id.0 as usize)
            .filter(|b| !b.removed)
            .map(|b| BindingInfo {
                trigger: b.trigger,
                event: b.event,
                handler: b.handler,
                action: b.action,
                enabled: b.enabled,
                always_enabled: b.always_enabled,
            })
    }

    pub fn enable_binding(&self, id: BindingId) {
        self.set_binding_enabled(id, true);
    }

    /// No-op for always-enabled bindings.
    pub fn disable_binding(&self, id: BindingId) {
        self.set_binding_enabled(id, false);
    }

    fn set_binding_enabled(&self, id: BindingId, enabled: bool) {
        let mut inner = self.inner.write();
        if let Some(b) = inner.bindings.get_mut(id.0 as usize)
            && !b.removed
            && (enabled || !b.always_enabled)
        {
            b.enabled = enabled;
        }
        inner.bump();
    }

    /// Removes every binding whose terminal handler (after decorator
    /// unwrapping) is `handler`. Registry-owned decorators referencing it
    /// are dropped as part of the sweep.
    pub fn delete_actions_handled_by(&self, handler: HandlerId) {
        let mut inner = self.inner.write();
        let mut dropped_decorators = Vec::new();
        for i in 0..inner.bindings.len() {
            let bound = inner.bindings[i].handler;
            if !inner.bindings[i].removed && inner.resolve(bound) == handler {
                inner.bindings[i].removed = true;
                if bound != handler {
                    dropped_decorators.push(bound);
                }
            }
        }
        for id in dropped_decorators {
            if let Some(entry) = inner.handlers.get_mut(id.0 as usize) {
                entry.handler = None;
            }
        }
        inner.bump();
    }

    /// Soft-delete: bindings stay in place (ordering and handles intact)
    /// but stop firing. Used to break a reference to a handler that is
    /// going away while the list may be mid-dispatch.
    pub fn nullify_actions_handled_by(&self, handler: HandlerId) {
        let mut inner = self.inner.write();
        for i in 0..inner.bindings.len() {
            let bound = inner.bindings[i].handler;
            if !inner.bindings[i].removed && inner.resolve(bound) == handler {
                inner.bindings[i].nullified = true;
            }
        }
        inner.bump();
    }

    /// Removes every binding emitted by `trigger`.
    pub fn unregister_trigger(&self, trigger: TriggerId) {
        let mut inner = self.inner.write();
        let mut dropped_decorators = Vec::new();
        for b in inner.bindings.iter_mut().filter(|b| b.trigger == trigger) {
            if !b.removed {
                b.removed = true;
                dropped_decorators.push(b.handler);
            }
        }
        for id in dropped_decorators {
            if let Some(entry) = inner.handlers.get_mut(id.0 as usize)
                && entry.unwraps_to.is_some()
            {
                entry.handler = None;
            }
        }
        inner.bump();
    }

    /// Highest `n` with at least one enabled `Click(n)` binding on the
    /// trigger; 0 when none. The button engine uses this for eager
    /// multiclick dispatch.
    pub fn max_multiclick(&self, trigger: TriggerId) -> u8 {
        let inner = self.inner.read();
        inner
            .bindings
            .iter()
            .filter(|b| !b.removed && !b.nullified && b.enabled && b.trigger == trigger)
            .filter_map(|b| match b.event {
                Event::Click(n) => Some(n),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Mutation counter; cheap staleness check for cached queries.
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }
}

/// A trigger's handle on the registry: a `TriggerId` plus the registry
/// clone, exposing the emit/bind surface triggers embed.
#[derive(Clone)]
pub struct LocalTrigger {
    registry: ActionRegistry,
    id: TriggerId,
}

impl LocalTrigger {
    pub fn new(registry: ActionRegistry) -> Self {
        let id = registry.register_trigger();
        Self { registry, id }
    }

    pub fn id(&self) -> TriggerId {
        self.id
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn add_action(&self, action: Action, handler: HandlerId, event: Event) -> BindingId {
        self.registry.add_action(self.id, action, handler, event, false)
    }

    /// Binding that survives every disable call (panic buttons, config
    /// gestures).
    pub fn add_action_always_enabled(
        &self,
        action: Action,
        handler: HandlerId,
        event: Event,
    ) -> BindingId {
        self.registry.add_action(self.id, action, handler, event, true)
    }

    pub fn add_conditional_action(
        &self,
        action: Action,
        handler: HandlerId,
        event: Event,
        condition: Condition,
        source: Arc<dyn ChannelValueSource>,
    ) -> BindingId {
        self.registry
            .add_conditional_action(self.id, action, handler, event, condition, source)
    }

    pub fn run_action(&self, event: Event) {
        self.registry.run_action(self.id, event);
    }

    pub fn is_event_used(&self, event: Event, ignore_always_enabled: bool) -> bool {
        self.registry.is_event_used(self.id, event, ignore_always_enabled)
    }

    pub fn enable_action(&self, action: Option<Action>, handler: HandlerId, event: Option<Event>) {
        self.registry.enable_action(self.id, action, handler, event);
    }

    pub fn disable_action(&self, action: Option<Action>, handler: HandlerId, event: Option<Event>) {
        self.registry.disable_action(self.id, action, handler, event);
    }

    pub fn disable_other_clients(&self, handler: HandlerId, event: Event) {
        self.registry.disable_other_clients(self.id, handler, event);
    }

    pub fn enable_other_clients(&self, handler: HandlerId, event: Event) {
        self.registry.enable_other_clients(self.id, handler, event);
    }

    pub fn first_binding_for(&self, events: &[Event]) -> Option<BindingId> {
        self.registry.first_binding_for(self.id, events)
    }

    pub fn binding_for(&self, handler: HandlerId, event: Event) -> Option<BindingId> {
        self.registry.binding_for(self.id, handler, event)
    }

    pub fn max_multiclick(&self) -> u8 {
        self.registry.max_multiclick(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Recorder {
        calls: Mutex<Vec<(Event, Action)>>,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(Event, Action)> {
            self.calls.lock().clone()
        }
    }

    impl ActionHandler for Recorder {
        fn handle_action(&self, event: Event, action: Action) {
            self.calls.lock().push((event, action));
        }
    }

    #[test]
    fn test_run_action_fires_matching_bindings_in_order() {
        let registry = ActionRegistry::new();
        let trigger = registry.register_trigger();
        let first = Recorder::new();
        let second = Recorder::new();
        let first_id = registry.register_handler(first.clone());
        let second_id = registry.register_handler(second.clone());

        registry.add_action(trigger, Action::TurnOn, first_id, Event::Press, false);
        registry.add_action(trigger, Action::Toggle, second_id, Event::Press, false);
        registry.add_action(trigger, Action::TurnOff, first_id, Event::Release, false);

        registry.run_action(trigger, Event::Press);

        assert_eq!(first.calls(), vec![(Event::Press, Action::TurnOn)]);
        assert_eq!(second.calls(), vec![(Event::Press, Action::Toggle)]);
    }

    #[test]
    fn test_duplicate_bindings_all_fire() {
        let registry = ActionRegistry::new();
        let trigger = registry.register_trigger();
        let handler = Recorder::new();
        let id = registry.register_handler(handler.clone());

        registry.add_action(trigger, Action::Toggle, id, Event::Change, false);
        registry.add_action(trigger, Action::Toggle, id, Event::Change, false);
        registry.run_action(trigger, Event::Change);

        assert_eq!(handler.calls().len(), 2);
    }

    #[test]
    fn test_disable_action_with_wildcards() {
        let registry = ActionRegistry::new();
        let trigger = registry.register_trigger();
        let handler = Recorder::new();
        let id = registry.register_handler(handler.clone());

        registry.add_action(trigger, Action::TurnOn, id, Event::Press, false);
        registry.add_action(trigger, Action::TurnOff, id, Event::Release, false);

        registry.disable_action(trigger, None, id, None);
        registry.run_action(trigger, Event::Press);
        registry.run_action(trigger, Event::Release);
        assert!(handler.calls().is_empty());

        registry.enable_action(trigger, None, id, Some(Event::Release));
        registry.run_action(trigger, Event::Press);
        registry.run_action(trigger, Event::Release);
        assert_eq!(handler.calls(), vec![(Event::Release, Action::TurnOff)]);
    }

    #[test]
    fn test_always_enabled_immune_to_disable() {
        let registry = ActionRegistry::new();
        let trigger = registry.register_trigger();
        let handler = Recorder::new();
        let id = registry.register_handler(handler.clone());

        let binding = registry.add_action(trigger, Action::TurnOn, id, Event::Hold, true);
        registry.disable_action(trigger, None, id, None);
        registry.disable_binding(binding);
        registry.disable_other_clients(trigger, HandlerId(99), Event::Hold);

        registry.run_action(trigger, Event::Hold);
        assert_eq!(handler.calls().len(), 1);
    }

    #[test]
    fn test_disable_other_clients_spares_own_bindings() {
        let registry = ActionRegistry::new();
        let trigger = registry.register_trigger();
        let own = Recorder::new();
        let other = Recorder::new();
        let own_id = registry.register_handler(own.clone());
        let other_id = registry.register_handler(other.clone());

        registry.add_action(trigger, Action::SendTurnOn, own_id, Event::Press, false);
        registry.add_action(trigger, Action::TurnOn, other_id, Event::Press, false);

        registry.disable_other_clients(trigger, own_id, Event::Press);
        registry.run_action(trigger, Event::Press);

        assert_eq!(own.calls().len(), 1);
        assert!(other.calls().is_empty());

        registry.enable_other_clients(trigger, own_id, Event::Press);
        registry.run_action(trigger, Event::Press);
        assert_eq!(other.calls().len(), 1);
    }

    #[test]
    fn test_is_event_used_respects_always_enabled_filter() {
        let registry = ActionRegistry::new();
        let trigger = registry.register_trigger();
        let handler = Recorder::new();
        let id = registry.register_handler(handler);

        registry.add_action(trigger, Action::TurnOn, id, Event::Hold, true);
        assert!(registry.is_event_used(trigger, Event::Hold, false));
        assert!(!registry.is_event_used(trigger, Event::Hold, true));
        assert!(!registry.is_event_used(trigger, Event::Press, false));
    }

    #[test]
    fn test_delete_actions_handled_by_removes_bindings() {
        let registry = ActionRegistry::new();
        let trigger = registry.register_trigger();
        let doomed = Recorder::new();
        let kept = Recorder::new();
        let doomed_id = registry.register_handler(doomed.clone());
        let kept_id = registry.register_handler(kept.clone());

        registry.add_action(trigger, Action::TurnOn, doomed_id, Event::Press, false);
        registry.add_action(trigger, Action::TurnOn, kept_id, Event::Press, false);

        registry.delete_actions_handled_by(doomed_id);
        registry.run_action(trigger, Event::Press);

        assert!(doomed.calls().is_empty());
        assert_eq!(kept.calls().len(), 1);
        assert!(registry.is_event_used(trigger, Event::Press, false));
    }

    #[test]
    fn test_nullify_keeps_binding_in_place() {
        let registry = ActionRegistry::new();
        let trigger = registry.register_trigger();
        let handler = Recorder::new();
        let id = registry.register_handler(handler.clone());

        registry.add_action(trigger, Action::TurnOn, id, Event::Press, false);
        registry.nullify_actions_handled_by(id);
        registry.run_action(trigger, Event::Press);

        assert!(handler.calls().is_empty());
        // the slot is still occupied, so the event still reads as used
        assert!(registry.is_event_used(trigger, Event::Press, false));
    }

    #[test]
    fn test_unregister_trigger_drops_only_its_bindings() {
        let registry = ActionRegistry::new();
        let a = registry.register_trigger();
        let b = registry.register_trigger();
        let handler = Recorder::new();
        let id = registry.register_handler(handler.clone());

        registry.add_action(a, Action::TurnOn, id, Event::Press, false);
        registry.add_action(b, Action::TurnOff, id, Event::Press, false);

        registry.unregister_trigger(a);
        registry.run_action(a, Event::Press);
        registry.run_action(b, Event::Press);

        assert_eq!(handler.calls(), vec![(Event::Press, Action::TurnOff)]);
    }

    #[test]
    fn test_max_multiclick_tracks_enabled_click_bindings() {
        let registry = ActionRegistry::new();
        let trigger = registry.register_trigger();
        let handler = Recorder::new();
        let id = registry.register_handler(handler);

        assert_eq!(registry.max_multiclick(trigger), 0);
        registry.add_action(trigger, Action::TurnOn, id, Event::Click(1), false);
        let five = registry.add_action(trigger, Action::TurnOn, id, Event::Click(5), false);
        assert_eq!(registry.max_multiclick(trigger), 5);

        registry.disable_binding(five);
        assert_eq!(registry.max_multiclick(trigger), 1);
    }

    #[test]
    fn test_reentrant_binding_mutation_during_dispatch() {
        struct SelfDisabler {
            registry: ActionRegistry,
            trigger: TriggerId,
            own_id: Mutex<Option<HandlerId>>,
            fired: Mutex<u32>,
        }

        impl ActionHandler for SelfDisabler {
            fn handle_action(&self, _event: Event, _action: Action) {
                *self.fired.lock() += 1;
                if let Some(id) = *self.own_id.lock() {
                    // mutating the registry while run_action is iterating
                    self.registry.disable_action(self.trigger, None, id, None);
                }
            }
        }

        let registry = ActionRegistry::new();
        let trigger = registry.register_trigger();
        let handler = Arc::new(SelfDisabler {
            registry: registry.clone(),
            trigger,
            own_id: Mutex::new(None),
            fired: Mutex::new(0),
        });
        let id = registry.register_handler(handler.clone());
        *handler.own_id.lock() = Some(id);

        registry.add_action(trigger, Action::Toggle, id, Event::Press, false);
        registry.run_action(trigger, Event::Press);
        registry.run_action(trigger, Event::Press);

        assert_eq!(*handler.fired.lock(), 1);
    }

    #[test]
    fn test_version_bumps_on_mutation() {
        let registry = ActionRegistry::new();
        let trigger = registry.register_trigger();
        let handler = Recorder::new();
        let id = registry.register_handler(handler);

        let v0 = registry.version();
        registry.add_action(trigger, Action::TurnOn, id, Event::Press, false);
        let v1 = registry.version();
        assert_ne!(v0, v1);
        registry.disable_action(trigger, None, id, None);
        assert_ne!(v1, registry.version());
    }

    #[test]
    fn test_local_trigger_surface() {
        let registry = ActionRegistry::new();
        let trigger = LocalTrigger::new(registry.clone());
        let handler = Recorder::new();
        let id = registry.register_handler(handler.clone());

        let binding = trigger.add_action(Action::Toggle, id, Event::Click(2));
        assert_eq!(trigger.binding_for(id, Event::Click(2)), Some(binding));
        assert_eq!(trigger.first_binding_for(&[Event::Press, Event::Click(2)]), Some(binding));
        assert_eq!(trigger.max_multiclick(), 2);

        trigger.run_action(Event::Click(2));
        assert_eq!(handler.calls(), vec![(Event::Click(2), Action::Toggle)]);
    }
}
