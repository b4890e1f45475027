//! The capability interface every action consumer implements.

use super::{Action, Event};

/// Receiver side of the action graph.
///
/// Implementations take `&self` and keep their state behind atomics or
/// locks, so one handler instance can be bound to any number of triggers
/// and invoked reentrantly (a handler may call `run_action` on another
/// trigger from inside `handle_action`).
pub trait ActionHandler: Send + Sync {
    fn handle_action(&self, event: Event, action: Action);

    /// Called once when a binding to this handler is created. Handlers
    /// that pre-configure internal capability masks (the action-trigger
    /// channel) hook in here; everyone else ignores it.
    fn activate_action(&self, _action: Action) {}
}
