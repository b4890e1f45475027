//! Event and action vocabulary plus the dispatch registry.
//!
//! Triggers (buttons, sensors) emit [`Event`]s; handlers (relays, the
//! action-trigger channel) receive an [`Action`] telling them what to do.
//! The pairing between the two lives in the [`registry::ActionRegistry`].

pub mod condition;
pub mod handler;
pub mod registry;

pub use condition::{ChannelKind, ChannelValueSource, Condition};
pub use handler::ActionHandler;
pub use registry::{ActionRegistry, BindingId, HandlerId, LocalTrigger, TriggerId};

use strum::Display;

/// Something that happened on a trigger.
///
/// `Click(n)` covers 1..=10 confirmed clicks; `LongClick(k)` is the
/// hold-terminated variant where `k` counts the clicks preceding the hold
/// (0..=10). The `Cond*` variants are suppressed while a competing hold or
/// multiclick classification could still reinterpret the interaction.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Press,
    Release,
    Change,
    SecondaryChange,
    Hold,
    Click(u8),
    LongClick(u8),
    CrazyClicker,
    CondPress,
    CondRelease,
    CondChange,
}

/// What a bound handler should do when its event fires.
///
/// The `Send*` verbs are consumed by the action-trigger channel and map
/// 1:1 onto wire capabilities; the rest are local peripheral verbs.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    TurnOn,
    TurnOff,
    Toggle,
    SendTurnOn,
    SendTurnOff,
    SendToggle(u8),
    SendHold,
    SendShortPress(u8),
}
