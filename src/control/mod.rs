pub mod action_trigger;
pub mod button;
pub mod simple_button;
pub mod virtual_relay;

pub use action_trigger::{ActionHandlingPolicy, ActionTrigger};
pub use button::{Button, ButtonKind};
pub use simple_button::SimpleButton;
pub use virtual_relay::VirtualRelay;
