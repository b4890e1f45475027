//! Trigger Bridge library.
//!
//! Button gesture recognition and action dispatch: debounced inputs feed
//! a gesture engine whose events fan out through an action registry to
//! local handlers and to server-facing action trigger channels.

pub mod actions;
pub mod channels;
pub mod clock;
pub mod config;
pub mod control;
pub mod device;
pub mod error;
pub mod input;
pub mod protocol;
pub mod storage;

pub use error::{BridgeError, Result};
