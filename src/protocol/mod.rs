//! Server-facing transport.
//!
//! Elements talk to the outside world through `ProtocolLayer`; the MQTT
//! implementation lives in [`mqtt`]. Send methods return `false` when the
//! link cannot take the message right now, and the caller keeps it queued
//! for the next drain.

pub mod mqtt;

pub use mqtt::MqttPublisher;

use crate::channels::Capability;

pub trait ProtocolLayer: Send + Sync {
    /// Publishes one recognized gesture on a trigger channel.
    fn send_action_trigger(&self, channel_number: u8, capability: Capability) -> bool;

    /// Publishes a channel value (related channel and the mask of locally
    /// disabled operations).
    fn send_channel_value(&self, channel_number: u8, value: [u8; 8]) -> bool;
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Records sends; can simulate a saturated link.
    #[derive(Default)]
    pub struct RecordingProtocol {
        pub triggers: Mutex<Vec<(u8, Capability)>>,
        pub values: Mutex<Vec<(u8, [u8; 8])>>,
        rejecting: AtomicBool,
    }

    impl RecordingProtocol {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_rejecting(&self, rejecting: bool) {
            self.rejecting.store(rejecting, Ordering::Relaxed);
        }

        pub fn trigger_count(&self) -> usize {
            self.triggers.lock().len()
        }
    }

    impl ProtocolLayer for RecordingProtocol {
        fn send_action_trigger(&self, channel_number: u8, capability: Capability) -> bool {
            if self.rejecting.load(Ordering::Relaxed) {
                return false;
            }
            self.triggers.lock().push((channel_number, capability));
            true
        }

        fn send_channel_value(&self, channel_number: u8, value: [u8; 8]) -> bool {
            if self.rejecting.load(Ordering::Relaxed) {
                return false;
            }
            self.values.lock().push((channel_number, value));
            true
        }
    }
}
