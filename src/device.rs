//! Device runtime: element lifecycle and tick fan-out.

use crate::actions::ActionRegistry;
use crate::error::{BridgeError, Result};
use crate::protocol::ProtocolLayer;
use crate::storage::ConfigStore;
use log::{debug, info, warn};
use std::sync::Arc;

/// Channel configuration pushed by the server.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub channel_number: u8,
    pub config_type: u8,
    pub payload: Vec<u8>,
}

/// One functional unit of the device (a button, a trigger channel, a
/// relay). All hooks default to no-ops so elements implement only what
/// they participate in.
pub trait Element: Send + Sync {
    /// The server-visible channel this element owns, if any.
    fn channel_number(&self) -> Option<u8> {
        None
    }

    fn on_load_config(&self, _store: &dyn ConfigStore) {}

    fn on_load_state(&self, _store: &dyn ConfigStore) {}

    fn on_save_state(&self, _store: &dyn ConfigStore) {}

    fn on_init(&self, _now_ms: u32) {}

    /// Fixed-period tick; local state machines advance here.
    fn on_timer(&self, _now_ms: u32) {}

    /// Server-facing work while the link is up. Returns `true` when the
    /// element has nothing left to send; the device keeps polling
    /// elements that return `false`.
    fn iterate_connected(&self, _proto: &dyn ProtocolLayer) -> bool {
        true
    }

    /// Called after (re-)registration with the server completes.
    fn on_registered(&self) {}

    fn handle_channel_config(
        &self,
        _config: &ChannelConfig,
        _store: &dyn ConfigStore,
    ) -> Result<()> {
        Ok(())
    }
}

pub struct Device {
    registry: ActionRegistry,
    elements: Vec<Arc<dyn Element>>,
}

impl Device {
    pub fn new() -> Self {
        Self {
            registry: ActionRegistry::new(),
            elements: Vec::new(),
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn add_element(&mut self, element: Arc<dyn Element>) {
        self.elements.push(element);
    }

    pub fn elements(&self) -> &[Arc<dyn Element>] {
        &self.elements
    }

    /// Startup sequence: config, persisted state, then init.
    pub fn begin(&self, store: &dyn ConfigStore, now_ms: u32) {
        info!("Starting device with {} elements", self.elements.len());
        for element in &self.elements {
            element.on_load_config(store);
        }
        for element in &self.elements {
            element.on_load_state(store);
        }
        for element in &self.elements {
            element.on_init(now_ms);
        }
    }

    pub fn on_timer(&self, now_ms: u32) {
        for element in &self.elements {
            element.on_timer(now_ms);
        }
    }

    /// One connected-side pass. Returns `true` once every element reports
    /// it has drained its outgoing work.
    pub fn iterate_connected(&self, proto: &dyn ProtocolLayer) -> bool {
        let mut done = true;
        for element in &self.elements {
            if !element.iterate_connected(proto) {
                done = false;
            }
        }
        done
    }

    pub fn on_registered(&self) {
        debug!("Registered with server");
        for element in &self.elements {
            element.on_registered();
        }
    }

    pub fn save_state(&self, store: &dyn ConfigStore) {
        for element in &self.elements {
            element.on_save_state(store);
        }
    }

    /// Routes a server channel config to the element owning the channel.
    pub fn handle_channel_config(&self, config: &ChannelConfig, store: &dyn ConfigStore) -> Result<()> {
        let element = self
            .elements
            .iter()
            .find(|e| e.channel_number() == Some(config.channel_number))
            .ok_or(BridgeError::UnknownChannel(config.channel_number))?;
        if let Err(err) = element.handle_channel_config(config, store) {
            warn!(
                "Channel {} rejected config: {}",
                config.channel_number, err
            );
            return Err(err);
        }
        Ok(())
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::testing::RecordingProtocol;
    use crate::storage::MemoryConfigStore;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Probe {
        channel: Option<u8>,
        log: Mutex<Vec<String>>,
        drain_after: AtomicU32,
    }

    impl Element for Probe {
        fn channel_number(&self) -> Option<u8> {
            self.channel
        }

        fn on_load_config(&self, _store: &dyn ConfigStore) {
            self.log.lock().push("load_config".into());
        }

        fn on_load_state(&self, _store: &dyn ConfigStore) {
            self.log.lock().push("load_state".into());
        }

        fn on_init(&self, _now_ms: u32) {
            self.log.lock().push("init".into());
        }

        fn iterate_connected(&self, _proto: &dyn ProtocolLayer) -> bool {
            let remaining = self.drain_after.load(Ordering::Relaxed);
            if remaining > 0 {
                self.drain_after.store(remaining - 1, Ordering::Relaxed);
            }
            remaining <= 1
        }

        fn handle_channel_config(
            &self,
            config: &ChannelConfig,
            _store: &dyn ConfigStore,
        ) -> Result<()> {
            self.log.lock().push(format!("config:{}", config.config_type));
            Ok(())
        }
    }

    #[test]
    fn test_begin_runs_lifecycle_in_order() {
        let mut device = Device::new();
        let probe = Arc::new(Probe::default());
        device.add_element(probe.clone());

        let store = MemoryConfigStore::new();
        device.begin(&store, 0);

        assert_eq!(*probe.log.lock(), vec!["load_config", "load_state", "init"]);
    }

    #[test]
    fn test_iterate_connected_polls_until_drained() {
        let mut device = Device::new();
        let probe = Arc::new(Probe::default());
        probe.drain_after.store(3, Ordering::Relaxed);
        device.add_element(probe.clone());

        let proto = RecordingProtocol::new();
        assert!(!device.iterate_connected(&proto));
        assert!(!device.iterate_connected(&proto));
        assert!(device.iterate_connected(&proto));
    }

    #[test]
    fn test_channel_config_routed_by_channel_number() {
        let mut device = Device::new();
        let first = Arc::new(Probe {
            channel: Some(0),
            ..Default::default()
        });
        let second = Arc::new(Probe {
            channel: Some(3),
            ..Default::default()
        });
        device.add_element(first.clone());
        device.add_element(second.clone());

        let store = MemoryConfigStore::new();
        let config = ChannelConfig {
            channel_number: 3,
            config_type: 0,
            payload: vec![0, 0, 0, 0],
        };
        device.handle_channel_config(&config, &store).unwrap();

        assert!(first.log.lock().is_empty());
        assert_eq!(*second.log.lock(), vec!["config:0"]);

        let unknown = ChannelConfig {
            channel_number: 9,
            config_type: 0,
            payload: vec![],
        };
        assert!(matches!(
            device.handle_channel_config(&unknown, &store),
            Err(BridgeError::UnknownChannel(9))
        ));
    }
}
