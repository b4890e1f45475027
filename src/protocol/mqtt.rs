//! MQTT transport for trigger channels.
//!
//! Gestures the server subscribed to come out as bare retained-off
//! publishes on per-channel topics; the channel value goes out as a JSON
//! byte array. Publishing uses the non-blocking client path so the tick
//! loop never stalls on a slow broker.

use crate::channels::Capability;
use crate::config::MqttConfig;
use crate::protocol::ProtocolLayer;
use log::{debug, error, info, warn};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

fn capability_topic(cap: Capability) -> &'static str {
    match cap {
        Capability::TurnOn => "button_turn_on",
        Capability::TurnOff => "button_turn_off",
        Capability::Hold => "button_long_press",
        Capability::ShortPress(1) | Capability::Toggle(1) => "button_short_press",
        Capability::ShortPress(2) | Capability::Toggle(2) => "button_double_press",
        Capability::ShortPress(3) | Capability::Toggle(3) => "button_triple_press",
        Capability::ShortPress(4) | Capability::Toggle(4) => "button_quadruple_press",
        Capability::ShortPress(_) | Capability::Toggle(_) => "button_quintuple_press",
    }
}

pub struct MqttPublisher {
    client: AsyncClient,
    prefix: String,
    connected: Arc<AtomicBool>,
}

impl MqttPublisher {
    /// Builds the publisher and the event loop to drive alongside it. A
    /// random client-id suffix keeps restarted instances from evicting
    /// each other on the broker.
    pub fn new(config: &MqttConfig) -> (Self, EventLoop) {
        let client_id = format!("{}-{:04x}", config.client_id, rand::random::<u16>());
        let mut options = MqttOptions::new(&client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(30));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, 100);
        let publisher = Self {
            client,
            prefix: config.topic_prefix.clone(),
            connected: Arc::new(AtomicBool::new(false)),
        };
        (publisher, event_loop)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn connected_flag(&self) -> Arc<AtomicBool> {
        self.connected.clone()
    }

    fn try_publish(&self, topic: String, payload: Vec<u8>) -> bool {
        if !self.is_connected() {
            return false;
        }
        match self.client.try_publish(&topic, QoS::AtLeastOnce, false, payload) {
            Ok(()) => {
                debug!("Published {}", topic);
                true
            }
            Err(err) => {
                warn!("Publish to {} deferred: {}", topic, err);
                false
            }
        }
    }

    /// Drives the connection, maintaining the connected flag. Runs until
    /// the client is dropped.
    pub async fn run(mut event_loop: EventLoop, connected: Arc<AtomicBool>) {
        info!("Starting MQTT event loop");
        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("Connected to MQTT broker");
                    connected.store(true, Ordering::Relaxed);
                }
                Ok(_) => {}
                Err(err) => {
                    error!("MQTT connection error: {:?}", err);
                    connected.store(false, Ordering::Relaxed);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }
}

impl ProtocolLayer for MqttPublisher {
    fn send_action_trigger(&self, channel_number: u8, capability: Capability) -> bool {
        let topic = format!(
            "{}/channels/{}/{}",
            self.prefix,
            channel_number,
            capability_topic(capability)
        );
        self.try_publish(topic, Vec::new())
    }

    fn send_channel_value(&self, channel_number: u8, value: [u8; 8]) -> bool {
        let topic = format!("{}/channels/{}/value", self.prefix, channel_number);
        let payload = match serde_json::to_vec(&value.to_vec()) {
            Ok(payload) => payload,
            Err(err) => {
                error!("Channel value serialization failed: {}", err);
                return false;
            }
        };
        self.try_publish(topic, payload)
    }
}
