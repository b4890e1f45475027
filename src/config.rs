use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Find the first '=' and split there
        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim();
            let mut value = line[eq_pos + 1..].trim();

            // Remove surrounding quotes if present
            if (value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\''))
            {
                value = &value[1..value.len() - 1];
            }

            // Only set if not already set (env vars take precedence)
            if std::env::var(key).is_err() {
                // SAFETY: We're single-threaded at this point (called before any async runtime)
                unsafe { std::env::set_var(key, value) };
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub device: DeviceConfig,
    pub mqtt: MqttConfig,
    pub buttons: Vec<ButtonConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    /// Stable device identity; generated once and kept in the config file.
    pub guid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub topic_prefix: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ButtonType {
    Monostable,
    Bistable,
    MotionSensor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonConfig {
    pub number: u8,
    pub button_type: ButtonType,
    #[serde(default)]
    pub invert_logic: bool,
    /// 0 disables hold detection.
    #[serde(default)]
    pub hold_time_ms: u32,
    /// 0 disables multiclick tracking.
    #[serde(default = "default_multiclick_ms")]
    pub multiclick_time_ms: u32,
    #[serde(default)]
    pub repeat_on_hold_ms: u32,
    /// Channel number of the element this trigger operates on, shown by
    /// the server next to the trigger.
    pub related_channel: Option<u8>,
}

fn default_multiclick_ms() -> u32 {
    450
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig {
                name: "Trigger Bridge".to_string(),
                guid: Uuid::new_v4().to_string(),
            },
            mqtt: MqttConfig {
                broker_host: "10.0.0.2".to_string(),
                broker_port: 1883,
                client_id: "trigger-bridge".to_string(),
                topic_prefix: "supla/devices/trigger-bridge".to_string(),
                username: None,
                password: None,
            },
            buttons: vec![ButtonConfig {
                number: 1,
                button_type: ButtonType::Monostable,
                invert_logic: false,
                hold_time_ms: 700,
                multiclick_time_ms: 450,
                repeat_on_hold_ms: 0,
                related_channel: None,
            }],
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        BridgeConfig::default().mqtt
    }
}

impl BridgeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| BridgeError::ConfigFile(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| BridgeError::ConfigFile(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("DEVICE_NAME") {
            config.device.name = name;
        }

        // MQTT configuration
        if let Ok(host) = std::env::var("MQTT_BROKER_HOST") {
            config.mqtt.broker_host = host;
        }
        if let Ok(port) = std::env::var("MQTT_BROKER_PORT")
            && let Ok(p) = port.parse()
        {
            config.mqtt.broker_port = p;
        }
        if let Ok(client_id) = std::env::var("MQTT_CLIENT_ID") {
            config.mqtt.client_id = client_id;
        }
        if let Ok(prefix) = std::env::var("MQTT_TOPIC_PREFIX") {
            config.mqtt.topic_prefix = prefix;
        }
        if let Ok(username) = std::env::var("MQTT_USERNAME") {
            config.mqtt.username = Some(username);
        }
        if let Ok(password) = std::env::var("MQTT_PASSWORD") {
            config.mqtt.password = Some(password);
        }

        config
    }

    fn validate(&self) -> Result<()> {
        let mut seen = Vec::new();
        for button in &self.buttons {
            if seen.contains(&button.number) {
                return Err(BridgeError::InvalidButton(format!(
                    "duplicate button number {}",
                    button.number
                )));
            }
            seen.push(button.number);
            if button.multiclick_time_ms != 0 && button.multiclick_time_ms < 100 {
                return Err(BridgeError::InvalidButton(format!(
                    "button {}: multiclick time below 100 ms",
                    button.number
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trip() {
        let config = BridgeConfig::default();
        let raw = serde_json::to_string(&config).unwrap();
        let parsed: BridgeConfig = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.buttons.len(), 1);
        assert_eq!(parsed.buttons[0].button_type, ButtonType::Monostable);
        assert_eq!(parsed.device.guid, config.device.guid);
    }

    #[test]
    fn test_button_defaults_fill_in() {
        let raw = r#"{"number": 2, "button_type": "bistable", "related_channel": 1}"#;
        let button: ButtonConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(button.button_type, ButtonType::Bistable);
        assert!(!button.invert_logic);
        assert_eq!(button.hold_time_ms, 0);
        assert_eq!(button.multiclick_time_ms, 450);
        assert_eq!(button.related_channel, Some(1));
    }

    #[test]
    fn test_validate_rejects_duplicate_numbers() {
        let mut config = BridgeConfig::default();
        let mut dup = config.buttons[0].clone();
        dup.button_type = ButtonType::MotionSensor;
        config.buttons.push(dup);
        assert!(matches!(
            config.validate(),
            Err(BridgeError::InvalidButton(_))
        ));
    }
}
