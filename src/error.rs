use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum BridgeError {
    #[error("Configuration file error: {0}")]
    ConfigFile(String),

    #[error("Invalid button definition: {0}")]
    InvalidButton(String),

    #[error("Unknown channel number: {0}")]
    UnknownChannel(u8),

    #[error("Channel config rejected: {0}")]
    ChannelConfigRejected(String),

    #[error("State store error: {0}")]
    StateStore(String),

    #[error("MQTT publish failed: {0}")]
    MqttPublish(String),

    #[error("MQTT connection error: {0}")]
    MqttConnection(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
