//! Persistent key/value state.
//!
//! Elements load and save small typed values (multiclick overrides, the
//! server-approved trigger mask) through the `ConfigStore` trait. The
//! production store keeps a JSON document on disk and batches writes with
//! a debounce deadline so a burst of channel configs costs one flush.

use crate::error::{BridgeError, Result};
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub trait ConfigStore: Send + Sync {
    fn get_i32(&self, key: &str) -> Option<i32>;
    fn set_i32(&self, key: &str, value: i32);
    fn get_u32(&self, key: &str) -> Option<u32>;
    fn set_u32(&self, key: &str, value: u32);
    /// Requests a flush no sooner than `delay_ms` from now. Repeated calls
    /// keep pushing the deadline out.
    fn schedule_save(&self, delay_ms: u32);
}

/// JSON-file backed store.
pub struct JsonConfigStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
    save_deadline: Mutex<Option<DateTime<Utc>>>,
}

impl JsonConfigStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => {
                    info!("Loaded state from {}", path.display());
                    map
                }
                Ok(_) | Err(_) => {
                    warn!(
                        "State file {} is not a JSON object, starting fresh",
                        path.display()
                    );
                    Map::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file at {}, starting fresh", path.display());
                Map::new()
            }
            Err(err) => return Err(BridgeError::IoError(err)),
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
            save_deadline: Mutex::new(None),
        })
    }

    /// Default location under the user's config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trigger-bridge")
            .join("state.json")
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(&Value::Object(self.values.lock().clone()))?;
        fs::write(&self.path, serialized)?;
        debug!("State flushed to {}", self.path.display());
        Ok(())
    }

    /// Flushes when a scheduled save is due. Call from the main loop.
    pub fn flush_due(&self, now: DateTime<Utc>) -> Result<()> {
        let due = {
            let mut deadline = self.save_deadline.lock();
            match *deadline {
                Some(at) if at <= now => {
                    *deadline = None;
                    true
                }
                _ => false,
            }
        };
        if due {
            self.save()?;
        }
        Ok(())
    }

    fn get_value(&self, key: &str) -> Option<Value> {
        self.values.lock().get(key).cloned()
    }

    fn set_value(&self, key: &str, value: Value) {
        self.values.lock().insert(key.to_string(), value);
    }
}

impl ConfigStore for JsonConfigStore {
    fn get_i32(&self, key: &str) -> Option<i32> {
        self.get_value(key)?.as_i64()?.try_into().ok()
    }

    fn set_i32(&self, key: &str, value: i32) {
        self.set_value(key, Value::from(value));
    }

    fn get_u32(&self, key: &str) -> Option<u32> {
        self.get_value(key)?.as_u64()?.try_into().ok()
    }

    fn set_u32(&self, key: &str, value: u32) {
        self.set_value(key, Value::from(value));
    }

    fn schedule_save(&self, delay_ms: u32) {
        let deadline = Utc::now() + Duration::milliseconds(delay_ms as i64);
        *self.save_deadline.lock() = Some(deadline);
    }
}

/// In-memory store for tests and stateless runs.
#[derive(Default)]
pub struct MemoryConfigStore {
    values: Mutex<Map<String, Value>>,
    save_requests: Mutex<u32>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_requests(&self) -> u32 {
        *self.save_requests.lock()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get_i32(&self, key: &str) -> Option<i32> {
        self.values.lock().get(key)?.as_i64()?.try_into().ok()
    }

    fn set_i32(&self, key: &str, value: i32) {
        self.values.lock().insert(key.to_string(), Value::from(value));
    }

    fn get_u32(&self, key: &str) -> Option<u32> {
        self.values.lock().get(key)?.as_u64()?.try_into().ok()
    }

    fn set_u32(&self, key: &str, value: u32) {
        self.values.lock().insert(key.to_string(), Value::from(value));
    }

    fn schedule_save(&self, _delay_ms: u32) {
        *self.save_requests.lock() += 1;
    }
}
