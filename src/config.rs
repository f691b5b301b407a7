//! Device configuration parameters
//!
//! All tunable parameters for the StationLink firmware.
//! Values can be overridden by a JSON document (`/device.json`) in the
//! document store; anything absent keeps its default.

use log::{LevelFilter, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{DocumentStore, StorageError};
use crate::connection::RetryPolicy;
use crate::error::Error;

/// Name of the optional override document.
pub const DEVICE_CONFIG_DOCUMENT: &str = "/device.json";

/// Core device configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    // --- Identity ---
    /// Human-readable device name shown in status
    pub device_name: String,
    /// Hostname announced by the update service
    pub update_hostname: String,
    /// Token required on firmware uploads
    pub update_password: String,

    // --- Storage ---
    /// Credential document name
    pub credentials_document: String,

    // --- Request interface ---
    pub http_port: u16,

    // --- Link ---
    /// Minimum spacing between connect attempts (milliseconds)
    pub reconnect_interval_ms: u64,
    /// Attempts per cycle before the link is marked exhausted
    pub max_retry: u32,
    /// How long to stay exhausted before a fresh cycle (milliseconds)
    pub exhausted_cooldown_ms: u64,

    // --- Uplink ---
    /// Telemetry interval (milliseconds)
    pub uplink_interval_ms: u64,
    /// Telemetry endpoint; `None` logs the payload instead
    pub uplink_endpoint: Option<String>,
    /// Uplink HTTP timeout (milliseconds)
    pub http_timeout_ms: u64,

    // --- Timing ---
    /// Main loop sleep between ticks (milliseconds)
    pub tick_interval_ms: u32,

    pub log_level: LevelFilter,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_name: "ESP32-Device".into(),
            update_hostname: "esp32-device".into(),
            update_password: "admin".into(),

            credentials_document: "/config.json".into(),

            http_port: 80,

            reconnect_interval_ms: 5_000,
            max_retry: 20,
            exhausted_cooldown_ms: 5_000,

            uplink_interval_ms: 60_000, // 1/min
            uplink_endpoint: None,
            http_timeout_ms: 5_000,

            tick_interval_ms: 10,

            log_level: LevelFilter::Info,
        }
    }
}

// The update password is never formatted.
impl core::fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("device_name", &self.device_name)
            .field("update_hostname", &self.update_hostname)
            .field("credentials_document", &self.credentials_document)
            .field("http_port", &self.http_port)
            .field("reconnect_interval_ms", &self.reconnect_interval_ms)
            .field("max_retry", &self.max_retry)
            .field("exhausted_cooldown_ms", &self.exhausted_cooldown_ms)
            .field("uplink_interval_ms", &self.uplink_interval_ms)
            .field("uplink_endpoint", &self.uplink_endpoint)
            .field("http_timeout_ms", &self.http_timeout_ms)
            .field("tick_interval_ms", &self.tick_interval_ms)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

impl DeviceConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            reconnect_interval_ms: self.reconnect_interval_ms,
            max_retry: self.max_retry,
            exhausted_cooldown_ms: self.exhausted_cooldown_ms,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.device_name.is_empty() {
            return Err(Error::Config("device_name must not be empty"));
        }
        if self.credentials_document.is_empty() {
            return Err(Error::Config("credentials_document must not be empty"));
        }
        if self.http_port == 0 {
            return Err(Error::Config("http_port must be non-zero"));
        }
        if self.reconnect_interval_ms == 0 {
            return Err(Error::Config("reconnect_interval_ms must be non-zero"));
        }
        if self.uplink_interval_ms == 0 {
            return Err(Error::Config("uplink_interval_ms must be non-zero"));
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be non-zero"));
        }
        Ok(())
    }

    /// Load overrides from [`DEVICE_CONFIG_DOCUMENT`].
    ///
    /// Missing, unparsable or invalid documents fall back to defaults.
    pub fn load(store: &impl DocumentStore) -> Self {
        let raw = match store.read_document(DEVICE_CONFIG_DOCUMENT) {
            Ok(raw) => raw,
            Err(StorageError::NotFound) => {
                info!("Config: no {}, using defaults", DEVICE_CONFIG_DOCUMENT);
                return Self::default();
            }
            Err(e) => {
                warn!("Config: read of {} failed ({}), using defaults", DEVICE_CONFIG_DOCUMENT, e);
                return Self::default();
            }
        };

        let Ok(config) = serde_json::from_slice::<Self>(&raw) else {
            warn!("Config: {} failed to parse, using defaults", DEVICE_CONFIG_DOCUMENT);
            return Self::default();
        };

        match config.validate() {
            Ok(()) => {
                info!("Config: loaded overrides from {}", DEVICE_CONFIG_DOCUMENT);
                config
            }
            Err(e) => {
                warn!("Config: {} rejected ({}), using defaults", DEVICE_CONFIG_DOCUMENT, e);
                Self::default()
            }
        }
    }
}
