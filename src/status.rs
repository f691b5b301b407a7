//! Status reporter and telemetry payloads.
//!
//! Both are read-only snapshots assembled from the orchestrator's
//! components plus the network and platform ports.

use serde::Serialize;

use crate::app::ports::{NetworkPort, PlatformPort};
use crate::connection::ConnectionManager;
use crate::update_gate::UpdateGate;

const NOT_CONNECTED: &str = "Not connected";
const NO_ADDRESS: &str = "N/A";

/// Body of `GET status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub device_name: String,
    pub device_id: String,
    pub uptime_ms: u64,
    pub wifi_connected: bool,
    pub link_state: &'static str,
    pub retry_count: u32,
    pub update_in_progress: bool,
    pub ssid: String,
    pub ip_address: String,
    pub signal_strength: i8,
    pub free_heap: u32,
    pub chip_model: &'static str,
    pub chip_cores: u8,
    pub sdk_version: String,
}

impl StatusReport {
    pub fn to_json(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Periodic uplink payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryReport {
    pub device_id: String,
    pub sequence: u32,
    pub uptime_ms: u64,
    pub signal_strength: i8,
    pub free_heap: u32,
}

impl TelemetryReport {
    pub fn to_json(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Builds status and telemetry snapshots for one device.
pub struct StatusReporter {
    device_name: String,
    device_id: String,
}

impl StatusReporter {
    pub fn new(device_name: &str, device_id: &str) -> Self {
        Self {
            device_name: device_name.to_owned(),
            device_id: device_id.to_owned(),
        }
    }

    pub fn status(
        &self,
        now_ms: u64,
        link: &ConnectionManager,
        gate: &UpdateGate,
        net: &impl NetworkPort,
        platform: &impl PlatformPort,
    ) -> StatusReport {
        let connected = link.is_connected();
        let vitals = platform.vitals();

        let (ssid, ip_address, signal_strength) = if connected {
            (
                net.current_identity()
                    .map_or_else(|| NOT_CONNECTED.to_owned(), |n| n.as_str().to_owned()),
                net.current_address()
                    .map_or_else(|| NO_ADDRESS.to_owned(), |ip| ip.to_string()),
                net.signal_strength().unwrap_or(0),
            )
        } else {
            (NOT_CONNECTED.to_owned(), NO_ADDRESS.to_owned(), 0)
        };

        StatusReport {
            device_name: self.device_name.clone(),
            device_id: self.device_id.clone(),
            uptime_ms: now_ms,
            wifi_connected: connected,
            link_state: link.state().as_str(),
            retry_count: link.retry_count(),
            update_in_progress: gate.is_busy(),
            ssid,
            ip_address,
            signal_strength,
            free_heap: vitals.free_heap,
            chip_model: vitals.chip_model,
            chip_cores: vitals.chip_cores,
            sdk_version: vitals.sdk_version,
        }
    }

    pub fn telemetry(
        &self,
        now_ms: u64,
        sequence: u32,
        net: &impl NetworkPort,
        platform: &impl PlatformPort,
    ) -> TelemetryReport {
        TelemetryReport {
            device_id: self.device_id.clone(),
            sequence,
            uptime_ms: now_ms,
            signal_strength: net.signal_strength().unwrap_or(0),
            free_heap: platform.vitals().free_heap,
        }
    }
}
