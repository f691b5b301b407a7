//! Station identifier for status reports and telemetry.
//!
//! `SL-` followed by the low three bytes of the WiFi station MAC in
//! uppercase hex, e.g. `SL-5A7E11`.

use core::fmt::{self, Write};

/// 6-byte MAC address.
pub type MacAddress = [u8; 6];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceId(heapless::String<12>);

impl DeviceId {
    pub fn from_mac(mac: &MacAddress) -> Self {
        let mut id = heapless::String::new();
        // 9 bytes always fit.
        let _ = write!(id, "SL-{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]);
        Self(id)
    }

    /// Identifier of the running device.
    pub fn of_this_device() -> Self {
        Self::from_mac(&station_mac())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// MAC the station interface associates with.
#[cfg(target_os = "espidf")]
pub fn station_mac() -> MacAddress {
    use esp_idf_svc::sys::{esp_mac_type_t_ESP_MAC_WIFI_STA, esp_read_mac};

    let mut mac: MacAddress = [0u8; 6];
    let rc = unsafe { esp_read_mac(mac.as_mut_ptr(), esp_mac_type_t_ESP_MAC_WIFI_STA) };
    if rc != esp_idf_svc::sys::ESP_OK {
        log::warn!("DeviceId: esp_read_mac failed ({}), using zero MAC", rc);
    }
    mac
}

/// Simulation: locally administered, fixed.
#[cfg(not(target_os = "espidf"))]
pub fn station_mac() -> MacAddress {
    [0x02, 0x00, 0x00, 0x5A, 0x7E, 0x11]
}
