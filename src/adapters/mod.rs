//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements       | Connects to                  |
//! |-------------|------------------|------------------------------|
//! | `wifi`      | NetworkPort      | ESP-IDF WiFi STA             |
//! | `ota`       | UpdateTransport  | esp-ota partition writer     |
//! | `storage`   | DocumentStore    | SPIFFS / host directory      |
//! | `uplink`    | UplinkPort       | ESP-IDF HTTP client          |
//! | `platform`  | PlatformPort     | ESP-IDF heap / chip info     |
//! | `log_sink`  | EventSink        | Serial log output            |
//! | `device`    | all of the above | bundle handed to the tick    |
//! | `http`      | (driving)        | ESP-IDF HTTP server          |
//! | `time`      | n/a              | ESP32 system timer           |
//! | `device_id` | n/a              | WiFi station MAC             |
//! | `web_assets`| n/a              | static UI files on SPIFFS    |

pub mod device;
pub mod device_id;
#[cfg(target_os = "espidf")]
pub mod http;
pub mod log_sink;
pub mod ota;
pub mod platform;
pub mod storage;
pub mod time;
pub mod uplink;
pub mod web_assets;
pub mod wifi;
