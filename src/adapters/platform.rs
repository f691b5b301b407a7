//! Platform vitals adapter.
//!
//! - **`target_os = "espidf"`**: heap, chip and SDK queries from ESP-IDF.
//! - **other targets**: fixed simulation values.

use crate::app::ports::{PlatformPort, PlatformVitals};

#[derive(Default)]
pub struct EspPlatform;

impl EspPlatform {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "espidf")]
impl PlatformPort for EspPlatform {
    fn vitals(&self) -> PlatformVitals {
        use esp_idf_svc::sys;

        let free_heap = unsafe { sys::esp_get_free_heap_size() };

        let mut info: sys::esp_chip_info_t = unsafe { core::mem::zeroed() };
        unsafe { sys::esp_chip_info(&mut info) };
        let chip_model = match info.model {
            sys::esp_chip_model_t_CHIP_ESP32 => "ESP32",
            sys::esp_chip_model_t_CHIP_ESP32S2 => "ESP32-S2",
            sys::esp_chip_model_t_CHIP_ESP32S3 => "ESP32-S3",
            sys::esp_chip_model_t_CHIP_ESP32C3 => "ESP32-C3",
            sys::esp_chip_model_t_CHIP_ESP32C6 => "ESP32-C6",
            _ => "ESP32-unknown",
        };

        let sdk_version = unsafe { core::ffi::CStr::from_ptr(sys::esp_get_idf_version()) }
            .to_string_lossy()
            .into_owned();

        PlatformVitals {
            free_heap,
            chip_model,
            chip_cores: info.cores,
            sdk_version,
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl PlatformPort for EspPlatform {
    fn vitals(&self) -> PlatformVitals {
        PlatformVitals {
            free_heap: 200_000,
            chip_model: "ESP32-sim",
            chip_cores: 2,
            sdk_version: "host".into(),
        }
    }
}
