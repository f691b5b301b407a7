//! StationLink firmware: main entry point.
//!
//! Hexagonal architecture driven by a single cooperative tick.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  WifiAdapter      OtaTransport       FsDocumentStore           │
//! │  (NetworkPort)    (UpdateTransport)  (DocumentStore)           │
//! │  HttpUplink       EspPlatform        LogEventSink              │
//! │  (UplinkPort)     (PlatformPort)     (EventSink)               │
//! │                                                                │
//! │  HTTP server ──▶ RequestMailbox (drained by the tick)          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Link state machine · Update gate · Uplink schedule    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use stationlink::adapters::device::Device;
use stationlink::adapters::log_sink::LogEventSink;
use stationlink::adapters::platform::EspPlatform;
use stationlink::adapters::time::MonotonicClock;
use stationlink::adapters::uplink::HttpUplink;
use stationlink::adapters::wifi::WifiAdapter;
use stationlink::adapters::device_id::DeviceId;
use stationlink::adapters::{http, ota, storage};
use stationlink::app::mailbox::RequestMailbox;
use stationlink::app::service::AppService;
use stationlink::config::DeviceConfig;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  StationLink v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 1b. OTA rollback check ────────────────────────────────
    ota::check_rollback();

    let clock = MonotonicClock::new();
    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = match EspDefaultNvsPartition::take() {
        Ok(nvs) => Some(nvs),
        Err(e) => {
            warn!("NVS partition unavailable ({:?}), WiFi driver runs without it", e);
            None
        }
    };

    // ── 2. Storage + config ───────────────────────────────────
    let storage = storage::mount_spiffs()?;
    let config = DeviceConfig::load(&storage);
    log::set_max_level(config.log_level);
    info!("Config: {:?}", config);

    // ── 3. Device identity ────────────────────────────────────
    let dev_id = DeviceId::of_this_device();
    info!("Device ID: {} (hostname: {})", dev_id, config.update_hostname);

    // ── 4. Construct adapters ─────────────────────────────────
    let wifi = WifiAdapter::new(
        peripherals.modem,
        &sys_loop,
        nvs,
        &config.update_hostname,
    )?;
    let (ota_transport, ota_reporter) = ota::channel();

    let mut dev = Device {
        wifi,
        ota: ota_transport,
        storage,
        uplink: HttpUplink::new(config.uplink_endpoint.clone(), config.http_timeout_ms),
        platform: EspPlatform::new(),
        sink: LogEventSink::new(),
    };

    // ── 5. Request interface ──────────────────────────────────
    let mailbox = Arc::new(RequestMailbox::new());
    let _server = http::start(
        config.http_port,
        mailbox.clone(),
        ota_reporter,
        config.update_password.clone(),
        http::WebRoot {
            dir: dev.storage.root().to_path_buf(),
            private_document: config.credentials_document.clone(),
        },
    )?;

    // ── 6. Construct app service ──────────────────────────────
    let mut app = AppService::new(&config, dev_id.as_str());
    app.start(clock.uptime_ms(), &mut dev);

    info!("System ready. Entering tick loop.");

    // ── 7. Tick loop ──────────────────────────────────────────
    let tick = Duration::from_millis(u64::from(config.tick_interval_ms));
    loop {
        app.tick(clock.uptime_ms(), &mut dev, &mailbox);
        std::thread::sleep(tick);
    }
}
