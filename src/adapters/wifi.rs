//! WiFi station-mode adapter.
//!
//! Implements [`NetworkPort`], the hexagonal boundary for the radio.
//! Every request returns as soon as it is issued; association results come
//! back as [`NetworkEvent`]s through a channel the tick drains.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspWifi` driver, with `WifiEvent` /
//!   `IpEvent` system-loop subscriptions feeding the channel.
//! - **all other targets**: deterministic simulation for host-side tests.

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use core::net::Ipv4Addr;

use crate::app::events::NetworkEvent;
use crate::app::ports::{NetworkError, NetworkPort};
use crate::identity::{NetworkIdentity, NetworkName};

/// Pending signals between the driver callbacks and the tick.
const EVENT_DEPTH: usize = 8;

type EventQueue = Channel<CriticalSectionRawMutex, NetworkEvent, EVENT_DEPTH>;

fn push(queue: &EventQueue, event: NetworkEvent) {
    if queue.try_send(event).is_err() {
        warn!("WiFi: event queue full, dropping {:?}", event);
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    events: Arc<EventQueue>,
    /// Name of the network last requested.
    active: Option<NetworkName>,

    #[cfg(target_os = "espidf")]
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
    #[cfg(target_os = "espidf")]
    _subscriptions: [esp_idf_svc::eventloop::EspSubscription<
        'static,
        esp_idf_svc::eventloop::System,
    >; 2],

    /// Simulation: whether the requested network answers.
    #[cfg(not(target_os = "espidf"))]
    sim_reachable: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_connected: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_connect_counter: u32,
}

// ── ESP-IDF construction ──────────────────────────────────────

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    /// Bring up the station interface and subscribe to link events.
    ///
    /// The driver is started but not connected; the connection state
    /// machine issues the first request.
    pub fn new(
        modem: esp_idf_svc::hal::modem::Modem,
        sys_loop: &esp_idf_svc::eventloop::EspSystemEventLoop,
        nvs: Option<esp_idf_svc::nvs::EspDefaultNvsPartition>,
        hostname: &str,
    ) -> Result<Self, esp_idf_svc::sys::EspError> {
        use esp_idf_svc::netif::IpEvent;
        use esp_idf_svc::wifi::{ClientConfiguration, Configuration, EspWifi, WifiEvent};

        let mut wifi = EspWifi::new(modem, sys_loop.clone(), nvs)?;
        if let Err(e) = wifi.sta_netif_mut().set_hostname(hostname) {
            warn!("WiFi: could not set hostname '{}': {:?}", hostname, e);
        }
        wifi.set_configuration(&Configuration::Client(ClientConfiguration::default()))?;
        wifi.start()?;

        let events = Arc::new(EventQueue::new());

        let q = events.clone();
        let wifi_sub = sys_loop.subscribe::<WifiEvent, _>(move |event| {
            if let WifiEvent::StaDisconnected(_) = event {
                push(&q, NetworkEvent::Disconnected);
            }
        })?;

        let q = events.clone();
        let ip_sub = sys_loop.subscribe::<IpEvent, _>(move |event| {
            if let IpEvent::DhcpIpAssigned(_) = event {
                push(&q, NetworkEvent::Connected);
            }
        })?;

        info!("WiFi: station interface started");
        Ok(Self {
            events,
            active: None,
            wifi,
            _subscriptions: [wifi_sub, ip_sub],
        })
    }
}

// ── Simulation construction ───────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            events: Arc::new(EventQueue::new()),
            active: None,
            sim_reachable: true,
            sim_connected: false,
            sim_connect_counter: 0,
        }
    }

    /// Simulation: make subsequent connect requests succeed or fail.
    pub fn set_reachable(&mut self, reachable: bool) {
        self.sim_reachable = reachable;
    }

    /// Simulation: drop the current association.
    pub fn drop_link(&mut self) {
        if self.sim_connected {
            self.sim_connected = false;
            push(&self.events, NetworkEvent::Disconnected);
        }
    }

    /// Simulation: number of connect requests seen.
    pub fn connect_requests(&self) -> u32 {
        self.sim_connect_counter
    }
}

// ── Platform-specific ─────────────────────────────────────────

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, identity: &NetworkIdentity) -> Result<(), NetworkError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if identity.secret().is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let conf = Configuration::Client(ClientConfiguration {
            ssid: identity
                .name()
                .try_into()
                .map_err(|()| NetworkError::DriverRejected)?,
            password: identity
                .secret()
                .try_into()
                .map_err(|()| NetworkError::DriverRejected)?,
            auth_method,
            ..Default::default()
        });

        // A stale association would make connect() fail with "busy".
        let _ = self.wifi.disconnect();
        self.wifi.set_configuration(&conf).map_err(|e| {
            warn!("WiFi: set_configuration failed: {:?}", e);
            NetworkError::DriverRejected
        })?;
        self.wifi.connect().map_err(|e| {
            warn!("WiFi: connect request failed: {:?}", e);
            NetworkError::Busy
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, _identity: &NetworkIdentity) -> Result<(), NetworkError> {
        self.sim_connect_counter = self.sim_connect_counter.wrapping_add(1);
        if self.sim_reachable {
            self.sim_connected = true;
            push(&self.events, NetworkEvent::Connected);
        } else {
            self.sim_connected = false;
            push(&self.events, NetworkEvent::Disconnected);
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.wifi.disconnect() {
            warn!("WiFi: disconnect failed: {:?}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_connected = false;
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_connected
    }

    #[cfg(target_os = "espidf")]
    fn platform_address(&self) -> Option<core::net::Ipv4Addr> {
        let info = self.wifi.sta_netif().get_ip_info().ok()?;
        (!info.ip.is_unspecified()).then_some(info.ip)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_address(&self) -> Option<Ipv4Addr> {
        Some(Ipv4Addr::new(192, 168, 4, 2))
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        let mut ap_info: esp_idf_svc::sys::wifi_ap_record_t = unsafe { core::mem::zeroed() };
        let rc = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        (rc == esp_idf_svc::sys::ESP_OK).then_some(ap_info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        // Oscillates between -66 and -55 dBm.
        let oscillation = (self.sim_connect_counter % 12) as i8 - 6;
        Some((-60_i8).saturating_add(oscillation))
    }
}

// ───────────────────────────────────────────────────────────────
// NetworkPort
// ───────────────────────────────────────────────────────────────

impl NetworkPort for WifiAdapter {
    fn request_connect(&mut self, identity: &NetworkIdentity) -> Result<(), NetworkError> {
        info!("WiFi: connecting to '{}'", identity.name());
        self.active = NetworkName::try_from(identity.name()).ok();
        self.platform_connect(identity)
    }

    fn request_disconnect(&mut self) {
        self.platform_disconnect();
        self.active = None;
        info!("WiFi: disconnect requested");
    }

    fn poll_event(&mut self) -> Option<NetworkEvent> {
        self.events.try_receive().ok()
    }

    fn current_identity(&self) -> Option<NetworkName> {
        if self.platform_is_connected() {
            self.active.clone()
        } else {
            None
        }
    }

    fn current_address(&self) -> Option<core::net::Ipv4Addr> {
        if self.platform_is_connected() {
            self.platform_address()
        } else {
            None
        }
    }

    fn signal_strength(&self) -> Option<i8> {
        if self.platform_is_connected() {
            self.platform_rssi()
        } else {
            None
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
