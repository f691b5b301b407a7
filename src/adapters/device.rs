//! Device bundle: one struct implementing every port.
//!
//! The tick takes a single `&mut impl DevicePorts`; this type gathers the
//! concrete adapters behind it and delegates each trait to its owner.

use core::net::Ipv4Addr;

use crate::app::events::{AppEvent, NetworkEvent, UpdateEvent};
use crate::app::ports::{
    DocumentStore, EventSink, NetworkError, NetworkPort, PlatformPort, PlatformVitals,
    StorageError, UpdateTransport, UplinkError, UplinkPort,
};
use crate::identity::{NetworkIdentity, NetworkName};
use crate::status::TelemetryReport;

use super::log_sink::LogEventSink;
use super::ota::OtaTransport;
use super::platform::EspPlatform;
use super::storage::FsDocumentStore;
use super::uplink::HttpUplink;
use super::wifi::WifiAdapter;

pub struct Device {
    pub wifi: WifiAdapter,
    pub ota: OtaTransport,
    pub storage: FsDocumentStore,
    pub uplink: HttpUplink,
    pub platform: EspPlatform,
    pub sink: LogEventSink,
}

impl NetworkPort for Device {
    fn request_connect(&mut self, identity: &NetworkIdentity) -> Result<(), NetworkError> {
        self.wifi.request_connect(identity)
    }
    fn request_disconnect(&mut self) {
        self.wifi.request_disconnect();
    }
    fn poll_event(&mut self) -> Option<NetworkEvent> {
        NetworkPort::poll_event(&mut self.wifi)
    }
    fn current_identity(&self) -> Option<NetworkName> {
        self.wifi.current_identity()
    }
    fn current_address(&self) -> Option<Ipv4Addr> {
        self.wifi.current_address()
    }
    fn signal_strength(&self) -> Option<i8> {
        self.wifi.signal_strength()
    }
}

impl UpdateTransport for Device {
    fn poll_event(&mut self) -> Option<UpdateEvent> {
        self.ota.poll_event()
    }
}

impl DocumentStore for Device {
    fn read_document(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        self.storage.read_document(name)
    }
    fn write_document(&mut self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        self.storage.write_document(name, data)
    }
}

impl UplinkPort for Device {
    fn send(&mut self, report: &TelemetryReport) -> Result<(), UplinkError> {
        self.uplink.send(report)
    }
}

impl PlatformPort for Device {
    fn vitals(&self) -> PlatformVitals {
        self.platform.vitals()
    }
}

impl EventSink for Device {
    fn emit(&mut self, event: &AppEvent) {
        self.sink.emit(event);
    }
}
