//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (radio, update transport, document storage, uplink,
//! platform vitals, event sinks) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics, so
//! the orchestration core never touches the driver or transport directly.
//!
//! ## Security notes
//!
//! - **NetworkPort** implementations MUST NOT log the identity secret.
//! - **DocumentStore** writes replace the whole document; callers never
//!   rely on partial updates.
//! - All port errors are typed; callers must handle every variant explicitly.

use core::net::Ipv4Addr;

use super::events::{AppEvent, NetworkEvent, UpdateEvent};
use crate::identity::{NetworkIdentity, NetworkName};

// ───────────────────────────────────────────────────────────────
// Network port (driven adapter: domain ↔ radio driver)
// ───────────────────────────────────────────────────────────────

/// Station-mode network collaborator.
///
/// Every request is non-blocking: the outcome arrives later as a
/// [`NetworkEvent`] returned from [`poll_event`](Self::poll_event).
pub trait NetworkPort {
    /// Begin associating with `identity`.  Returns once the request is issued.
    fn request_connect(&mut self, identity: &NetworkIdentity) -> Result<(), NetworkError>;

    /// Drop the current association (if any).
    fn request_disconnect(&mut self);

    /// Next pending `connected`/`disconnected` signal, oldest first.
    fn poll_event(&mut self) -> Option<NetworkEvent>;

    /// SSID the driver is currently associated with.
    fn current_identity(&self) -> Option<NetworkName>;

    /// Station IPv4 address once DHCP has completed.
    fn current_address(&self) -> Option<Ipv4Addr>;

    /// RSSI in dBm while associated.
    fn signal_strength(&self) -> Option<i8>;
}

// ───────────────────────────────────────────────────────────────
// Update transport (driven adapter: transfer + flashing → domain)
// ───────────────────────────────────────────────────────────────

/// Firmware-update transport collaborator.
///
/// The core never performs transfer mechanics; it only consumes the
/// lifecycle events the transport produces.
pub trait UpdateTransport {
    /// Next pending update event, oldest first.
    fn poll_event(&mut self) -> Option<UpdateEvent>;
}

// ───────────────────────────────────────────────────────────────
// Document store (driven adapter: domain ↔ flash filesystem)
// ───────────────────────────────────────────────────────────────

/// Whole-document persistent storage addressed by name.
pub trait DocumentStore {
    /// Read the full document.
    fn read_document(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Replace the full document.
    fn write_document(&mut self, name: &str, data: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Uplink port (driven adapter: domain → telemetry endpoint)
// ───────────────────────────────────────────────────────────────

/// Outbound telemetry transmission.
pub trait UplinkPort {
    fn send(&mut self, report: &crate::status::TelemetryReport) -> Result<(), UplinkError>;
}

// ───────────────────────────────────────────────────────────────
// Platform port (host environment → domain)
// ───────────────────────────────────────────────────────────────

/// Device vitals supplied by the host environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformVitals {
    pub free_heap: u32,
    pub chip_model: &'static str,
    pub chip_cores: u8,
    pub sdk_version: String,
}

pub trait PlatformPort {
    fn vitals(&self) -> PlatformVitals;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.  Adapters
/// decide where they go (serial log, status LED, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Combined port bundle
// ───────────────────────────────────────────────────────────────

/// Everything one tick touches.
///
/// A single adapter struct implements all ports so the tick can take one
/// `&mut` instead of juggling several simultaneous mutable borrows.
pub trait DevicePorts:
    NetworkPort + UpdateTransport + DocumentStore + UplinkPort + PlatformPort + EventSink
{
}

impl<T> DevicePorts for T where
    T: NetworkPort + UpdateTransport + DocumentStore + UplinkPort + PlatformPort + EventSink
{
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`DocumentStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested document does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

/// Errors from [`NetworkPort`] requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// The driver is not started or refused the configuration.
    DriverRejected,
    /// The driver is busy with another operation.
    Busy,
}

/// Errors from [`UplinkPort::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UplinkError {
    /// No endpoint configured.
    NoEndpoint,
    /// Connection or request failed before a status was received.
    Transport,
    /// The endpoint answered with a non-2xx status.
    Status(u16),
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "document not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DriverRejected => write!(f, "driver rejected request"),
            Self::Busy => write!(f, "driver busy"),
        }
    }
}

impl core::fmt::Display for UplinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoEndpoint => write!(f, "no uplink endpoint configured"),
            Self::Transport => write!(f, "uplink transport error"),
            Self::Status(code) => write!(f, "uplink rejected with HTTP {code}"),
        }
    }
}
