//! Tagged events crossing the port boundary.
//!
//! Inbound: [`NetworkEvent`] (radio driver signals) and [`UpdateEvent`]
//! (update-transport lifecycle).  Each is consumed by exactly one
//! component's handler.
//!
//! Outbound: [`AppEvent`], emitted by the
//! [`AppService`](super::service::AppService) through the
//! [`EventSink`](super::ports::EventSink) port.

use crate::connection::LinkState;
use crate::update_gate::{UpdateErrorKind, UpdateTarget};

/// Asynchronous signals from the network collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
    /// Associated and holding an address.
    Connected,
    /// Association lost or a connect attempt failed.
    Disconnected,
}

/// Lifecycle events from the update-transport collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateEvent {
    Started(UpdateTarget),
    Progress { written: u32, total: u32 },
    Finished,
    Failed(UpdateErrorKind),
}

/// Structured events emitted by the application core.
///
/// None of these carry the network secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service started; `configured` is false when no stored identity was usable.
    Started { configured: bool },

    /// The connection state machine moved between states.
    LinkChanged { from: LinkState, to: LinkState },

    /// A new identity was accepted from the request interface.
    ConfigChanged { persisted: bool },

    UpdateStarted(UpdateTarget),
    UpdateCompleted,
    UpdateFailed(UpdateErrorKind),

    /// A telemetry uplink was sent (`ok`) or attempted and failed.
    Uplink { sequence: u32, ok: bool },
}
