//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the connection state machine, the update gate, the
//! uplink schedule and the credential store, and drives them from a single
//! cooperative [`tick`](AppService::tick).  All I/O flows through port
//! traits injected at call sites, making the entire service testable with
//! mock adapters.
//!
//! ```text
//!  NetworkPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//! UpdateTransport ▶│        AppService        │ ──▶ UplinkPort
//! RequestMailbox ◀▶│ Link · Gate · Uplink     │ ◀─▶ DocumentStore
//!                  └──────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::DeviceConfig;
use crate::connection::{ConnectionManager, LinkState};
use crate::credentials::{CredentialStore, LoadError};
use crate::identity::{IdentityError, NetworkIdentity};
use crate::scheduler::UplinkSchedule;
use crate::status::{StatusReport, StatusReporter};
use crate::update_gate::UpdateGate;

use super::commands::{ConfigUpdate, Request, Response};
use super::events::{AppEvent, UpdateEvent};
use super::mailbox::RequestMailbox;
use super::ports::{DevicePorts, EventSink, NetworkPort, UpdateTransport, UplinkPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    link: ConnectionManager,
    gate: UpdateGate,
    uplink: UplinkSchedule,
    credentials: CredentialStore,
    reporter: StatusReporter,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch storage or the radio; call [`start`](Self::start) next.
    pub fn new(config: &DeviceConfig, device_id: &str) -> Self {
        Self {
            link: ConnectionManager::new(config.retry_policy()),
            gate: UpdateGate::new(),
            uplink: UplinkSchedule::new(config.uplink_interval_ms),
            credentials: CredentialStore::new(&config.credentials_document),
            reporter: StatusReporter::new(&config.device_name, device_id),
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load the persisted identity and, if usable, start connecting.
    pub fn start(&mut self, now_ms: u64, dev: &mut impl DevicePorts) {
        let configured = match self.credentials.load(dev) {
            Ok(identity) if !identity.is_unconfigured() => {
                self.link.configure(identity, now_ms, dev).is_ok()
            }
            Ok(_) | Err(LoadError::NotFound | LoadError::Corrupt) => false,
        };

        if !configured {
            info!("AppService: no stored network, waiting for configuration");
        }
        dev.emit(&AppEvent::Started { configured });
        if configured {
            dev.emit(&AppEvent::LinkChanged {
                from: LinkState::Unconfigured,
                to: self.link.state(),
            });
        }
        info!("AppService started (link={})", self.link.state().as_str());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one cooperative cycle.  Never blocks.
    ///
    /// The `dev` parameter satisfies every port, so one mutable borrow
    /// covers the whole cycle.
    pub fn tick(&mut self, now_ms: u64, dev: &mut impl DevicePorts, mailbox: &RequestMailbox) {
        self.tick_count += 1;
        let prev_state = self.link.state();

        // 0. Network signals, then the read-only snapshot for this tick
        while let Some(event) = NetworkPort::poll_event(dev) {
            self.link.on_network_event(event);
        }

        // 1. Connection state machine
        if self.link.is_configured() {
            self.link.tick(now_ms, dev);
        }
        let connected = self.link.is_connected();

        // 2. Update transport (also drained while a session is open so a
        //    session started before a link drop can still finish)
        if connected || self.gate.is_busy() {
            while let Some(event) = UpdateTransport::poll_event(dev) {
                self.apply_update_event(&event, dev);
            }
        }

        // 3. Uplink
        if self.uplink.due_check(now_ms, connected, self.gate.is_busy()) {
            self.send_uplink(now_ms, dev);
        }

        // 4. External requests
        mailbox.serve(|req| self.handle_request(req, now_ms, dev));

        // 5. Emit link change if the state machine moved
        let new_state = self.link.state();
        if new_state != prev_state {
            dev.emit(&AppEvent::LinkChanged {
                from: prev_state,
                to: new_state,
            });
        }
    }

    // ── Request handling ──────────────────────────────────────

    /// Answer one request from the web-serving collaborator.
    pub fn handle_request(
        &mut self,
        req: Request,
        now_ms: u64,
        dev: &mut impl DevicePorts,
    ) -> Response {
        match req {
            Request::GetConfig => match self.credentials.read_document(dev) {
                Ok(Some(doc)) => Response::Config(doc),
                Ok(None) => Response::NotFound,
                Err(e) => {
                    warn!("AppService: config read failed: {}", e);
                    Response::NotFound
                }
            },
            Request::SetConfig(update) => self.apply_config(&update, now_ms, dev),
            Request::GetStatus => Response::Status(self.status(now_ms, dev)),
            Request::Disconnect => {
                self.disconnect(dev);
                Response::Link(self.link.state())
            }
            Request::Retry => {
                if !self.link.is_configured() {
                    return Response::Invalid("No network configured");
                }
                self.retry_now(now_ms, dev);
                Response::Link(self.link.state())
            }
        }
    }

    // ── Link control ──────────────────────────────────────────

    /// Drop the link and forget the in-memory identity.  The stored
    /// document is left as it is.
    pub fn disconnect(&mut self, dev: &mut impl DevicePorts) {
        self.link.disconnect(dev);
    }

    /// Start a fresh retry cycle; no-op while unconfigured or connected.
    pub fn retry_now(&mut self, now_ms: u64, dev: &mut impl DevicePorts) {
        self.link.retry_now(now_ms, dev);
    }

    fn apply_config(
        &mut self,
        update: &ConfigUpdate,
        now_ms: u64,
        dev: &mut impl DevicePorts,
    ) -> Response {
        if update.ssid.is_empty() {
            return Response::Invalid("SSID is required");
        }
        let identity = match NetworkIdentity::new(&update.ssid, &update.password) {
            Ok(identity) => identity,
            Err(IdentityError::NameTooLong) => return Response::Invalid("SSID too long"),
            Err(IdentityError::SecretTooLong) => return Response::Invalid("Password too long"),
        };

        let persisted = match self.credentials.save(dev, &identity) {
            Ok(()) => true,
            Err(e) => {
                warn!("AppService: could not persist network config: {}", e);
                false
            }
        };

        info!("AppService: new network config for '{}'", identity.name());
        if self.link.configure(identity, now_ms, dev).is_err() {
            return Response::Invalid("SSID is required");
        }
        dev.emit(&AppEvent::ConfigChanged { persisted });
        Response::Applied { persisted }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self, now_ms: u64, dev: &impl DevicePorts) -> StatusReport {
        self.reporter.status(now_ms, &self.link, &self.gate, dev, dev)
    }

    pub fn link(&self) -> &ConnectionManager {
        &self.link
    }

    pub fn gate(&self) -> &UpdateGate {
        &self.gate
    }

    pub fn uplink(&self) -> &UplinkSchedule {
        &self.uplink
    }

    /// Total ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply_update_event(&mut self, event: &UpdateEvent, sink: &mut impl EventSink) {
        self.gate.handle(event);
        match *event {
            UpdateEvent::Started(target) => sink.emit(&AppEvent::UpdateStarted(target)),
            UpdateEvent::Finished => sink.emit(&AppEvent::UpdateCompleted),
            UpdateEvent::Failed(reason) => sink.emit(&AppEvent::UpdateFailed(reason)),
            UpdateEvent::Progress { .. } => {}
        }
    }

    fn send_uplink(&mut self, now_ms: u64, dev: &mut impl DevicePorts) {
        let sequence = self.uplink.fires();
        let ports = &*dev;
        let report = self.reporter.telemetry(now_ms, sequence, ports, ports);
        let ok = match UplinkPort::send(dev, &report) {
            Ok(()) => true,
            Err(e) => {
                warn!("AppService: uplink #{} failed: {}", sequence, e);
                false
            }
        };
        dev.emit(&AppEvent::Uplink { sequence, ok });
    }
}
