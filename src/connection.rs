//! Connection state machine with bounded retry and cool-down.
//!
//! ```text
//!                 configure()
//!  Unconfigured ─────────────▶ Connecting ──Connected──▶ Connected
//!       ▲                         │  ▲                      │
//!       │ disconnect()            │  │ interval elapsed     │ Disconnected
//!       │ (from any state)        ▼  │ (retry ≤ max)        ▼
//!       └────────────────────  Reconnecting ◀───────────────┘
//!                                 │  ▲
//!                   retry > max   ▼  │ cool-down elapsed / retry_now()
//!                              Exhausted
//! ```
//!
//! Every transition happens inside a call; nothing here waits.  A connect
//! attempt is a request to the [`NetworkPort`] whose outcome arrives later
//! as a [`NetworkEvent`].  While not connected the machine issues at most
//! one attempt per `reconnect_interval_ms`.  After `max_retry` failed
//! attempts it parks in `Exhausted` for `exhausted_cooldown_ms`, then starts
//! a fresh cycle with the counter at zero.

use log::{info, warn};

use crate::app::events::NetworkEvent;
use crate::app::ports::NetworkPort;
use crate::error::Error;
use crate::identity::NetworkIdentity;

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    /// No identity held in memory.
    Unconfigured,
    /// First connect request issued after `configure()`.
    Connecting,
    /// Associated with an address.
    Connected,
    /// Link lost or attempt failed; retrying on the fixed interval.
    Reconnecting,
    /// Retries used up; cooling down before the next cycle.
    Exhausted,
}

impl LinkState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Exhausted => "exhausted",
        }
    }

    /// States in which [`ConnectionManager::tick`] may issue an attempt.
    const fn is_attempting(self) -> bool {
        matches!(self, Self::Connecting | Self::Reconnecting)
    }
}

/// Retry timing for the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub reconnect_interval_ms: u64,
    pub max_retry: u32,
    pub exhausted_cooldown_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            reconnect_interval_ms: 5_000,
            max_retry: 20,
            exhausted_cooldown_ms: 5_000,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Manager
// ───────────────────────────────────────────────────────────────

/// Owns the active identity and the connection state.
pub struct ConnectionManager {
    policy: RetryPolicy,
    state: LinkState,
    identity: Option<NetworkIdentity>,
    retry_count: u32,
    /// Time of the last connect request, or of entering `Exhausted`.
    last_attempt_ms: u64,
}

impl ConnectionManager {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: LinkState::Unconfigured,
            identity: None,
            retry_count: 0,
            last_attempt_ms: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn identity(&self) -> Option<&NetworkIdentity> {
        self.identity.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.state != LinkState::Unconfigured
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    // ── Requests ──────────────────────────────────────────────

    /// Adopt `identity` and issue the first connect request immediately.
    ///
    /// An empty name is rejected and leaves the machine untouched.
    pub fn configure(
        &mut self,
        identity: NetworkIdentity,
        now_ms: u64,
        net: &mut impl NetworkPort,
    ) -> Result<(), Error> {
        if identity.is_unconfigured() {
            warn!("Link: rejected identity with empty network name");
            return Err(Error::InvalidIdentity);
        }

        info!("Link: configured for '{}'", identity.name());
        self.identity = Some(identity);
        self.retry_count = 0;
        self.state = LinkState::Connecting;
        self.attempt(now_ms, net);
        Ok(())
    }

    /// Drop the link and forget the in-memory identity.
    ///
    /// The persisted copy is untouched.
    pub fn disconnect(&mut self, net: &mut impl NetworkPort) {
        net.request_disconnect();
        self.identity = None;
        self.retry_count = 0;
        self.state = LinkState::Unconfigured;
        info!("Link: disconnected, identity cleared");
    }

    /// Start a fresh retry cycle now (manual retry).
    ///
    /// No-op while unconfigured or connected.
    pub fn retry_now(&mut self, now_ms: u64, net: &mut impl NetworkPort) {
        match self.state {
            LinkState::Unconfigured | LinkState::Connected => {}
            _ => self.restart_cycle(now_ms, net),
        }
    }

    // ── Per-tick advance ──────────────────────────────────────

    pub fn tick(&mut self, now_ms: u64, net: &mut impl NetworkPort) {
        let elapsed = now_ms.saturating_sub(self.last_attempt_ms);

        if self.state == LinkState::Exhausted {
            if elapsed >= self.policy.exhausted_cooldown_ms {
                info!("Link: cool-down over, starting a new retry cycle");
                self.restart_cycle(now_ms, net);
            }
            return;
        }

        if !self.state.is_attempting() || elapsed < self.policy.reconnect_interval_ms {
            return;
        }

        self.retry_count += 1;
        if self.retry_count > self.policy.max_retry {
            warn!(
                "Link: reconnection failed after {} attempts, cooling down",
                self.policy.max_retry
            );
            self.state = LinkState::Exhausted;
            self.retry_count = 0;
            self.last_attempt_ms = now_ms;
            return;
        }

        info!(
            "Link: reconnect attempt {}/{}",
            self.retry_count, self.policy.max_retry
        );
        self.attempt(now_ms, net);
    }

    // ── Network signals ───────────────────────────────────────

    pub fn on_network_event(&mut self, event: NetworkEvent) {
        match (event, self.state) {
            (_, LinkState::Unconfigured) => {}
            (NetworkEvent::Connected, _) => {
                self.state = LinkState::Connected;
                self.retry_count = 0;
                info!("Link: connected");
            }
            (NetworkEvent::Disconnected, prev) => {
                if prev == LinkState::Connected {
                    warn!("Link: connection lost, entering reconnect");
                }
                self.state = LinkState::Reconnecting;
            }
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn restart_cycle(&mut self, now_ms: u64, net: &mut impl NetworkPort) {
        self.retry_count = 0;
        self.state = LinkState::Reconnecting;
        self.attempt(now_ms, net);
    }

    /// Issue one connect request.  A synchronous refusal counts as a failed
    /// attempt; the interval still applies before the next one.
    fn attempt(&mut self, now_ms: u64, net: &mut impl NetworkPort) {
        self.last_attempt_ms = now_ms;
        let Some(identity) = self.identity.as_ref() else {
            return;
        };
        if let Err(e) = net.request_connect(identity) {
            warn!("Link: connect request refused by driver: {}", e);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
