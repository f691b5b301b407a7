//! Update session gate.
//!
//! Tracks whether a firmware/filesystem update is in flight so the uplink
//! scheduler can be held off while flash writes are happening.
//!
//! Flow: Started → N × Progress → Finished | Failed
//!
//! The gate never performs transfer mechanics.  It changes only when the
//! update transport reports a lifecycle event.

use core::fmt;
use log::{error, info};

use crate::app::events::UpdateEvent;

/// Percentage step between progress log lines.
const MILESTONE_STEP: u8 = 10;

// ── Reasons ───────────────────────────────────────────────────

/// Why an update session ended without completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateErrorKind {
    Auth,
    Begin,
    Connect,
    Receive,
    End,
}

impl fmt::Display for UpdateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth => write!(f, "auth failed"),
            Self::Begin => write!(f, "begin failed"),
            Self::Connect => write!(f, "connect failed"),
            Self::Receive => write!(f, "receive failed"),
            Self::End => write!(f, "end failed"),
        }
    }
}

/// What the session is writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTarget {
    Firmware,
    Filesystem,
}

impl UpdateTarget {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Firmware => "firmware",
            Self::Filesystem => "filesystem",
        }
    }
}

// ── Session state ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSession {
    Idle,
    InProgress { percent: u8 },
    Completed,
    Failed(UpdateErrorKind),
}

// ── Gate ──────────────────────────────────────────────────────

pub struct UpdateGate {
    session: UpdateSession,
    /// Highest milestone already logged in the current session.
    last_milestone: u8,
}

impl Default for UpdateGate {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateGate {
    pub const fn new() -> Self {
        Self {
            session: UpdateSession::Idle,
            last_milestone: 0,
        }
    }

    pub fn session(&self) -> UpdateSession {
        self.session
    }

    /// `true` iff a session is in progress.
    pub fn is_busy(&self) -> bool {
        matches!(self.session, UpdateSession::InProgress { .. })
    }

    /// Current percentage, or `None` outside a session.
    pub fn percent(&self) -> Option<u8> {
        match self.session {
            UpdateSession::InProgress { percent } => Some(percent),
            _ => None,
        }
    }

    pub fn on_start(&mut self, target: UpdateTarget) {
        info!("Update: start updating {}", target.as_str());
        self.session = UpdateSession::InProgress { percent: 0 };
        self.last_milestone = 0;
    }

    /// Record transfer progress.  Ignored outside a session.
    pub fn on_progress(&mut self, written: u32, total: u32) {
        if !self.is_busy() {
            return;
        }

        // `total == 0` would divide by zero; report 0% and stay quiet.
        let percent = if total == 0 {
            0
        } else {
            let p = u64::from(written) * 100 / u64::from(total);
            p.min(100) as u8
        };
        self.session = UpdateSession::InProgress { percent };

        if total == 0 {
            return;
        }
        let milestone = percent - percent % MILESTONE_STEP;
        if milestone > self.last_milestone {
            self.last_milestone = milestone;
            info!("Update: progress {}%", milestone);
        }
    }

    pub fn on_end(&mut self) {
        self.session = UpdateSession::Completed;
        info!("Update: complete");
    }

    pub fn on_error(&mut self, reason: UpdateErrorKind) {
        self.session = UpdateSession::Failed(reason);
        error!("Update: error {}", reason);
    }

    /// Dispatch one transport event.
    pub fn handle(&mut self, event: &UpdateEvent) {
        match *event {
            UpdateEvent::Started(target) => self.on_start(target),
            UpdateEvent::Progress { written, total } => self.on_progress(written, total),
            UpdateEvent::Finished => self.on_end(),
            UpdateEvent::Failed(reason) => self.on_error(reason),
        }
    }

    #[cfg(test)]
    fn last_milestone(&self) -> u8 {
        self.last_milestone
    }
}

// ── Tests ─────────────────────────────────────────────────────
