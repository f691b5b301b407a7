//! Uplink scheduler.
//!
//! Decides when the periodic telemetry uplink may fire.  The uplink is
//! suppressed while the device is offline or an update session holds the
//! gate.
//!
//! ```text
//!    now ──┐
//!          ▼
//!   ┌──────────────┐   elapsed ≥ interval ─┐
//!   │ UplinkSchedule│  connected          ├─▶ fire, last_fire = now
//!   │  last_fire    │  !gate_busy         ─┘
//!   └──────────────┘   otherwise ─────────▶ skip, last_fire untouched
//! ```
//!
//! Skipped windows are not queued: after a long blackout the uplink fires
//! once, then waits a full interval again.

use log::debug;

/// Fixed-interval admission for the telemetry uplink.
#[derive(Debug, Clone)]
pub struct UplinkSchedule {
    interval_ms: u64,
    /// Time of the last admitted fire.  Starts at boot (0).
    last_fire_ms: u64,
    /// Number of admitted fires, used as the telemetry sequence number.
    fires: u32,
    /// Reason the open window is being held, as last logged.
    held: Option<Hold>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Hold {
    connected: bool,
    gate_busy: bool,
}

impl UplinkSchedule {
    /// Create a schedule.  A zero interval is clamped to 1 ms.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            last_fire_ms: 0,
            fires: 0,
            held: None,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn last_fire_ms(&self) -> u64 {
        self.last_fire_ms
    }

    pub fn fires(&self) -> u32 {
        self.fires
    }

    /// Returns `true` and records the fire iff a full interval has elapsed,
    /// the link is up and no update session is in progress.
    pub fn due_check(&mut self, now_ms: u64, connected: bool, gate_busy: bool) -> bool {
        if now_ms.saturating_sub(self.last_fire_ms) < self.interval_ms {
            return false;
        }
        if !connected || gate_busy {
            let hold = Hold { connected, gate_busy };
            if self.held != Some(hold) {
                debug!(
                    "Uplink: window open but held (connected={}, update_busy={})",
                    connected, gate_busy
                );
                self.held = Some(hold);
            }
            return false;
        }

        self.held = None;
        self.last_fire_ms = now_ms;
        self.fires = self.fires.wrapping_add(1);
        true
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
