//! Firmware update transport, backed by the `esp-ota` crate.
//!
//! Flow: authorize → Started → N × Progress → Finished → reboot
//!
//! The upload itself runs on the HTTP server task.  It reports lifecycle
//! events through an [`OtaReporter`]; the tick drains them from the paired
//! [`OtaTransport`] into the update gate.

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::{info, warn};

use crate::app::events::UpdateEvent;
use crate::app::ports::UpdateTransport;
use crate::update_gate::{UpdateErrorKind, UpdateTarget};

/// Staging buffer for each read from the upload body.
pub const CHUNK_SIZE: usize = 4096;

const EVENT_DEPTH: usize = 16;

/// Slots progress never takes, kept for `Finished` / `Failed`.
const LIFECYCLE_RESERVE: usize = 2;

type EventQueue = Channel<CriticalSectionRawMutex, UpdateEvent, EVENT_DEPTH>;

// ── Channel halves ────────────────────────────────────────────

/// Consumer half, owned by the device bundle.
pub struct OtaTransport {
    events: Arc<EventQueue>,
}

/// Producer half, owned by the upload handler.
#[derive(Clone)]
pub struct OtaReporter {
    events: Arc<EventQueue>,
}

/// Create a connected transport/reporter pair.
pub fn channel() -> (OtaTransport, OtaReporter) {
    let events = Arc::new(EventQueue::new());
    (
        OtaTransport {
            events: events.clone(),
        },
        OtaReporter { events },
    )
}

impl UpdateTransport for OtaTransport {
    fn poll_event(&mut self) -> Option<UpdateEvent> {
        self.events.try_receive().ok()
    }
}

impl OtaReporter {
    pub fn started(&self, target: UpdateTarget) {
        self.lifecycle(UpdateEvent::Started(target));
    }

    /// Progress is best-effort: dropped when the tick has fallen behind.
    pub fn progress(&self, written: u32, total: u32) {
        if self.events.free_capacity() > LIFECYCLE_RESERVE {
            let _ = self.events.try_send(UpdateEvent::Progress { written, total });
        }
    }

    pub fn finished(&self) {
        self.lifecycle(UpdateEvent::Finished);
    }

    pub fn failed(&self, reason: UpdateErrorKind) {
        self.lifecycle(UpdateEvent::Failed(reason));
    }

    /// Never waits: the tick may not be draining (link down, no session).
    fn lifecycle(&self, event: UpdateEvent) {
        if let Err(TrySendError::Full(event)) = self.events.try_send(event) {
            warn!("OTA: event queue full, dropped {:?}", event);
        }
    }
}

// ── Authorization ─────────────────────────────────────────────

/// Compare the presented upload token with the configured one without
/// short-circuiting on the first mismatching byte.
pub fn authorize(presented: Option<&str>, expected: &str) -> bool {
    let Some(presented) = presented else {
        return false;
    };
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ── Streaming ─────────────────────────────────────────────────

/// Copy an upload body into flash.
///
/// `read` fills the buffer and returns the byte count (0 at end of body),
/// `write` stores one chunk.  `total` is the declared body length; zero
/// means unknown.  Returns the number of bytes written.
pub fn stream_image<R, W>(
    mut read: R,
    mut write: W,
    total: u32,
    reporter: &OtaReporter,
) -> Result<u32, UpdateErrorKind>
where
    R: FnMut(&mut [u8]) -> Option<usize>,
    W: FnMut(&[u8]) -> bool,
{
    let mut buf = [0u8; CHUNK_SIZE];
    let mut written: u32 = 0;

    loop {
        let n = read(&mut buf).ok_or(UpdateErrorKind::Receive)?;
        if n == 0 {
            break;
        }
        if !write(&buf[..n]) {
            return Err(UpdateErrorKind::Receive);
        }
        written = written.saturating_add(n as u32);
        reporter.progress(written, total);
    }

    if written == 0 || (total != 0 && written != total) {
        warn!("OTA: body ended at {} of {} bytes", written, total);
        return Err(UpdateErrorKind::Receive);
    }
    Ok(written)
}

// ── ESP-IDF flashing ──────────────────────────────────────────

/// Receive a firmware image into the inactive OTA partition and mark it
/// bootable.  Every outcome is reported through `reporter`.
#[cfg(target_os = "espidf")]
pub fn receive_firmware<R>(read: R, total: u32, reporter: &OtaReporter) -> Result<u32, UpdateErrorKind>
where
    R: FnMut(&mut [u8]) -> Option<usize>,
{
    reporter.started(UpdateTarget::Firmware);
    let result = flash_firmware(read, total, reporter);
    match result {
        Ok(n) => {
            info!("OTA: {} bytes written, image set as boot partition", n);
            reporter.finished();
        }
        Err(reason) => reporter.failed(reason),
    }
    result
}

#[cfg(target_os = "espidf")]
fn flash_firmware<R>(read: R, total: u32, reporter: &OtaReporter) -> Result<u32, UpdateErrorKind>
where
    R: FnMut(&mut [u8]) -> Option<usize>,
{
    let mut update = esp_ota::OtaUpdate::begin().map_err(|e| {
        warn!("esp-ota begin failed: {:?}", e);
        UpdateErrorKind::Begin
    })?;

    let written = stream_image(
        read,
        |chunk| match update.write(chunk) {
            Ok(()) => true,
            Err(e) => {
                warn!("esp-ota write failed: {:?}", e);
                false
            }
        },
        total,
        reporter,
    )?;

    let mut completed = update.finalize().map_err(|e| {
        warn!("esp-ota finalize failed: {:?}", e);
        UpdateErrorKind::End
    })?;
    completed.set_as_boot_partition().map_err(|e| {
        warn!("esp-ota set_as_boot_partition failed: {:?}", e);
        UpdateErrorKind::End
    })?;
    Ok(written)
}

/// Mark the running image valid so the bootloader does not roll back.
///
/// Call once at boot, after the system has come up far enough to be
/// considered healthy.
#[cfg(target_os = "espidf")]
pub fn check_rollback() {
    match esp_ota::mark_app_valid() {
        Ok(()) => info!("OTA: running image marked valid"),
        Err(e) => warn!("OTA: mark_app_valid failed: {:?}", e),
    }
}

// ── Tests ─────────────────────────────────────────────────────
