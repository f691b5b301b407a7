//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { configured } => {
                info!("START | configured={}", configured);
            }
            AppEvent::LinkChanged { from, to } => {
                info!("LINK | {} -> {}", from.as_str(), to.as_str());
            }
            AppEvent::ConfigChanged { persisted } => {
                if *persisted {
                    info!("CONFIG | network identity saved");
                } else {
                    warn!("CONFIG | network identity applied but not saved");
                }
            }
            AppEvent::UpdateStarted(target) => {
                info!("UPDATE | started target={}", target.as_str());
            }
            AppEvent::UpdateCompleted => {
                info!("UPDATE | completed");
            }
            AppEvent::UpdateFailed(reason) => {
                warn!("UPDATE | failed reason={}", reason);
            }
            AppEvent::Uplink { sequence, ok } => {
                info!("UPLINK | seq={} ok={}", sequence, ok);
            }
        }
    }
}
