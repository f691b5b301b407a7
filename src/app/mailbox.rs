//! Cross-task request mailbox.
//!
//! The HTTP server runs on its own task and must never touch the
//! orchestrator directly.  Requests are queued here and applied during the
//! tick; the reply is handed back through a [`Signal`].
//!
//! ```text
//!  HTTP task                         tick (main loop)
//!  ─────────                         ────────────────
//!  call(req) ── lock ──▶ requests ──▶ serve(handler)
//!      ▲                                  │
//!      └──────────── reply ◀──────────────┘
//! ```
//!
//! The caller lock keeps exactly one request outstanding, so a reply can
//! only ever belong to the caller that is waiting for it.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;

use super::commands::{Request, Response};

pub struct RequestMailbox {
    requests: Channel<CriticalSectionRawMutex, Request, 1>,
    reply: Signal<CriticalSectionRawMutex, Response>,
    caller: Mutex<CriticalSectionRawMutex, ()>,
}

impl Default for RequestMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestMailbox {
    pub const fn new() -> Self {
        Self {
            requests: Channel::new(),
            reply: Signal::new(),
            caller: Mutex::new(()),
        }
    }

    /// Submit `req` and wait for the tick to answer it.
    pub async fn call(&self, req: Request) -> Response {
        let _guard = self.caller.lock().await;
        self.reply.reset();
        self.requests.send(req).await;
        self.reply.wait().await
    }

    /// Answer every queued request with `handler`.  Never blocks.
    ///
    /// Returns the number of requests served.
    pub fn serve(&self, mut handler: impl FnMut(Request) -> Response) -> usize {
        let mut served = 0;
        while let Ok(req) = self.requests.try_receive() {
            self.reply.signal(handler(req));
            served += 1;
        }
        served
    }
}
