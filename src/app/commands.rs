//! Inbound requests to the application service.
//!
//! These are what the web-serving collaborator may ask of the core.  The
//! HTTP adapter translates routes into [`Request`]s, passes them through the
//! [`RequestMailbox`](super::mailbox::RequestMailbox), and renders the
//! [`Response`] with [`Response::status_code`] / [`Response::body`].

use serde::Deserialize;

use crate::connection::LinkState;
use crate::status::StatusReport;

/// Body of `POST config`.  Absent fields default to empty strings.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    pub ssid: String,
    pub password: String,
}

impl ConfigUpdate {
    /// Parse a JSON request body.
    pub fn from_json(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }
}

// Password is never formatted.
impl core::fmt::Debug for ConfigUpdate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConfigUpdate")
            .field("ssid", &self.ssid)
            .finish_non_exhaustive()
    }
}

/// Requests that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Return the persisted configuration document.
    GetConfig,
    /// Validate, persist and apply a new network identity.
    SetConfig(ConfigUpdate),
    /// Return a status snapshot.
    GetStatus,
    /// Drop the link and forget the in-memory identity.  The persisted
    /// document is kept, so the next boot reconnects.
    Disconnect,
    /// Start a fresh retry cycle now.
    Retry,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Raw persisted configuration document.
    Config(Vec<u8>),
    /// Status snapshot.
    Status(StatusReport),
    /// Identity applied; `persisted` is false when only the in-memory copy changed.
    Applied { persisted: bool },
    /// Link request accepted; carries the resulting state.
    Link(LinkState),
    /// The requested document does not exist.
    NotFound,
    /// Request rejected during validation.
    Invalid(&'static str),
}

impl Response {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Config(_)
            | Self::Status(_)
            | Self::Link(_)
            | Self::Applied { persisted: true } => 200,
            Self::Applied { persisted: false } => 500,
            Self::NotFound => 404,
            Self::Invalid(_) => 400,
        }
    }

    /// JSON body for the response.
    pub fn body(&self) -> Vec<u8> {
        let value = match self {
            Self::Config(doc) => return doc.clone(),
            Self::Status(report) => return report.to_json(),
            Self::Applied { persisted: true } => serde_json::json!({
                "success": true,
                "message": "Configuration saved. Device will reconnect.",
            }),
            Self::Applied { persisted: false } => serde_json::json!({
                "success": false,
                "message": "Configuration applied but could not be saved.",
            }),
            Self::Link(state) => serde_json::json!({
                "success": true,
                "link_state": state.as_str(),
            }),
            Self::NotFound => serde_json::json!({ "error": "Config file not found" }),
            Self::Invalid(msg) => serde_json::json!({ "error": msg }),
        };
        serde_json::to_vec(&value).unwrap_or_default()
    }
}
