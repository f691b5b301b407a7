//! Network identity: the name/secret pair used to join a wireless network.
//!
//! Both fields are fixed-capacity so an identity never allocates and an
//! over-long value is rejected at the boundary instead of being truncated.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Maximum network name length in bytes (802.11 SSID limit).
pub const NAME_MAX_LEN: usize = 32;
/// Maximum secret length in bytes (WPA2 passphrase / raw PSK hex).
pub const SECRET_MAX_LEN: usize = 64;

pub type NetworkName = heapless::String<NAME_MAX_LEN>;
pub type NetworkSecret = heapless::String<SECRET_MAX_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityError {
    NameTooLong,
    SecretTooLong,
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameTooLong => write!(f, "network name exceeds {NAME_MAX_LEN} bytes"),
            Self::SecretTooLong => write!(f, "network secret exceeds {SECRET_MAX_LEN} bytes"),
        }
    }
}

/// Credentials for one wireless network.
///
/// Serialises as the persisted configuration document
/// `{"ssid": "...", "password": "..."}`; absent fields default to empty.
/// An empty `name` means "not configured".
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkIdentity {
    #[serde(rename = "ssid")]
    name: NetworkName,
    #[serde(rename = "password")]
    secret: NetworkSecret,
}

impl NetworkIdentity {
    pub fn new(name: &str, secret: &str) -> Result<Self, IdentityError> {
        let mut id = Self::default();
        id.name.push_str(name).map_err(|()| IdentityError::NameTooLong)?;
        id.secret
            .push_str(secret)
            .map_err(|()| IdentityError::SecretTooLong)?;
        Ok(id)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// `true` when the name is empty.
    pub fn is_unconfigured(&self) -> bool {
        self.name.is_empty()
    }
}

// The secret is never formatted, not even in debug output.
impl fmt::Debug for NetworkIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkIdentity")
            .field("name", &self.name.as_str())
            .field("secret", &"<redacted>")
            .finish()
    }
}
