//! Credential store.
//!
//! Sole reader/writer of the persisted configuration document
//! (`{"ssid": "...", "password": "..."}`).  The document is always
//! replaced wholesale; there are no partial updates.

use core::fmt;
use log::{info, warn};

use crate::app::ports::{DocumentStore, StorageError};
use crate::error::PersistenceError;
use crate::identity::NetworkIdentity;

/// Why no usable identity could be loaded.  Callers treat both the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// No document existed; an empty one has been created.
    NotFound,
    /// The document exists but could not be read or parsed.
    Corrupt,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config document not found"),
            Self::Corrupt => write!(f, "config document corrupt"),
        }
    }
}

pub struct CredentialStore {
    document: String,
}

impl CredentialStore {
    pub fn new(document: &str) -> Self {
        Self {
            document: document.to_owned(),
        }
    }

    /// Read and validate the persisted identity.
    ///
    /// A missing document is created empty before `NotFound` is returned, so
    /// the next load yields an empty identity.
    pub fn load(&self, store: &mut impl DocumentStore) -> Result<NetworkIdentity, LoadError> {
        let raw = match store.read_document(&self.document) {
            Ok(raw) => raw,
            Err(StorageError::NotFound) => {
                info!("Config: {} missing, creating empty document", self.document);
                if let Err(e) = self.save(store, &NetworkIdentity::default()) {
                    warn!("Config: could not create {}: {}", self.document, e);
                }
                return Err(LoadError::NotFound);
            }
            Err(e) => {
                warn!("Config: read of {} failed: {}", self.document, e);
                return Err(LoadError::Corrupt);
            }
        };

        serde_json::from_slice::<NetworkIdentity>(&raw).map_err(|_| {
            warn!("Config: {} failed to parse, ignoring", self.document);
            LoadError::Corrupt
        })
    }

    /// Replace the persisted document with `identity`.
    pub fn save(
        &self,
        store: &mut impl DocumentStore,
        identity: &NetworkIdentity,
    ) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec(identity).map_err(|_| PersistenceError::Encode)?;
        store.write_document(&self.document, &bytes)?;
        Ok(())
    }

    /// Raw persisted document, or `None` when it does not exist.
    pub fn read_document(
        &self,
        store: &impl DocumentStore,
    ) -> Result<Option<Vec<u8>>, PersistenceError> {
        match store.read_document(&self.document) {
            Ok(raw) => Ok(Some(raw)),
            Err(StorageError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
