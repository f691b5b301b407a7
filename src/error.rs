//! Unified error types for the StationLink firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! request interface and the tick loop's error handling uniform.  All
//! variants are `Copy` so they pass through the orchestrator without
//! allocation.  None of them is fatal: every failure is local and
//! recoverable.

use core::fmt;

use crate::app::ports::{NetworkError, StorageError};
use crate::update_gate::UpdateErrorKind;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The network name was empty (or did not fit). Rejected synchronously.
    InvalidIdentity,
    /// An external request was malformed.
    InvalidRequest(&'static str),
    /// The credential document could not be written or read.
    Persistence(PersistenceError),
    /// A firmware update session failed.
    Update(UpdateErrorKind),
    /// The network driver refused a request.
    Network(NetworkError),
    /// Device configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIdentity => write!(f, "invalid network identity (name must be 1-32 bytes)"),
            Self::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            Self::Persistence(e) => write!(f, "persistence: {e}"),
            Self::Update(e) => write!(f, "update: {e}"),
            Self::Network(e) => write!(f, "network: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceError {
    /// The document store rejected the write.
    Io,
    /// The document could not be serialised.
    Encode,
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "document I/O error"),
            Self::Encode => write!(f, "document encode error"),
        }
    }
}

impl From<PersistenceError> for Error {
    fn from(e: PersistenceError) -> Self {
        Self::Persistence(e)
    }
}

impl From<StorageError> for PersistenceError {
    fn from(_: StorageError) -> Self {
        Self::Io
    }
}

impl From<UpdateErrorKind> for Error {
    fn from(e: UpdateErrorKind) -> Self {
        Self::Update(e)
    }
}

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
