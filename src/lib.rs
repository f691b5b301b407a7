//! StationLink firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod connection;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod scheduler;
pub mod status;
pub mod update_gate;

pub mod adapters;
