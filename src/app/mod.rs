//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the orchestration rules for the StationLink
//! firmware: link supervision, update gating, uplink scheduling and the
//! request contract.  All interaction with the radio, storage and network
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod mailbox;
pub mod ports;
pub mod service;
