//! Shared types and utilities for the SNMP telemetry service
//!
//! This crate is the leaf of the workspace: pure helpers with no I/O, used by
//! both the polling engine and the trap ingestion path.
//!
//! - [`oid`] — dot-notation object-identifier helpers (index extraction,
//!   suffix joining, prefix checks)
//! - [`intf`] — data-plane interface name classification
//! - [`time`] — epoch timestamp helper

pub mod intf;
pub mod oid;
pub mod time;

pub use intf::is_data_interface;
pub use oid::{extract_index, oid_has_prefix, suffix_segments};
pub use time::epoch_secs;
