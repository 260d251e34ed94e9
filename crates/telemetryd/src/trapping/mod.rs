//! Trap ingestion pipeline
//!
//! [`receiver`] listens for SNMP notifications and resolves varbind names,
//! [`parsers`] turn recognized notifications into events, and [`store`]
//! accumulates events per subscribed device.

pub mod parsers;
pub mod receiver;
pub mod store;

pub use parsers::{LinkStateParser, TrapFields, TrapParser, TrapParserRegistry};
pub use receiver::{start_trap_listener, TrapListenerContext, TrapListenerHandle, TrapNotification};
pub use store::{TrapEvent, TrapStore};
