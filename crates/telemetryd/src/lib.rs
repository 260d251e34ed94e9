//! SNMP Telemetry Daemon
//!
//! Polls network devices over SNMP into structured snapshots and accumulates
//! link state trap events for subscribed devices. Polling is strategy driven:
//! a strategy runs an ordered list of OID tasks and assembles their records
//! into a per-device snapshot keyed by interface index.

pub mod api;
pub mod config;
pub mod error;
pub mod polling;
pub mod transport;
pub mod trapping;

pub use api::{AppState, GetTrapsResponse, SubscriptionResponse};
pub use config::{ApiConfig, PollConfig, TelemetryConfig, TrapConfig};
pub use error::{Result, TelemetryError};
pub use polling::poller::{PollRequest, Poller};
pub use polling::strategy::{
    DeviceSnapshot, InterfaceRecord, NeighbourRecord, PollStrategy, StrategyRegistry,
};
pub use transport::{Community, QueryMode, RawPair, RawValue, Snmp2Transport, SnmpQuery, SnmpTarget};
pub use trapping::receiver::{start_trap_listener, TrapListenerHandle};
pub use trapping::store::{TrapEvent, TrapStore};
