//! SNMP polling engine
//!
//! Layered as: transport queries -> [`task`] retrieval and parsing ->
//! [`strategy`] assembly into a device snapshot -> [`poller`] validation
//! and orchestration.

pub mod poller;
pub mod strategy;
pub mod task;
pub mod tasks;

pub use poller::{PollRequest, Poller};
pub use strategy::{DeviceSnapshot, InterfaceRecord, NeighbourRecord, PollStrategy, StrategyRegistry};
pub use task::{ParsedRecord, PollTask, RecordParser, ValueTransform};
