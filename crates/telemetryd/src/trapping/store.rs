//! Per-device trap event accumulation
//!
//! Devices must be subscribed before their traps are retained. Each store
//! operation is a single critical section, so a check never races the
//! mutation it guards.

use crate::error::{Result, TelemetryError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// One parsed trap, as it is stored and served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrapEvent {
    /// Stable identity within a device; a newer event with the same id
    /// replaces the older one in place
    pub trap_id: String,
    /// Source device address
    pub ip_address: String,
    /// Unix epoch seconds at parse time
    pub timestamp: i64,
    /// Event family name
    pub trap_name: String,
    /// Parsed payload fields
    pub trap_data: BTreeMap<String, String>,
}

/// Thread-safe subscription and event store.
#[derive(Debug, Default)]
pub struct TrapStore {
    devices: Mutex<HashMap<String, Vec<TrapEvent>>>,
}

impl TrapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a device. Returns `true` when the subscription was
    /// created, `false` when it already existed (events are kept).
    pub fn create_subscription(&self, ip: &str) -> bool {
        let mut devices = self.devices.lock();
        if devices.contains_key(ip) {
            debug!(ip, "subscription already exists");
            false
        } else {
            devices.insert(ip.to_string(), Vec::new());
            info!(ip, "trap subscription created");
            true
        }
    }

    pub fn has_subscription(&self, ip: &str) -> bool {
        self.devices.lock().contains_key(ip)
    }

    /// Removes a device and its accumulated events. Returns `false` when
    /// no subscription existed.
    pub fn delete_subscription(&self, ip: &str) -> bool {
        let removed = self.devices.lock().remove(ip).is_some();
        if removed {
            info!(ip, "trap subscription deleted");
        }
        removed
    }

    /// Events for a subscribed device, in arrival order.
    pub fn get_traps(&self, ip: &str) -> Result<Vec<TrapEvent>> {
        self.devices
            .lock()
            .get(ip)
            .cloned()
            .ok_or_else(|| TelemetryError::NoSubscription(ip.to_string()))
    }

    /// Full copy of the store contents, for the debug endpoint.
    pub fn dump(&self) -> HashMap<String, Vec<TrapEvent>> {
        self.devices.lock().clone()
    }

    /// Stores an event for its source device, replacing any existing event
    /// with the same id in place. Returns `false` (not an error) when the
    /// device has no subscription - unsubscribed traffic is expected.
    pub fn store_trap(&self, event: TrapEvent) -> bool {
        let mut devices = self.devices.lock();
        let Some(events) = devices.get_mut(&event.ip_address) else {
            debug!(ip = %event.ip_address, "dropping trap for unsubscribed device");
            return false;
        };
        if let Some(existing) = events.iter_mut().find(|e| e.trap_id == event.trap_id) {
            *existing = event;
        } else {
            events.push(event);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn event(ip: &str, id: &str, timestamp: i64) -> TrapEvent {
        TrapEvent {
            trap_id: id.to_string(),
            ip_address: ip.to_string(),
            timestamp,
            trap_name: "IntfStateChange".to_string(),
            trap_data: BTreeMap::from([("State".to_string(), "down".to_string())]),
        }
    }

    #[test]
    fn test_subscription_lifecycle() {
        let store = TrapStore::new();
        assert!(!store.has_subscription("10.0.0.1"));
        assert!(store.create_subscription("10.0.0.1"));
        assert!(!store.create_subscription("10.0.0.1"));
        assert!(store.has_subscription("10.0.0.1"));
        assert!(store.delete_subscription("10.0.0.1"));
        assert!(!store.delete_subscription("10.0.0.1"));
    }

    #[test]
    fn test_get_traps_without_subscription_errors() {
        let store = TrapStore::new();
        assert!(matches!(
            store.get_traps("10.0.0.1"),
            Err(TelemetryError::NoSubscription(_))
        ));
    }

    #[test]
    fn test_store_trap_requires_subscription() {
        let store = TrapStore::new();
        assert!(!store.store_trap(event("10.0.0.1", "IntfStateChange_ge-0/0/0", 1)));
        store.create_subscription("10.0.0.1");
        assert!(store.store_trap(event("10.0.0.1", "IntfStateChange_ge-0/0/0", 1)));
        assert_eq!(store.get_traps("10.0.0.1").unwrap().len(), 1);
    }

    #[test]
    fn test_store_trap_upserts_in_place() {
        let store = TrapStore::new();
        store.create_subscription("10.0.0.1");
        store.store_trap(event("10.0.0.1", "a", 1));
        store.store_trap(event("10.0.0.1", "b", 2));
        store.store_trap(event("10.0.0.1", "a", 3));

        let traps = store.get_traps("10.0.0.1").unwrap();
        assert_eq!(traps.len(), 2);
        // "a" keeps its original position but carries the newer timestamp.
        assert_eq!(traps[0].trap_id, "a");
        assert_eq!(traps[0].timestamp, 3);
        assert_eq!(traps[1].trap_id, "b");
    }

    #[test]
    fn test_resubscription_keeps_events() {
        let store = TrapStore::new();
        store.create_subscription("10.0.0.1");
        store.store_trap(event("10.0.0.1", "a", 1));
        assert!(!store.create_subscription("10.0.0.1"));
        assert_eq!(store.get_traps("10.0.0.1").unwrap().len(), 1);
    }

    #[test]
    fn test_delete_discards_events() {
        let store = TrapStore::new();
        store.create_subscription("10.0.0.1");
        store.store_trap(event("10.0.0.1", "a", 1));
        store.delete_subscription("10.0.0.1");
        store.create_subscription("10.0.0.1");
        assert!(store.get_traps("10.0.0.1").unwrap().is_empty());
    }

    #[test]
    fn test_devices_are_isolated() {
        let store = TrapStore::new();
        store.create_subscription("10.0.0.1");
        store.create_subscription("10.0.0.2");
        store.store_trap(event("10.0.0.1", "a", 1));
        assert_eq!(store.get_traps("10.0.0.1").unwrap().len(), 1);
        assert!(store.get_traps("10.0.0.2").unwrap().is_empty());
    }

    #[test]
    fn test_dump_copies_all_devices() {
        let store = TrapStore::new();
        store.create_subscription("10.0.0.1");
        store.create_subscription("10.0.0.2");
        store.store_trap(event("10.0.0.1", "a", 1));

        let dump = store.dump();
        assert_eq!(dump.len(), 2);
        assert_eq!(dump["10.0.0.1"].len(), 1);
        assert!(dump["10.0.0.2"].is_empty());
    }

    #[test]
    fn test_event_wire_names() {
        let json = serde_json::to_string(&event("10.0.0.1", "a", 1)).unwrap();
        assert!(json.contains("\"TrapId\""));
        assert!(json.contains("\"IpAddress\""));
        assert!(json.contains("\"TrapName\""));
        assert!(json.contains("\"TrapData\""));
    }
}
