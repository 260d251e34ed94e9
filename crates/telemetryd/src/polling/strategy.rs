//! Poll strategies: task lists plus assembly rules
//!
//! A strategy owns the ordered task list and a dispatch map that binds each
//! task name to the snapshot field it writes. Records tagged with an
//! interface index route into lazily created interface entries; everything
//! else writes device-level fields. The resulting [`DeviceSnapshot`]
//! serializes with the PascalCase wire names consumers expect.

use crate::error::Result;
use crate::polling::task::PollTask;
use crate::polling::tasks;
use crate::transport::{Community, RawValue, SnmpQuery, SnmpTarget};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use snmp_types::{epoch_secs, is_data_interface};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// LLDP neighbour details attached to an interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NeighbourRecord {
    pub lldp_rem_host: Option<String>,
    pub lldp_rem_host_ip_addr: Option<String>,
    pub lldp_rem_port: Option<String>,
}

/// One interface in the snapshot, keyed by its interface index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InterfaceRecord {
    pub if_index: u32,
    pub if_admin_status: Option<String>,
    pub if_oper_status: Option<String>,
    pub if_name: Option<String>,
    pub if_descr: Option<String>,
    pub if_speed: Option<i64>,
    #[serde(rename = "IfHCInOctets")]
    pub if_hc_in_octets: Option<i64>,
    #[serde(rename = "IfHCOutOctets")]
    pub if_hc_out_octets: Option<i64>,
    pub neighbour: NeighbourRecord,
}

impl InterfaceRecord {
    fn new(if_index: u32) -> Self {
        Self {
            if_index,
            if_admin_status: None,
            if_oper_status: None,
            if_name: None,
            if_descr: None,
            if_speed: None,
            if_hc_in_octets: None,
            if_hc_out_octets: None,
            neighbour: NeighbourRecord::default(),
        }
    }
}

/// Assembled result of one poll run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceSnapshot {
    /// Unix epoch seconds at assembly time
    pub timestamp: i64,
    pub ip_address: String,
    pub host_name: Option<String>,
    pub device_model: Option<String>,
    pub interfaces: Vec<InterfaceRecord>,
}

impl DeviceSnapshot {
    fn new(ip_address: String) -> Self {
        Self {
            timestamp: 0,
            ip_address,
            host_name: None,
            device_model: None,
            interfaces: Vec::new(),
        }
    }

    /// Entry for `if_index`, created on first touch; first-seen order is
    /// preserved.
    fn interface_mut(&mut self, if_index: u32) -> &mut InterfaceRecord {
        if let Some(pos) = self.interfaces.iter().position(|i| i.if_index == if_index) {
            &mut self.interfaces[pos]
        } else {
            self.interfaces.push(InterfaceRecord::new(if_index));
            self.interfaces
                .last_mut()
                .expect("just pushed an interface record")
        }
    }

    /// Drops management and logical entries, keeping only physical data
    /// interfaces.
    fn retain_data_interfaces(&mut self) {
        self.interfaces.retain(|i| {
            i.if_name
                .as_deref()
                .map(is_data_interface)
                .unwrap_or(false)
        });
    }
}

fn as_int(value: &RawValue) -> Option<i64> {
    match value {
        RawValue::Int(n) => Some(*n),
        RawValue::Str(s) => s.trim().parse().ok(),
    }
}

/// Where a task's records land in the snapshot.
///
/// Bound by name at strategy construction, so an unroutable task is a
/// startup-visible defect rather than a silent runtime fallthrough.
#[derive(Clone, Copy)]
enum FieldSetter {
    Device(fn(&mut DeviceSnapshot, &RawValue)),
    Interface(fn(&mut InterfaceRecord, &RawValue)),
    Neighbour(fn(&mut NeighbourRecord, &RawValue)),
}

/// A named way of polling a device into a snapshot.
#[async_trait]
pub trait PollStrategy: Send + Sync {
    async fn run(
        &self,
        transport: &dyn SnmpQuery,
        target: &SnmpTarget,
        community: &Community,
    ) -> Result<DeviceSnapshot>;
}

/// The standard strategy: MIB-II system and interface columns plus LLDP
/// neighbour tables, assembled sequentially.
pub struct DefaultStrategy {
    tasks: Vec<PollTask>,
    setters: HashMap<&'static str, FieldSetter>,
}

impl DefaultStrategy {
    pub fn new() -> Self {
        let mut setters: HashMap<&'static str, FieldSetter> = HashMap::new();
        setters.insert(
            "HostName",
            FieldSetter::Device(|s, v| s.host_name = Some(v.as_text())),
        );
        setters.insert(
            "DeviceModel",
            FieldSetter::Device(|s, v| s.device_model = Some(v.as_text())),
        );
        // The index column only seeds the interface entry; its key is its
        // value.
        setters.insert("IfIndex", FieldSetter::Interface(|_, _| {}));
        setters.insert(
            "IfName",
            FieldSetter::Interface(|i, v| i.if_name = Some(v.as_text())),
        );
        setters.insert(
            "IfDescr",
            FieldSetter::Interface(|i, v| i.if_descr = Some(v.as_text())),
        );
        setters.insert(
            "IfAdminStatus",
            FieldSetter::Interface(|i, v| i.if_admin_status = Some(v.as_text())),
        );
        setters.insert(
            "IfOperStatus",
            FieldSetter::Interface(|i, v| i.if_oper_status = Some(v.as_text())),
        );
        setters.insert(
            "IfSpeed",
            FieldSetter::Interface(|i, v| i.if_speed = as_int(v)),
        );
        setters.insert(
            "IfHCInOctets",
            FieldSetter::Interface(|i, v| i.if_hc_in_octets = as_int(v)),
        );
        setters.insert(
            "IfHCOutOctets",
            FieldSetter::Interface(|i, v| i.if_hc_out_octets = as_int(v)),
        );
        setters.insert(
            "LldpRemHost",
            FieldSetter::Neighbour(|n, v| n.lldp_rem_host = Some(v.as_text())),
        );
        setters.insert(
            "LldpRemPort",
            FieldSetter::Neighbour(|n, v| n.lldp_rem_port = Some(v.as_text())),
        );
        setters.insert(
            "LldpRemHostIpAddr",
            FieldSetter::Neighbour(|n, v| n.lldp_rem_host_ip_addr = Some(v.as_text())),
        );

        Self {
            tasks: tasks::all_tasks(),
            setters,
        }
    }
}

impl Default for DefaultStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PollStrategy for DefaultStrategy {
    async fn run(
        &self,
        transport: &dyn SnmpQuery,
        target: &SnmpTarget,
        community: &Community,
    ) -> Result<DeviceSnapshot> {
        let mut snapshot = DeviceSnapshot::new(target.addr.to_string());

        for task in &self.tasks {
            let Some(setter) = self.setters.get(task.name).copied() else {
                warn!(task = task.name, "task has no snapshot field binding");
                continue;
            };
            let Some(records) = task.retrieve(transport, target, community).await? else {
                debug!(task = task.name, "task returned no data");
                continue;
            };

            for record in records {
                // Placeholder records carry no value and write nothing.
                let Some(value) = record.value else { continue };
                match setter {
                    FieldSetter::Device(set) => set(&mut snapshot, &value),
                    FieldSetter::Interface(set) => {
                        if let Some(if_index) = record.if_index {
                            set(snapshot.interface_mut(if_index), &value);
                        }
                    }
                    FieldSetter::Neighbour(set) => {
                        if let Some(if_index) = record.if_index {
                            set(&mut snapshot.interface_mut(if_index).neighbour, &value);
                        }
                    }
                }
            }
        }

        snapshot.timestamp = epoch_secs();
        snapshot.retain_data_interfaces();
        Ok(snapshot)
    }
}

/// Named strategy lookup. Registration is explicit; lookups are
/// case-insensitive.
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn PollStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Registry holding the built-in "default" strategy.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("default", Arc::new(DefaultStrategy::new()));
        registry
    }

    pub fn register(&mut self, name: &str, strategy: Arc<dyn PollStrategy>) {
        self.strategies.insert(name.to_lowercase(), strategy);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PollStrategy>> {
        self.strategies.get(&name.to_lowercase()).cloned()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
