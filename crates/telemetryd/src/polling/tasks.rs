//! The built-in poll task catalogue
//!
//! Standard MIB-II / IF-MIB columns plus the LLDP remote tables. Task names
//! double as the keys strategies bind snapshot fields to.

use crate::polling::task::{PollTask, RecordParser, ValueTransform};
use crate::transport::QueryMode;

/// sysName.0
pub fn host_name() -> PollTask {
    PollTask::new(
        "HostName",
        vec!["1.3.6.1.2.1.1.5.0"],
        QueryMode::Get,
        RecordParser::DeviceScalar,
    )
}

/// entPhysicalModelName.1, falling back to lldpLocSysDesc.0 for devices
/// without an entity table.
pub fn device_model() -> PollTask {
    PollTask::new(
        "DeviceModel",
        vec!["1.3.6.1.2.1.47.1.1.1.1.13.1", "1.0.8802.1.1.2.1.3.4.0"],
        QueryMode::Get,
        RecordParser::ModelDescription,
    )
}

/// ifIndex column; values seed the interface table.
pub fn if_index() -> PollTask {
    PollTask::new(
        "IfIndex",
        vec!["1.3.6.1.2.1.2.2.1.1"],
        QueryMode::BulkWalk,
        RecordParser::IndexColumn,
    )
}

/// ifName (IF-MIB high-capacity table)
pub fn if_name() -> PollTask {
    PollTask::new(
        "IfName",
        vec!["1.3.6.1.2.1.31.1.1.1.1"],
        QueryMode::BulkWalk,
        RecordParser::InterfaceColumn {
            index_pos: -1,
            transform: None,
        },
    )
}

/// ifDescr
pub fn if_descr() -> PollTask {
    PollTask::new(
        "IfDescr",
        vec!["1.3.6.1.2.1.2.2.1.2"],
        QueryMode::BulkWalk,
        RecordParser::InterfaceColumn {
            index_pos: -1,
            transform: None,
        },
    )
}

/// ifAdminStatus, mapped to "up"/"down"
pub fn if_admin_status() -> PollTask {
    PollTask::new(
        "IfAdminStatus",
        vec!["1.3.6.1.2.1.2.2.1.7"],
        QueryMode::BulkWalk,
        RecordParser::InterfaceColumn {
            index_pos: -1,
            transform: Some(ValueTransform::UpDown),
        },
    )
}

/// ifOperStatus, mapped to "up"/"down"
pub fn if_oper_status() -> PollTask {
    PollTask::new(
        "IfOperStatus",
        vec!["1.3.6.1.2.1.2.2.1.8"],
        QueryMode::BulkWalk,
        RecordParser::InterfaceColumn {
            index_pos: -1,
            transform: Some(ValueTransform::UpDown),
        },
    )
}

/// ifHighSpeed (Mb/s)
pub fn if_speed() -> PollTask {
    PollTask::new(
        "IfSpeed",
        vec!["1.3.6.1.2.1.31.1.1.1.15"],
        QueryMode::BulkWalk,
        RecordParser::InterfaceColumn {
            index_pos: -1,
            transform: None,
        },
    )
}

/// ifHCInOctets
pub fn if_hc_in_octets() -> PollTask {
    PollTask::new(
        "IfHCInOctets",
        vec!["1.3.6.1.2.1.31.1.1.1.6"],
        QueryMode::BulkWalk,
        RecordParser::InterfaceColumn {
            index_pos: -1,
            transform: None,
        },
    )
}

/// ifHCOutOctets
pub fn if_hc_out_octets() -> PollTask {
    PollTask::new(
        "IfHCOutOctets",
        vec!["1.3.6.1.2.1.31.1.1.1.10"],
        QueryMode::BulkWalk,
        RecordParser::InterfaceColumn {
            index_pos: -1,
            transform: None,
        },
    )
}

/// lldpRemSysName; the local port number sits second-from-last in the
/// instance identifier.
pub fn lldp_rem_host() -> PollTask {
    PollTask::new(
        "LldpRemHost",
        vec!["1.0.8802.1.1.2.1.4.1.1.9"],
        QueryMode::BulkWalk,
        RecordParser::InterfaceColumn {
            index_pos: -2,
            transform: None,
        },
    )
}

/// lldpRemPortId
pub fn lldp_rem_port() -> PollTask {
    PollTask::new(
        "LldpRemPort",
        vec!["1.0.8802.1.1.2.1.4.1.1.7"],
        QueryMode::BulkWalk,
        RecordParser::InterfaceColumn {
            index_pos: -2,
            transform: None,
        },
    )
}

/// lldpRemManAddrIfId for IPv4 management addresses; the neighbour address
/// is the last four instance segments, the local port number sits eight
/// segments from the end.
pub fn lldp_rem_host_ip_addr() -> PollTask {
    PollTask::new(
        "LldpRemHostIpAddr",
        vec!["1.0.8802.1.1.2.1.4.2.1.4.0"],
        QueryMode::BulkWalk,
        RecordParser::EmbeddedIp {
            value_segments: 4,
            index_pos: -8,
        },
    )
}

/// Every task the default strategy runs, in assembly order: device scalars
/// first, then the index column that seeds interfaces, then the remaining
/// interface and neighbour columns.
pub fn all_tasks() -> Vec<PollTask> {
    vec![
        host_name(),
        device_model(),
        if_index(),
        if_name(),
        if_descr(),
        if_admin_status(),
        if_oper_status(),
        if_speed(),
        if_hc_in_octets(),
        if_hc_out_octets(),
        lldp_rem_host(),
        lldp_rem_port(),
        lldp_rem_host_ip_addr(),
    ]
}
