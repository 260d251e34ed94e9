//! Data-plane interface name classification
//!
//! Telemetry is only kept for data-plane (revenue) ports. Loopbacks, VLAN
//! SVIs and management interfaces are dropped by a post-filter after
//! assembly, never by skipping the poll itself.

use once_cell::sync::Lazy;
use regex::Regex;

/// Recognized data-plane interface naming conventions: Cisco-style
/// ("GigabitEthernet1/0/1", "fa0/1") and Juniper-style ("ge-0/0/0",
/// "xe-1/2/3", "et-0/0/48").
static DATA_INTF_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:((gigabit|fast)ethernet|gi|fa)[0-9]+(/[0-9]+)+|(ge|et|xe)-[0-9]+(/[0-9]+)+)$")
        .expect("data interface regex is valid")
});

/// Returns true iff `name` matches a recognized data-plane interface naming
/// convention, case-insensitively.
pub fn is_data_interface(name: &str) -> bool {
    DATA_INTF_REGEX.is_match(&name.to_lowercase())
}
