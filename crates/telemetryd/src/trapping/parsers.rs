//! Trap parsers: turn resolved notifications into storable events
//!
//! Each parser family handles one kind of notification; the registry binds
//! the resolved trap names to their parser explicitly.

use crate::trapping::store::TrapEvent;
use snmp_types::{epoch_secs, is_data_interface};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Varbind fields of one notification, keyed by resolved symbolic name.
pub type TrapFields = HashMap<String, String>;

/// One family of trap events.
///
/// `extract` returns the event id suffix and the payload, or `None` when
/// the notification is not one this parser reports (missing fields,
/// filtered interface). Ingestion treats `None` as a silent drop.
pub trait TrapParser: Send + Sync {
    /// Event family name; prefixes every event id
    fn event_name(&self) -> &'static str;

    fn extract(
        &self,
        source: &str,
        fields: &TrapFields,
    ) -> Option<(String, BTreeMap<String, String>)>;
}

/// Interface link state changes (linkUp / linkDown).
///
/// Needs the trap identity and the interface name; anything that is not a
/// physical data interface is dropped.
pub struct LinkStateParser;

impl TrapParser for LinkStateParser {
    fn event_name(&self) -> &'static str {
        "IntfStateChange"
    }

    fn extract(
        &self,
        source: &str,
        fields: &TrapFields,
    ) -> Option<(String, BTreeMap<String, String>)> {
        let trap_oid = fields.get("snmpTrapOID")?;
        let if_name = fields.get("ifName")?;

        if !is_data_interface(if_name) {
            debug!(source, if_name, "ignoring link state change on non-data interface");
            return None;
        }

        let state = if trap_oid.eq_ignore_ascii_case("linkUp") {
            "up"
        } else {
            "down"
        };

        let payload = BTreeMap::from([
            ("Interface".to_string(), if_name.clone()),
            ("State".to_string(), state.to_string()),
        ]);
        Some((if_name.clone(), payload))
    }
}

/// Builds the stored event for a parsed notification. Returns `None` when
/// the parser does not recognize it; ingestion never fails on bad input.
pub fn build_event(
    parser: &dyn TrapParser,
    source: &str,
    fields: &TrapFields,
) -> Option<TrapEvent> {
    let (suffix, payload) = parser.extract(source, fields)?;
    Some(TrapEvent {
        trap_id: format!("{}_{}", parser.event_name(), suffix),
        ip_address: source.to_string(),
        timestamp: epoch_secs(),
        trap_name: parser.event_name().to_string(),
        trap_data: payload,
    })
}

/// Resolved-trap-name → parser map. Registration is explicit and lookups
/// are case-insensitive.
pub struct TrapParserRegistry {
    parsers: HashMap<String, Arc<dyn TrapParser>>,
}

impl TrapParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Registry with the built-in link state parser bound to both link
    /// transition traps.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let link_state = Arc::new(LinkStateParser);
        registry.register("linkUp", link_state.clone());
        registry.register("linkDown", link_state);
        registry
    }

    pub fn register(&mut self, trap_name: &str, parser: Arc<dyn TrapParser>) {
        if self
            .parsers
            .insert(trap_name.to_lowercase(), parser)
            .is_some()
        {
            warn!(trap_name, "replacing existing trap parser binding");
        }
    }

    pub fn lookup(&self, trap_name: &str) -> Option<Arc<dyn TrapParser>> {
        self.parsers.get(&trap_name.to_lowercase()).cloned()
    }
}

impl Default for TrapParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
