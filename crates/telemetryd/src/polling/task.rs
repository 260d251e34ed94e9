//! Poll task: one named unit of SNMP retrieval work
//!
//! A task owns an ordered list of candidate OID prefixes (vendor fallbacks),
//! a query mode, and a parser that turns raw pairs into structured records,
//! each optionally tagged with an interface index used downstream as the
//! correlation key.

use crate::error::Result;
use crate::transport::{Community, QueryMode, RawPair, RawValue, SnmpQuery, SnmpTarget};
use once_cell::sync::Lazy;
use regex::Regex;
use snmp_types::oid::{extract_index, oid_has_prefix, suffix_segments};
use tracing::{debug, warn};

/// Juniper chassis descriptions embed the model after the vendor prefix,
/// e.g. "Juniper Networks, Inc. vmx internet router ..." -> "vmx".
static JUNOS_MODEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Juniper Networks, Inc\. ([a-zA-Z]+)").expect("juniper model regex is valid")
});

/// Maps status integers to the wire strings stored in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTransform {
    /// 1 -> "up", anything else -> "down"
    UpDown,
}

impl ValueTransform {
    fn apply(&self, value: &RawValue) -> RawValue {
        match self {
            ValueTransform::UpDown => match value {
                RawValue::Int(1) => RawValue::Str("up".to_string()),
                _ => RawValue::Str("down".to_string()),
            },
        }
    }
}

/// How a task turns matched raw pairs into records.
///
/// Explicit dispatch: every parsing behavior the task list needs is a
/// variant here, selected when the task is constructed.
#[derive(Debug, Clone)]
pub enum RecordParser {
    /// Exact-OID scalar: a single untagged record (e.g. sysName).
    DeviceScalar,
    /// Device model: the primary OID carries the model verbatim; the
    /// fallback OID carries a chassis description the model is extracted
    /// from by regex.
    ModelDescription,
    /// Table column whose value *is* the interface index; the index tags
    /// the record as its own correlation key.
    IndexColumn,
    /// Table column keyed by an index segment inside the OID.
    InterfaceColumn {
        /// Signed segment position of the index within the OID
        index_pos: isize,
        /// Optional value rewrite
        transform: Option<ValueTransform>,
    },
    /// Column whose value is embedded in the OID itself as a fixed-length
    /// segment suffix (remote management IPv4 address), with the index at
    /// a different offset.
    EmbeddedIp {
        /// Number of trailing segments forming the value
        value_segments: usize,
        /// Signed segment position of the index within the OID
        index_pos: isize,
    },
}

/// One structured record produced by a task's parser.
///
/// A parser that finds no real records still returns a single placeholder
/// record with all fields unset, so callers can tell "ran, found nothing"
/// apart from "did not run".
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    /// Source OID, unset for placeholders
    pub oid: Option<String>,
    /// Parsed value, unset for placeholders
    pub value: Option<RawValue>,
    /// Correlation key (interface index), unset for device-level records
    pub if_index: Option<u32>,
}

impl ParsedRecord {
    fn placeholder() -> Self {
        Self {
            oid: None,
            value: None,
            if_index: None,
        }
    }

    fn device(oid: &str, value: RawValue) -> Self {
        Self {
            oid: Some(oid.to_string()),
            value: Some(value),
            if_index: None,
        }
    }

    fn interface(oid: &str, value: RawValue, if_index: u32) -> Self {
        Self {
            oid: Some(oid.to_string()),
            value: Some(value),
            if_index: Some(if_index),
        }
    }
}

/// A single named poll task.
#[derive(Debug, Clone)]
pub struct PollTask {
    /// Task identity; selects the snapshot field the strategy writes
    pub name: &'static str,
    /// Candidate OID prefixes, tried in order; first with matches wins
    pub oids: Vec<&'static str>,
    /// Query mode for every candidate
    pub mode: QueryMode,
    /// Parsing behavior
    pub parser: RecordParser,
}

impl PollTask {
    pub fn new(
        name: &'static str,
        oids: Vec<&'static str>,
        mode: QueryMode,
        parser: RecordParser,
    ) -> Self {
        debug_assert!(!oids.is_empty(), "poll task needs at least one OID");
        Self {
            name,
            oids,
            mode,
            parser,
        }
    }

    /// Runs the task against one target.
    ///
    /// Returns `Ok(Some(records))` when any candidate prefix yielded data,
    /// `Ok(None)` when every candidate came back empty ("no data"), and an
    /// error when the transport reported the target unreachable - which
    /// aborts immediately without trying the remaining candidates.
    pub async fn retrieve(
        &self,
        transport: &dyn SnmpQuery,
        target: &SnmpTarget,
        community: &Community,
    ) -> Result<Option<Vec<ParsedRecord>>> {
        for (idx, prefix) in self.oids.iter().enumerate() {
            debug!(task = self.name, prefix, "running poll task candidate");
            let pairs = transport
                .query(self.mode, target, community, prefix)
                .await?;

            // Keep only pairs under this prefix that actually carry a value.
            let matched: Vec<RawPair> = pairs
                .into_iter()
                .filter(|p| oid_has_prefix(&p.oid, prefix) && !p.value.is_absent())
                .collect();

            if matched.is_empty() {
                if idx < self.oids.len() - 1 {
                    continue;
                }
                warn!(task = self.name, "poll task yielded no varbinds");
                return Ok(None);
            }

            return Ok(Some(self.parse(idx, &matched)));
        }
        Ok(None)
    }

    /// Parses matched pairs into records. `prefix_idx` says which candidate
    /// matched, for parsers whose behavior differs between primary and
    /// fallback identifiers.
    pub fn parse(&self, prefix_idx: usize, pairs: &[RawPair]) -> Vec<ParsedRecord> {
        let records: Vec<ParsedRecord> = match &self.parser {
            RecordParser::DeviceScalar => pairs
                .iter()
                .filter(|p| self.oids.iter().any(|oid| p.oid == *oid))
                .map(|p| ParsedRecord::device(&p.oid, p.value.clone()))
                .collect(),
            RecordParser::ModelDescription => pairs
                .iter()
                .filter_map(|p| {
                    let model = if prefix_idx == 0 {
                        Some(p.value.clone())
                    } else {
                        JUNOS_MODEL_REGEX
                            .captures(&p.value.as_text())
                            .and_then(|c| c.get(1))
                            .map(|m| RawValue::Str(m.as_str().to_string()))
                    };
                    model.map(|v| ParsedRecord::device(&p.oid, v))
                })
                .collect(),
            RecordParser::IndexColumn => pairs
                .iter()
                .filter_map(|p| match p.value {
                    RawValue::Int(n) if n >= 0 => {
                        Some(ParsedRecord::interface(&p.oid, p.value.clone(), n as u32))
                    }
                    _ => None,
                })
                .collect(),
            RecordParser::InterfaceColumn {
                index_pos,
                transform,
            } => pairs
                .iter()
                .filter_map(|p| {
                    let if_index = extract_index(&p.oid, *index_pos)?;
                    let value = match transform {
                        Some(t) => t.apply(&p.value),
                        None => p.value.clone(),
                    };
                    Some(ParsedRecord::interface(&p.oid, value, if_index))
                })
                .collect(),
            RecordParser::EmbeddedIp {
                value_segments,
                index_pos,
            } => pairs
                .iter()
                .filter_map(|p| {
                    let addr = suffix_segments(&p.oid, *value_segments)?;
                    let if_index = extract_index(&p.oid, *index_pos)?;
                    Some(ParsedRecord::interface(
                        &p.oid,
                        RawValue::Str(addr),
                        if_index,
                    ))
                })
                .collect(),
        };

        if records.is_empty() {
            vec![ParsedRecord::placeholder()]
        } else {
            records
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TelemetryError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Scripted transport: maps requested OID -> canned response.
    struct ScriptedTransport {
        responses: Mutex<HashMap<&'static str, Vec<RawPair>>>,
        queried: Mutex<Vec<String>>,
        unreachable: bool,
    }

    impl ScriptedTransport {
        fn new(responses: HashMap<&'static str, Vec<RawPair>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                queried: Mutex::new(Vec::new()),
                unreachable: false,
            }
        }

        fn unreachable() -> Self {
            Self {
                responses: Mutex::new(HashMap::new()),
                queried: Mutex::new(Vec::new()),
                unreachable: true,
            }
        }
    }

    #[async_trait]
    impl SnmpQuery for ScriptedTransport {
        async fn query(
            &self,
            _mode: QueryMode,
            target: &SnmpTarget,
            _community: &Community,
            oid: &str,
        ) -> Result<Vec<RawPair>> {
            self.queried.lock().push(oid.to_string());
            if self.unreachable {
                return Err(TelemetryError::DeviceUnreachable(target.endpoint()));
            }
            Ok(self
                .responses
                .lock()
                .get(oid)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn target() -> SnmpTarget {
        SnmpTarget::new(
            "192.0.2.1".parse().unwrap(),
            161,
            Duration::from_secs(1),
            0,
        )
    }

    fn community() -> Community {
        Community("public".to_string())
    }

    #[tokio::test]
    async fn test_fallback_prefix_wins_when_first_is_empty() {
        let mut responses = HashMap::new();
        responses.insert("1.1.1", Vec::new());
        responses.insert(
            "2.2.2",
            vec![RawPair::new("2.2.2.0", RawValue::Str("fallback".to_string()))],
        );
        let transport = ScriptedTransport::new(responses);

        let task = PollTask::new(
            "Scalar",
            vec!["1.1.1", "2.2.2"],
            QueryMode::Get,
            RecordParser::InterfaceColumn {
                index_pos: -1,
                transform: None,
            },
        );
        let records = task
            .retrieve(&transport, &target(), &community())
            .await
            .unwrap()
            .expect("fallback yields records");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].oid.as_deref(), Some("2.2.2.0"));
        // Both prefixes were attempted, in order.
        assert_eq!(*transport.queried.lock(), vec!["1.1.1", "2.2.2"]);
    }

    #[tokio::test]
    async fn test_no_data_from_any_prefix_yields_none() {
        let transport = ScriptedTransport::new(HashMap::new());
        let task = PollTask::new(
            "Scalar",
            vec!["1.1.1", "2.2.2"],
            QueryMode::Get,
            RecordParser::DeviceScalar,
        );
        let result = task
            .retrieve(&transport, &target(), &community())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_aborts_without_trying_fallbacks() {
        let transport = ScriptedTransport::unreachable();
        let task = PollTask::new(
            "Scalar",
            vec!["1.1.1", "2.2.2"],
            QueryMode::Get,
            RecordParser::DeviceScalar,
        );
        let err = task
            .retrieve(&transport, &target(), &community())
            .await
            .unwrap_err();
        assert!(matches!(err, TelemetryError::DeviceUnreachable(_)));
        assert_eq!(transport.queried.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_absent_values_never_reach_parser() {
        let mut responses = HashMap::new();
        responses.insert(
            "1.1.1",
            vec![
                RawPair::new(
                    "1.1.1.1",
                    RawValue::Str("No Such Instance currently exists".to_string()),
                ),
                RawPair::new("1.1.1.2", RawValue::Str(String::new())),
                RawPair::new("1.1.1.3", RawValue::Str("ge-0/0/0".to_string())),
            ],
        );
        let transport = ScriptedTransport::new(responses);
        let task = PollTask::new(
            "IfName",
            vec!["1.1.1"],
            QueryMode::BulkWalk,
            RecordParser::InterfaceColumn {
                index_pos: -1,
                transform: None,
            },
        );
        let records = task
            .retrieve(&transport, &target(), &community())
            .await
            .unwrap()
            .expect("one real value remains");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].if_index, Some(3));
        assert_eq!(records[0].value, Some(RawValue::Str("ge-0/0/0".to_string())));
    }

    #[tokio::test]
    async fn test_pairs_outside_prefix_are_filtered() {
        let mut responses = HashMap::new();
        responses.insert(
            "1.3.6.1.2.1.2.2.1.7",
            vec![
                RawPair::new("1.3.6.1.2.1.2.2.1.7.1", RawValue::Int(1)),
                // Walk overshoot into the next column.
                RawPair::new("1.3.6.1.2.1.2.2.1.8.1", RawValue::Int(2)),
            ],
        );
        let transport = ScriptedTransport::new(responses);
        let task = PollTask::new(
            "IfAdminStatus",
            vec!["1.3.6.1.2.1.2.2.1.7"],
            QueryMode::BulkWalk,
            RecordParser::InterfaceColumn {
                index_pos: -1,
                transform: Some(ValueTransform::UpDown),
            },
        );
        let records = task
            .retrieve(&transport, &target(), &community())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, Some(RawValue::Str("up".to_string())));
    }

    #[test]
    fn test_up_down_transform() {
        assert_eq!(
            ValueTransform::UpDown.apply(&RawValue::Int(1)),
            RawValue::Str("up".to_string())
        );
        assert_eq!(
            ValueTransform::UpDown.apply(&RawValue::Int(2)),
            RawValue::Str("down".to_string())
        );
        assert_eq!(
            ValueTransform::UpDown.apply(&RawValue::Str("weird".to_string())),
            RawValue::Str("down".to_string())
        );
    }

    #[test]
    fn test_index_column_uses_value_as_key() {
        let task = PollTask::new(
            "IfIndex",
            vec!["1.3.6.1.2.1.2.2.1.1"],
            QueryMode::BulkWalk,
            RecordParser::IndexColumn,
        );
        let records = task.parse(
            0,
            &[RawPair::new("1.3.6.1.2.1.2.2.1.1.528", RawValue::Int(528))],
        );
        assert_eq!(records[0].if_index, Some(528));
        assert_eq!(records[0].value, Some(RawValue::Int(528)));
    }

    #[test]
    fn test_embedded_ip_parser() {
        let task = PollTask::new(
            "LldpRemHostIpAddr",
            vec!["1.0.8802.1.1.2.1.4.2.1.4.0"],
            QueryMode::BulkWalk,
            RecordParser::EmbeddedIp {
                value_segments: 4,
                index_pos: -8,
            },
        );
        let records = task.parse(
            0,
            &[RawPair::new(
                "1.0.8802.1.1.2.1.4.2.1.4.0.3.5.1.4.192.168.0.1",
                RawValue::Int(3),
            )],
        );
        assert_eq!(
            records[0].value,
            Some(RawValue::Str("192.168.0.1".to_string()))
        );
        assert_eq!(records[0].if_index, Some(3));
    }

    #[test]
    fn test_model_description_primary_vs_fallback() {
        let task = PollTask::new(
            "DeviceModel",
            vec!["1.3.6.1.2.1.47.1.1.1.1.13.1", "1.0.8802.1.1.2.1.3.4.0"],
            QueryMode::Get,
            RecordParser::ModelDescription,
        );

        // Primary OID: value is the model verbatim.
        let records = task.parse(
            0,
            &[RawPair::new(
                "1.3.6.1.2.1.47.1.1.1.1.13.1",
                RawValue::Str("EX4300-48T".to_string()),
            )],
        );
        assert_eq!(
            records[0].value,
            Some(RawValue::Str("EX4300-48T".to_string()))
        );

        // Fallback OID: model extracted from the chassis description.
        let records = task.parse(
            1,
            &[RawPair::new(
                "1.0.8802.1.1.2.1.3.4.0",
                RawValue::Str("Juniper Networks, Inc. vmx internet router".to_string()),
            )],
        );
        assert_eq!(records[0].value, Some(RawValue::Str("vmx".to_string())));
    }

    #[test]
    fn test_empty_parse_yields_placeholder() {
        let task = PollTask::new(
            "DeviceModel",
            vec!["1.3.6.1.2.1.47.1.1.1.1.13.1", "1.0.8802.1.1.2.1.3.4.0"],
            QueryMode::Get,
            RecordParser::ModelDescription,
        );
        let records = task.parse(
            1,
            &[RawPair::new(
                "1.0.8802.1.1.2.1.3.4.0",
                RawValue::Str("some other vendor".to_string()),
            )],
        );
        assert_eq!(records.len(), 1);
        assert!(records[0].oid.is_none());
        assert!(records[0].value.is_none());
        assert!(records[0].if_index.is_none());
    }
}
