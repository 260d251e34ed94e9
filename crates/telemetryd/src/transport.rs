//! SNMP transport seam
//!
//! The polling engine never speaks wire SNMP itself; it issues queries
//! through the narrow [`SnmpQuery`] trait and receives decoded
//! (identifier, value) pairs. [`Snmp2Transport`] is the production
//! implementation over `snmp2` v2c sessions. Tests substitute scripted
//! implementations of the trait.

use crate::error::{Result, TelemetryError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use snmp2::{AsyncSession, Oid, Value};
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

/// Query mode: single-value fetch or prefix-bounded enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// SNMP GET for one scalar instance
    Get,
    /// SNMP GETBULK walk bounded by the requested prefix
    BulkWalk,
}

/// A decoded value from a varbind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Integral value (INTEGER, Counter, Gauge, TimeTicks)
    Int(i64),
    /// Textual value (OCTET STRING, OID, IP address)
    Str(String),
}

impl RawValue {
    /// Value as text, regardless of wire type.
    pub fn as_text(&self) -> String {
        match self {
            RawValue::Int(n) => n.to_string(),
            RawValue::Str(s) => s.clone(),
        }
    }

    /// True when the value textually signals an absent instance
    /// ("no such instance", "no such object", any case) or is empty.
    pub fn is_absent(&self) -> bool {
        match self {
            RawValue::Int(_) => false,
            RawValue::Str(s) => s.is_empty() || s.to_lowercase().starts_with("no such"),
        }
    }
}

/// One (identifier, value) result from a device query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPair {
    /// Dot-notation OID
    pub oid: String,
    /// Decoded value
    pub value: RawValue,
}

impl RawPair {
    pub fn new(oid: impl Into<String>, value: RawValue) -> Self {
        Self {
            oid: oid.into(),
            value,
        }
    }
}

/// Poll target: validated address plus fixed transport bounds.
#[derive(Debug, Clone)]
pub struct SnmpTarget {
    /// Target IP address
    pub addr: IpAddr,
    /// Target UDP port
    pub port: u16,
    /// Per-request timeout
    pub timeout: Duration,
    /// Per-request retry count
    pub retries: u32,
}

impl SnmpTarget {
    pub fn new(addr: IpAddr, port: u16, timeout: Duration, retries: u32) -> Self {
        Self {
            addr,
            port,
            timeout,
            retries,
        }
    }

    /// "ip:port" form used by the session layer.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

/// SNMP v2c community credentials.
#[derive(Debug, Clone)]
pub struct Community(pub String);

impl Community {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// The narrow command interface the polling engine consumes.
///
/// A successful query yields the ordered decoded pairs the device returned
/// (possibly empty). An unreachable target yields
/// [`TelemetryError::DeviceUnreachable`].
#[async_trait]
pub trait SnmpQuery: Send + Sync {
    async fn query(
        &self,
        mode: QueryMode,
        target: &SnmpTarget,
        community: &Community,
        oid: &str,
    ) -> Result<Vec<RawPair>>;
}

/// Production transport over `snmp2` async v2c sessions.
///
/// Each query opens a session, runs the GET or bulk walk with the target's
/// fixed timeout and retry count, and decodes varbinds into [`RawPair`]s.
/// Per-value decode problems are logged and skipped; only transport-level
/// failures surface as errors.
#[derive(Debug)]
pub struct Snmp2Transport {
    /// GETBULK max-repetitions per round trip
    max_repetitions: u32,
}

impl Default for Snmp2Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl Snmp2Transport {
    pub fn new() -> Self {
        Self {
            max_repetitions: 25,
        }
    }

    async fn run_once(
        &self,
        mode: QueryMode,
        target: &SnmpTarget,
        community: &Community,
        oid: &str,
    ) -> Result<Vec<RawPair>> {
        let root = parse_oid(oid)?;
        let mut session = tokio::time::timeout(
            target.timeout,
            AsyncSession::new_v2c(&target.endpoint(), community.as_bytes(), 0),
        )
        .await
        .map_err(|_| unreachable_err(target, "session setup timed out"))?
        .map_err(|e| unreachable_err(target, &format!("session setup failed: {:?}", e)))?;

        match mode {
            QueryMode::Get => {
                let pdu = tokio::time::timeout(target.timeout, session.get(&root))
                    .await
                    .map_err(|_| unreachable_err(target, "GET timed out"))?
                    .map_err(|e| unreachable_err(target, &format!("GET failed: {:?}", e)))?;

                let mut pairs = Vec::new();
                for (vb_oid, vb_value) in pdu.varbinds {
                    if let Some(pair) = decode_varbind(&vb_oid, &vb_value) {
                        pairs.push(pair);
                    }
                }
                Ok(pairs)
            }
            QueryMode::BulkWalk => {
                let mut pairs = Vec::new();
                let mut current = root.to_owned();
                loop {
                    let pdu = tokio::time::timeout(
                        target.timeout,
                        session.getbulk(&[&current], 0, self.max_repetitions),
                    )
                    .await
                    .map_err(|_| unreachable_err(target, "GETBULK timed out"))?
                    .map_err(|e| unreachable_err(target, &format!("GETBULK failed: {:?}", e)))?;

                    let mut advanced = false;
                    for (vb_oid, vb_value) in pdu.varbinds {
                        if !vb_oid.starts_with(&root) {
                            // Walk ran past the requested subtree.
                            return Ok(pairs);
                        }
                        if matches!(vb_value, Value::EndOfMibView) {
                            return Ok(pairs);
                        }
                        if let Some(pair) = decode_varbind(&vb_oid, &vb_value) {
                            pairs.push(pair);
                        }
                        current = vb_oid.to_owned();
                        advanced = true;
                    }
                    if !advanced {
                        return Ok(pairs);
                    }
                }
            }
        }
    }
}

#[async_trait]
impl SnmpQuery for Snmp2Transport {
    async fn query(
        &self,
        mode: QueryMode,
        target: &SnmpTarget,
        community: &Community,
        oid: &str,
    ) -> Result<Vec<RawPair>> {
        let attempts = target.retries + 1;
        let mut last_err = None;
        for attempt in 0..attempts {
            match self.run_once(mode, target, community, oid).await {
                Ok(pairs) => {
                    debug!(
                        target = %target.endpoint(),
                        oid,
                        count = pairs.len(),
                        "SNMP query completed"
                    );
                    return Ok(pairs);
                }
                Err(e) => {
                    warn!(
                        target = %target.endpoint(),
                        oid,
                        attempt = attempt + 1,
                        error = %e,
                        "SNMP query attempt failed"
                    );
                    last_err = Some(e);
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| unreachable_err(target, "retries exhausted with no attempts")))
    }
}

fn unreachable_err(target: &SnmpTarget, detail: &str) -> TelemetryError {
    TelemetryError::DeviceUnreachable(format!("{}: {}", target.endpoint(), detail))
}

/// Parses a dot-notation OID string into an `snmp2` OID.
///
/// A malformed identifier means the command cannot be constructed at all,
/// which is an unexpected-error signal rather than an unreachable target.
pub fn parse_oid(s: &str) -> Result<Oid<'static>> {
    let parts: std::result::Result<Vec<u64>, _> = s
        .trim()
        .split('.')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u64>())
        .collect();
    let parts =
        parts.map_err(|_| TelemetryError::UnexpectedPoll(format!("invalid OID '{}'", s)))?;
    Oid::from(&parts)
        .map_err(|e| TelemetryError::UnexpectedPoll(format!("invalid OID '{}': {:?}", s, e)))
}

/// Decodes one varbind into an owned pair, or `None` for values that carry
/// no data (Null, NoSuchObject, NoSuchInstance, EndOfMibView).
pub(crate) fn decode_varbind(oid: &Oid<'_>, value: &Value<'_>) -> Option<RawPair> {
    let decoded = match value {
        Value::Integer(n) => RawValue::Int(*n),
        Value::Counter32(n) | Value::Unsigned32(n) | Value::Timeticks(n) => {
            RawValue::Int(i64::from(*n))
        }
        // 64-bit counters can exceed i64; saturate rather than wrap negative.
        Value::Counter64(n) => RawValue::Int(i64::try_from(*n).unwrap_or(i64::MAX)),
        Value::OctetString(bytes) => RawValue::Str(String::from_utf8_lossy(bytes).into_owned()),
        Value::ObjectIdentifier(o) => RawValue::Str(o.to_string()),
        Value::IpAddress(octets) => RawValue::Str(format!(
            "{}.{}.{}.{}",
            octets[0], octets[1], octets[2], octets[3]
        )),
        Value::Boolean(b) => RawValue::Int(i64::from(*b)),
        Value::Null | Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => {
            return None;
        }
        other => RawValue::Str(format!("{:?}", other)),
    };
    Some(RawPair::new(oid.to_string(), decoded))
}
