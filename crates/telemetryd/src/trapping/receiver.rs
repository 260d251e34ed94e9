//! UDP trap listener
//!
//! Binds a UDP socket, decodes inbound SNMP notifications and feeds them
//! through the parser registry into the store. The loop runs in a
//! background task; nothing that arrives on the wire can make it exit.

use crate::error::{Result, TelemetryError};
use crate::transport::decode_varbind;
use crate::trapping::parsers::{build_event, TrapFields, TrapParserRegistry};
use crate::trapping::store::TrapStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Known notification varbind identifiers, symbolic name by prefix.
/// Resolution takes the longest matching prefix; unknown identifiers keep
/// their numeric form.
const SYMBOL_TABLE: &[(&str, &str)] = &[
    ("1.3.6.1.2.1.1.3", "sysUpTime"),
    ("1.3.6.1.2.1.2.2.1.1", "ifIndex"),
    ("1.3.6.1.2.1.2.2.1.7", "ifAdminStatus"),
    ("1.3.6.1.2.1.2.2.1.8", "ifOperStatus"),
    ("1.3.6.1.2.1.31.1.1.1.1", "ifName"),
    ("1.3.6.1.6.3.1.1.4.1", "snmpTrapOID"),
    ("1.3.6.1.6.3.1.1.5.1", "coldStart"),
    ("1.3.6.1.6.3.1.1.5.2", "warmStart"),
    ("1.3.6.1.6.3.1.1.5.3", "linkDown"),
    ("1.3.6.1.6.3.1.1.5.4", "linkUp"),
];

/// Resolves a numeric identifier to its symbolic name, or returns it
/// unchanged when unknown.
pub fn resolve_symbol(oid: &str) -> &str {
    SYMBOL_TABLE
        .iter()
        .filter(|(prefix, _)| snmp_types::oid_has_prefix(oid, prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, name)| *name)
        .unwrap_or(oid)
}

/// One inbound notification after symbol resolution.
#[derive(Debug, Clone)]
pub struct TrapNotification {
    /// Sender address, textual
    pub source: String,
    /// Varbind values keyed by resolved name
    pub fields: TrapFields,
}

impl TrapNotification {
    /// Builds the field map from decoded (identifier, value) pairs. Both
    /// keys and identifier-typed values resolve through the symbol table,
    /// so `snmpTrapOID` carries "linkDown" rather than its numeric form.
    pub fn from_pairs(source: String, pairs: &[crate::transport::RawPair]) -> Self {
        let mut fields = TrapFields::new();
        for pair in pairs {
            let key = resolve_symbol(&pair.oid).to_string();
            let text = pair.value.as_text();
            let value = if looks_like_oid(&text) {
                resolve_symbol(&text).to_string()
            } else {
                text
            };
            fields.insert(key, value);
        }
        Self { source, fields }
    }
}

fn looks_like_oid(s: &str) -> bool {
    s.contains('.') && s.split('.').all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

/// Everything notification handling needs, owned by the listener.
pub struct TrapListenerContext {
    pub registry: TrapParserRegistry,
    pub store: Arc<TrapStore>,
    pub community: String,
}

/// Routes one notification: parser lookup, event construction, storage.
/// Unrecognized or malformed notifications are logged and dropped.
pub fn handle_notification(ctx: &TrapListenerContext, notification: &TrapNotification) {
    let Some(trap_name) = notification.fields.get("snmpTrapOID") else {
        debug!(source = %notification.source, "notification without trap identity");
        return;
    };
    let Some(parser) = ctx.registry.lookup(trap_name) else {
        debug!(source = %notification.source, trap_name, "no parser for trap");
        return;
    };
    let Some(event) = build_event(parser.as_ref(), &notification.source, &notification.fields)
    else {
        debug!(source = %notification.source, trap_name, "trap not reportable");
        return;
    };
    let stored = ctx.store.store_trap(event);
    debug!(source = %notification.source, trap_name, stored, "trap handled");
}

/// Running trap listener.
pub struct TrapListenerHandle {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl TrapListenerHandle {
    /// Address the listener actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops the background loop.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

/// Binds the trap socket and spawns the receive loop.
///
/// Datagrams that fail to decode, or carry the wrong community, are logged
/// and dropped. The caller is never blocked.
pub async fn start_trap_listener(
    bind_addr: &str,
    port: u16,
    community: String,
    store: Arc<TrapStore>,
) -> Result<TrapListenerHandle> {
    let socket = UdpSocket::bind((bind_addr, port)).await.map_err(|e| {
        TelemetryError::Config(format!(
            "failed to bind trap listener on {}:{}: {}",
            bind_addr, port, e
        ))
    })?;
    let local_addr = socket.local_addr()?;
    info!(addr = %local_addr, "trap listener started");

    let ctx = TrapListenerContext {
        registry: TrapParserRegistry::with_defaults(),
        store,
        community,
    };

    let task = tokio::spawn(async move {
        let mut buf = vec![0u8; 65535];
        loop {
            let (len, peer) = match socket.recv_from(&mut buf).await {
                Ok(recv) => recv,
                Err(e) => {
                    warn!(error = %e, "trap socket receive failed");
                    continue;
                }
            };
            if let Some(notification) = decode_datagram(&buf[..len], peer, &ctx.community) {
                handle_notification(&ctx, &notification);
            }
        }
    });

    Ok(TrapListenerHandle { local_addr, task })
}

/// Decodes one datagram into a notification, or `None` when it is not a
/// well-formed v2c notification for our community.
fn decode_datagram(data: &[u8], peer: SocketAddr, community: &str) -> Option<TrapNotification> {
    let pdu = match snmp2::Pdu::from_bytes(data) {
        Ok(pdu) => pdu,
        Err(e) => {
            warn!(peer = %peer, error = ?e, "dropping undecodable datagram");
            return None;
        }
    };
    if pdu.community != community.as_bytes() {
        warn!(peer = %peer, "dropping notification with wrong community");
        return None;
    }

    let mut pairs = Vec::new();
    for (vb_oid, vb_value) in pdu.varbinds {
        if let Some(pair) = decode_varbind(&vb_oid, &vb_value) {
            pairs.push(pair);
        }
    }
    Some(TrapNotification::from_pairs(peer.ip().to_string(), pairs.as_slice()))
}
