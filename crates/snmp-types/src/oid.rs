//! Dot-notation OID helpers
//!
//! An OID is handled as a dot-separated string of non-negative integers
//! (e.g. "1.3.6.1.2.1.2.2.1.1.3"). Correlation indices (interface indices)
//! are encoded in the trailing segments; which segment depends on the table
//! being walked, so extraction takes a signed position.

/// Extracts the integer at `position` from a dot-separated OID.
///
/// Negative positions count from the end, Python-style: `-1` is the last
/// segment, `-2` the second-to-last. Returns `None` when the position is out
/// of range or the segment is not a non-negative integer.
///
/// ```
/// use snmp_types::oid::extract_index;
///
/// assert_eq!(extract_index("1.3.6.1.2.1.2.2.1.1.3", -1), Some(3));
/// assert_eq!(extract_index("1.0.8802.1.1.2.1.4.1.1.9.0.5.2", -2), Some(5));
/// assert_eq!(extract_index("1.2.3", -4), None);
/// ```
pub fn extract_index(oid: &str, position: isize) -> Option<u32> {
    let segments: Vec<&str> = oid.split('.').collect();
    let len = segments.len() as isize;
    let idx = if position < 0 { len + position } else { position };
    if idx < 0 || idx >= len {
        return None;
    }
    segments[idx as usize].parse::<u32>().ok()
}

/// Joins the last `n` dot-segments of an OID back into a dot string.
///
/// Used for encodings where a value (e.g. an IPv4 address) is embedded in
/// the identifier itself: "…4.0.3.1.4.10.0.0.1" with `n = 4` yields
/// "10.0.0.1". Returns `None` when the OID has fewer than `n` segments.
pub fn suffix_segments(oid: &str, n: usize) -> Option<String> {
    let segments: Vec<&str> = oid.split('.').collect();
    if segments.len() < n {
        return None;
    }
    Some(segments[segments.len() - n..].join("."))
}

/// Lexical prefix check between an OID and a configured prefix string.
pub fn oid_has_prefix(oid: &str, prefix: &str) -> bool {
    oid.starts_with(prefix)
}
