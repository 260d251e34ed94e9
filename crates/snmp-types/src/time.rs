//! Epoch timestamp helper

use chrono::Utc;

/// Returns the current time as integer epoch seconds, e.g. 1644590688.
pub fn epoch_secs() -> i64 {
    Utc::now().timestamp()
}
