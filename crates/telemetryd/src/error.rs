//! Error types for the telemetry daemon

use thiserror::Error;

/// Telemetry daemon errors
///
/// The polling path distinguishes caller mistakes (`InvalidInput`), transport
/// failures (`DeviceUnreachable`) and everything else (`UnexpectedPoll`);
/// the trap path only ever surfaces `NoSubscription`, and only from reads.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Malformed address, port or strategy name - caller error, never retried
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transport timeout or retry exhaustion against the target device
    #[error("Device unreachable: {0}")]
    DeviceUnreachable(String),

    /// Any other failure during polling, wrapped with its original cause
    #[error("Unexpected poll error: {0}")]
    UnexpectedPoll(String),

    /// Trap query against a device without an active subscription
    #[error("No trap subscription for device {0}")]
    NoSubscription(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for telemetry daemon operations
pub type Result<T> = std::result::Result<T, TelemetryError>;
