//! Shared error type across floodmeter crates.

use std::io;

use thiserror::Error;

/// Stable error classification used in log fields and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Peak record could not be read or written.
    StoreIo,
    /// Peak record exists but does not parse.
    StoreCorrupt,
    /// Invalid configuration value.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Listener could not be bound.
    Bind,
    /// Connections did not drain within the grace period.
    DrainTimeout,
    /// Malformed wire frame.
    Decode,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// String representation used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::StoreIo => "STORE_IO",
            ErrorKind::StoreCorrupt => "STORE_CORRUPT",
            ErrorKind::BadConfig => "BAD_CONFIG",
            ErrorKind::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorKind::Bind => "BIND",
            ErrorKind::DrainTimeout => "DRAIN_TIMEOUT",
            ErrorKind::Decode => "DECODE",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, FloodError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum FloodError {
    #[error("stats {op} failed (path={path}): {source}")]
    StoreIo {
        op: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("stats record unparsable (path={path}): {source}")]
    StoreCorrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("bind failed (addr={addr}): {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("connections did not drain within {grace_ms}ms")]
    DrainTimeout { grace_ms: u64 },
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl FloodError {
    /// Map an error to its stable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FloodError::StoreIo { .. } => ErrorKind::StoreIo,
            FloodError::StoreCorrupt { .. } => ErrorKind::StoreCorrupt,
            FloodError::BadConfig(_) => ErrorKind::BadConfig,
            FloodError::UnsupportedVersion => ErrorKind::UnsupportedVersion,
            FloodError::Bind { .. } => ErrorKind::Bind,
            FloodError::DrainTimeout { .. } => ErrorKind::DrainTimeout,
            FloodError::Decode(_) => ErrorKind::Decode,
            FloodError::Internal(_) => ErrorKind::Internal,
        }
    }
}
