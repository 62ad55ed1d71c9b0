use std::io;
use thiserror::Error;

/// Error type for the scan core
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Topology discovery failed: {0}")]
    Topology(String),

    #[error("Collection failed: {0}")]
    Collection(String),

    /// The monotonic clock did not move forward between two cycles.
    #[error("monotonic clock did not advance (previous {previous} ms, current {current} ms)")]
    ClockNotAdvancing { previous: u64, current: u64 },

    #[error("machine halted after a clock invariant violation")]
    Halted,

    #[error("{0}")]
    Other(String),
}

/// Result type alias for the scan core
pub type Result<T> = std::result::Result<T, ScanError>;

impl ScanError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        ScanError::Config(msg.into())
    }

    /// Create a topology error
    pub fn topology<S: Into<String>>(msg: S) -> Self {
        ScanError::Topology(msg.into())
    }

    /// Create a collection error
    pub fn collection<S: Into<String>>(msg: S) -> Self {
        ScanError::Collection(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ScanError::Other(msg.into())
    }

    /// True for errors after which the machine refuses to scan again.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::ClockNotAdvancing { .. } | ScanError::Halted)
    }
}
