//! Error types for afconverge
//!
//! Sensor-level faults never surface here: a missing AF state or a stalled
//! focus motor is reported as a terminal failure by the state machine.
//! These errors cover the collaborator side (session setup, sources, config).

use thiserror::Error;

/// Main error type for convergence sessions
#[derive(Error, Debug)]
pub enum ConvergeError {
    /// A session was requested without any focus region
    #[error("No focus regions supplied; a focus session requires at least one")]
    NoFocusRegions,

    /// Focus points list was empty
    #[error("No focus points supplied")]
    NoFocusPoints,

    /// Device does not support AF regions
    #[error("Device supports {max_regions} AF regions; focus regions unavailable")]
    AfRegionsUnsupported { max_regions: i32 },

    /// Observation source ended before the session reached a terminal outcome
    #[error("Observation source closed after {observations} observations without a terminal outcome")]
    SourceClosed { observations: usize },

    /// Session wall-clock timeout
    #[error("Session timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Trace file errors
    #[error("Trace error: {0}")]
    TraceError(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for convergence operations
pub type Result<T> = std::result::Result<T, ConvergeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConvergeError::SourceClosed { observations: 7 };
        assert!(err.to_string().contains('7'));

        let err = ConvergeError::Timeout { duration_ms: 1500 };
        assert!(err.to_string().contains("1500ms"));
    }

    #[test]
    fn test_unsupported_regions_error() {
        let err = ConvergeError::AfRegionsUnsupported { max_regions: 0 };
        assert!(err.to_string().contains("0 AF regions"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ConvergeError = io.into();
        assert!(matches!(err, ConvergeError::IoError(_)));
    }
}
