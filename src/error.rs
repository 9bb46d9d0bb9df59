//! Error types for EmberKV
//!
//! Provides a unified error type for all operations.

use std::io::ErrorKind;

use thiserror::Error;

/// Result type alias using EmberError
pub type Result<T> = std::result::Result<T, EmberError>;

/// Unified error type for EmberKV operations
#[derive(Debug, Error)]
pub enum EmberError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Decode Errors
    // -------------------------------------------------------------------------
    /// Peer closed the stream before a new top-level frame began.
    #[error("end of stream")]
    EndOfStream,

    /// Stream ended in the middle of a frame.
    #[error("truncated frame: {0}")]
    Truncated(String),

    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("failed to decode element {index} in array: {source}")]
    InElement {
        index: usize,
        #[source]
        source: Box<EmberError>,
    },

    #[error("array nesting exceeds maximum depth of {0}")]
    TooDeep(usize),

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EmberError {
    /// True when the peer closed cleanly between frames
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, EmberError::EndOfStream)
    }

    /// True when the underlying socket was torn down by the peer
    pub fn is_disconnect(&self) -> bool {
        match self {
            EmberError::Io(e) => matches!(
                e.kind(),
                ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }

    /// Strip `InElement` wrappers down to the error that actually occurred
    pub fn root_cause(&self) -> &EmberError {
        match self {
            EmberError::InElement { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
