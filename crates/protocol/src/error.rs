//! Error types for the protocol crate

use std::io;

use thiserror::Error;

/// Errors that can occur while framing or parsing entries
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// I/O error on the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed or truncated frame payload
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Frame length prefix exceeds the allowed maximum
    #[error("frame too large ({len} bytes, max {max})")]
    FrameTooLarge { len: u32, max: u32 },
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
