//! Error types for the hub

use std::io;

use thiserror::Error;

use loghub_protocol::ProtocolError;

/// Errors surfaced by the hub's public API
#[derive(Error, Debug)]
pub enum HubError {
    /// I/O error (socket operations, sink writes)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Wire protocol error on an ingest connection
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The hub actor has shut down; no further requests can be served
    #[error("hub shut down")]
    Closed,
}

/// Result type for hub operations
pub type Result<T> = std::result::Result<T, HubError>;
