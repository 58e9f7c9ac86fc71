//! Loghub Protocol - Entry data model and wire codec
//!
//! This crate defines the `Entry` log record shared by producers and
//! the hub, plus the length-prefixed framing used on logger
//! connections:
//!
//! - a handshake token frame identifying the connection's purpose
//! - a stream of framed entries (timestamp, source, payload)
//!
//! # Wire Format
//!
//! All frames are length-prefixed:
//! ```text
//! ┌──────────────┬─────────────────────────────────────┐
//! │ 4 bytes      │ N bytes                             │
//! │ length (BE)  │ payload                             │
//! └──────────────┴─────────────────────────────────────┘
//! ```
//!
//! The token frame payload is a UTF-8 string. The entry frame payload
//! is `[8 bytes timestamp][4 bytes source len][source][4 bytes data
//! len][data]`, all integers big-endian.

pub mod codec;
mod entry;
mod error;

pub use codec::{MAX_FRAME_SIZE, read_entry, read_token, write_entry, write_payload, write_token};
pub use entry::Entry;
pub use error::{ProtocolError, Result};
