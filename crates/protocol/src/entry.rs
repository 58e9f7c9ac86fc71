//! The log entry record
//!
//! An `Entry` is immutable once created. The hub shares entries
//! between the history buffer and subscriber queues as `Arc<Entry>`,
//! so nothing here needs interior mutability.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

/// One log record: a timestamp, the name of the emitting process, and
/// an opaque payload written verbatim to output sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Epoch milliseconds. Zero is the "replay everything" cutoff.
    timestamp: u64,
    /// Name of the emitting process (the filterable field).
    source: String,
    /// Opaque payload bytes.
    data: Bytes,
}

impl Entry {
    /// Create an entry stamped with the current wall-clock time
    pub fn new(source: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::with_timestamp(now_millis(), source, data)
    }

    /// Create an entry with an explicit timestamp (decode path, tests)
    pub fn with_timestamp(timestamp: u64, source: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            timestamp,
            source: source.into(),
            data: data.into(),
        }
    }

    /// Timestamp in epoch milliseconds
    #[inline]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Name of the emitting process
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Payload bytes
    #[inline]
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// Current wall-clock time in epoch milliseconds
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
