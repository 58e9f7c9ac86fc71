//! Streaming/export path - live tail into an output sink
//!
//! `HubHandle::stream_to` registers an ephemeral listener with a zero
//! replay cutoff, so the caller sees the entire retained backlog
//! before live entries start. Entries are read through the rate
//! limiter and their payloads written verbatim to the sink. The first
//! write error ends the stream with that error; the listener queue
//! closing (hub shutdown) ends it cleanly.
//!
//! The listener is deregistered on every exit path: the write loop
//! runs in a helper and the removal request is issued unconditionally
//! before the result is returned.

use std::sync::Arc;

use crossfire::MAsyncRx;
use tokio::io::AsyncWrite;
use tracing::debug;

use loghub_protocol::{Entry, ProtocolError, write_payload};

use crate::error::{HubError, Result};
use crate::filter::EntryFilter;
use crate::hub::HubHandle;
use crate::listener::Listener;
use crate::throttle::throttle;

/// Default maximum delivery rate for an export stream
const DEFAULT_MAX_PER_SEC: u32 = 100;

/// Default stream queue capacity
///
/// A one-slot queue gives direct hand-off semantics: the live
/// broadcast drops for us rather than buffering unboundedly, and
/// catch-up replay paces against the throttled reader.
const DEFAULT_QUEUE_CAPACITY: usize = 1;

/// Streaming configuration
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Maximum entries per second written to the sink
    pub max_per_sec: u32,

    /// Listener queue capacity
    pub queue_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_per_sec: DEFAULT_MAX_PER_SEC,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl StreamConfig {
    /// Create config with custom delivery rate
    pub fn with_max_per_sec(mut self, max_per_sec: u32) -> Self {
        self.max_per_sec = max_per_sec;
        self
    }

    /// Create config with custom queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}

impl HubHandle {
    /// Stream the backlog and live feed to a sink until error or shutdown
    pub async fn stream_to<W>(&self, sink: &mut W, filter: EntryFilter) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        self.stream_with(sink, filter, StreamConfig::default()).await
    }

    /// `stream_to` with explicit rate and queue configuration
    pub async fn stream_with<W>(
        &self,
        sink: &mut W,
        filter: EntryFilter,
        config: StreamConfig,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let (listener, rx) = Listener::new(filter, 0, config.queue_capacity);
        let id = listener.id();

        self.add_listener(listener).await?;
        debug!(id, "stream listener registered");

        let result = copy_entries(sink, rx, config.max_per_sec).await;

        // Unconditional deregistration; if the hub is already gone the
        // listener went with it.
        if self.remove_listener(id).await.is_err() {
            debug!(id, "hub closed before stream listener removal");
        }

        result
    }
}

/// Write throttled entries to the sink until error or queue close
async fn copy_entries<W>(sink: &mut W, rx: MAsyncRx<Arc<Entry>>, max_per_sec: u32) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let rx = throttle(rx, max_per_sec);
    loop {
        let entry = match rx.recv().await {
            Ok(entry) => entry,
            // Queue closed: no more entries will ever arrive.
            Err(_) => return Ok(()),
        };
        if let Err(e) = write_payload(sink, entry.data()).await {
            // Sink failures are I/O errors from the caller's view.
            return Err(match e {
                ProtocolError::Io(io) => HubError::Io(io),
                other => HubError::Protocol(other),
            });
        }
    }
}

#[cfg(test)]
#[path = "stream_test.rs"]
mod tests;
