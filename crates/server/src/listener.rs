//! Listener and drain subscriber model
//!
//! A `Listener` is one registered sink: a bounded delivery queue, an
//! `EntryFilter`, and a replay cutoff. Once registered it is owned
//! exclusively by the hub actor; the subscriber task only reads from
//! the receiver handed back by `Listener::new`.
//!
//! The delivery queue is a crossfire mpmc channel so the hub can keep
//! a receiver clone of its own: the drop-oldest backpressure step
//! needs to pop one queued entry from the producer side when the
//! queue is full. Dropping the listener closes the queue; the
//! subscriber observes end-of-stream after draining what is left.
//!
//! A `Drain` wraps exactly one listener so a caller can remove a
//! subscriber registered elsewhere (e.g. by a background task) via a
//! handle of its own. Removing a drain removes its wrapped listener.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossfire::{MAsyncRx, MAsyncTx};

use loghub_protocol::Entry;

use crate::filter::EntryFilter;

/// Counter for unique listener and drain IDs
static ID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A registered live subscriber
#[derive(Debug)]
pub struct Listener {
    /// Unique identifier, used for removal
    id: u64,
    /// Replay cutoff: deliver history strictly after this timestamp
    since: u64,
    /// Filter evaluated per entry
    filter: EntryFilter,
    /// Delivery queue, hub side
    tx: MAsyncTx<Arc<Entry>>,
    /// Hub-side receiver clone for the drop-oldest step
    evict_rx: MAsyncRx<Arc<Entry>>,
}

impl Listener {
    /// Create a listener and its subscriber-side receiver
    ///
    /// `since == 0` requests the entire retained backlog. Capacity is
    /// clamped to at least 1 (bounded channels have no zero-capacity
    /// rendezvous mode).
    pub fn new(
        filter: EntryFilter,
        since: u64,
        capacity: usize,
    ) -> (Self, MAsyncRx<Arc<Entry>>) {
        let (tx, rx) = crossfire::mpmc::bounded_async(capacity.max(1));
        let listener = Self {
            id: next_id(),
            since,
            filter,
            tx,
            evict_rx: rx.clone(),
        };
        (listener, rx)
    }

    /// Unique listener ID
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Replay cutoff timestamp
    #[inline]
    pub fn since(&self) -> u64 {
        self.since
    }

    /// The listener's filter
    #[inline]
    pub fn filter(&self) -> &EntryFilter {
        &self.filter
    }

    /// Non-blocking enqueue; false when the queue is full or closed
    #[inline]
    pub(crate) fn try_send(&self, entry: Arc<Entry>) -> bool {
        self.tx.try_send(entry).is_ok()
    }

    /// Opportunistically drop the oldest queued entry
    ///
    /// A no-op when the queue is momentarily empty or contended.
    #[inline]
    pub(crate) fn evict_one(&self) {
        let _ = self.evict_rx.try_recv();
    }

    /// Blocking enqueue (catch-up path); false when the queue closed
    pub(crate) async fn send(&self, entry: Arc<Entry>) -> bool {
        self.tx.send(entry).await.is_ok()
    }
}

/// Removable handle wrapping one listener
#[derive(Debug)]
pub struct Drain {
    /// Unique drain ID, independent of the listener's
    id: u64,
    /// The wrapped listener
    listener: Listener,
}

impl Drain {
    /// Wrap a listener in a drain handle
    pub fn new(listener: Listener) -> Self {
        Self {
            id: next_id(),
            listener,
        }
    }

    /// Unique drain ID
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// ID of the wrapped listener
    #[inline]
    pub fn listener_id(&self) -> u64 {
        self.listener.id()
    }

    /// Split into the drain ID and the wrapped listener
    pub(crate) fn into_parts(self) -> (u64, Listener) {
        (self.id, self.listener)
    }
}
