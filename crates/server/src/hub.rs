//! The dispatch core - single-writer actor owning all hub state
//!
//! `Hub` is the only code path that mutates the listener list, the
//! drain table, or the history buffer. It processes exactly one event
//! at a time, in arrival order across its two input endpoints:
//!
//! - a control endpoint for registration and removal requests, each
//!   carrying a completion channel so the caller blocks until the
//!   core has processed it (catch-up replay included)
//! - an entry endpoint fed by ingest connections; the bounded channel
//!   is what throttles a fast producer to the core's processing rate
//!
//! Closing the entry endpoint is a quiescent signal: the loop stops
//! polling that arm but keeps serving control requests. Closing the
//! control endpoint (all handles dropped) shuts the hub down, which
//! closes every listener queue.
//!
//! # Broadcast policy
//!
//! Live delivery never blocks the core. Per matching listener:
//! try-send; on a full queue, pop one queued entry (drop-oldest) and
//! try-send once more; still full means the entry is silently dropped
//! for that listener. Consumers get a lossy tail under sustained
//! overload, never a stalled hub.

use std::sync::Arc;
use std::time::Duration;

use crossfire::{AsyncRx, MAsyncTx};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use loghub_protocol::Entry;

use crate::error::{HubError, Result};
use crate::history::{DEFAULT_CAPACITY, History};
use crate::listener::{Drain, Listener};

/// Default shared deadline for catch-up replay
const DEFAULT_CATCHUP_TIMEOUT: Duration = Duration::from_secs(1);

/// Control endpoint capacity
const CONTROL_CAPACITY: usize = 16;

/// Entry endpoint capacity (ingestion backpressure bound)
const DEFAULT_ENTRY_CAPACITY: usize = 64;

/// Hub configuration
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// History ring capacity
    pub history_capacity: usize,

    /// Shared deadline for one listener's catch-up replay
    pub catchup_timeout: Duration,

    /// Capacity of the entry-ingestion channel
    pub entry_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_CAPACITY,
            catchup_timeout: DEFAULT_CATCHUP_TIMEOUT,
            entry_capacity: DEFAULT_ENTRY_CAPACITY,
        }
    }
}

impl HubConfig {
    /// Create config with custom history capacity
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Create config with custom catch-up deadline
    pub fn with_catchup_timeout(mut self, timeout: Duration) -> Self {
        self.catchup_timeout = timeout;
        self
    }
}

/// Control requests processed by the actor loop
enum Control {
    AddListener {
        listener: Listener,
        done: oneshot::Sender<()>,
    },
    AddDrain {
        drain: Drain,
        done: oneshot::Sender<()>,
    },
    RemoveListener {
        id: u64,
        done: oneshot::Sender<()>,
    },
    RemoveDrain {
        id: u64,
        done: oneshot::Sender<()>,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
}

/// Point-in-time hub statistics
#[derive(Debug, Clone, Copy)]
pub struct HubStats {
    /// Currently registered listeners
    pub listeners: usize,
    /// Currently registered drains
    pub drains: usize,
    /// Entries retained in history
    pub history_len: usize,
    /// Total entries ingested
    pub entries_received: u64,
    /// Total entry deliveries onto listener queues
    pub entries_delivered: u64,
}

/// Drain table row: drain ID -> wrapped listener ID
struct DrainEntry {
    id: u64,
    listener_id: u64,
}

/// The dispatch core actor
pub struct Hub {
    state: HubState,
    control_rx: mpsc::Receiver<Control>,
    entry_rx: AsyncRx<Entry>,
}

/// Cloneable endpoint surface for the hub
#[derive(Clone)]
pub struct HubHandle {
    control: mpsc::Sender<Control>,
    entries: MAsyncTx<Entry>,
}

struct HubState {
    config: HubConfig,
    listeners: Vec<Listener>,
    drains: Vec<DrainEntry>,
    history: History,
    received: u64,
    delivered: u64,
}

impl Hub {
    /// Create a hub and its endpoint handle
    pub fn new(config: HubConfig) -> (Self, HubHandle) {
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CAPACITY);
        let (entry_tx, entry_rx) = crossfire::mpsc::bounded_async(config.entry_capacity.max(1));

        let hub = Self {
            state: HubState {
                history: History::with_capacity(config.history_capacity),
                config,
                listeners: Vec::new(),
                drains: Vec::new(),
                received: 0,
                delivered: 0,
            },
            control_rx,
            entry_rx,
        };
        let handle = HubHandle {
            control: control_tx,
            entries: entry_tx,
        };
        (hub, handle)
    }

    /// Run the actor loop until every handle is dropped
    pub async fn run(self) {
        let Hub {
            mut state,
            mut control_rx,
            entry_rx,
        } = self;

        info!(
            history_capacity = state.history.capacity(),
            catchup_timeout_ms = state.config.catchup_timeout.as_millis() as u64,
            "hub starting"
        );

        let mut entries_open = true;
        loop {
            tokio::select! {
                ctrl = control_rx.recv() => match ctrl {
                    Some(ctrl) => state.handle_control(ctrl).await,
                    None => break,
                },
                entry = entry_rx.recv(), if entries_open => match entry {
                    Ok(entry) => state.receive_entry(Arc::new(entry)),
                    Err(_) => {
                        // Quiescent: ingestion is gone, keep serving control.
                        debug!("entry endpoint closed");
                        entries_open = false;
                    }
                },
            }
        }

        info!(
            entries_received = state.received,
            entries_delivered = state.delivered,
            "hub shutting down"
        );
    }

    /// Run the actor loop in a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

impl HubState {
    async fn handle_control(&mut self, ctrl: Control) {
        match ctrl {
            Control::AddListener { listener, done } => {
                self.add_listener(listener).await;
                let _ = done.send(());
            }
            Control::AddDrain { drain, done } => {
                self.add_drain(drain).await;
                let _ = done.send(());
            }
            Control::RemoveListener { id, done } => {
                self.remove_listener(id);
                let _ = done.send(());
            }
            Control::RemoveDrain { id, done } => {
                self.remove_drain(id);
                let _ = done.send(());
            }
            Control::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }

    /// Register a listener and replay history under one shared deadline
    ///
    /// The listener joins the active list first, then receives every
    /// retained entry newer than its cutoff that passes its filter.
    /// All catch-up deliveries race against a single deadline started
    /// here; expiry abandons the rest of the backlog silently, so one
    /// absent reader can never stall the core indefinitely.
    async fn add_listener(&mut self, listener: Listener) {
        debug!(id = listener.id(), since = listener.since(), "listener registered");
        self.listeners.push(listener);

        let Some(listener) = self.listeners.last() else {
            return;
        };
        let deadline = tokio::time::Instant::now() + self.config.catchup_timeout;
        let mut replayed = 0usize;
        for entry in self.history.entries_since(listener.since()) {
            if !listener.filter().matches(&entry) {
                continue;
            }
            tokio::select! {
                sent = listener.send(entry) => {
                    if !sent {
                        break;
                    }
                    replayed += 1;
                }
                _ = tokio::time::sleep_until(deadline) => {
                    debug!(
                        id = listener.id(),
                        replayed,
                        "catch-up deadline reached, skipping remaining backlog"
                    );
                    break;
                }
            }
        }
        trace!(id = listener.id(), replayed, "catch-up complete");
    }

    async fn add_drain(&mut self, drain: Drain) {
        let (id, listener) = drain.into_parts();
        debug!(id, listener_id = listener.id(), "drain registered");
        self.drains.push(DrainEntry {
            id,
            listener_id: listener.id(),
        });
        self.add_listener(listener).await;
    }

    /// Remove a listener by ID; unknown IDs are a no-op
    fn remove_listener(&mut self, id: u64) {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id() != id);
        if self.listeners.len() < before {
            debug!(id, "listener removed");
        }
    }

    /// Remove a drain and its wrapped listener; unknown IDs are a no-op
    fn remove_drain(&mut self, id: u64) {
        let Some(pos) = self.drains.iter().position(|d| d.id == id) else {
            return;
        };
        let drain = self.drains.remove(pos);
        debug!(id, listener_id = drain.listener_id, "drain removed");
        self.remove_listener(drain.listener_id);
    }

    /// Ingest one entry: append to history, fan out to listeners
    fn receive_entry(&mut self, entry: Arc<Entry>) {
        trace!(
            timestamp = entry.timestamp(),
            source = entry.source(),
            "entry received"
        );
        self.received += 1;
        self.history.add(Arc::clone(&entry));

        for listener in &self.listeners {
            if !listener.filter().matches(&entry) {
                continue;
            }
            if listener.try_send(Arc::clone(&entry)) {
                self.delivered += 1;
                continue;
            }
            // Queue full: drop the oldest queued entry, retry once,
            // then give up on this entry for this listener.
            listener.evict_one();
            if listener.try_send(Arc::clone(&entry)) {
                self.delivered += 1;
            }
        }
    }

    fn stats(&self) -> HubStats {
        HubStats {
            listeners: self.listeners.len(),
            drains: self.drains.len(),
            history_len: self.history.len(),
            entries_received: self.received,
            entries_delivered: self.delivered,
        }
    }
}

impl HubHandle {
    /// Register a listener; returns once catch-up replay has finished
    pub async fn add_listener(&self, listener: Listener) -> Result<()> {
        self.request(|done| Control::AddListener { listener, done })
            .await
    }

    /// Register a drain (and its wrapped listener)
    pub async fn add_drain(&self, drain: Drain) -> Result<()> {
        self.request(|done| Control::AddDrain { drain, done }).await
    }

    /// Remove a listener by ID; a no-op for unknown IDs
    pub async fn remove_listener(&self, id: u64) -> Result<()> {
        self.request(|done| Control::RemoveListener { id, done })
            .await
    }

    /// Remove a drain and its wrapped listener; a no-op for unknown IDs
    pub async fn remove_drain(&self, id: u64) -> Result<()> {
        self.request(|done| Control::RemoveDrain { id, done }).await
    }

    /// Forward one entry to the hub
    ///
    /// Blocks while the entry channel is full, which is what paces a
    /// fast producer to the core's processing rate.
    pub async fn send_entry(&self, entry: Entry) -> Result<()> {
        self.entries
            .send(entry)
            .await
            .map_err(|_| HubError::Closed)
    }

    /// Fetch point-in-time statistics from the core
    pub async fn stats(&self) -> Result<HubStats> {
        let (reply, wait) = oneshot::channel();
        self.control
            .send(Control::Stats { reply })
            .await
            .map_err(|_| HubError::Closed)?;
        wait.await.map_err(|_| HubError::Closed)
    }

    async fn request(&self, make: impl FnOnce(oneshot::Sender<()>) -> Control) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.control
            .send(make(done))
            .await
            .map_err(|_| HubError::Closed)?;
        wait.await.map_err(|_| HubError::Closed)
    }
}

#[cfg(test)]
#[path = "hub_test.rs"]
mod tests;
