//! Loghub Server - centralized in-memory log aggregation hub
//!
//! Producers connect over TCP and stream framed entries; consumers
//! register filtered listeners and receive a bounded replay of recent
//! history followed by a best-effort live feed. All mutable state
//! (listener list, drain table, history buffer) is owned by a single
//! actor task and reached only through message-passing endpoints, so
//! the hub has no locks.
//!
//! # Architecture
//!
//! ```text
//! logger conns ──→ IngestServer ──→ Hub actor ──→ History (ring)
//!                  (per-conn task)      │
//!                                  ┌────┴────┐
//!                                  ▼         ▼
//!                            Listener Qs  Listener Qs  ◄── filters
//!                                  │
//!                                  ▼
//!                              throttle ──→ output sink (stream_to)
//! ```
//!
//! Delivery to live listeners is lossy under load: a full queue drops
//! its oldest buffered entry to make room for the newest, and the
//! dispatch core never blocks on a slow consumer.

mod error;
mod filter;
mod history;
mod hub;
mod ingest;
mod listener;
mod stream;
mod throttle;

pub use error::{HubError, Result};
pub use filter::EntryFilter;
pub use history::History;
pub use hub::{Hub, HubConfig, HubHandle, HubStats};
pub use ingest::{HANDSHAKE_LOGGER, IngestConfig, IngestServer};
pub use listener::{Drain, Listener};
pub use stream::StreamConfig;
pub use throttle::throttle;

pub use loghub_protocol::Entry;
