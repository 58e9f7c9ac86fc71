//! Ring buffer of recently received entries
//!
//! `History` stores the last N entries in a fixed-size ring buffer so
//! a newly registered listener can replay recent activity before its
//! live feed begins. Once full, each append silently overwrites the
//! oldest retained entry; the buffer never grows and never blocks.
//!
//! The buffer is owned exclusively by the hub actor, so no locking is
//! needed here.

use std::sync::Arc;

use loghub_protocol::Entry;

/// Default history capacity
pub const DEFAULT_CAPACITY: usize = 1000;

/// Fixed-capacity circular store of entries
#[derive(Debug)]
pub struct History {
    /// Ring storage
    slots: Vec<Option<Arc<Entry>>>,
    /// Next write position
    write_pos: usize,
    /// Number of valid entries currently held
    len: usize,
    /// Fixed capacity
    capacity: usize,
}

impl History {
    /// Create a history buffer with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![None; capacity],
            write_pos: 0,
            len: 0,
            capacity,
        }
    }

    /// Append an entry, evicting the oldest once full
    ///
    /// Always succeeds; eviction is unconditional and silent.
    pub fn add(&mut self, entry: Arc<Entry>) {
        self.slots[self.write_pos] = Some(entry);
        self.write_pos = (self.write_pos + 1) % self.capacity;
        if self.len < self.capacity {
            self.len += 1;
        }
    }

    /// Retained entries with timestamp strictly greater than `since`,
    /// oldest first
    ///
    /// Lazy and one-shot: computed over the live buffer at call time.
    /// `since == 0` yields the entire retained backlog.
    pub fn entries_since(&self, since: u64) -> impl Iterator<Item = Arc<Entry>> + '_ {
        let oldest = (self.write_pos + self.capacity - self.len) % self.capacity;
        (0..self.len).filter_map(move |i| {
            let slot = &self.slots[(oldest + i) % self.capacity];
            slot.as_ref()
                .filter(|entry| entry.timestamp() > since)
                .map(Arc::clone)
        })
    }

    /// Number of valid entries currently held
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the buffer holds no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fixed capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
