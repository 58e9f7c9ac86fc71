//! Metadata filter for listener subscriptions
//!
//! `EntryFilter` performs O(1) filtering on entry metadata. It is
//! stateless from the dispatch core's perspective and evaluated once
//! per (entry, listener) pair, on both the catch-up and live paths.
//!
//! # Filter Logic
//!
//! - The source filter is optional (None = match all)
//! - Multiple sources are OR'd (match any)

use std::collections::HashSet;

use loghub_protocol::Entry;

/// Metadata-only predicate for entry matching
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Source names to match (None = match all)
    sources: Option<HashSet<String>>,
}

impl EntryFilter {
    /// Create an empty filter (matches everything)
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the filter to entries from the given sources
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    /// Check if the filter is empty (matches everything)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sources.is_none()
    }

    /// Check if an entry matches this filter
    #[inline]
    pub fn matches(&self, entry: &Entry) -> bool {
        if let Some(ref sources) = self.sources
            && !sources.contains(entry.source())
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
