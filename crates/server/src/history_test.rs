//! Tests for the history ring buffer

use super::*;
use bytes::Bytes;

fn make_entry(timestamp: u64, label: &str) -> Arc<Entry> {
    Arc::new(Entry::with_timestamp(
        timestamp,
        "test",
        Bytes::copy_from_slice(label.as_bytes()),
    ))
}

fn labels(history: &History, since: u64) -> Vec<String> {
    history
        .entries_since(since)
        .map(|e| String::from_utf8_lossy(e.data()).into_owned())
        .collect()
}

#[test]
fn test_new_buffer_is_empty() {
    let history = History::with_capacity(10);
    assert!(history.is_empty());
    assert_eq!(history.len(), 0);
    assert_eq!(history.entries_since(0).count(), 0);
}

#[test]
fn test_add_increments_len_up_to_capacity() {
    let mut history = History::with_capacity(3);

    history.add(make_entry(1, "a"));
    assert_eq!(history.len(), 1);

    history.add(make_entry(2, "b"));
    history.add(make_entry(3, "c"));
    assert_eq!(history.len(), 3);

    history.add(make_entry(4, "d"));
    assert_eq!(history.len(), 3);
}

#[test]
fn test_wrap_evicts_oldest() {
    // Capacity 3: add A@1, B@2, C@3, D@4 -> retained [B, C, D]
    let mut history = History::with_capacity(3);
    history.add(make_entry(1, "A"));
    history.add(make_entry(2, "B"));
    history.add(make_entry(3, "C"));
    history.add(make_entry(4, "D"));

    assert_eq!(labels(&history, 0), ["B", "C", "D"]);
}

#[test]
fn test_entries_since_is_strictly_greater() {
    let mut history = History::with_capacity(3);
    history.add(make_entry(1, "A"));
    history.add(make_entry(2, "B"));
    history.add(make_entry(3, "C"));
    history.add(make_entry(4, "D"));

    // Cutoff t2 against [B, C, D] -> exactly [C, D]
    assert_eq!(labels(&history, 2), ["C", "D"]);
    // Cutoff at the newest timestamp yields nothing
    assert_eq!(labels(&history, 4), Vec::<String>::new());
}

#[test]
fn test_evicted_entries_never_yielded() {
    let mut history = History::with_capacity(2);
    history.add(make_entry(10, "old"));
    history.add(make_entry(20, "mid"));
    history.add(make_entry(30, "new"));

    // "old" satisfies the time predicate but has been evicted
    assert_eq!(labels(&history, 5), ["mid", "new"]);
}

#[test]
fn test_long_sequence_keeps_most_recent_capacity() {
    let mut history = History::with_capacity(5);
    for i in 1..=100u64 {
        history.add(make_entry(i, &i.to_string()));
    }

    let got: Vec<u64> = history.entries_since(0).map(|e| e.timestamp()).collect();
    assert_eq!(got, [96, 97, 98, 99, 100]);
}

#[test]
fn test_zero_capacity_clamped_to_one() {
    let mut history = History::with_capacity(0);
    assert_eq!(history.capacity(), 1);
    history.add(make_entry(1, "a"));
    history.add(make_entry(2, "b"));
    assert_eq!(labels(&history, 0), ["b"]);
}
