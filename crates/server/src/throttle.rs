//! Rate-limiting channel transform
//!
//! `throttle` forwards items from an input queue to a fresh output
//! queue, preserving order and pacing delivery to at most
//! `max_per_sec` items per second. The output closes once the input
//! is exhausted. Used by the streaming path to bound how fast a live
//! tail writes to its sink.

use std::time::Duration;

use crossfire::MAsyncRx;
use tokio::time::MissedTickBehavior;

/// Output queue capacity; small so pacing propagates upstream
const OUTPUT_CAPACITY: usize = 1;

/// Forward `input` to a new queue at a bounded rate
pub fn throttle<T: Send + Unpin + 'static>(input: MAsyncRx<T>, max_per_sec: u32) -> MAsyncRx<T> {
    let (tx, output) = crossfire::mpmc::bounded_async(OUTPUT_CAPACITY);
    let period = Duration::from_secs(1) / max_per_sec.max(1);

    tokio::spawn(async move {
        let mut pace = tokio::time::interval(period);
        pace.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while let Ok(item) = input.recv().await {
            pace.tick().await;
            if tx.send(item).await.is_err() {
                break;
            }
        }
        // tx drops here, closing the output
    });

    output
}

#[cfg(test)]
#[path = "throttle_test.rs"]
mod tests;
