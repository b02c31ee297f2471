//! Capture counters.
//!
//! Tracks how many raw events arrived and how often the consumer polled.
//! Sample accounting lives in the buffer itself, under its lock, so a
//! snapshot is consistent even while capture is running.

use crate::core::BufferCounts;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running counters for one capture session.
#[derive(Debug)]
pub struct CaptureStats {
    /// Raw events delivered to the recorder
    events_received: AtomicU64,
    /// Raw events dropped because recording was disabled
    events_ignored: AtomicU64,
    /// Number of poll calls
    polls: AtomicU64,
    session_start: DateTime<Utc>,
}

impl CaptureStats {
    pub fn new() -> Self {
        Self {
            events_received: AtomicU64::new(0),
            events_ignored: AtomicU64::new(0),
            polls: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    pub fn record_event_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event_ignored(&self) {
        self.events_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_poll(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot, completing it with the buffer's own counts.
    ///
    /// `buffer` should come from a single [`EventBuffer::counts`] call.
    ///
    /// [`EventBuffer::counts`]: crate::core::EventBuffer::counts
    pub fn snapshot(&self, buffer: BufferCounts) -> CaptureStatsSnapshot {
        CaptureStatsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_ignored: self.events_ignored.load(Ordering::Relaxed),
            samples_recorded: buffer.inserted,
            polls: self.polls.load(Ordering::Relaxed),
            samples_delivered: buffer.drained,
            samples_evicted: buffer.evicted,
            samples_cleared: buffer.cleared,
            samples_buffered: buffer.buffered,
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }
}

impl Default for CaptureStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the capture counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureStatsSnapshot {
    pub events_received: u64,
    pub events_ignored: u64,
    pub samples_recorded: u64,
    pub polls: u64,
    pub samples_delivered: u64,
    pub samples_evicted: u64,
    pub samples_cleared: u64,
    pub samples_buffered: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

impl CaptureStatsSnapshot {
    /// Every recorded sample has been delivered, evicted, cleared or is
    /// still buffered.
    pub fn is_balanced(&self) -> bool {
        self.samples_delivered + self.samples_evicted + self.samples_cleared + self.samples_buffered
            == self.samples_recorded
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "Capture Statistics:\n\
             - Raw events received: {}\n\
             - Raw events ignored (recording off): {}\n\
             - Samples recorded: {}\n\
             - Samples delivered: {} (over {} polls)\n\
             - Samples evicted on overflow: {}\n\
             - Samples cleared: {}\n\
             - Samples still buffered: {}\n\
             - Session duration: {} seconds",
            self.events_received,
            self.events_ignored,
            self.samples_recorded,
            self.samples_delivered,
            self.polls,
            self.samples_evicted,
            self.samples_cleared,
            self.samples_buffered,
            self.session_duration_secs
        )
    }
}

/// Thread-safe shared capture counters.
pub type SharedCaptureStats = Arc<CaptureStats>;

/// Create a new shared set of capture counters.
pub fn create_shared_stats() -> SharedCaptureStats {
    Arc::new(CaptureStats::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let stats = CaptureStats::new();

        stats.record_event_received();
        stats.record_event_received();
        stats.record_event_ignored();
        stats.record_poll();

        let snapshot = stats.snapshot(BufferCounts {
            inserted: 3,
            drained: 2,
            evicted: 0,
            cleared: 0,
            buffered: 1,
        });
        assert_eq!(snapshot.events_received, 2);
        assert_eq!(snapshot.events_ignored, 1);
        assert_eq!(snapshot.samples_recorded, 3);
        assert_eq!(snapshot.polls, 1);
        assert_eq!(snapshot.samples_delivered, 2);
        assert!(snapshot.is_balanced());
    }

    #[test]
    fn test_summary_format() {
        let summary = CaptureStats::new()
            .snapshot(BufferCounts::default())
            .summary();

        assert!(summary.contains("Capture Statistics"));
        assert!(summary.contains("Samples evicted on overflow: 0"));
        assert!(summary.contains("Samples delivered"));
    }
}
