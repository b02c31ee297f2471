//! Bounded, thread-safe sample buffer.
//!
//! The buffer keeps the most recent window of pointer activity. Inserting into
//! a full buffer evicts the oldest sample instead of rejecting the new one, and
//! `drain` hands the whole batch to the caller in a single critical section.
//!
//! One mutex guards every operation. There may be any number of producer and
//! consumer threads; the lock only serializes them.

use crate::collector::types::Sample;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default maximum number of buffered samples.
pub const DEFAULT_CAPACITY: usize = 2048;

/// Sample accounting taken under the buffer lock.
///
/// `inserted == drained + evicted + cleared + buffered` holds for every value
/// returned by [`EventBuffer::counts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferCounts {
    pub inserted: u64,
    pub drained: u64,
    pub evicted: u64,
    pub cleared: u64,
    pub buffered: u64,
}

#[derive(Debug)]
struct Inner {
    samples: VecDeque<Sample>,
    inserted: u64,
    drained: u64,
    evicted: u64,
    cleared: u64,
}

/// Fixed-capacity FIFO of [`Sample`]s with drop-oldest eviction.
#[derive(Debug)]
pub struct EventBuffer {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl EventBuffer {
    /// Create a buffer holding at most `capacity` samples.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(Inner {
                samples: VecDeque::with_capacity(capacity),
                inserted: 0,
                drained: 0,
                evicted: 0,
                cleared: 0,
            }),
        }
    }

    /// Append a sample, evicting the oldest one first if the buffer is full.
    pub fn insert(&self, sample: Sample) {
        let mut inner = self.lock();
        self.push_bounded(&mut inner, sample);
    }

    /// Append several samples under a single lock acquisition.
    ///
    /// A concurrent `drain` sees either none or all of them, although later
    /// inserts may still evict the oldest of them. Returns the number of
    /// samples evicted to make room.
    pub fn insert_batch<I>(&self, batch: I) -> usize
    where
        I: IntoIterator<Item = Sample>,
    {
        let mut inner = self.lock();
        let mut evicted = 0;
        for sample in batch {
            if self.push_bounded(&mut inner, sample) {
                evicted += 1;
            }
        }
        evicted
    }

    /// Take every buffered sample in insertion order, leaving the buffer empty.
    pub fn drain(&self) -> Vec<Sample> {
        let mut inner = self.lock();
        inner.drained += inner.samples.len() as u64;
        inner.samples.drain(..).collect()
    }

    /// Discard every buffered sample.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.cleared += inner.samples.len() as u64;
        inner.samples.clear();
    }

    /// Number of samples currently buffered.
    pub fn len(&self) -> usize {
        self.lock().samples.len()
    }

    /// Check if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.lock().samples.is_empty()
    }

    /// Maximum number of samples retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total samples evicted by overflow.
    pub fn evicted(&self) -> u64 {
        self.lock().evicted
    }

    /// Total samples discarded by [`clear`](Self::clear).
    pub fn cleared(&self) -> u64 {
        self.lock().cleared
    }

    /// Every counter, read in one critical section.
    pub fn counts(&self) -> BufferCounts {
        let inner = self.lock();
        BufferCounts {
            inserted: inner.inserted,
            drained: inner.drained,
            evicted: inner.evicted,
            cleared: inner.cleared,
            buffered: inner.samples.len() as u64,
        }
    }

    // Samples are plain data, so a panic on another thread cannot leave the
    // deque half-updated; recover the guard rather than propagate poisoning.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push_bounded(&self, inner: &mut Inner, sample: Sample) -> bool {
        let evicted = inner.samples.len() >= self.capacity;
        if evicted {
            inner.samples.pop_front();
            inner.evicted += 1;
        }
        inner.samples.push_back(sample);
        inner.inserted += 1;
        evicted
    }
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::{MotionAction, ToolType};

    fn tagged(tag: i64) -> Sample {
        Sample {
            timestamp_ms: tag,
            action: MotionAction::Move,
            action_index: 0,
            is_triggering_pointer: true,
            pointer_index: 0,
            pointer_id: 0,
            tool_type: ToolType::Finger,
            x: 0.0,
            y: 0.0,
            pressure: 1.0,
            size: 0.0,
            touch_major: 0.0,
            touch_minor: 0.0,
            tool_major: 0.0,
            tool_minor: 0.0,
            orientation: 0.0,
            tilt: 0.0,
            distance: 0.0,
            button_state: 0,
            meta_state: 0,
            edge_flags: 0,
        }
    }

    fn tags(samples: &[Sample]) -> Vec<i64> {
        samples.iter().map(|s| s.timestamp_ms).collect()
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let buffer = EventBuffer::new(8);
        for tag in 0..50 {
            buffer.insert(tagged(tag));
            assert!(buffer.len() <= 8);
            if tag >= 7 {
                assert_eq!(buffer.len(), 8);
            }
        }
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let buffer = EventBuffer::new(4);
        for tag in 1..=5 {
            buffer.insert(tagged(tag));
        }

        assert_eq!(tags(&buffer.drain()), vec![2, 3, 4, 5]);
        assert_eq!(buffer.evicted(), 1);
    }

    #[test]
    fn test_default_capacity_overflow_by_one() {
        let buffer = EventBuffer::default();
        let total = DEFAULT_CAPACITY as i64 + 1;
        for tag in 0..total {
            buffer.insert(tagged(tag));
        }

        let drained = buffer.drain();
        assert_eq!(drained.len(), DEFAULT_CAPACITY);
        assert_eq!(drained.first().map(|s| s.timestamp_ms), Some(1));
        assert_eq!(drained.last().map(|s| s.timestamp_ms), Some(total - 1));
    }

    #[test]
    fn test_drain_preserves_order_and_empties() {
        let buffer = EventBuffer::new(16);
        for tag in 1..=10 {
            buffer.insert(tagged(tag));
        }

        assert_eq!(tags(&buffer.drain()), (1..=10).collect::<Vec<_>>());
        assert!(buffer.is_empty());
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn test_clear_discards_and_counts() {
        let buffer = EventBuffer::new(16);
        for tag in 0..5 {
            buffer.insert(tagged(tag));
        }
        buffer.clear();

        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.cleared(), 5);
        assert!(buffer.drain().is_empty());

        // Clearing an empty buffer is a no-op.
        buffer.clear();
        assert_eq!(buffer.cleared(), 5);
    }

    #[test]
    fn test_insert_batch_reports_evictions() {
        let buffer = EventBuffer::new(3);
        buffer.insert(tagged(0));

        let evicted = buffer.insert_batch((1..=4).map(tagged));
        assert_eq!(evicted, 2);
        assert_eq!(tags(&buffer.drain()), vec![2, 3, 4]);
    }

    #[test]
    fn test_counts_account_for_every_sample() {
        let buffer = EventBuffer::new(4);
        buffer.insert_batch((0..6).map(tagged));
        buffer.drain();
        buffer.insert_batch((6..9).map(tagged));
        buffer.clear();
        buffer.insert(tagged(9));

        let counts = buffer.counts();
        assert_eq!(
            counts,
            BufferCounts {
                inserted: 10,
                drained: 4,
                evicted: 2,
                cleared: 3,
                buffered: 1,
            }
        );
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let buffer = EventBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);

        buffer.insert(tagged(1));
        buffer.insert(tagged(2));
        assert_eq!(tags(&buffer.drain()), vec![2]);
    }
}
