//! Bounded, thread-safe FIFO buffer
//!
//! Used for rolling windows (performance samples, user feedback) that are
//! appended from many concurrent callers. Appends are serialized behind a
//! single lock; once the buffer is full the oldest entry is evicted.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// Append-only ring buffer with FIFO eviction
pub struct BoundedBuffer<T> {
    capacity: usize,
    inner: Mutex<VecDeque<T>>,
}

impl<T: Clone> BoundedBuffer<T> {
    /// Create a buffer holding at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    /// Append an entry, returning the evicted one if the buffer was full
    pub fn push(&self, value: T) -> Option<T> {
        let mut inner = self.inner.lock();
        let evicted = if inner.len() >= self.capacity {
            inner.pop_front()
        } else {
            None
        };
        inner.push_back(value);
        evicted
    }

    /// Clone the most recent `n` entries, oldest first
    pub fn recent(&self, n: usize) -> Vec<T> {
        let inner = self.inner.lock();
        let skip = inner.len().saturating_sub(n);
        inner.iter().skip(skip).cloned().collect()
    }

    /// Clone every entry, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}
