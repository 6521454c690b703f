use crate::metrics::{INBOX_DEPTH, INBOX_DROPPED_TOTAL};
use crate::model::Reading;
use prometheus::Gauge;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

pub const DEFAULT_CAPACITY: usize = 1024;

/// Readings waiting between the feed listener and the render loop.
///
/// Cloning yields another handle to the same queue. When full, the oldest
/// reading is evicted to make room; only the newest one is ever displayed.
#[derive(Debug, Clone)]
pub struct Inbox {
    queue: Arc<Mutex<VecDeque<Reading>>>,
    capacity: usize,
    depth: Gauge,
}

impl Inbox {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_depth_gauge(capacity, INBOX_DEPTH.clone())
    }

    /// Like [`Inbox::with_capacity`], reporting queue depth to `depth`.
    pub fn with_depth_gauge(capacity: usize, depth: Gauge) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(64)))),
            capacity,
            depth,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queues a reading. Never blocks on the consumer and never fails.
    pub fn push(&self, reading: Reading) {
        let mut queue = self.lock();
        if queue.len() >= self.capacity {
            queue.pop_front();
            INBOX_DROPPED_TOTAL.inc();
            warn!(
                "Inbox full ({} readings), dropped oldest reading",
                self.capacity
            );
        }
        queue.push_back(reading);
        self.depth.set(queue.len() as f64);
    }

    /// Removes and returns everything queued, oldest first.
    pub fn drain_all(&self) -> Vec<Reading> {
        let mut queue = self.lock();
        let drained = std::mem::take(&mut *queue);
        self.depth.set(0.0);
        drained.into()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave the deque half-updated,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Reading>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reading(label: &str) -> Reading {
        let mut r = Reading::sentinel(Utc::now());
        r.label = label.to_string();
        r
    }

    #[test]
    fn test_drain_empty_returns_nothing() {
        let inbox = Inbox::new();
        assert!(inbox.drain_all().is_empty());
        assert!(inbox.drain_all().is_empty());
    }

    #[test]
    fn test_drain_preserves_arrival_order() {
        let inbox = Inbox::new();
        for label in ["A", "B", "C"] {
            inbox.push(reading(label));
        }

        let labels: Vec<String> = inbox.drain_all().into_iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
        assert!(inbox.is_empty());
    }

    #[test]
    fn test_full_inbox_drops_oldest() {
        let inbox = Inbox::with_capacity(2);
        inbox.push(reading("A"));
        inbox.push(reading("B"));
        inbox.push(reading("C"));

        let labels: Vec<String> = inbox.drain_all().into_iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["B", "C"]);
    }

    #[test]
    fn test_zero_capacity_still_holds_newest() {
        let inbox = Inbox::with_capacity(0);
        assert_eq!(inbox.capacity(), 1);
        inbox.push(reading("A"));
        inbox.push(reading("B"));

        let drained = inbox.drain_all();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].label, "B");
    }

    #[test]
    fn test_depth_gauge_matches_queue_after_concurrent_drains() {
        let depth = Gauge::new("test_inbox_depth", "depth").unwrap();
        let inbox = Inbox::with_depth_gauge(10_000, depth.clone());

        let producer = {
            let inbox = inbox.clone();
            std::thread::spawn(move || {
                for i in 0..5_000 {
                    inbox.push(reading(&i.to_string()));
                }
            })
        };
        for _ in 0..2_000 {
            inbox.drain_all();
        }
        producer.join().unwrap();

        assert_eq!(depth.get(), inbox.len() as f64);
        inbox.drain_all();
        assert_eq!(depth.get(), 0.0);
    }

    #[test]
    fn test_clones_share_queue() {
        let producer = Inbox::new();
        let consumer = producer.clone();
        producer.push(reading("A"));
        assert_eq!(consumer.len(), 1);
        assert_eq!(consumer.drain_all()[0].label, "A");
        assert!(producer.is_empty());
    }
}
