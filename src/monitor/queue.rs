//! Debounced, deduplicating queue of paths pending a realtime scan

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Map size beyond which stale last-seen entries are reclaimed
const EVICTION_THRESHOLD: usize = 1024;
/// Entries idle longer than this are eligible for reclamation
const EVICTION_AGE: Duration = Duration::from_secs(60);

struct QueueInner {
    pending: VecDeque<PathBuf>,
    last_seen: HashMap<PathBuf, Instant>,
}

/// Ordered queue of absolute paths with per-path last-seen bookkeeping.
///
/// A path occurs at most once in the queue; repeated events only refresh its
/// last-seen time, so bursts collapse without delaying the first
/// observation. The internal mutex is held only for constant-time work, with
/// stale-entry reclamation amortized past a size threshold.
pub struct EventQueue {
    inner: Mutex<QueueInner>,
    work_available: Condvar,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                pending: VecDeque::new(),
                last_seen: HashMap::new(),
            }),
            work_available: Condvar::new(),
        }
    }

    /// Record an event for `path` and wake one waiter. The path joins the
    /// queue only if not already pending.
    pub fn enqueue(&self, path: PathBuf) {
        {
            let mut inner = self.inner.lock().unwrap();
            let now = Instant::now();

            if inner.last_seen.len() >= EVICTION_THRESHOLD {
                let pending = inner.pending.clone();
                inner.last_seen.retain(|p, seen| {
                    now.duration_since(*seen) < EVICTION_AGE || pending.contains(p)
                });
            }

            inner.last_seen.insert(path.clone(), now);
            if !inner.pending.contains(&path) {
                inner.pending.push_back(path);
            }
        }
        self.work_available.notify_one();
    }

    /// Dequeue the front path, if any
    pub fn pop(&self) -> Option<PathBuf> {
        self.inner.lock().unwrap().pending.pop_front()
    }

    /// Block until work arrives, `monitoring` clears, or `timeout` elapses,
    /// then dequeue the front path if one is present.
    pub fn wait_and_pop(&self, timeout: Duration, monitoring: &AtomicBool) -> Option<PathBuf> {
        let inner = self.inner.lock().unwrap();
        let (mut inner, _timed_out) = self
            .work_available
            .wait_timeout_while(inner, timeout, |q| {
                q.pending.is_empty() && monitoring.load(Ordering::Relaxed)
            })
            .unwrap();
        inner.pending.pop_front()
    }

    /// Wake every waiter (used on lifecycle stop)
    pub fn notify_all(&self) {
        let _guard = self.inner.lock().unwrap();
        self.work_available.notify_all();
    }

    /// Drop all pending paths and the last-seen map
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.pending.clear();
        inner.last_seen.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub(crate) fn occurrences(&self, path: &std::path::Path) -> usize {
        self.inner
            .lock()
            .unwrap()
            .pending
            .iter()
            .filter(|p| p.as_path() == path)
            .count()
    }

    #[cfg(test)]
    pub(crate) fn tracked_paths(&self) -> usize {
        self.inner.lock().unwrap().last_seen.len()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn repeated_events_keep_one_queue_entry() {
        let queue = EventQueue::new();
        let path = PathBuf::from("/tmp/burst.bin");
        for _ in 0..10 {
            queue.enqueue(path.clone());
        }
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.occurrences(&path), 1);
        assert_eq!(queue.tracked_paths(), 1);
    }

    #[test]
    fn pop_preserves_first_enqueue_order() {
        let queue = EventQueue::new();
        queue.enqueue(PathBuf::from("/a"));
        queue.enqueue(PathBuf::from("/b"));
        // A repeat of /a refreshes bookkeeping but not position.
        queue.enqueue(PathBuf::from("/a"));
        queue.enqueue(PathBuf::from("/c"));

        assert_eq!(queue.pop(), Some(PathBuf::from("/a")));
        assert_eq!(queue.pop(), Some(PathBuf::from("/b")));
        assert_eq!(queue.pop(), Some(PathBuf::from("/c")));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn wait_and_pop_times_out_empty() {
        let queue = EventQueue::new();
        let monitoring = AtomicBool::new(true);
        let popped = queue.wait_and_pop(Duration::from_millis(20), &monitoring);
        assert_eq!(popped, None);
    }

    #[test]
    fn wait_and_pop_returns_pending_immediately() {
        let queue = EventQueue::new();
        let monitoring = AtomicBool::new(true);
        queue.enqueue(PathBuf::from("/ready"));
        let popped = queue.wait_and_pop(Duration::from_secs(5), &monitoring);
        assert_eq!(popped, Some(PathBuf::from("/ready")));
    }

    #[test]
    fn cleared_monitoring_flag_unblocks_waiters() {
        let queue = EventQueue::new();
        let monitoring = AtomicBool::new(false);
        let start = Instant::now();
        let popped = queue.wait_and_pop(Duration::from_secs(5), &monitoring);
        assert_eq!(popped, None);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn clear_empties_queue_and_bookkeeping() {
        let queue = EventQueue::new();
        queue.enqueue(PathBuf::from("/x"));
        queue.enqueue(PathBuf::from("/y"));
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.tracked_paths(), 0);
    }

    #[test]
    fn eviction_keeps_queued_paths_tracked() {
        let queue = EventQueue::new();
        for i in 0..(EVICTION_THRESHOLD + 10) {
            queue.enqueue(PathBuf::from(format!("/spray/{i}")));
        }
        // All entries are fresh, so nothing is reclaimed and every queued
        // path still has a bookkeeping entry.
        assert_eq!(queue.len(), EVICTION_THRESHOLD + 10);
        assert_eq!(queue.tracked_paths(), EVICTION_THRESHOLD + 10);
    }
}
