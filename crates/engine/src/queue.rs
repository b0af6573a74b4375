//! Per-kind work queue feeding an indexing worker.
//!
//! Events are queued per object key. A key that is already waiting is not
//! queued twice: the newer event replaces the older one in place, so a burst
//! of updates to one object is indexed once and a later delete supersedes an
//! earlier pending update.
//!
//! The queue has two ways to stop:
//! - [`close`](WorkQueue::close): no new events; the worker drains what is
//!   left and then exits (feed shutdown).
//! - [`abort`](WorkQueue::abort): the worker exits after the event in hand,
//!   remaining events are discarded (cancellation).

use kubesearch_core::{ChangeEvent, Error, EventSink, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::ops::Deref;
use std::time::{Duration, Instant};

#[derive(Default)]
struct QueueState {
    /// Keys in arrival order
    order: VecDeque<String>,
    /// Latest pending event per key
    pending: HashMap<String, ChangeEvent>,
    /// Events handed to the worker and not yet finished
    processing: usize,
    closed: bool,
    aborted: bool,
}

impl QueueState {
    fn idle(&self) -> bool {
        self.aborted || (self.order.is_empty() && self.processing == 0)
    }
}

/// Blocking FIFO of change events for one kind.
pub struct WorkQueue {
    kind: String,
    state: Mutex<QueueState>,
    work_ready: Condvar,
    drain_cond: Condvar,
}

impl WorkQueue {
    /// Create an empty queue for `kind`
    pub fn new(kind: impl Into<String>) -> Self {
        WorkQueue {
            kind: kind.into(),
            state: Mutex::new(QueueState::default()),
            work_ready: Condvar::new(),
            drain_cond: Condvar::new(),
        }
    }

    /// Kind this queue carries events for
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Queue an event.
    ///
    /// Returns `Ok(false)` if an event for the same key was already waiting
    /// and has been replaced.
    ///
    /// # Errors
    ///
    /// Returns `Error::FeedClosed` after `close` or `abort`.
    pub fn push(&self, event: ChangeEvent) -> Result<bool> {
        let queued = {
            let mut state = self.state.lock();
            if state.closed || state.aborted {
                return Err(Error::FeedClosed(self.kind.clone()));
            }
            let key = event.key().to_string();
            match state.pending.insert(key.clone(), event) {
                Some(_) => false,
                None => {
                    state.order.push_back(key);
                    true
                }
            }
        };

        if queued {
            self.work_ready.notify_one();
        }
        Ok(queued)
    }

    /// Block until an event is available.
    ///
    /// Returns `None` once the queue is aborted, or closed and empty. The
    /// returned lease marks the event finished when dropped.
    pub fn pop(&self) -> Option<Lease<'_>> {
        let mut state = self.state.lock();
        loop {
            if state.aborted {
                return None;
            }
            if let Some(key) = state.order.pop_front() {
                if let Some(event) = state.pending.remove(&key) {
                    state.processing += 1;
                    return Some(Lease { queue: self, event });
                }
                continue;
            }
            if state.closed {
                return None;
            }
            self.work_ready.wait(&mut state);
        }
    }

    /// Stop accepting events; pending events are still handed out.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.work_ready.notify_all();
    }

    /// Stop handing out events and discard the pending ones.
    pub fn abort(&self) {
        let mut state = self.state.lock();
        state.aborted = true;
        state.order.clear();
        state.pending.clear();
        self.work_ready.notify_all();
        self.drain_cond.notify_all();
    }

    /// Whether `close` or `abort` has been called
    pub fn is_shut_down(&self) -> bool {
        let state = self.state.lock();
        state.closed || state.aborted
    }

    /// Number of events waiting
    pub fn len(&self) -> usize {
        self.state.lock().order.len()
    }

    /// Whether no events are waiting
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until all queued and in-flight events have been processed.
    ///
    /// Also returns once the queue is aborted.
    pub fn drain(&self) {
        let mut state = self.state.lock();
        while !state.idle() {
            self.drain_cond.wait(&mut state);
        }
    }

    /// Like [`drain`](Self::drain), giving up after `timeout`.
    ///
    /// Returns true if the queue became idle.
    pub fn drain_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while !state.idle() {
            if self.drain_cond.wait_until(&mut state, deadline).timed_out() {
                return state.idle();
            }
        }
        true
    }

    fn finish(&self) {
        let mut state = self.state.lock();
        state.processing -= 1;
        if state.idle() {
            self.drain_cond.notify_all();
        }
    }
}

impl EventSink for WorkQueue {
    fn send(&self, event: ChangeEvent) -> Result<()> {
        self.push(event).map(|_| ())
    }

    fn close(&self) {
        WorkQueue::close(self);
    }
}

impl std::fmt::Debug for WorkQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue")
            .field("kind", &self.kind)
            .field("len", &self.len())
            .finish()
    }
}

/// An event handed out by [`WorkQueue::pop`].
///
/// Dropping the lease marks the event processed, even if the worker panics
/// while holding it, so `drain` never waits on a lost event.
pub struct Lease<'a> {
    queue: &'a WorkQueue,
    event: ChangeEvent,
}

impl Lease<'_> {
    /// The leased event
    pub fn event(&self) -> &ChangeEvent {
        &self.event
    }
}

impl Deref for Lease<'_> {
    type Target = ChangeEvent;

    fn deref(&self) -> &ChangeEvent {
        &self.event
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.queue.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn upsert(key: &str) -> ChangeEvent {
        ChangeEvent::Upsert(key.to_string())
    }

    #[test]
    fn test_fifo_order() {
        let queue = WorkQueue::new("Pod");
        queue.push(upsert("a")).unwrap();
        queue.push(upsert("b")).unwrap();

        assert_eq!(*queue.pop().unwrap(), upsert("a"));
        assert_eq!(*queue.pop().unwrap(), upsert("b"));
    }

    #[test]
    fn test_pending_key_is_coalesced() {
        let queue = WorkQueue::new("Pod");
        assert!(queue.push(upsert("a")).unwrap());
        assert!(queue.push(upsert("b")).unwrap());
        assert!(!queue.push(ChangeEvent::Delete("a".to_string())).unwrap());
        assert_eq!(queue.len(), 2);

        // Latest event wins, original position kept
        assert_eq!(*queue.pop().unwrap(), ChangeEvent::Delete("a".to_string()));
        assert_eq!(*queue.pop().unwrap(), upsert("b"));
    }

    #[test]
    fn test_key_can_be_requeued_once_popped() {
        let queue = WorkQueue::new("Pod");
        queue.push(upsert("a")).unwrap();
        let lease = queue.pop().unwrap();
        assert!(queue.push(upsert("a")).unwrap());
        drop(lease);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_close_drains_then_stops() {
        let queue = WorkQueue::new("Pod");
        queue.push(upsert("a")).unwrap();
        queue.close();

        assert!(matches!(queue.push(upsert("b")), Err(Error::FeedClosed(_))));
        assert_eq!(*queue.pop().unwrap(), upsert("a"));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_abort_discards_pending() {
        let queue = WorkQueue::new("Pod");
        queue.push(upsert("a")).unwrap();
        queue.abort();

        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
        assert!(queue.is_shut_down());
    }

    #[test]
    fn test_pop_blocks_until_push() {
        let queue = Arc::new(WorkQueue::new("Pod"));
        let q = Arc::clone(&queue);
        let handle = thread::spawn(move || q.pop().map(|lease| lease.event().clone()));

        thread::sleep(Duration::from_millis(20));
        queue.push(upsert("late")).unwrap();

        assert_eq!(handle.join().unwrap(), Some(upsert("late")));
    }

    #[test]
    fn test_close_wakes_blocked_pop() {
        let queue = Arc::new(WorkQueue::new("Pod"));
        let q = Arc::clone(&queue);
        let handle = thread::spawn(move || q.pop().is_none());

        thread::sleep(Duration::from_millis(20));
        queue.close();

        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_drain_waits_for_in_flight() {
        let queue = Arc::new(WorkQueue::new("Pod"));
        queue.push(upsert("a")).unwrap();
        let lease = queue.pop().unwrap();

        assert!(!queue.drain_timeout(Duration::from_millis(10)));
        drop(lease);
        assert!(queue.drain_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_drain_with_worker() {
        let queue = Arc::new(WorkQueue::new("Pod"));
        for i in 0..100 {
            queue.push(upsert(&format!("pod-{}", i))).unwrap();
        }

        let q = Arc::clone(&queue);
        let worker = thread::spawn(move || {
            let mut seen = 0;
            while let Some(_lease) = q.pop() {
                seen += 1;
            }
            seen
        });

        queue.drain();
        assert!(queue.is_empty());
        queue.close();
        assert_eq!(worker.join().unwrap(), 100);
    }

    #[test]
    fn test_event_sink_impl() {
        let queue = WorkQueue::new("Pod");
        let sink: &dyn EventSink = &queue;
        sink.send(upsert("a")).unwrap();
        sink.close();
        assert!(sink.send(upsert("b")).is_err());
        assert_eq!(queue.len(), 1);
    }
}
