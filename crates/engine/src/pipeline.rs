//! Indexing pipeline: one worker thread per kind.
//!
//! Each worker drains its kind's [`WorkQueue`], derives terms from the object
//! key and files postings in the shared [`InvertedIndex`]. Workers for
//! different kinds share nothing but the index.

use crate::queue::WorkQueue;
use kubesearch_core::{ChangeEvent, Error, Posting, Result};
use kubesearch_search::{tokenize_identifier, InvertedIndex};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Split an object key into `(namespace, name)`.
///
/// `name` gives `("", "name")` and `ns/name` gives `("ns", "name")`. Any other
/// shape is malformed and is indexed literally as `("", key)`.
pub fn split_key(key: &str) -> (&str, &str) {
    let mut parts = key.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), None, _) => ("", name),
        (Some(namespace), Some(name), None) => (namespace, name),
        _ => {
            warn!(key, "malformed object key, indexing it literally");
            ("", key)
        }
    }
}

/// Index the namespace and name of `key`. Returns the number of new
/// (term, posting) pairs.
pub fn index_object(index: &InvertedIndex, kind: &str, key: &str) -> usize {
    let (namespace, name) = split_key(key);
    let posting = Posting::new(kind, key);

    let mut inserted = 0;
    if !namespace.is_empty() {
        inserted += index.put(&tokenize_identifier(namespace), &posting);
    }
    inserted += index.put(&tokenize_identifier(name), &posting);
    inserted
}

/// Apply one change event to the index.
pub fn apply_event(index: &InvertedIndex, kind: &str, event: &ChangeEvent) {
    match event {
        ChangeEvent::Upsert(key) => {
            let inserted = index_object(index, kind, key);
            debug!(kind, key = key.as_str(), inserted, "indexed object");
        }
        ChangeEvent::Delete(key) => {
            let removed = index.remove(kind, key);
            debug!(kind, key = key.as_str(), removed, "removed object");
        }
    }
}

fn index_objects(queue: &WorkQueue, index: &InvertedIndex) {
    let kind = queue.kind();
    info!(kind, "indexer started");

    while let Some(lease) = queue.pop() {
        apply_event(index, kind, lease.event());
    }

    info!(kind, "shutting down {} queue", kind);
}

// ============================================================================
// Pipeline
// ============================================================================

/// Per-kind queues waiting to be started.
pub struct Pipeline {
    index: Arc<InvertedIndex>,
    queues: Vec<Arc<WorkQueue>>,
}

impl Pipeline {
    /// Create a pipeline writing to `index`
    pub fn new(index: Arc<InvertedIndex>) -> Self {
        Pipeline {
            index,
            queues: Vec::new(),
        }
    }

    /// Add a kind and return the queue its change feed should deliver to.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateKind` if the kind is already registered.
    pub fn register(&mut self, kind: &str) -> Result<Arc<WorkQueue>> {
        if self.queues.iter().any(|q| q.kind() == kind) {
            return Err(Error::DuplicateKind(kind.to_string()));
        }
        let queue = Arc::new(WorkQueue::new(kind));
        self.queues.push(Arc::clone(&queue));
        Ok(queue)
    }

    /// Registered kinds, in registration order
    pub fn kinds(&self) -> Vec<&str> {
        self.queues.iter().map(|q| q.kind()).collect()
    }

    /// Spawn one worker thread per registered kind.
    ///
    /// Workers are named `kubesearch-<kind>`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if a thread cannot be spawned; workers started so
    /// far are cancelled and joined.
    pub fn start(self) -> Result<PipelineHandle> {
        let handle = PipelineHandle {
            queues: self.queues.clone(),
            workers: Mutex::new(Vec::with_capacity(self.queues.len())),
        };

        for queue in &self.queues {
            let index = Arc::clone(&self.index);
            let worker_queue = Arc::clone(queue);
            let spawned = std::thread::Builder::new()
                .name(format!("kubesearch-{}", queue.kind()))
                .spawn(move || index_objects(&worker_queue, &index));

            match spawned {
                Ok(worker) => handle.workers.lock().push(worker),
                Err(e) => {
                    handle.shutdown();
                    return Err(Error::Io(e));
                }
            }
        }

        Ok(handle)
    }
}

// ============================================================================
// PipelineHandle
// ============================================================================

/// Control handle for running indexing workers.
///
/// Dropping the handle cancels and joins the workers.
pub struct PipelineHandle {
    queues: Vec<Arc<WorkQueue>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl PipelineHandle {
    /// Queue for `kind`, if registered
    pub fn queue(&self, kind: &str) -> Option<&Arc<WorkQueue>> {
        self.queues.iter().find(|q| q.kind() == kind)
    }

    /// Stop all workers after the event each one is processing.
    pub fn cancel(&self) {
        for queue in &self.queues {
            queue.abort();
        }
    }

    /// Wait for all workers to exit.
    ///
    /// Workers exit when cancelled or when their feed closes the queue.
    pub fn join(&self) {
        let mut workers = self.workers.lock();
        for worker in workers.drain(..) {
            if worker.join().is_err() {
                warn!("indexing worker panicked");
            }
        }
    }

    /// Cancel and join.
    pub fn shutdown(&self) {
        self.cancel();
        self.join();
    }

    /// Block until every queue is empty with nothing in flight.
    pub fn drain(&self) {
        for queue in &self.queues {
            queue.drain();
        }
    }

    /// Like [`drain`](Self::drain) with an overall timeout. Returns true if
    /// every queue became idle.
    pub fn drain_timeout(&self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        self.queues.iter().all(|queue| {
            let left = deadline.saturating_duration_since(std::time::Instant::now());
            queue.drain_timeout(left)
        })
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for PipelineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineHandle")
            .field("queues", &self.queues)
            .finish_non_exhaustive()
    }
}
