//! In-memory object store and change feeds.
//!
//! `MemoryCluster` plays the part of a cluster's object cache: objects are
//! applied and deleted through it, and every [`MemoryFeed`] started for the
//! object's kind is notified. A feed replays the objects already present when
//! it starts, the way an informer lists before it watches.

use kubesearch_core::{ChangeEvent, ChangeFeed, EventSink, Object, ObjectStore, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

type Subscribers = HashMap<String, Vec<(u64, Arc<dyn EventSink>)>>;

/// Thread-safe in-memory object store with change notification.
#[derive(Default)]
pub struct MemoryCluster {
    /// Kind -> key -> object
    objects: RwLock<HashMap<String, BTreeMap<String, Object>>>,
    /// Kind -> started feeds, always locked before `objects`
    subscribers: RwLock<Subscribers>,
    next_subscription: AtomicU64,
}

impl MemoryCluster {
    /// Create an empty cluster
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an object and notify feeds for its kind.
    ///
    /// The object map stays locked until the event is queued, so feeds see
    /// changes to one key in the order the store applied them.
    pub fn apply(&self, object: Object) {
        let kind = object.kind.clone();
        let key = object.key();
        let subscribers = self.subscribers.read();
        let mut objects = self.objects.write();
        objects
            .entry(kind.clone())
            .or_default()
            .insert(key.clone(), object);
        notify(&subscribers, &kind, ChangeEvent::Upsert(key));
    }

    /// Remove an object and notify feeds for its kind.
    ///
    /// Returns the removed object, if it existed.
    pub fn delete(&self, kind: &str, key: &str) -> Option<Object> {
        let subscribers = self.subscribers.read();
        let mut objects = self.objects.write();
        let removed = objects.get_mut(kind).and_then(|objects| objects.remove(key));
        if removed.is_some() {
            notify(&subscribers, kind, ChangeEvent::Delete(key.to_string()));
        }
        removed
    }

    /// All objects of `kind`, ordered by key
    pub fn list(&self, kind: &str) -> Vec<Object> {
        self.objects
            .read()
            .get(kind)
            .map(|objects| objects.values().cloned().collect())
            .unwrap_or_default()
    }

    /// A change feed for `kind` backed by this cluster
    pub fn feed(self: &Arc<Self>, kind: impl Into<String>) -> MemoryFeed {
        MemoryFeed {
            cluster: Arc::clone(self),
            kind: kind.into(),
            subscription: None,
        }
    }

    fn subscribe(&self, kind: &str, sink: Arc<dyn EventSink>) -> Result<u64> {
        let mut subscribers = self.subscribers.write();

        // Replay under the subscriber lock: an apply racing with us either
        // lands in the replay or is notified to the new sink afterwards.
        for object in self.list(kind) {
            sink.send(ChangeEvent::Upsert(object.key()))?;
        }

        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        subscribers
            .entry(kind.to_string())
            .or_default()
            .push((id, sink));
        Ok(id)
    }

    fn unsubscribe(&self, kind: &str, id: u64) -> Option<Arc<dyn EventSink>> {
        let mut subscribers = self.subscribers.write();
        let sinks = subscribers.get_mut(kind)?;
        let at = sinks.iter().position(|(sid, _)| *sid == id)?;
        Some(sinks.remove(at).1)
    }
}

fn notify(subscribers: &Subscribers, kind: &str, event: ChangeEvent) {
    for (_, sink) in subscribers.get(kind).into_iter().flatten() {
        if let Err(e) = sink.send(event.clone()) {
            debug!(kind, error = %e, "dropped change event");
        }
    }
}

impl ObjectStore for MemoryCluster {
    fn get_by_kind(&self, kind: &str, key: &str) -> Option<Object> {
        self.objects.read().get(kind)?.get(key).cloned()
    }
}

impl std::fmt::Debug for MemoryCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCluster")
            .field("objects", &self.objects)
            .finish_non_exhaustive()
    }
}

/// Change feed for one kind of a [`MemoryCluster`].
#[derive(Debug)]
pub struct MemoryFeed {
    cluster: Arc<MemoryCluster>,
    kind: String,
    subscription: Option<u64>,
}

impl ChangeFeed for MemoryFeed {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn start(&mut self, sink: Arc<dyn EventSink>) -> Result<()> {
        if let Some(id) = self.subscription.take() {
            self.cluster.unsubscribe(&self.kind, id);
        }
        let id = self.cluster.subscribe(&self.kind, sink)?;
        self.subscription = Some(id);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(id) = self.subscription.take() {
            if let Some(sink) = self.cluster.unsubscribe(&self.kind, id) {
                sink.close();
            }
        }
    }
}

impl Drop for MemoryFeed {
    fn drop(&mut self) {
        self.stop();
    }
}
