//! Capability traits for the collaborators around the index
//!
//! The real implementations (a cluster informer, a cluster object cache) live
//! outside this workspace. In-memory implementations for tests and embedding
//! are provided by `kubesearch-engine`.

use std::sync::Arc;

use crate::error::Result;
use crate::types::{ChangeEvent, Object};

/// Receiver side of a change feed.
///
/// Implemented by the indexing pipeline's per-kind work queue.
///
/// Thread safety: `send` may be called from any thread.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    ///
    /// # Errors
    ///
    /// Returns `Error::FeedClosed` once the sink no longer accepts events.
    fn send(&self, event: ChangeEvent) -> Result<()>;

    /// Signal that no further events will be delivered.
    fn close(&self);
}

/// Source of add/update/delete notifications for one kind.
///
/// A feed may deliver the same key more than once; indexing is idempotent.
pub trait ChangeFeed: Send {
    /// Kind of object this feed watches
    fn kind(&self) -> &str;

    /// Start delivering events into `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed cannot be started.
    fn start(&mut self, sink: Arc<dyn EventSink>) -> Result<()>;

    /// Stop delivering events and close the sink.
    fn stop(&mut self);
}

/// Lookup of full objects by kind and key.
///
/// Thread safety: all methods must be safe to call concurrently.
pub trait ObjectStore: Send + Sync {
    /// Fetch the object stored under `key` for `kind`, if any.
    fn get_by_kind(&self, kind: &str, key: &str) -> Option<Object>;
}
