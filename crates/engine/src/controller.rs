//! Controller: change feeds, the indexing pipeline and the shared index.
//!
//! The controller owns the one [`InvertedIndex`] instance and hands it to the
//! pipeline workers and to every searcher it creates. Nothing is global: a
//! process that wants two independent indexes builds two controllers.

use crate::config::SearchConfig;
use crate::memory::MemoryCluster;
use crate::pipeline::{Pipeline, PipelineHandle};
use kubesearch_core::{ChangeFeed, Error, EventSink, ObjectStore, Result};
use kubesearch_search::{Finder, InvertedIndex, SearchService, Searcher};
use std::sync::Arc;
use tracing::{info, warn};

/// Feeds plus index, started and stopped together.
pub struct Controller {
    index: Arc<InvertedIndex>,
    store: Arc<dyn ObjectStore>,
    feeds: Vec<Box<dyn ChangeFeed>>,
    started: bool,
}

impl Controller {
    /// Create a controller with an empty index and no feeds.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Controller {
            index: Arc::new(InvertedIndex::new()),
            store,
            feeds: Vec::new(),
            started: false,
        }
    }

    /// Create a controller with one feed per configured kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid.
    pub fn from_config<F>(
        config: &SearchConfig,
        store: Arc<dyn ObjectStore>,
        mut make_feed: F,
    ) -> Result<Self>
    where
        F: FnMut(&str) -> Box<dyn ChangeFeed>,
    {
        config.validate()?;
        let mut controller = Self::new(store);
        for kind in &config.kinds {
            controller.add_feed(make_feed(kind.as_str()))?;
        }
        Ok(controller)
    }

    /// Controller over a [`MemoryCluster`], used as both store and feed source.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid.
    pub fn in_memory(config: &SearchConfig, cluster: Arc<MemoryCluster>) -> Result<Self> {
        let store: Arc<dyn ObjectStore> = cluster.clone();
        Self::from_config(config, store, |kind| -> Box<dyn ChangeFeed> {
            Box::new(cluster.feed(kind))
        })
    }

    /// Add a change feed.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateKind` if a feed for the kind exists, or
    /// `Error::AlreadyStarted` once the controller is running.
    pub fn add_feed(&mut self, feed: Box<dyn ChangeFeed>) -> Result<()> {
        if self.started {
            return Err(Error::AlreadyStarted);
        }
        if self.feeds.iter().any(|f| f.kind() == feed.kind()) {
            return Err(Error::DuplicateKind(feed.kind().to_string()));
        }
        self.feeds.push(feed);
        Ok(())
    }

    /// Kinds with a registered feed
    pub fn kinds(&self) -> Vec<&str> {
        self.feeds.iter().map(|f| f.kind()).collect()
    }

    /// The index bound to this controller
    pub fn index(&self) -> &Arc<InvertedIndex> {
        &self.index
    }

    /// A searcher over this controller's index
    pub fn searcher(&self) -> Searcher {
        Searcher::new(Arc::clone(&self.index))
    }

    /// A finder over this controller's object store
    pub fn finder(&self) -> Finder {
        Finder::new(Arc::clone(&self.store))
    }

    /// Searcher and finder combined
    pub fn service(&self) -> SearchService {
        SearchService::new(self.searcher(), self.finder())
    }

    /// Start one indexing worker per feed, then start the feeds.
    ///
    /// The returned handle cancels the workers; [`stop`](Self::stop) instead
    /// stops the feeds and lets the workers finish their backlog.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyStarted` on a second call, or the first error
    /// from spawning a worker or starting a feed. On error nothing is left
    /// running.
    pub fn start(&mut self) -> Result<PipelineHandle> {
        if self.started {
            return Err(Error::AlreadyStarted);
        }

        let mut pipeline = Pipeline::new(Arc::clone(&self.index));
        let mut queues = Vec::with_capacity(self.feeds.len());
        for feed in &self.feeds {
            queues.push(pipeline.register(feed.kind())?);
        }
        let handle = pipeline.start()?;

        for (at, queue) in queues.into_iter().enumerate() {
            let sink: Arc<dyn EventSink> = queue;
            if let Err(e) = self.feeds[at].start(sink) {
                warn!(kind = self.feeds[at].kind(), error = %e, "change feed failed to start");
                for feed in self.feeds.iter_mut().take(at) {
                    feed.stop();
                }
                handle.shutdown();
                return Err(e);
            }
        }

        self.started = true;
        info!(kinds = ?self.kinds(), "controller started");
        Ok(handle)
    }

    /// Stop all feeds. Workers index what is already queued, then exit.
    pub fn stop(&mut self) {
        if !self.started {
            return;
        }
        for feed in &mut self.feeds {
            feed.stop();
        }
        self.started = false;
        info!("controller stopped");
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("kinds", &self.kinds())
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}
