//! Indexing engine for kubesearch
//!
//! This crate keeps the inverted index in step with the cluster:
//! - WorkQueue: per-kind blocking queue of change events
//! - Pipeline: one indexing worker thread per kind
//! - Controller: feeds + pipeline + shared index, wired from config
//! - MemoryCluster: in-memory object store and change feeds
//! - SearchConfig: `kubesearch.toml`
//! - telemetry: fmt subscriber setup
//!
//! # Usage
//!
//! ```
//! use kubesearch_core::Object;
//! use kubesearch_engine::{Controller, MemoryCluster, SearchConfig};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let cluster = Arc::new(MemoryCluster::new());
//! let mut controller = Controller::in_memory(&SearchConfig::default(), cluster.clone())?;
//! let pipeline = controller.start()?;
//!
//! cluster.apply(Object::namespaced("Pod", "flargle", "blargle"));
//! pipeline.drain_timeout(Duration::from_secs(5));
//!
//! let results = controller.service().query(Some("blargle"));
//! assert_eq!(results[0].name, "blargle");
//! # Ok::<(), kubesearch_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod controller;
pub mod memory;
pub mod pipeline;
pub mod queue;
pub mod telemetry;

pub use config::{SearchConfig, CONFIG_FILE_NAME};
pub use controller::Controller;
pub use memory::{MemoryCluster, MemoryFeed};
pub use pipeline::{apply_event, index_object, split_key, Pipeline, PipelineHandle};
pub use queue::{Lease, WorkQueue};
