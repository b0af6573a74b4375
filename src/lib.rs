//! kubesearch - fulltext search over live cluster objects
//!
//! kubesearch keeps an in-memory inverted index in step with a change feed of
//! cluster objects (Pods, Deployments, ...) and answers multi-term queries
//! with results ranked by term frequency.
//!
//! # Quick Start
//!
//! ```
//! use kubesearch::{Controller, MemoryCluster, Object, SearchConfig};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let cluster = Arc::new(MemoryCluster::new());
//! let mut controller = Controller::in_memory(&SearchConfig::default(), cluster.clone())?;
//! let pipeline = controller.start()?;
//!
//! cluster.apply(Object::namespaced("Pod", "kube-system", "coredns"));
//! pipeline.drain_timeout(Duration::from_secs(5));
//!
//! let json = controller.service().query_json(Some("kube coredns"))?;
//! assert!(json.contains("coredns"));
//! # Ok::<(), kubesearch::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `kubesearch-core`: postings, objects, errors, capability traits
//! - `kubesearch-search`: tokenizer, inverted index, searcher, finder
//! - `kubesearch-engine`: work queues, indexing pipeline, controller, config

pub use kubesearch_core::*;
pub use kubesearch_engine::*;
pub use kubesearch_search::*;
