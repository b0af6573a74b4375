//! Core types and traits for kubesearch
//!
//! This crate defines the foundational types used throughout the system:
//! - Posting: (object, term) relevance fact with a term frequency
//! - DocId: `<kind>/<key>` identity used to order and deduplicate postings
//! - Object: resolved cluster object metadata
//! - ChangeEvent: upsert/delete notification for one object key
//! - Error: Error type hierarchy
//! - Traits: ChangeFeed, EventSink, ObjectStore

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{ChangeFeed, EventSink, ObjectStore};
pub use types::{ChangeEvent, DocId, Object, Posting};
