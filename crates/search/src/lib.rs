//! Fulltext search over cluster objects
//!
//! This crate provides:
//! - Identifier and query tokenizers
//! - InvertedIndex: term -> DocId-ordered posting lists
//! - Searcher: conjunctive merge-join queries with frequency ranking
//! - Finder: resolution of postings through an `ObjectStore`
//! - SearchService: the query surface an HTTP handler wraps
//!
//! # Usage
//!
//! ```
//! use kubesearch_core::Posting;
//! use kubesearch_search::{InvertedIndex, Searcher};
//! use std::sync::Arc;
//!
//! let index = Arc::new(InvertedIndex::new());
//! index.put(&["flargle", "blargle"], &Posting::new("Pod", "flargle/blargle"));
//!
//! let hits = Searcher::new(index).search("blargle");
//! assert_eq!(hits.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod finder;
pub mod index;
pub mod searcher;
pub mod service;
pub mod tokenizer;

pub use finder::{FindOutcome, Finder, Found};
pub use index::{InvertedIndex, PostingList};
pub use searcher::{intersect, rank, Searcher};
pub use service::{SearchResult, SearchService};
pub use tokenizer::{tokenize_identifier, tokenize_query, MAX_IDENTIFIER_LEN};
