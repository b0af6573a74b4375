//! Inverted index for fulltext search over cluster objects
//!
//! This module provides:
//! - PostingList kept in DocId order for merge-join intersection
//! - InvertedIndex: term -> PostingList behind a read-write lock
//! - Idempotent insertion and per-document removal
//! - Version counter bumped on every mutation
//!
//! # Ordering
//!
//! Posting lists are always stored sorted by DocId ascending. Ranking by
//! frequency happens only when a query result is produced (see
//! `searcher`), never on the stored lists.

use kubesearch_core::Posting;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

// ============================================================================
// PostingList
// ============================================================================

/// Postings filed under one term, sorted by DocId ascending.
///
/// At most one posting per DocId.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingList {
    entries: Vec<Posting>,
}

impl PostingList {
    /// Create a new empty posting list
    pub fn new() -> Self {
        PostingList { entries: vec![] }
    }

    /// Postings in DocId order
    pub fn entries(&self) -> &[Posting] {
        &self.entries
    }

    /// Take the postings out of the list
    pub fn into_vec(self) -> Vec<Posting> {
        self.entries
    }

    /// Number of documents containing this term
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if posting list is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a posting for the same document is present
    pub fn contains(&self, posting: &Posting) -> bool {
        self.position(posting).is_ok()
    }

    /// Insert keeping DocId order. Returns false if the document is already
    /// present; the existing entry is left untouched.
    pub fn insert(&mut self, posting: Posting) -> bool {
        match self.position(&posting) {
            Ok(_) => false,
            Err(at) => {
                self.entries.insert(at, posting);
                true
            }
        }
    }

    /// Remove the entry for a document. Returns true if one was removed.
    pub fn remove(&mut self, posting: &Posting) -> bool {
        match self.position(posting) {
            Ok(at) => {
                self.entries.remove(at);
                true
            }
            Err(_) => false,
        }
    }

    fn position(&self, posting: &Posting) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|probe| probe.cmp_doc_id(posting))
    }
}

impl IntoIterator for PostingList {
    type Item = Posting;
    type IntoIter = std::vec::IntoIter<Posting>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ============================================================================
// InvertedIndex
// ============================================================================

/// Inverted index mapping terms to posting lists.
///
/// # Thread Safety
///
/// A single `RwLock` guards the term map. Any number of `get` calls run
/// concurrently; `put` and `remove` take the write lock for the whole call,
/// so readers never observe a partially applied update.
///
/// # Version Watermark
///
/// The version field is incremented on every call that changed the index.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    /// Term -> PostingList mapping
    postings: RwLock<HashMap<String, PostingList>>,

    /// Version watermark for consistency
    version: AtomicU64,
}

impl InvertedIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// File `posting` under each of `terms`.
    ///
    /// Terms that already hold a posting for the same document are skipped,
    /// so reindexing an object never duplicates or recounts it. The stored
    /// frequency is computed per term from the posting's kind and key; the
    /// frequency carried by the argument is ignored.
    ///
    /// Returns the number of terms the posting was newly filed under.
    pub fn put<S: AsRef<str>>(&self, terms: &[S], posting: &Posting) -> usize {
        let mut inserted = 0;
        {
            let mut postings = self.postings.write();
            for term in terms {
                let term = term.as_ref();
                if term.is_empty() {
                    continue;
                }
                let list = postings.entry(term.to_string()).or_default();
                if list.contains(posting) {
                    continue;
                }
                let frequency = posting.term_frequency(term).max(1);
                list.insert(posting.clone().with_frequency(frequency));
                inserted += 1;
            }
        }

        if inserted > 0 {
            self.version.fetch_add(1, Ordering::Release);
            trace!(kind = %posting.kind, key = %posting.key, inserted, "indexed posting");
        }
        inserted
    }

    /// Remove every posting for the document `kind`/`key`.
    ///
    /// Terms left without postings are dropped. Returns the number of terms
    /// the document was removed from.
    pub fn remove(&self, kind: &str, key: &str) -> usize {
        let target = Posting::new(kind, key);
        let mut removed = 0;
        {
            let mut postings = self.postings.write();
            postings.retain(|_, list| {
                if list.remove(&target) {
                    removed += 1;
                }
                !list.is_empty()
            });
        }

        if removed > 0 {
            self.version.fetch_add(1, Ordering::Release);
            trace!(kind, key, removed, "removed document");
        }
        removed
    }

    // ========================================================================
    // Query
    // ========================================================================

    /// Snapshot of the postings for `term`, empty if the term is unknown.
    pub fn get(&self, term: &str) -> PostingList {
        self.postings.read().get(term).cloned().unwrap_or_default()
    }

    /// Get all terms in the index
    pub fn terms(&self) -> Vec<String> {
        self.postings.read().keys().cloned().collect()
    }

    /// Number of distinct terms
    pub fn term_count(&self) -> usize {
        self.postings.read().len()
    }

    // ========================================================================
    // Version Watermark
    // ========================================================================

    /// Get current version
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

// ============================================================================
// Tests
// ============================================================================
