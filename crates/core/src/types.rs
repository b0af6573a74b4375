//! Core value types: postings, document identity, objects and change events

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter;

// ============================================================================
// DocId
// ============================================================================

/// Globally unique identity of an indexed object: `<kind>/<object key>`.
///
/// Ordering is plain byte-wise string order. This is the order posting lists
/// are stored in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(String);

impl DocId {
    /// Build a DocId from a kind and an object key
    pub fn new(kind: &str, key: &str) -> Self {
        DocId(format!("{}/{}", kind, key))
    }

    /// The DocId as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Posting
// ============================================================================

/// One (object, term) relevance fact.
///
/// A posting identifies an object by `kind` + `key` and carries the number of
/// times the term it is filed under occurs in the object's kind and key text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Posting {
    /// Object key, `<namespace>/<name>` or `<name>`
    pub key: String,
    /// Object kind, e.g. `Pod`
    pub kind: String,
    /// Term frequency, at least 1
    pub frequency: u32,
}

impl Posting {
    /// Create a posting with frequency 1.
    ///
    /// The index recomputes the frequency when the posting is filed under a
    /// term.
    pub fn new(kind: impl Into<String>, key: impl Into<String>) -> Self {
        Posting {
            key: key.into(),
            kind: kind.into(),
            frequency: 1,
        }
    }

    /// Same posting with an explicit frequency
    pub fn with_frequency(mut self, frequency: u32) -> Self {
        self.frequency = frequency;
        self
    }

    /// Materialized document identity
    pub fn doc_id(&self) -> DocId {
        DocId::new(&self.kind, &self.key)
    }

    /// Compare two postings by DocId without allocating.
    pub fn cmp_doc_id(&self, other: &Posting) -> Ordering {
        doc_id_bytes(&self.kind, &self.key).cmp(doc_id_bytes(&other.kind, &other.key))
    }

    /// Whether both postings refer to the same object
    pub fn same_doc(&self, other: &Posting) -> bool {
        self.kind == other.kind && self.key == other.key
    }

    /// Occurrences of `term` in this posting.
    ///
    /// One if the kind equals the term, plus the number of non-overlapping
    /// occurrences of the term in the object key.
    pub fn term_frequency(&self, term: &str) -> u32 {
        if term.is_empty() {
            return 0;
        }
        let kind_match = u32::from(self.kind == term);
        kind_match + self.key.matches(term).count() as u32
    }
}

fn doc_id_bytes<'a>(kind: &'a str, key: &'a str) -> impl Iterator<Item = u8> + 'a {
    kind.bytes().chain(iter::once(b'/')).chain(key.bytes())
}

// ============================================================================
// Object
// ============================================================================

/// A resolved cluster object.
///
/// Only the identifying metadata is modeled; it is all the index reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    /// Object kind, e.g. `Deployment`
    pub kind: String,
    /// Namespace, empty for cluster-scoped objects
    #[serde(default)]
    pub namespace: String,
    /// Object name
    pub name: String,
}

impl Object {
    /// Namespaced object
    pub fn namespaced(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Object {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Cluster-scoped object
    pub fn cluster_scoped(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::namespaced(kind, "", name)
    }

    /// Store key: `<namespace>/<name>`, or `<name>` when cluster-scoped
    pub fn key(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.namespace, self.name)
        }
    }
}

// ============================================================================
// ChangeEvent
// ============================================================================

/// A notification from a change feed about one object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    /// The object was added or updated
    Upsert(String),
    /// The object was removed
    Delete(String),
}

impl ChangeEvent {
    /// The object key this event refers to
    pub fn key(&self) -> &str {
        match self {
            ChangeEvent::Upsert(key) | ChangeEvent::Delete(key) => key,
        }
    }
}
