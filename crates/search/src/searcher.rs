//! Conjunctive query evaluation over the inverted index
//!
//! A query is tokenized, each term's posting list is fetched, and the lists
//! are intersected left to right with a merge-join keyed on DocId. The
//! surviving postings are then ranked by frequency.

use crate::index::InvertedIndex;
use crate::tokenizer::tokenize_query;
use kubesearch_core::Posting;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Query engine over a shared [`InvertedIndex`].
#[derive(Debug, Clone)]
pub struct Searcher {
    index: Arc<InvertedIndex>,
}

impl Searcher {
    /// Create a searcher reading from `index`
    pub fn new(index: Arc<InvertedIndex>) -> Self {
        Searcher { index }
    }

    /// Postings for objects matching every term of `query`, ranked.
    ///
    /// An empty query (no terms) yields an empty result.
    pub fn search(&self, query: &str) -> Vec<Posting> {
        let terms = tokenize_query(query);

        let mut result: Option<Vec<Posting>> = None;
        for term in &terms {
            let postings = self.index.get(term).into_vec();
            let next = match result {
                None => postings,
                Some(running) => intersect(&running, &postings),
            };
            let exhausted = next.is_empty();
            result = Some(next);
            if exhausted {
                break;
            }
        }

        let mut result = result.unwrap_or_default();
        rank(&mut result);
        debug!(query, terms = terms.len(), hits = result.len(), "search");
        result
    }
}

/// Merge-join two DocId-sorted posting lists.
///
/// On a DocId match the posting with the larger frequency is kept.
pub fn intersect(left: &[Posting], right: &[Posting]) -> Vec<Posting> {
    let mut result = Vec::with_capacity(left.len().min(right.len()));
    let (mut i, mut j) = (0, 0);

    while i < left.len() && j < right.len() {
        match left[i].cmp_doc_id(&right[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                result.push(larger_frequency(&left[i], &right[j]).clone());
                i += 1;
                j += 1;
            }
        }
    }

    result
}

fn larger_frequency<'a>(a: &'a Posting, b: &'a Posting) -> &'a Posting {
    if a.frequency < b.frequency {
        b
    } else {
        a
    }
}

/// Sort into ranking order: frequency descending, then DocId ascending.
pub fn rank(postings: &mut [Posting]) {
    postings.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then_with(|| a.cmp_doc_id(b))
    });
}
