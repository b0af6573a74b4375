//! Query surface: free-text query in, ranked object summaries out
//!
//! This is everything an HTTP handler needs short of the listener itself. An
//! absent query parameter is treated the same as an empty query.

use crate::finder::Finder;
use crate::searcher::Searcher;
use kubesearch_core::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single result entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Object kind
    pub kind: String,
    /// Object name
    pub name: String,
    /// Object namespace, omitted for cluster-scoped objects
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// Term frequency the result was ranked by
    pub rank: u32,
}

/// Searcher and finder combined behind one call.
#[derive(Debug, Clone)]
pub struct SearchService {
    searcher: Searcher,
    finder: Finder,
}

impl SearchService {
    /// Create a service from its two halves
    pub fn new(searcher: Searcher, finder: Finder) -> Self {
        SearchService { searcher, finder }
    }

    /// Run `query` and resolve the hits, in ranking order.
    ///
    /// Hits that no longer resolve are left out of the result.
    pub fn query(&self, query: Option<&str>) -> Vec<SearchResult> {
        let query = query.unwrap_or_default();
        let postings = self.searcher.search(query);
        let outcome = self.finder.find_all(&postings);

        if !outcome.is_complete() {
            debug!(query, missing = outcome.missing.len(), "partial search result");
        }

        outcome
            .found
            .into_iter()
            .map(|found| SearchResult {
                kind: found.posting.kind,
                name: found.object.name,
                namespace: found.object.namespace,
                rank: found.posting.frequency,
            })
            .collect()
    }

    /// [`query`](Self::query) encoded as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` if encoding fails.
    pub fn query_json(&self, query: Option<&str>) -> Result<String> {
        Ok(serde_json::to_string(&self.query(query))?)
    }
}
