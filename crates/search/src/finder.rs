//! Resolution of matched postings back to full objects

use kubesearch_core::{DocId, Error, Object, ObjectStore, Posting};
use std::sync::Arc;
use tracing::warn;

/// A posting together with the object it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found {
    /// The ranked posting
    pub posting: Posting,
    /// The resolved object
    pub object: Object,
}

/// Outcome of resolving a batch of postings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOutcome {
    /// Resolved objects, in the order of the input postings
    pub found: Vec<Found>,
    /// Documents that are indexed but no longer in the store
    pub missing: Vec<DocId>,
}

impl FindOutcome {
    /// Whether every posting resolved
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Looks up matched postings in an [`ObjectStore`].
#[derive(Clone)]
pub struct Finder {
    store: Arc<dyn ObjectStore>,
}

impl Finder {
    /// Create a finder over `store`
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Finder { store }
    }

    /// Resolve each posting.
    ///
    /// A posting whose object cannot be found is an inconsistency between
    /// the index and the store. It is logged and reported in
    /// [`FindOutcome::missing`]; resolution carries on with the rest.
    pub fn find_all(&self, postings: &[Posting]) -> FindOutcome {
        let mut outcome = FindOutcome::default();

        for posting in postings {
            match self.store.get_by_kind(&posting.kind, &posting.key) {
                Some(object) => outcome.found.push(Found {
                    posting: posting.clone(),
                    object,
                }),
                None => {
                    let err = Error::MissingObject {
                        kind: posting.kind.clone(),
                        key: posting.key.clone(),
                    };
                    warn!(error = %err, "indexed object not resolvable");
                    outcome.missing.push(posting.doc_id());
                }
            }
        }

        outcome
    }
}

impl std::fmt::Debug for Finder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Finder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapStore(HashMap<(String, String), Object>);

    impl ObjectStore for MapStore {
        fn get_by_kind(&self, kind: &str, key: &str) -> Option<Object> {
            self.0.get(&(kind.to_string(), key.to_string())).cloned()
        }
    }

    fn finder(objects: Vec<Object>) -> Finder {
        let map = objects
            .into_iter()
            .map(|o| ((o.kind.clone(), o.key()), o))
            .collect();
        Finder::new(Arc::new(MapStore(map)))
    }

    #[test]
    fn test_find_all_resolves_in_order() {
        let finder = finder(vec![
            Object::namespaced("Pod", "flargle", "blargle"),
            Object::namespaced("Pod", "flargle", "foo"),
        ]);
        let postings = vec![
            Posting::new("Pod", "flargle/foo").with_frequency(2),
            Posting::new("Pod", "flargle/blargle").with_frequency(1),
        ];

        let outcome = finder.find_all(&postings);
        assert!(outcome.is_complete());
        let names: Vec<&str> = outcome.found.iter().map(|f| f.object.name.as_str()).collect();
        assert_eq!(names, vec!["foo", "blargle"]);
        assert_eq!(outcome.found[0].posting.frequency, 2);
    }

    #[test]
    fn test_find_all_reports_missing_and_continues() {
        let finder = finder(vec![Object::namespaced("Pod", "flargle", "foo")]);
        let postings = vec![
            Posting::new("Pod", "flargle/gone"),
            Posting::new("Pod", "flargle/foo"),
        ];

        let outcome = finder.find_all(&postings);
        assert_eq!(outcome.found.len(), 1);
        assert_eq!(outcome.missing, vec![DocId::new("Pod", "flargle/gone")]);
        assert!(!outcome.is_complete());
    }

    #[test]
    fn test_find_all_empty() {
        let outcome = finder(vec![]).find_all(&[]);
        assert!(outcome.found.is_empty());
        assert!(outcome.is_complete());
    }
}
