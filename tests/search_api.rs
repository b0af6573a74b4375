//! End-to-end search tests
//!
//! Objects are applied to an in-memory cluster, indexed by the running
//! pipeline, and queried through the search service the way an HTTP handler
//! would.

use kubesearch::{Controller, MemoryCluster, Object, PipelineHandle, SearchConfig, SearchResult};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

struct Fixture {
    cluster: Arc<MemoryCluster>,
    controller: Controller,
    pipeline: PipelineHandle,
}

impl Fixture {
    fn new() -> Self {
        let cluster = Arc::new(MemoryCluster::new());
        let config = SearchConfig {
            kinds: vec![
                "Deployment".to_string(),
                "Namespace".to_string(),
                "Pod".to_string(),
            ],
            ..SearchConfig::default()
        };
        let mut controller = Controller::in_memory(&config, Arc::clone(&cluster)).unwrap();
        let pipeline = controller.start().unwrap();
        Fixture {
            cluster,
            controller,
            pipeline,
        }
    }

    fn apply(&self, objects: Vec<Object>) {
        for object in objects {
            self.cluster.apply(object);
        }
        self.settle();
    }

    fn settle(&self) {
        assert!(
            self.pipeline.drain_timeout(Duration::from_secs(5)),
            "pipeline did not drain"
        );
    }

    fn query(&self, query: &str) -> Vec<SearchResult> {
        self.controller.service().query(Some(query))
    }
}

fn test_pods() -> Vec<Object> {
    vec![
        Object::namespaced("Pod", "flargle", "blargle"),
        Object::namespaced("Pod", "flargle", "foo"),
    ]
}

fn result(kind: &str, namespace: &str, name: &str, rank: u32) -> SearchResult {
    SearchResult {
        kind: kind.to_string(),
        name: name.to_string(),
        namespace: namespace.to_string(),
        rank,
    }
}

// ============================================================================
// Search API
// ============================================================================

#[test]
fn test_search_for_pod_by_name() {
    let fixture = Fixture::new();
    fixture.apply(test_pods());

    assert_eq!(
        fixture.query("blargle"),
        vec![result("Pod", "flargle", "blargle", 1)]
    );
}

#[test]
fn test_search_for_pod_by_namespace() {
    let fixture = Fixture::new();
    fixture.apply(test_pods());

    assert_eq!(
        fixture.query("flargle"),
        vec![
            result("Pod", "flargle", "blargle", 1),
            result("Pod", "flargle", "foo", 1),
        ]
    );
}

#[test]
fn test_search_for_missing_object() {
    let fixture = Fixture::new();
    fixture.apply(test_pods());

    assert!(fixture.query("whatever").is_empty());
}

#[test]
fn test_search_using_empty_query() {
    let fixture = Fixture::new();
    fixture.apply(test_pods());

    assert!(fixture.query("").is_empty());
    assert!(fixture.controller.service().query(None).is_empty());
}

#[test]
fn test_search_requires_every_term() {
    let fixture = Fixture::new();
    fixture.apply(test_pods());

    assert_eq!(
        fixture.query("blargle flargle"),
        vec![result("Pod", "flargle", "blargle", 1)]
    );
    assert_eq!(fixture.query("flargle blargle"), fixture.query("blargle flargle"));
}

#[test]
fn test_search_across_kinds() {
    let fixture = Fixture::new();
    fixture.apply(vec![
        Object::namespaced("Deployment", "kube-system", "coredns"),
        Object::namespaced("Pod", "kube-system", "coredns-5d78c9869d-abcde"),
        Object::namespaced("Pod", "default", "nginx"),
    ]);

    let results = fixture.query("coredns");
    let kinds: Vec<&str> = results.iter().map(|r| r.kind.as_str()).collect();
    assert_eq!(kinds, vec!["Deployment", "Pod"]);

    assert_eq!(
        fixture.query("kube-system nginx"),
        Vec::<SearchResult>::new()
    );
}

#[test]
fn test_search_ranks_by_frequency() {
    let fixture = Fixture::new();
    fixture.apply(vec![
        Object::namespaced("Pod", "web", "web"),
        Object::namespaced("Pod", "web", "api"),
    ]);

    let results = fixture.query("web");
    assert_eq!(results[0], result("Pod", "web", "web", 2));
    assert_eq!(results[1], result("Pod", "web", "api", 1));
}

#[test]
fn test_deleted_object_is_no_longer_found() {
    let fixture = Fixture::new();
    fixture.apply(test_pods());

    fixture.cluster.delete("Pod", "flargle/blargle");
    fixture.settle();

    assert!(fixture.query("blargle").is_empty());
    assert_eq!(fixture.query("flargle").len(), 1);
}

#[test]
fn test_updates_are_idempotent() {
    let fixture = Fixture::new();
    fixture.apply(test_pods());
    fixture.apply(test_pods());

    assert_eq!(fixture.query("flargle").len(), 2);
}

#[test]
fn test_query_json() {
    let fixture = Fixture::new();
    fixture.apply(vec![Object::cluster_scoped("Namespace", "flargle")]);

    let json = fixture.controller.service().query_json(Some("flargle")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!([{"kind": "Namespace", "name": "flargle", "rank": 1}])
    );

    assert_eq!(fixture.controller.service().query_json(None).unwrap(), "[]");
}
