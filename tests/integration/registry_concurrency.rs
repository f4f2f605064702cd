#![allow(missing_docs)]

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use incgraph::census::GraphletCensus;
use incgraph::data_generator::DataGenerator;
use incgraph::{load_pairs, GraphletError, NodeId, NodeRegistry, StagedBatch};

#[test]
fn concurrent_interning_hands_out_one_id_per_label() {
    let registry = NodeRegistry::shared();
    let per_thread: Vec<Vec<NodeId>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = Arc::clone(&registry);
                scope.spawn(move || {
                    // every thread walks the same labels from a different start
                    (0..200)
                        .map(|i| registry.intern(&format!("gene{}", (i + t * 25) % 200)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(registry.len(), 200);
    let distinct: HashSet<NodeId> = per_thread.iter().flatten().copied().collect();
    assert_eq!(distinct.len(), 200);
    for i in 0..200 {
        let label = format!("gene{i}");
        let id = registry.lookup(&label).unwrap();
        assert_eq!(registry.label(id).as_deref(), Some(label.as_str()));
    }
}

#[test]
fn independent_runs_share_one_registry() {
    let registry = NodeRegistry::shared();
    let counts: Vec<[u64; 9]> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4u64)
            .map(|seed| {
                let registry = Arc::clone(&registry);
                scope.spawn(move || {
                    let mut generator = DataGenerator::new(seed);
                    let mut graph = generator.graph(registry, 10, 25).unwrap();
                    let mut census = GraphletCensus::default();
                    census.recompute(&graph).unwrap();
                    for _ in 0..5 {
                        *graph.staged_mut() = generator.batch(&graph, 2, 2, 0);
                        census.apply_staged(&mut graph).unwrap();
                        graph.commit().unwrap();
                    }
                    let mut fresh = GraphletCensus::default();
                    fresh.recompute(&graph).unwrap();
                    assert_eq!(fresh.global_counts().unwrap(), census.global_counts().unwrap());
                    census.global_counts().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(counts.len(), 4);
    // every context handed its handle back
    assert_eq!(registry.live_contexts(), 0);
}

#[test]
fn reset_starts_a_new_generation() {
    let registry = NodeRegistry::shared();
    let first = registry.acquire_context();
    registry.intern("a");
    registry.reset();
    assert!(registry.is_empty());
    assert_eq!(registry.snapshot().generation, 1);

    // stale leases are ignored
    registry.release_context(first);
    assert_eq!(registry.live_contexts(), 0);
    let second = registry.acquire_context();
    assert_ne!(second.id, first.id);
    assert_eq!(registry.live_contexts(), 1);
}

#[test]
fn census_rejects_a_context_created_after_reset() {
    let registry = NodeRegistry::shared();
    let (old, _) = load_pairs(registry.clone(), [("a", "b"), ("b", "c")]).unwrap();
    let mut census = GraphletCensus::default();
    census.recompute(&old).unwrap();

    registry.reset();
    let (new, _) = load_pairs(registry.clone(), [("x", "y")]).unwrap();
    assert_ne!(new.id(), old.id());
    let err = census
        .incremental_update(&new, &mut StagedBatch::new())
        .unwrap_err();
    assert!(matches!(err, GraphletError::ContextMismatch { .. }));
}
