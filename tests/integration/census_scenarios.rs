#![allow(missing_docs)]

mod oracle;

use incgraph::census::{CensusOptions, Graphlet, GraphletCensus};
use incgraph::data_generator::DataGenerator;
use incgraph::{load_pairs, EdgeKey, GraphContext, GraphletError, Link, NodeRegistry, StagedBatch};

fn graph(pairs: &[(&str, &str)]) -> GraphContext {
    load_pairs(NodeRegistry::shared(), pairs.iter().copied())
        .unwrap()
        .0
}

fn key(graph: &GraphContext, source: &str, target: &str) -> EdgeKey {
    let registry = graph.registry();
    EdgeKey::new(registry.intern(source), registry.intern(target))
}

fn checked() -> GraphletCensus {
    GraphletCensus::new(CensusOptions::new().verify_incremental(true))
}

/// Compares counts and every node vector against the brute-force reference
/// of `expected`.
fn assert_matches(census: &GraphletCensus, expected: &GraphContext) {
    let reference = oracle::census(expected);
    assert_eq!(census.global_counts().unwrap(), reference.counts);
    for &node in expected.nodes() {
        let wanted = reference.vectors.get(&node).copied().unwrap_or_default();
        assert_eq!(
            census.node_vector(node).unwrap().0,
            wanted,
            "node {}",
            expected.registry().describe(node)
        );
    }
    for (node, vector) in census.vectors() {
        if !expected.contains_node(node) {
            assert!(vector.is_zero(), "stale tallies on {node}");
        }
    }
}

#[test]
fn square_census() {
    let g = graph(&[("A", "B"), ("B", "C"), ("C", "D"), ("D", "A")]);
    let mut census = GraphletCensus::default();
    census.recompute(&g).unwrap();
    assert_eq!(census.global_counts().unwrap(), [4, 4, 0, 0, 0, 1, 0, 0, 0]);
    let a = g.registry().lookup("A").unwrap();
    let vector = census.node_vector(a).unwrap();
    assert_eq!(vector[Graphlet::Edge], 2);
    assert_eq!(vector[Graphlet::OpenTriad], 2);
    assert_eq!(vector[Graphlet::Cycle], 1);
    assert_matches(&census, &g);
}

#[test]
fn opening_the_square_leaves_a_path() {
    let mut g = graph(&[("A", "B"), ("B", "C"), ("C", "D"), ("D", "A")]);
    let mut census = checked();
    census.recompute(&g).unwrap();

    let da = key(&g, "D", "A");
    g.stage_delete(da).unwrap();
    let stats = census.apply_staged(&mut g).unwrap();
    assert_eq!(stats.removed, 1);
    assert_eq!(census.global_counts().unwrap(), [3, 2, 0, 1, 0, 0, 0, 0, 0]);
    assert_matches(&census, &g.materialize(g.staged()).unwrap());

    // keep it: the committed graph catches up with the census
    g.commit().unwrap();
    assert_matches(&census, &g);
}

#[test]
fn revert_restores_the_square() {
    let mut g = graph(&[("A", "B"), ("B", "C"), ("C", "D"), ("D", "A")]);
    let mut census = checked();
    census.recompute(&g).unwrap();
    let before: Vec<_> = g
        .nodes()
        .iter()
        .map(|&n| census.node_vector(n).unwrap())
        .collect();

    g.stage_delete(key(&g, "D", "A")).unwrap();
    census.apply_staged(&mut g).unwrap();
    census.revert().unwrap();
    g.revert().unwrap();

    let after: Vec<_> = g
        .nodes()
        .iter()
        .map(|&n| census.node_vector(n).unwrap())
        .collect();
    assert_eq!(before, after);
    assert_eq!(census.global_counts().unwrap(), [4, 4, 0, 0, 0, 1, 0, 0, 0]);
}

#[test]
fn diamond_loses_an_edge() {
    let mut g = graph(&[("A", "B"), ("B", "C"), ("C", "D"), ("D", "A"), ("A", "C")]);
    let mut census = checked();
    census.recompute(&g).unwrap();
    assert_eq!(census.global_counts().unwrap()[Graphlet::Diamond.index()], 1);
    assert_matches(&census, &g);

    g.stage_delete(key(&g, "C", "D")).unwrap();
    census.apply_staged(&mut g).unwrap();
    let counts = census.global_counts().unwrap();
    assert_eq!(counts[Graphlet::Diamond.index()], 0);
    assert_eq!(counts[Graphlet::TailedTriangle.index()], 1);
    g.commit().unwrap();
    assert_matches(&census, &g);
}

#[test]
fn closing_a_star_into_a_clique() {
    let mut g = graph(&[("hub", "x"), ("hub", "y"), ("hub", "z")]);
    let mut census = checked();
    census.recompute(&g).unwrap();
    assert_eq!(census.global_counts().unwrap()[Graphlet::Star.index()], 1);

    let r = g.registry().clone();
    for (s, t) in [("x", "y"), ("y", "z"), ("z", "x")] {
        g.stage_add(Link::ranked(r.intern(s), r.intern(t), 9));
    }
    census.apply_staged(&mut g).unwrap();
    assert_eq!(census.global_counts().unwrap(), [6, 0, 4, 0, 0, 0, 0, 0, 1]);
    g.commit().unwrap();
    assert_matches(&census, &g);
}

#[test]
fn new_nodes_join_through_a_batch() {
    let mut g = graph(&[("a", "b")]);
    let mut census = checked();
    census.recompute(&g).unwrap();
    let r = g.registry().clone();
    g.stage_add(Link::ranked(r.intern("b"), r.intern("c"), 2));
    g.stage_add(Link::ranked(r.intern("c"), r.intern("d"), 3));
    census.apply_staged(&mut g).unwrap();
    assert_eq!(census.global_counts().unwrap(), [3, 2, 0, 1, 0, 0, 0, 0, 0]);
    g.commit().unwrap();
    assert_matches(&census, &g);
}

#[test]
fn mirror_arcs_keep_the_pair_adjacent() {
    let mut g = graph(&[("a", "b"), ("b", "a"), ("b", "c")]);
    let mut census = checked();
    census.recompute(&g).unwrap();
    let before = census.global_counts().unwrap();

    g.stage_delete(key(&g, "a", "b")).unwrap();
    let r = g.registry().clone();
    g.stage_add(Link::ranked(r.intern("c"), r.intern("b"), 4));
    let stats = census.apply_staged(&mut g).unwrap();
    assert_eq!(stats.absorbed, 2);
    assert_eq!(census.global_counts().unwrap(), before);
}

#[test]
fn failed_update_can_be_reverted() {
    let g = graph(&[("a", "b"), ("b", "c"), ("c", "a")]);
    let mut census = GraphletCensus::default();
    census.recompute(&g).unwrap();
    let before = census.global_counts().unwrap();

    let mut batch = StagedBatch::new();
    batch.stage_delete(Link::ranked(key(&g, "a", "b").source, key(&g, "a", "b").target, 1));
    batch.stage_delete(Link::ranked(key(&g, "b", "a").source, key(&g, "b", "a").target, 1));
    let err = census.incremental_update(&g, &mut batch).unwrap_err();
    assert!(matches!(err, GraphletError::UnknownEdge { .. }));
    assert!(err.is_contract_violation());

    census.revert().unwrap();
    assert_eq!(census.global_counts().unwrap(), before);
}

#[test]
fn random_batches_track_the_reference() {
    let mut generator = DataGenerator::new(0x5EED);
    let mut g = generator.graph(NodeRegistry::shared(), 9, 18).unwrap();
    let mut census = checked();
    census.recompute(&g).unwrap();
    assert_matches(&census, &g);

    for round in 0..12 {
        let batch = generator.batch(&g, round % 4, 3, 1);
        *g.staged_mut() = batch;
        census.apply_staged(&mut g).unwrap();
        if round % 3 == 2 {
            census.revert().unwrap();
            g.revert().unwrap();
        } else {
            g.commit().unwrap();
        }
        assert_matches(&census, &g);
    }
}

#[test]
fn adding_then_deleting_one_edge_conserves_counts() {
    let mut g = graph(&[("a", "b"), ("b", "c"), ("c", "d"), ("b", "e")]);
    let mut census = checked();
    census.recompute(&g).unwrap();
    let before = census.global_counts().unwrap();

    let r = g.registry().clone();
    g.stage_add(Link::ranked(r.intern("a"), r.intern("d"), 5));
    census.apply_staged(&mut g).unwrap();
    g.commit().unwrap();
    assert_ne!(census.global_counts().unwrap(), before);

    g.stage_delete(key(&g, "a", "d")).unwrap();
    census.apply_staged(&mut g).unwrap();
    g.commit().unwrap();
    assert_eq!(census.global_counts().unwrap(), before);
    assert_matches(&census, &g);
}
