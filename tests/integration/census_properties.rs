#![allow(missing_docs)]

mod oracle;

use incgraph::census::{GraphletCensus, GRAPHLET_COUNT};
use incgraph::{load_pairs, GraphContext, Link, NodeRegistry, StagedBatch};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Edit {
    /// Delete the committed link at this position (modulo the link count).
    Delete(usize),
    /// Insert `n{source} -> n{target}`; may repeat or loop.
    Add(u8, u8),
    /// Delete and re-add the same committed link.
    Toggle(usize),
}

fn arb_pairs() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((0u8..8, 0u8..8), 0..24)
}

fn arb_edits() -> impl Strategy<Value = Vec<Edit>> {
    prop::collection::vec(
        prop_oneof![
            any::<usize>().prop_map(Edit::Delete),
            (0u8..10, 0u8..10).prop_map(|(s, t)| Edit::Add(s, t)),
            any::<usize>().prop_map(Edit::Toggle),
        ],
        0..10,
    )
}

fn build(pairs: &[(u8, u8)]) -> GraphContext {
    let labelled = pairs
        .iter()
        .map(|(s, t)| (format!("n{s}"), format!("n{t}")));
    load_pairs(NodeRegistry::shared(), labelled).unwrap().0
}

/// Turns edits into a batch whose deletions are all committed and distinct.
fn stage(graph: &mut GraphContext, edits: &[Edit]) {
    let mut deleted = Vec::new();
    for edit in edits {
        match *edit {
            Edit::Delete(pos) | Edit::Toggle(pos) if graph.link_count() > 0 => {
                let link = graph.links()[pos % graph.link_count()].clone();
                if deleted.contains(&link.key()) {
                    continue;
                }
                deleted.push(link.key());
                graph.stage_delete(link.key()).unwrap();
                if matches!(edit, Edit::Toggle(_)) {
                    graph.stage_add(Link::ranked(link.source, link.target, 0));
                }
            }
            Edit::Add(s, t) => {
                let r = graph.registry().clone();
                let link = Link::ranked(r.intern(&format!("n{s}")), r.intern(&format!("n{t}")), 0);
                graph.stage_add(link);
            }
            _ => {}
        }
    }
}

fn snapshot(census: &GraphletCensus, graph: &GraphContext) -> Vec<[u64; GRAPHLET_COUNT]> {
    graph
        .nodes()
        .iter()
        .map(|&n| census.node_vector(n).unwrap().0)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn incremental_matches_recompute(pairs in arb_pairs(), edits in arb_edits()) {
        let mut graph = build(&pairs);
        let mut census = GraphletCensus::default();
        census.recompute(&graph).unwrap();
        stage(&mut graph, &edits);
        census.apply_staged(&mut graph).unwrap();
        graph.commit().unwrap();

        let reference = oracle::census(&graph);
        prop_assert_eq!(census.global_counts().unwrap(), reference.counts);
        for &node in graph.nodes() {
            let wanted = reference.vectors.get(&node).copied().unwrap_or_default();
            prop_assert_eq!(census.node_vector(node).unwrap().0, wanted);
        }

        let mut fresh = GraphletCensus::default();
        fresh.recompute(&graph).unwrap();
        prop_assert_eq!(fresh.global_counts().unwrap(), census.global_counts().unwrap());
    }

    #[test]
    fn revert_restores_every_vector(pairs in arb_pairs(), edits in arb_edits()) {
        let mut graph = build(&pairs);
        let mut census = GraphletCensus::default();
        census.recompute(&graph).unwrap();
        let counts = census.global_counts().unwrap();
        let vectors = snapshot(&census, &graph);

        stage(&mut graph, &edits);
        census.apply_staged(&mut graph).unwrap();
        census.revert().unwrap();
        graph.revert().unwrap();

        prop_assert_eq!(census.global_counts().unwrap(), counts);
        prop_assert_eq!(snapshot(&census, &graph), vectors);
        prop_assert!(census.revert().is_err());
    }

    #[test]
    fn empty_batch_changes_nothing(pairs in arb_pairs()) {
        let graph = build(&pairs);
        let mut census = GraphletCensus::default();
        census.recompute(&graph).unwrap();
        let vectors = snapshot(&census, &graph);
        let stats = census.incremental_update(&graph, &mut StagedBatch::new()).unwrap();
        prop_assert_eq!(stats.reshaped, 0);
        prop_assert_eq!(snapshot(&census, &graph), vectors);
    }

    #[test]
    fn toggled_links_cancel_out(pairs in arb_pairs(), picks in prop::collection::vec(any::<usize>(), 1..6)) {
        let mut graph = build(&pairs);
        prop_assume!(graph.link_count() > 0);
        let mut census = GraphletCensus::default();
        census.recompute(&graph).unwrap();
        let counts = census.global_counts().unwrap();

        let edits: Vec<_> = picks.into_iter().map(Edit::Toggle).collect();
        stage(&mut graph, &edits);
        census.apply_staged(&mut graph).unwrap();
        prop_assert!(graph.staged().is_empty());
        prop_assert_eq!(census.global_counts().unwrap(), counts);
    }

    #[test]
    fn degree_tallies_sum_to_twice_the_edges(pairs in arb_pairs(), edits in arb_edits()) {
        let mut graph = build(&pairs);
        let mut census = GraphletCensus::default();
        census.recompute(&graph).unwrap();
        stage(&mut graph, &edits);
        census.apply_staged(&mut graph).unwrap();
        let degree_sum: u64 = census.vectors().map(|(_, v)| v.0[0]).sum();
        prop_assert_eq!(degree_sum, 2 * census.global_counts().unwrap()[0]);
    }
}
