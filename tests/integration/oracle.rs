//! Brute-force census over every node subset, used as a reference.

use std::collections::BTreeMap;

use incgraph::census::{Graphlet, GRAPHLET_COUNT};
use incgraph::{GraphContext, NodeId};

pub struct Reference {
    pub counts: [u64; GRAPHLET_COUNT],
    pub vectors: BTreeMap<NodeId, [u64; GRAPHLET_COUNT]>,
}

fn classify(degree: &[usize]) -> Option<(Graphlet, Vec<bool>)> {
    let edges: usize = degree.iter().sum::<usize>() / 2;
    let max = degree.iter().copied().max().unwrap_or(0);
    let ends = |d: usize| degree.iter().map(|&x| x == d).collect::<Vec<_>>();
    let all = vec![true; degree.len()];
    let shape = match (degree.len(), edges) {
        (3, 2) => (Graphlet::OpenTriad, ends(1)),
        (3, 3) => (Graphlet::Triangle, all),
        (4, 3) if degree.contains(&0) => return None,
        (4, 3) if max == 3 => (Graphlet::Star, ends(1)),
        (4, 3) => (Graphlet::Path, ends(1)),
        (4, 4) if max == 3 => (Graphlet::TailedTriangle, ends(1)),
        (4, 4) => (Graphlet::Cycle, all),
        (4, 5) => (Graphlet::Diamond, ends(3)),
        (4, 6) => (Graphlet::Clique, all),
        _ => return None,
    };
    Some(shape)
}

fn visit(
    graph: &GraphContext,
    subset: &[NodeId],
    counts: &mut [u64; GRAPHLET_COUNT],
    vectors: &mut BTreeMap<NodeId, [u64; GRAPHLET_COUNT]>,
) {
    let degree: Vec<usize> = subset
        .iter()
        .map(|&a| subset.iter().filter(|&&b| graph.is_adjacent(a, b)).count())
        .collect();
    if let Some((graphlet, roles)) = classify(&degree) {
        counts[graphlet.index()] += 1;
        for (&node, role) in subset.iter().zip(roles) {
            if role {
                vectors.entry(node).or_default()[graphlet.index()] += 1;
            }
        }
    }
}

pub fn census(graph: &GraphContext) -> Reference {
    let mut nodes = graph.nodes().to_vec();
    nodes.sort();
    let n = nodes.len();
    let mut counts = [0u64; GRAPHLET_COUNT];
    let mut vectors: BTreeMap<NodeId, [u64; GRAPHLET_COUNT]> = BTreeMap::new();

    for i in 0..n {
        for j in i + 1..n {
            if graph.is_adjacent(nodes[i], nodes[j]) {
                counts[Graphlet::Edge.index()] += 1;
                vectors.entry(nodes[i]).or_default()[Graphlet::Edge.index()] += 1;
                vectors.entry(nodes[j]).or_default()[Graphlet::Edge.index()] += 1;
            }
            for k in j + 1..n {
                visit(graph, &[nodes[i], nodes[j], nodes[k]], &mut counts, &mut vectors);
                for l in k + 1..n {
                    visit(
                        graph,
                        &[nodes[i], nodes[j], nodes[k], nodes[l]],
                        &mut counts,
                        &mut vectors,
                    );
                }
            }
        }
    }
    Reference { counts, vectors }
}
