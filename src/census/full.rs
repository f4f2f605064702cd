//! Census computed from scratch over the committed graph.

use rustc_hash::FxHashMap;

use super::graphlet::{CensusVector, Graphlet};
use super::tally::Tallies;
use crate::network::GraphContext;
use crate::types::NodeId;

/// Tallies of every node in `graph`.
pub(crate) fn census(graph: &GraphContext) -> Tallies {
    let mut vectors = FxHashMap::default();
    vectors.reserve(graph.node_count());
    for &node in graph.nodes() {
        vectors.insert(node, node_vector(graph, node));
    }
    Tallies::from_vectors(vectors)
}

/// Walks `a -> b -> c` and extends every triangle or chain to a fourth node.
///
/// Each walk visits an instance once per ordering of its interchangeable
/// nodes; those repeats are divided out before returning.
pub fn node_vector(graph: &GraphContext, a: NodeId) -> CensusVector {
    let adjacent = |x: NodeId, y: NodeId| graph.is_adjacent(x, y);
    let mut raw = [0u64; 9];
    let mut tally = |graphlet: Graphlet| raw[graphlet.index()] += 1;

    for b in graph.undirected(a) {
        tally(Graphlet::Edge);
        for c in graph.undirected(b) {
            if c == a {
                continue;
            }
            if adjacent(a, c) {
                tally(Graphlet::Triangle);
                for d in graph.undirected(c) {
                    if d == a || d == b || !adjacent(a, d) {
                        continue;
                    }
                    if adjacent(b, d) {
                        tally(Graphlet::Clique);
                    } else {
                        tally(Graphlet::Diamond);
                    }
                }
                continue;
            }

            // chain a - b - c
            tally(Graphlet::OpenTriad);
            for leaf in graph.undirected(b) {
                if leaf != a && leaf != c && !adjacent(a, leaf) && !adjacent(c, leaf) {
                    tally(Graphlet::Star);
                }
            }
            for d in graph.undirected(c) {
                if d == b {
                    continue;
                }
                match (adjacent(a, d), adjacent(b, d)) {
                    (false, true) => tally(Graphlet::TailedTriangle),
                    (true, false) => tally(Graphlet::Cycle),
                    (false, false) => tally(Graphlet::Path),
                    (true, true) => {}
                }
            }
        }
    }

    // ordered walks over symmetric positions
    let repeats = [
        (Graphlet::Triangle, 2),
        (Graphlet::Star, 2),
        (Graphlet::Cycle, 2),
        (Graphlet::TailedTriangle, 2),
        (Graphlet::Diamond, 2),
        (Graphlet::Clique, 6),
    ];
    for (graphlet, factor) in repeats {
        raw[graphlet.index()] /= factor;
    }
    CensusVector(raw)
}
