//! Seeded random graphs and edit batches for tests and benchmarks.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashSet;

use crate::network::{EdgeKey, GraphContext, Link, StagedBatch};
use crate::primitives::NodeRegistry;
use crate::types::{NodeId, Result};

/// Deterministic generator of labelled directed graphs and batches over them.
pub struct DataGenerator {
    rng: ChaCha8Rng,
}

impl DataGenerator {
    /// Generator whose output depends only on `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Random simple directed graph on labels `n0..n{nodes}` with up to
    /// `links` arcs, ranked in insertion order.
    ///
    /// Stops early when the graph cannot take more arcs.
    pub fn graph(
        &mut self,
        registry: Arc<NodeRegistry>,
        nodes: usize,
        links: usize,
    ) -> Result<GraphContext> {
        let ids: Vec<NodeId> = (0..nodes)
            .map(|i| registry.intern(&format!("n{i}")))
            .collect();
        let mut graph = GraphContext::new(registry);
        if nodes < 2 {
            return Ok(graph);
        }
        let target = links.min(nodes * (nodes - 1));
        let mut attempts = 0;
        while graph.link_count() < target && attempts < target * 20 {
            attempts += 1;
            let source = ids[self.rng.gen_range(0..nodes)];
            let sink = ids[self.rng.gen_range(0..nodes)];
            if source == sink || graph.contains_edge(source, sink) {
                continue;
            }
            let rank = graph.link_count() + 1;
            graph.add_edge(Link::ranked(source, sink, rank))?;
        }
        Ok(graph)
    }

    /// Batch of `deletes` distinct committed arcs and up to `adds` distinct
    /// absent arcs.
    ///
    /// New arcs connect existing nodes or one of `spare` fresh labels, so a
    /// batch can grow the node set. Every edit is valid on its own, which
    /// keeps the batch free of contract violations.
    pub fn batch(
        &mut self,
        graph: &GraphContext,
        deletes: usize,
        adds: usize,
        spare: usize,
    ) -> StagedBatch {
        let mut batch = StagedBatch::new();
        let mut committed: Vec<&Link> = graph.links().iter().collect();
        committed.shuffle(&mut self.rng);
        for link in committed.into_iter().take(deletes) {
            batch.stage_delete(link.clone());
        }

        let registry = graph.registry();
        let mut pool: Vec<NodeId> = graph.nodes().to_vec();
        let offset = registry.len();
        pool.extend((0..spare).map(|i| registry.intern(&format!("fresh{}", offset + i))));
        if pool.len() < 2 {
            return batch;
        }

        let mut chosen: FxHashSet<EdgeKey> = FxHashSet::default();
        let mut attempts = 0;
        while chosen.len() < adds && attempts < adds * 20 {
            attempts += 1;
            let source = pool[self.rng.gen_range(0..pool.len())];
            let sink = pool[self.rng.gen_range(0..pool.len())];
            let key = EdgeKey::new(source, sink);
            if key.is_self_loop() || graph.contains_edge(source, sink) || !chosen.insert(key) {
                continue;
            }
            let rank = graph.link_count() + chosen.len();
            batch.stage_add(Link::ranked(source, sink, rank));
        }
        batch
    }
}
