use tracing::debug;

use super::context::GraphContext;
use crate::types::{GraphletError, Result};

/// Nested rank windows over the top of a ranked context.
///
/// Window `k` holds every link ranked in the first `(k + 1) * chunk`
/// positions, so each window contains all earlier ones. Each link's
/// partition slot records the first window it appears in.
#[derive(Debug)]
pub struct RankPartition {
    contexts: Vec<GraphContext>,
    bounds: Vec<usize>,
}

impl RankPartition {
    /// Sorts `ranked` by rank and splits its top `cutoff` links into windows.
    ///
    /// `cutoff` must be a positive multiple of `chunk` no larger than the
    /// link count.
    pub fn build(ranked: &mut GraphContext, cutoff: usize, chunk: usize) -> Result<Self> {
        if chunk == 0 || cutoff == 0 || cutoff % chunk != 0 {
            return Err(GraphletError::Config(format!(
                "cutoff {cutoff} must be a positive multiple of chunk {chunk}"
            )));
        }
        if cutoff > ranked.link_count() {
            return Err(GraphletError::Config(format!(
                "cutoff {cutoff} exceeds link count {}",
                ranked.link_count()
            )));
        }
        ranked.sort_by_rank();
        let bounds: Vec<usize> = (1..=cutoff / chunk).map(|k| k * chunk).collect();
        let mut contexts: Vec<GraphContext> = bounds
            .iter()
            .map(|_| GraphContext::new(ranked.registry().clone()))
            .collect();

        for pos in 0..cutoff {
            let window = pos / chunk;
            let link = &mut ranked.links_mut()[pos];
            link.props
                .set_partition(window, window * chunk, bounds[window]);
            let link = link.clone();
            for context in &mut contexts[window..] {
                context.add_edge(link.clone())?;
            }
        }
        debug!(
            source = ranked.id().0,
            windows = bounds.len(),
            cutoff,
            "partition.build"
        );
        Ok(Self { contexts, bounds })
    }

    /// One context per window, smallest first.
    pub fn contexts(&self) -> &[GraphContext] {
        &self.contexts
    }

    /// Exclusive upper rank position of each window.
    pub fn bounds(&self) -> &[usize] {
        &self.bounds
    }

    /// Linearly descending weights `coef * n, coef * (n - 1), ..., coef`.
    pub fn coefficients(&self, coef: f64) -> Vec<f64> {
        let n = self.bounds.len();
        (0..n).map(|k| coef * (n - k) as f64).collect()
    }
}
