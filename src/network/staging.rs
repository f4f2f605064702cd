use super::link::Link;

/// Edits proposed against a committed graph but not yet applied.
#[derive(Clone, Debug, Default)]
pub struct StagedBatch {
    /// Links staged for removal, in staging order.
    pub deleted: Vec<Link>,
    /// Links staged for insertion, in staging order.
    pub added: Vec<Link>,
}

impl StagedBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages an insertion.
    pub fn stage_add(&mut self, link: Link) {
        self.added.push(link);
    }

    /// Stages a removal.
    pub fn stage_delete(&mut self, link: Link) {
        self.deleted.push(link);
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.added.is_empty()
    }

    /// Number of staged edits.
    pub fn len(&self) -> usize {
        self.deleted.len() + self.added.len()
    }

    /// Drops every staged edit.
    pub fn clear(&mut self) {
        self.deleted.clear();
        self.added.clear();
    }

    /// Removes every edge that is both added and deleted in this batch.
    ///
    /// Each added link cancels at most one deleted link with the same
    /// endpoints. Returns the cancelled `(added, deleted)` pairs.
    pub fn cancel_toggled(&mut self) -> Vec<(Link, Link)> {
        let mut cancelled = Vec::new();
        if self.added.is_empty() || self.deleted.is_empty() {
            return cancelled;
        }
        let mut kept = Vec::with_capacity(self.added.len());
        for added in std::mem::take(&mut self.added) {
            match self.deleted.iter().position(|deleted| *deleted == added) {
                Some(pos) => {
                    let deleted = self.deleted.remove(pos);
                    cancelled.push((added, deleted));
                }
                None => kept.push(added),
            }
        }
        self.added = kept;
        cancelled
    }
}
