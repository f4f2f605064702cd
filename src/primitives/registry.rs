use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::types::{ContextId, NodeId};

/// Interning table mapping node labels to dense [`NodeId`]s.
///
/// A registry guarantees at most one id per label until [`NodeRegistry::reset`]
/// is called. It also hands out the small-integer [`ContextId`] handles that
/// identify graph contexts; handles released within a generation are
/// recycled so that short-lived contexts never grow any per-context table
/// without bound.
///
/// Lookups take a shared lock and inserts an exclusive one, so independent
/// optimization runs only contend briefly when they meet a label for the first
/// time.
pub struct NodeRegistry {
    interner: RwLock<Interner>,
    handles: Mutex<HandleSlots>,
}

#[derive(Default)]
struct Interner {
    by_label: FxHashMap<Arc<str>, NodeId>,
    labels: Vec<Arc<str>>,
}

#[derive(Default, Debug)]
struct HandleSlots {
    next: u32,
    free: Vec<u32>,
    live: usize,
    generation: u64,
}

/// Lease on a context handle; returned to the registry on release.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ContextLease {
    /// The handle itself.
    pub id: ContextId,
    generation: u64,
}

/// Snapshot of registry state for observability.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub struct RegistrySnapshot {
    /// Number of interned labels.
    pub labels: usize,
    /// Number of context handles currently leased.
    pub live_contexts: usize,
    /// Incremented by every reset.
    pub generation: u64,
}

static GLOBAL: OnceLock<Arc<NodeRegistry>> = OnceLock::new();

impl NodeRegistry {
    /// Creates an empty, run-local registry.
    pub fn new() -> Self {
        Self {
            interner: RwLock::new(Interner::default()),
            handles: Mutex::new(HandleSlots::default()),
        }
    }

    /// Creates an empty registry wrapped for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Process-wide registry, created on first use.
    pub fn global() -> Arc<Self> {
        GLOBAL.get_or_init(NodeRegistry::shared).clone()
    }

    /// Returns the id for `label`, creating it on first sight.
    pub fn intern(&self, label: &str) -> NodeId {
        if let Some(id) = self.interner.read().by_label.get(label) {
            return *id;
        }
        let mut interner = self.interner.write();
        if let Some(id) = interner.by_label.get(label) {
            return *id;
        }
        let id = NodeId(interner.labels.len() as u32);
        let label: Arc<str> = Arc::from(label);
        interner.labels.push(label.clone());
        interner.by_label.insert(label, id);
        id
    }

    /// Looks up an existing label without creating it.
    pub fn lookup(&self, label: &str) -> Option<NodeId> {
        self.interner.read().by_label.get(label).copied()
    }

    /// Label of an interned node.
    pub fn label(&self, node: NodeId) -> Option<Arc<str>> {
        self.interner.read().labels.get(node.index()).cloned()
    }

    /// Label of `node`, or its numeric id when it is not interned here.
    pub fn describe(&self, node: NodeId) -> String {
        match self.label(node) {
            Some(label) => label.to_string(),
            None => format!("#{node}"),
        }
    }

    /// Number of interned labels.
    pub fn len(&self) -> usize {
        self.interner.read().labels.len()
    }

    /// Whether no label has been interned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Leases a context handle, reusing released ones first.
    pub fn acquire_context(&self) -> ContextLease {
        let mut slots = self.handles.lock();
        let raw = match slots.free.pop() {
            Some(raw) => raw,
            None => {
                let raw = slots.next;
                slots.next += 1;
                raw
            }
        };
        slots.live += 1;
        debug!(context = raw, live = slots.live, "registry.context.acquire");
        ContextLease {
            id: ContextId(raw),
            generation: slots.generation,
        }
    }

    /// Returns a handle to the free list. Leases from before a reset are ignored.
    pub fn release_context(&self, lease: ContextLease) {
        let mut slots = self.handles.lock();
        if lease.generation != slots.generation {
            return;
        }
        slots.free.push(lease.id.0);
        slots.live = slots.live.saturating_sub(1);
        debug!(context = lease.id.0, live = slots.live, "registry.context.release");
    }

    /// Number of context handles currently leased.
    pub fn live_contexts(&self) -> usize {
        self.handles.lock().live
    }

    /// Forgets every label and starts a new handle generation; the boundary
    /// between independent runs.
    ///
    /// Handles keep counting up across resets, so a context created afterwards
    /// never shares an id with one that outlived the reset.
    pub fn reset(&self) {
        let mut interner = self.interner.write();
        let mut slots = self.handles.lock();
        if slots.live > 0 {
            warn!(live = slots.live, "registry.reset.live_contexts");
        }
        *interner = Interner::default();
        // Handles held by live contexts stay unique; only the free list goes.
        slots.free.clear();
        slots.live = 0;
        slots.generation += 1;
    }

    /// Returns a snapshot of the registry state.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let labels = self.interner.read().labels.len();
        let slots = self.handles.lock();
        RegistrySnapshot {
            labels,
            live_contexts: slots.live,
            generation: slots.generation,
        }
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
