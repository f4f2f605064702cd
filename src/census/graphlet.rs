use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::types::{GraphletError, Result};

/// Number of graphlet slots in a census vector.
pub const GRAPHLET_COUNT: usize = 9;

/// The connected graphlets on two, three and four nodes, in slot order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Graphlet {
    /// Single edge.
    Edge,
    /// Path on three nodes.
    OpenTriad,
    /// Three mutually adjacent nodes.
    Triangle,
    /// Path on four nodes.
    Path,
    /// One center joined to three leaves.
    Star,
    /// Chordless four-cycle.
    Cycle,
    /// Triangle with a pendant node.
    TailedTriangle,
    /// Four-cycle with one chord.
    Diamond,
    /// Complete graph on four nodes.
    Clique,
}

impl Graphlet {
    /// Every graphlet, in slot order.
    pub const ALL: [Graphlet; GRAPHLET_COUNT] = [
        Graphlet::Edge,
        Graphlet::OpenTriad,
        Graphlet::Triangle,
        Graphlet::Path,
        Graphlet::Star,
        Graphlet::Cycle,
        Graphlet::TailedTriangle,
        Graphlet::Diamond,
        Graphlet::Clique,
    ];

    /// Slot of this graphlet in a [`CensusVector`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Graphlet stored in `slot`.
    pub fn from_index(slot: usize) -> Option<Self> {
        Self::ALL.get(slot).copied()
    }

    /// How many nodes of one instance carry a tally for it.
    ///
    /// Summing per-node tallies and dividing by this yields the number of
    /// distinct instances.
    pub fn multiplicity(self) -> u64 {
        match self {
            Graphlet::Edge => 2,
            Graphlet::OpenTriad => 2,
            Graphlet::Triangle => 3,
            Graphlet::Path => 2,
            Graphlet::Star => 3,
            Graphlet::Cycle => 4,
            Graphlet::TailedTriangle => 1,
            Graphlet::Diamond => 2,
            Graphlet::Clique => 4,
        }
    }

    /// Number of nodes in the graphlet.
    pub fn order(self) -> usize {
        match self {
            Graphlet::Edge => 2,
            Graphlet::OpenTriad | Graphlet::Triangle => 3,
            _ => 4,
        }
    }

    /// Stable kebab-case name.
    pub fn name(self) -> &'static str {
        match self {
            Graphlet::Edge => "edge",
            Graphlet::OpenTriad => "open-triad",
            Graphlet::Triangle => "triangle",
            Graphlet::Path => "path",
            Graphlet::Star => "star",
            Graphlet::Cycle => "cycle",
            Graphlet::TailedTriangle => "tailed-triangle",
            Graphlet::Diamond => "diamond",
            Graphlet::Clique => "clique",
        }
    }
}

impl fmt::Display for Graphlet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-node graphlet tallies.
///
/// A node is tallied once per instance in which it holds the counted role:
/// degree for edges, endpoint for both paths, leaf for the star, tail for
/// the tailed triangle, chord endpoint for the diamond and plain membership
/// for the triangle, cycle and clique.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct CensusVector(pub [u64; GRAPHLET_COUNT]);

impl CensusVector {
    /// All-zero vector.
    pub const ZERO: CensusVector = CensusVector([0; GRAPHLET_COUNT]);

    /// Tally for `graphlet`.
    pub fn get(&self, graphlet: Graphlet) -> u64 {
        self.0[graphlet.index()]
    }

    /// Whether every tally is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0)
    }

    pub(crate) fn bump(&mut self, graphlet: Graphlet) {
        self.0[graphlet.index()] += 1;
    }

    pub(crate) fn drop_one(&mut self, graphlet: Graphlet) -> Result<()> {
        let slot = &mut self.0[graphlet.index()];
        *slot = slot
            .checked_sub(1)
            .ok_or(GraphletError::Invariant("graphlet tally below zero"))?;
        Ok(())
    }

    /// Raw tallies in slot order.
    pub fn as_array(&self) -> &[u64; GRAPHLET_COUNT] {
        &self.0
    }
}

impl Index<Graphlet> for CensusVector {
    type Output = u64;

    fn index(&self, graphlet: Graphlet) -> &u64 {
        &self.0[graphlet.index()]
    }
}

/// A classified induced subgraph and the positions that hold its tallied role.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Shape {
    /// The graphlet the nodes induce.
    pub graphlet: Graphlet,
    roles: u8,
}

impl Shape {
    fn new(graphlet: Graphlet, roles: u8) -> Self {
        Self { graphlet, roles }
    }

    /// Positions (into the classified node tuple) that receive a tally.
    pub fn members(self) -> impl Iterator<Item = usize> {
        (0..4).filter(move |pos| self.roles & (1 << pos) != 0)
    }
}

/// Node pairs of a triple, in the order `classify_triad` expects.
pub const TRIAD_PAIRS: [(usize, usize); 3] = [(0, 1), (0, 2), (1, 2)];

/// Node pairs of a quadruple, in the order `classify_quad` expects.
pub const QUAD_PAIRS: [(usize, usize); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];

fn degrees<const N: usize>(edges: &[bool], pairs: &[(usize, usize)]) -> ([u8; N], usize) {
    let mut degree = [0u8; N];
    let mut m = 0;
    for (&present, &(a, b)) in edges.iter().zip(pairs) {
        if present {
            degree[a] += 1;
            degree[b] += 1;
            m += 1;
        }
    }
    (degree, m)
}

fn mask_of<const N: usize>(degree: &[u8; N], wanted: u8) -> u8 {
    degree
        .iter()
        .enumerate()
        .filter(|(_, &d)| d == wanted)
        .fold(0, |mask, (pos, _)| mask | (1 << pos))
}

/// Classifies three nodes from the presence of their pairs ([`TRIAD_PAIRS`]).
///
/// Returns `None` when the triple is disconnected.
pub fn classify_triad(edges: [bool; 3]) -> Option<Shape> {
    let (degree, m) = degrees::<3>(&edges, &TRIAD_PAIRS);
    match m {
        2 => Some(Shape::new(Graphlet::OpenTriad, mask_of(&degree, 1))),
        3 => Some(Shape::new(Graphlet::Triangle, 0b111)),
        _ => None,
    }
}

/// Classifies four nodes from the presence of their pairs ([`QUAD_PAIRS`]).
///
/// Returns `None` when the quadruple is disconnected.
pub fn classify_quad(edges: [bool; 6]) -> Option<Shape> {
    let (degree, m) = degrees::<4>(&edges, &QUAD_PAIRS);
    let shape = match m {
        3 if degree.contains(&3) => Shape::new(Graphlet::Star, mask_of(&degree, 1)),
        // triangle plus an isolated node
        3 if degree.contains(&0) => return None,
        3 => Shape::new(Graphlet::Path, mask_of(&degree, 1)),
        4 if degree.iter().all(|&d| d == 2) => Shape::new(Graphlet::Cycle, 0b1111),
        4 => Shape::new(Graphlet::TailedTriangle, mask_of(&degree, 1)),
        5 => Shape::new(Graphlet::Diamond, mask_of(&degree, 3)),
        6 => Shape::new(Graphlet::Clique, 0b1111),
        _ => return None,
    };
    Some(shape)
}
