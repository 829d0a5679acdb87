//! The input to the expression builder: one Cypher pattern path, already
//! parsed and validated upstream. Cypher parsing and AST validation are a
//! separate collaborator's job; this crate assumes a validated path.
//!
//! This is a deliberately small surface — just enough structure for
//! [`crate::builder::build_path`] to lower a path into algebraic
//! expressions. It is not a general Cypher AST.

use graph_model::{LabelId, RelTypeId, SlotIdx};
use smallvec::SmallVec;

/// Traversal direction of a pattern edge, as written in the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `(a)-[e]->(b)`: adjacency read as stored, `b` depends on `a`.
    Outgoing,
    /// `(a)<-[e]-(b)`: adjacency read transposed.
    Incoming,
}

/// One node in the pattern, e.g. `(a:Person)`.
#[derive(Debug, Clone)]
pub struct PatternNode {
    /// Record slot this node is bound to, if the query references it by
    /// name; `None` is the Rust stand-in for the original's
    /// `NOT_IN_RECORD` sentinel.
    pub slot: Option<SlotIdx>,
    pub labels: SmallVec<[LabelId; 2]>,
}

impl PatternNode {
    pub fn new(slot: Option<SlotIdx>, labels: &[LabelId]) -> Self {
        Self {
            slot,
            labels: SmallVec::from_slice(labels),
        }
    }

    pub fn unlabeled(slot: Option<SlotIdx>) -> Self {
        Self::new(slot, &[])
    }
}

/// One edge in the pattern, e.g. `-[e:KNOWS*1..3]->`.
#[derive(Debug, Clone)]
pub struct PatternEdge {
    pub slot: Option<SlotIdx>,
    pub rel_types: SmallVec<[RelTypeId; 2]>,
    pub direction: Direction,
    pub min_hops: u32,
    pub max_hops: u32,
    /// Whether this edge carries a `*` quantifier at all. `min_hops ==
    /// max_hops == 1` with `variable_length == false` is an ordinary single
    /// hop; the same bounds with `variable_length == true` is `*1..1`,
    /// which behaves identically at the algebra layer but signals
    /// `pipeline::VarLenTraverse` rather than `ConditionalTraverse` should
    /// run it.
    pub variable_length: bool,
}

impl PatternEdge {
    pub fn single_hop(slot: Option<SlotIdx>, rel_types: &[RelTypeId], direction: Direction) -> Self {
        Self {
            slot,
            rel_types: SmallVec::from_slice(rel_types),
            direction,
            min_hops: 1,
            max_hops: 1,
            variable_length: false,
        }
    }

    pub fn variable_length(
        slot: Option<SlotIdx>,
        rel_types: &[RelTypeId],
        direction: Direction,
        min_hops: u32,
        max_hops: u32,
    ) -> Self {
        Self {
            slot,
            rel_types: SmallVec::from_slice(rel_types),
            direction,
            min_hops,
            max_hops,
            variable_length: true,
        }
    }
}

/// A chain of nodes and the edges between them: `nodes.len() == edges.len()
/// + 1`. Interior nodes/edges are the ones a downstream operator may need to
/// expose as a record slot; only those force a segment split.
#[derive(Debug, Clone)]
pub struct PatternPath {
    pub nodes: Vec<PatternNode>,
    pub edges: Vec<PatternEdge>,
}

impl PatternPath {
    pub fn new(nodes: Vec<PatternNode>, edges: Vec<PatternEdge>) -> Self {
        assert_eq!(nodes.len(), edges.len() + 1, "path nodes must outnumber edges by one");
        Self { nodes, edges }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
