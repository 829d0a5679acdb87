//! The algebraic expression IR: either
//! an *operand* (a matrix reference plus `transpose`/`ownership` flags) or
//! an *operation* node (`MUL`, `ADD`, `TRANSPOSE`) with up to two children.
//!
//! Grounded in `sparql::algebra::Algebra`'s shape — an owned tree of
//! boxed variants, one per operator kind, each field individually
//! doc-commented — generalized from a borrowed RDF-query AST to an owned
//! tree of resolved catalog matrices, since an algebraic expression here is
//! built once per query against a pinned catalog snapshot rather than
//! parsed fresh from source text each time.

use graph_model::{RelTypeId, SlotIdx};
use matrix::{Matrix, Ownership};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Where an operand's matrix comes from in the catalog. Kept alongside the
/// resolved matrix (rather than re-looked-up at eval time) purely for
/// diagnostics — `EXPLAIN`-style plan printing wants to say "label
/// selector for :Person", not just "some 40000x40000 boolean matrix".
#[derive(Debug, Clone)]
pub enum OperandSource {
    /// Diagonal label-selector matrix.
    Label(graph_model::LabelId),
    /// A single relation type's adjacency matrix.
    Adjacency(RelTypeId),
    /// `R1 ⊕ R2 ⊕ ...`, pre-built by the builder for `-[:R1|:R2]->` as a
    /// single element-wise-OR'd operand.
    MultiRelation(SmallVec<[RelTypeId; 4]>),
    /// `L1 ⊗ L2 ⊗ ...`, pre-built for a multi-label node pattern
    /// (`(a:A:B)`), which narrows by intersection rather than union.
    LabelIntersection(SmallVec<[graph_model::LabelId; 2]>),
    /// A frontier vector bound in by the consuming operator at evaluation
    /// time — `ConditionalTraverse`'s leftmost operand, derived from the
    /// child record. The algebra crate
    /// never materializes this itself; [`crate::eval::execute`] takes it as
    /// a parameter and substitutes it for this leaf.
    Frontier,
}

/// A matrix-valued leaf of an expression tree.
///
/// Wraps [`matrix::Operand`] for its lazy-transpose-once-and-cache
/// behavior — an operand with `transpose = true` is transposed once, in
/// place, on first use, then the flag is cleared for subsequent re-entries
/// — behind a `RefCell` so the surrounding expression tree can be
/// evaluated through a shared reference.
pub struct Operand {
    pub source: OperandSource,
    inner: RefCell<Option<matrix::Operand<bool>>>,
}

impl Operand {
    pub fn new(source: OperandSource, base: Arc<Matrix<bool>>, transpose: bool) -> Self {
        Self {
            source,
            inner: RefCell::new(Some(matrix::Operand::new(base, transpose, Ownership::Borrowed))),
        }
    }

    /// A frontier placeholder: has no catalog-backed matrix until
    /// [`crate::eval::execute`] binds one in for this query.
    pub fn frontier() -> Self {
        Self {
            source: OperandSource::Frontier,
            inner: RefCell::new(None),
        }
    }

    pub fn is_frontier(&self) -> bool {
        matches!(self.source, OperandSource::Frontier)
    }

    pub fn wants_transpose(&self) -> bool {
        self.inner
            .borrow()
            .as_ref()
            .map(matrix::Operand::wants_transpose)
            .unwrap_or(false)
    }

    /// Bind a concrete frontier matrix into this (necessarily
    /// [`OperandSource::Frontier`]) leaf for the duration of one
    /// evaluation.
    pub fn bind_frontier(&self, frontier: Arc<Matrix<bool>>) {
        debug_assert!(self.is_frontier());
        *self.inner.borrow_mut() = Some(matrix::Operand::new(frontier, false, Ownership::Borrowed));
    }

    pub fn resolve(&self) -> Arc<Matrix<bool>> {
        let mut guard = self.inner.borrow_mut();
        let op = guard
            .as_mut()
            .expect("operand resolved before its frontier was bound");
        op.resolve()
    }

    /// Flip the transpose flag in place — used by the transpose-hoisting
    /// rewrite when it pushes a `TRANSPOSE` node down onto a leaf
    /// (`(Aᵀ)ᵀ = A` cancels; otherwise the flag just flips).
    pub fn toggle_transpose(&self) {
        if let Some(op) = self.inner.borrow_mut().as_mut() {
            op.toggle_transpose();
        }
    }
}

/// The binary/unary structural operators an expression tree is built from.
pub enum ExprNode {
    Operand(Operand),
    Mul(Box<ExprNode>, Box<ExprNode>),
    Add(Box<ExprNode>, Box<ExprNode>),
    Transpose(Box<ExprNode>),
    /// Marks a subtree the sum-of-products rewrite duplicated across two
    /// branches, so evaluation materializes it once rather than twice.
    /// Both branches hold the same `Rc`,
    /// so the second evaluation hits the cache instead of recomputing.
    Shared(Rc<SharedNode>),
}

pub struct SharedNode {
    pub node: ExprNode,
    cache: RefCell<Option<Arc<Matrix<bool>>>>,
}

impl SharedNode {
    pub fn new(node: ExprNode) -> Rc<Self> {
        Rc::new(Self {
            node,
            cache: RefCell::new(None),
        })
    }

    pub fn cached(&self) -> Option<Arc<Matrix<bool>>> {
        self.cache.borrow().clone()
    }

    pub fn store(&self, value: Arc<Matrix<bool>>) {
        *self.cache.borrow_mut() = Some(value);
    }
}

/// One intermediate segment of a lowered pattern path — segments are
/// split at any interior referenced node or edge — carrying the semantic
/// metadata that accompanies the structural tree.
pub struct AlgebraicExpression {
    pub root: ExprNode,

    /// Position of this segment's source/destination node within the
    /// original pattern path (not a graph node id — the pattern is
    /// compiled once and evaluated against many different bound frontiers).
    pub src_node: PatternNodeIdx,
    pub dest_node: PatternNodeIdx,
    /// Index of the semantic edge traversed by this expression within the
    /// original pattern, if this segment corresponds to exactly one edge.
    pub edge: Option<usize>,

    pub src_node_idx: Option<SlotIdx>,
    pub dest_node_idx: Option<SlotIdx>,
    pub edge_idx: Option<SlotIdx>,

    pub min_hops: u32,
    pub max_hops: u32,

    /// Relation ids traversed by this segment — used to reconstruct a
    /// concrete edge reference when the edge must be reported.
    pub relation_ids: SmallVec<[RelTypeId; 4]>,
}

impl AlgebraicExpression {
    pub fn is_variable_length(&self) -> bool {
        self.min_hops != 1 || self.max_hops != 1
    }
}

/// Index of a node within a [`crate::pattern::PatternPath`] — never a
/// graph node id, which only exists once a query actually runs.
pub type PatternNodeIdx = usize;
