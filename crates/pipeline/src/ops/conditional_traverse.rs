//! `ConditionalTraverse` (spec.md §4.3 "Traversal operators"): for each
//! child record, binds a singleton frontier at the currently-matched source
//! node, evaluates the segment's algebraic expression, and fans out one
//! record per reached destination.
//!
//! Grounded in `wcoj::leapfrog::LeapfrogIterator`'s "hold a pending
//! iterator, drain it before pulling the next input row" shape, generalized
//! from a multi-relation leapfrog join to a single traversal segment.

use crate::context::QueryContext;
use crate::record_stream::Operator;
use algebra::AlgebraicExpression;
use graph_model::{GraphResult, NodeId, NodeRef, RelTypeId, SIValue, SlotIdx};
use matrix::{Index, Matrix};
use smallvec::SmallVec;
use std::sync::Arc;

/// One traversal leg: `(src_slot) -[relation_ids*]-> (dest_slot)`, with an
/// optional edge slot to report the crossed relationship.
pub struct ConditionalTraverse {
    child: Box<dyn Operator>,
    expr: Arc<AlgebraicExpression>,
    src_slot: SlotIdx,
    dest_slot: SlotIdx,
    edge_slot: Option<SlotIdx>,
    relation_ids: SmallVec<[RelTypeId; 4]>,
    pending: Option<PendingExpansion>,
    modifies: SmallVec<[SlotIdx; 2]>,
}

struct PendingExpansion {
    record: graph_model::Record,
    src_id: NodeId,
    dests: Vec<(Index, bool)>,
    cursor: usize,
}

impl ConditionalTraverse {
    pub fn new(
        child: Box<dyn Operator>,
        expr: Arc<AlgebraicExpression>,
        src_slot: SlotIdx,
        dest_slot: SlotIdx,
        edge_slot: Option<SlotIdx>,
        relation_ids: SmallVec<[RelTypeId; 4]>,
    ) -> Self {
        let mut modifies = SmallVec::from_slice(&[dest_slot]);
        if let Some(e) = edge_slot {
            modifies.push(e);
        }
        Self {
            child,
            expr,
            src_slot,
            dest_slot,
            edge_slot,
            relation_ids,
            pending: None,
            modifies,
        }
    }

    fn next_from_pending(&mut self) -> Option<graph_model::Record> {
        let pending = self.pending.as_mut()?;
        while let Some(&(dest_id, reached)) = pending.dests.get(pending.cursor) {
            pending.cursor += 1;
            if !reached {
                continue;
            }
            let mut record = pending.record.clone();
            record.set(self.dest_slot, SIValue::Node(NodeRef::new(dest_id as NodeId)));
            return Some(record);
        }
        self.pending = None;
        None
    }
}

impl Operator for ConditionalTraverse {
    fn init(&mut self, ctx: &mut QueryContext) -> GraphResult<()> {
        self.child.init(ctx)
    }

    fn consume(&mut self, ctx: &mut QueryContext) -> GraphResult<Option<graph_model::Record>> {
        loop {
            if let Some(mut record) = self.next_from_pending() {
                if let Some(edge_slot) = self.edge_slot {
                    let src_id = self.pending.as_ref().map(|p| p.src_id);
                    if let (Some(src_id), SIValue::Node(dest)) = (src_id, record.get(self.dest_slot).clone()) {
                        if let Some(edge) = ctx.graph.find_edge(src_id, dest.id, &self.relation_ids) {
                            record.set(edge_slot, SIValue::Edge(edge));
                        }
                    }
                }
                return Ok(Some(record));
            }

            match self.child.consume(ctx)? {
                None => return Ok(None),
                Some(record) => {
                    let SIValue::Node(src) = record.get(self.src_slot).clone() else {
                        // An unbound or non-node source yields no destinations for this leg.
                        continue;
                    };
                    let n = ctx.graph.node_capacity().max(src.id as usize + 1);
                    let frontier = {
                        let idx = vec![src.id as usize];
                        Arc::new(matrix::build(n, n, &idx, &idx, &vec![true], |a, b| *a || *b))
                    };
                    let sauna = ctx.sauna();
                    let dest_matrix: Arc<Matrix<bool>> = algebra::execute(&self.expr, frontier, sauna)?;
                    let dests = dest_matrix.column(src.id as usize);
                    self.pending = Some(PendingExpansion {
                        record,
                        src_id: src.id,
                        dests,
                        cursor: 0,
                    });
                }
            }
        }
    }

    fn reset(&mut self) -> GraphResult<()> {
        self.pending = None;
        self.child.reset()
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(Self {
            child: self.child.clone_box(),
            expr: self.expr.clone(),
            src_slot: self.src_slot,
            dest_slot: self.dest_slot,
            edge_slot: self.edge_slot,
            relation_ids: self.relation_ids.clone(),
            pending: None,
            modifies: self.modifies.clone(),
        })
    }

    fn modifies(&self) -> &[SlotIdx] {
        &self.modifies
    }

    fn free(&mut self) {
        self.pending = None;
        self.child.free();
    }
}
