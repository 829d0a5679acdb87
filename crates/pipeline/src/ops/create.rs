//! `Create` (spec.md §4.3 "Writing operators"): a node/edge creation
//! template evaluated once per input record, staged into a
//! [`catalog::PendingMutations`] buffer, and committed in one batch once
//! the child is exhausted — the shared two-phase (ingest → commit) write
//! discipline every writing operator in this module follows.
//!
//! Grounded in `op_create.c`'s "build the whole batch, then commit it in
//! one pass" structure.

use crate::context::QueryContext;
use crate::expr::{eval, Expr};
use crate::record_stream::Operator;
use catalog::{PendingEdge, PendingMutations, PendingNode};
use graph_model::{EdgeRef, GraphResult, LabelId, NodeRef, PropertyKeyId, RelTypeId, Record, SIValue, SlotIdx};
use smallvec::SmallVec;

/// A node template: `(n:Label1:Label2 {prop: expr, ...})`.
#[derive(Clone)]
pub struct NodeCreateCtx {
    pub dest_slot: SlotIdx,
    pub labels: SmallVec<[LabelId; 4]>,
    pub properties: Vec<(PropertyKeyId, Expr)>,
}

/// An edge template: `(src_slot)-[e:Rel {prop: expr, ...}]->(dest_slot)`.
/// Both endpoints must already be bound — either by an earlier node
/// template in the same `Create`, or by an upstream operator.
#[derive(Clone)]
pub struct EdgeCreateCtx {
    pub dest_slot: SlotIdx,
    pub rel_type: RelTypeId,
    pub src_slot: SlotIdx,
    pub target_slot: SlotIdx,
    pub properties: Vec<(PropertyKeyId, Expr)>,
}

pub struct Create {
    child: Box<dyn Operator>,
    nodes: Vec<NodeCreateCtx>,
    edges: Vec<EdgeCreateCtx>,
    output_width: usize,
    pending: PendingMutations,
    staged_records: Vec<Record>,
    drain_cursor: usize,
    ingested: bool,
}

impl Create {
    pub fn new(child: Box<dyn Operator>, nodes: Vec<NodeCreateCtx>, edges: Vec<EdgeCreateCtx>, output_width: usize) -> Self {
        Self {
            child,
            nodes,
            edges,
            output_width,
            pending: PendingMutations::default(),
            staged_records: Vec::new(),
            drain_cursor: 0,
            ingested: false,
        }
    }
}

impl Operator for Create {
    fn init(&mut self, ctx: &mut QueryContext) -> GraphResult<()> {
        self.pending = PendingMutations::default();
        self.staged_records.clear();
        self.drain_cursor = 0;
        self.ingested = false;
        self.child.init(ctx)
    }

    fn consume(&mut self, ctx: &mut QueryContext) -> GraphResult<Option<Record>> {
        if !self.ingested {
            while let Some(mut record) = self.child.consume(ctx)? {
                record.ensure_width(self.output_width);

                for node in &self.nodes {
                    let id = ctx.graph.reserve_node_id();
                    let properties = node
                        .properties
                        .iter()
                        .map(|(k, e)| Ok((*k, eval(e, &record, &ctx.graph)?)))
                        .collect::<GraphResult<_>>()?;
                    self.pending.node_creates.push(PendingNode {
                        id,
                        labels: node.labels.clone(),
                        properties,
                    });
                    record.set(node.dest_slot, SIValue::Node(NodeRef::new(id)));
                }

                for edge in &self.edges {
                    let src = match record.get(edge.src_slot) {
                        SIValue::Node(n) => n.id,
                        _ => continue,
                    };
                    let dest = match record.get(edge.target_slot) {
                        SIValue::Node(n) => n.id,
                        _ => continue,
                    };
                    let id = ctx.graph.reserve_edge_id();
                    let properties = edge
                        .properties
                        .iter()
                        .map(|(k, e)| Ok((*k, eval(e, &record, &ctx.graph)?)))
                        .collect::<GraphResult<_>>()?;
                    self.pending.edge_creates.push(PendingEdge {
                        id,
                        rel_type: edge.rel_type,
                        src,
                        dest,
                        properties,
                    });
                    record.set(
                        edge.dest_slot,
                        SIValue::Edge(EdgeRef { id, rel_type: edge.rel_type, src, dest }),
                    );
                }

                self.staged_records.push(record);
            }

            tracing::debug!(
                nodes = self.staged_records.len(),
                "create: acquiring commit lock to stage templated node/edge creates"
            );
            let stats = ctx.graph.commit(std::mem::take(&mut self.pending))?;
            tracing::debug!(?stats, "create: commit applied");
            ctx.record_commit(stats);
            self.ingested = true;
        }

        let Some(record) = self.staged_records.get(self.drain_cursor).cloned() else {
            return Ok(None);
        };
        self.drain_cursor += 1;
        Ok(Some(record))
    }

    fn reset(&mut self) -> GraphResult<()> {
        self.pending = PendingMutations::default();
        self.staged_records.clear();
        self.drain_cursor = 0;
        self.ingested = false;
        self.child.reset()
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(Self::new(self.child.clone_box(), self.nodes.clone(), self.edges.clone(), self.output_width))
    }

    fn modifies(&self) -> &[SlotIdx] {
        &[]
    }

    fn free(&mut self) {
        // Staged-but-uncommitted mutations are simply dropped: nothing was
        // ever written to the graph (spec.md §7 "not touch the graph at
        // all" on the error path).
        self.pending = PendingMutations::default();
        self.staged_records.clear();
        self.child.free();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{Graph, RuntimeConfig};
    use std::sync::Arc;

    #[test]
    fn create_stages_then_commits_in_one_batch() {
        let g = Arc::new(Graph::default());
        let label = g.labels().intern("Person");
        let mut ctx = QueryContext::new(g.clone(), RuntimeConfig::default());

        // A bare `CREATE` with no preceding `MATCH` runs its body exactly once.
        struct SingleRow(bool);
        impl Operator for SingleRow {
            fn consume(&mut self, _ctx: &mut QueryContext) -> GraphResult<Option<Record>> {
                if self.0 {
                    self.0 = false;
                    Ok(Some(Record::with_width(1)))
                } else {
                    Ok(None)
                }
            }
            fn reset(&mut self) -> GraphResult<()> {
                self.0 = true;
                Ok(())
            }
            fn clone_box(&self) -> Box<dyn Operator> {
                Box::new(SingleRow(true))
            }
            fn modifies(&self) -> &[SlotIdx] {
                &[]
            }
        }

        let node = NodeCreateCtx {
            dest_slot: 0,
            labels: smallvec::smallvec![label],
            properties: vec![],
        };
        let mut op = Create::new(Box::new(SingleRow(true)), vec![node], vec![], 1);
        let out = crate::record_stream::run(&mut op, &mut ctx).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(ctx.stats().nodes_created, 1);
        assert_eq!(g.node_ids_with_label(label).len(), 1);
    }
}
