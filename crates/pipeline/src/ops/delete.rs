//! `Delete` (spec.md §4.3 "Writing operators", §8 scenario 6): stages
//! bound node/edge references for removal and commits them in one batch.
//! Deleting a node implicitly cascades to its incident edges at commit
//! time (`catalog::Graph::apply`) regardless of whether `DETACH DELETE`
//! was written — per spec.md §9, detach-vs-plain delete validation (erroring
//! on a non-detached delete of a node with live edges) is parse-time
//! semantic analysis, out of scope for this operator.

use crate::context::QueryContext;
use crate::expr::{eval, Expr};
use crate::record_stream::Operator;
use catalog::PendingMutations;
use graph_model::{GraphResult, Record, SIValue, SlotIdx};

pub struct Delete {
    child: Box<dyn Operator>,
    targets: Vec<Expr>,
    pending: PendingMutations,
    staged_records: Vec<Record>,
    drain_cursor: usize,
    ingested: bool,
}

impl Delete {
    pub fn new(child: Box<dyn Operator>, targets: Vec<Expr>) -> Self {
        Self {
            child,
            targets,
            pending: PendingMutations::default(),
            staged_records: Vec::new(),
            drain_cursor: 0,
            ingested: false,
        }
    }
}

impl Operator for Delete {
    fn init(&mut self, ctx: &mut QueryContext) -> GraphResult<()> {
        self.pending = PendingMutations::default();
        self.staged_records.clear();
        self.drain_cursor = 0;
        self.ingested = false;
        self.child.init(ctx)
    }

    fn consume(&mut self, ctx: &mut QueryContext) -> GraphResult<Option<Record>> {
        if !self.ingested {
            while let Some(record) = self.child.consume(ctx)? {
                for target in &self.targets {
                    match eval(target, &record, &ctx.graph)? {
                        SIValue::Node(n) => self.pending.node_deletes.push(n.id),
                        SIValue::Edge(e) => self.pending.edge_deletes.push(e.id),
                        SIValue::Null => {}
                        other => {
                            return Err(graph_model::GraphError::TypeMismatch(format!(
                                "DELETE target must be a node or edge, got {}",
                                other.type_name()
                            )))
                        }
                    }
                }
                self.staged_records.push(record);
            }
            tracing::debug!(
                nodes = self.pending.node_deletes.len(),
                edges = self.pending.edge_deletes.len(),
                "delete: acquiring commit lock for staged deletions"
            );
            let stats = ctx.graph.commit(std::mem::take(&mut self.pending))?;
            tracing::debug!(?stats, "delete: commit applied (cascading adjacent edges of deleted nodes)");
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
        Box::new(Self::new(self.child.clone_box(), self.targets.clone()))
    }

    fn modifies(&self) -> &[SlotIdx] {
        &[]
    }

    fn free(&mut self) {
        self.pending = PendingMutations::default();
        self.staged_records.clear();
        self.child.free();
    }
}
