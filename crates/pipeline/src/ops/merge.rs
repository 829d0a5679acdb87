//! `Merge`: run a match subtree once per upstream row; if it yields any
//! rows, apply the `ON MATCH` update dictionary to each and pass them
//! through, otherwise run the create templates once and apply the
//! `ON CREATE` dictionary to the freshly created row.
//!
//! Keeps separate `ON MATCH`/`ON CREATE` property dictionaries rather than
//! one shared update list, since the two branches bind different slots.
//!
//! Scope note: the match subtree is evaluated independently of which
//! upstream row is driving it (it is re-run via `reset()`/drain for every
//! upstream row, but does not itself read that row's bound slots). This
//! covers `MERGE` as a query's own entry clause — `MERGE (n:Label
//! {key: $val})` — which is by far the common case; a `MERGE` whose match
//! pattern references a variable bound earlier in the same query would
//! need the planner to thread that binding into the match subtree's scan,
//! which is a planner-level concern this crate's operator library does not
//! own.

use crate::context::QueryContext;
use crate::expr::{eval, Expr};
use crate::ops::create::{EdgeCreateCtx, NodeCreateCtx};
use crate::record_stream::Operator;
use catalog::{EntityRef, PendingEdge, PendingMutations, PendingNode, PropertyUpdate};
use graph_model::{EdgeRef, GraphResult, NodeRef, Record, SIValue, SlotIdx};

pub struct Merge {
    child: Box<dyn Operator>,
    matcher: Box<dyn Operator>,
    on_match: Vec<(SlotIdx, graph_model::PropertyKeyId, Expr)>,
    create_nodes: Vec<NodeCreateCtx>,
    create_edges: Vec<EdgeCreateCtx>,
    on_create: Vec<(SlotIdx, graph_model::PropertyKeyId, Expr)>,
    output_width: usize,
    staged_records: Vec<Record>,
    drain_cursor: usize,
    ingested: bool,
}

impl Merge {
    pub fn new(
        child: Box<dyn Operator>,
        matcher: Box<dyn Operator>,
        on_match: Vec<(SlotIdx, graph_model::PropertyKeyId, Expr)>,
        create_nodes: Vec<NodeCreateCtx>,
        create_edges: Vec<EdgeCreateCtx>,
        on_create: Vec<(SlotIdx, graph_model::PropertyKeyId, Expr)>,
        output_width: usize,
    ) -> Self {
        Self {
            child,
            matcher,
            on_match,
            create_nodes,
            create_edges,
            on_create,
            output_width,
            staged_records: Vec::new(),
            drain_cursor: 0,
            ingested: false,
        }
    }

    fn entity_ref(value: &SIValue) -> Option<EntityRef> {
        match value {
            SIValue::Node(n) => Some(EntityRef::Node(n.id)),
            SIValue::Edge(e) => Some(EntityRef::Edge(e.id)),
            _ => None,
        }
    }
}

impl Operator for Merge {
    fn init(&mut self, ctx: &mut QueryContext) -> GraphResult<()> {
        self.staged_records.clear();
        self.drain_cursor = 0;
        self.ingested = false;
        self.matcher.init(ctx)?;
        self.child.init(ctx)
    }

    fn consume(&mut self, ctx: &mut QueryContext) -> GraphResult<Option<Record>> {
        if !self.ingested {
            let mut pending = PendingMutations::default();

            while let Some(mut record) = self.child.consume(ctx)? {
                record.ensure_width(self.output_width);

                self.matcher.reset()?;
                let mut matches = Vec::new();
                while let Some(m) = self.matcher.consume(ctx)? {
                    matches.push(m);
                }

                if !matches.is_empty() {
                    for matched in matches {
                        let mut out = record.clone();
                        out.ensure_width(self.output_width);
                        for (slot, key, expr) in &self.on_match {
                            let Some(entity) = Self::entity_ref(matched.get(*slot)) else {
                                continue;
                            };
                            out.set(*slot, matched.get(*slot).clone());
                            let value = eval(expr, &matched, &ctx.graph)?;
                            pending.property_updates.push(PropertyUpdate::Set { entity, key: *key, value });
                        }
                        self.staged_records.push(out);
                    }
                    continue;
                }

                for node in &self.create_nodes {
                    let id = ctx.graph.reserve_node_id();
                    let properties = node
                        .properties
                        .iter()
                        .map(|(k, e)| Ok((*k, eval(e, &record, &ctx.graph)?)))
                        .collect::<GraphResult<_>>()?;
                    pending.node_creates.push(PendingNode { id, labels: node.labels.clone(), properties });
                    record.set(node.dest_slot, SIValue::Node(NodeRef::new(id)));
                }
                for edge in &self.create_edges {
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
                    pending.edge_creates.push(PendingEdge { id, rel_type: edge.rel_type, src, dest, properties });
                    record.set(edge.dest_slot, SIValue::Edge(EdgeRef { id, rel_type: edge.rel_type, src, dest }));
                }
                for (slot, key, expr) in &self.on_create {
                    let Some(entity) = Self::entity_ref(record.get(*slot)) else {
                        continue;
                    };
                    let value = eval(expr, &record, &ctx.graph)?;
                    pending.property_updates.push(PropertyUpdate::Set { entity, key: *key, value });
                }
                self.staged_records.push(record);
            }

            tracing::debug!(records = self.staged_records.len(), "merge: acquiring commit lock for staged ON MATCH/ON CREATE mutations");
            let stats = ctx.graph.commit(pending)?;
            tracing::debug!(?stats, "merge: commit applied");
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
        self.staged_records.clear();
        self.drain_cursor = 0;
        self.ingested = false;
        self.matcher.reset()?;
        self.child.reset()
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(Self::new(
            self.child.clone_box(),
            self.matcher.clone_box(),
            self.on_match.clone(),
            self.create_nodes.clone(),
            self.create_edges.clone(),
            self.on_create.clone(),
            self.output_width,
        ))
    }

    fn modifies(&self) -> &[SlotIdx] {
        &[]
    }

    fn free(&mut self) {
        self.staged_records.clear();
        self.matcher.free();
        self.child.free();
    }
}
