//! `AllNodeScan`/`NodeByLabelScan`: the two leaves of every plan,
//! producing one record per live node.
//!
//! Grounded in `reasoning::transitive::TransitiveReasoner`'s simple
//! index-cursor-over-a-`Vec` iteration style, generalized from iterating
//! triples to iterating a pre-snapshotted list of node ids.

use crate::context::QueryContext;
use crate::record_stream::Operator;
use graph_model::{GraphResult, LabelId, NodeId, NodeRef, Record, SIValue, SlotIdx};

/// Emit one record per live node, binding it into `slot`.
#[derive(Clone)]
pub struct AllNodeScan {
    slot: SlotIdx,
    record_width: usize,
    ids: Vec<NodeId>,
    cursor: usize,
}

impl AllNodeScan {
    pub fn new(slot: SlotIdx, record_width: usize) -> Self {
        Self {
            slot,
            record_width,
            ids: Vec::new(),
            cursor: 0,
        }
    }
}

impl Operator for AllNodeScan {
    fn init(&mut self, ctx: &mut QueryContext) -> GraphResult<()> {
        self.ids = ctx.graph.all_node_ids();
        self.cursor = 0;
        Ok(())
    }

    fn consume(&mut self, _ctx: &mut QueryContext) -> GraphResult<Option<Record>> {
        let Some(&id) = self.ids.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        let mut record = Record::with_width(self.record_width);
        record.set(self.slot, SIValue::Node(NodeRef::new(id)));
        Ok(Some(record))
    }

    fn reset(&mut self) -> GraphResult<()> {
        self.cursor = 0;
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }

    fn modifies(&self) -> &[SlotIdx] {
        std::slice::from_ref(&self.slot)
    }
}

/// Emit one record per live node carrying `label`, binding it into `slot`.
#[derive(Clone)]
pub struct NodeByLabelScan {
    slot: SlotIdx,
    label: LabelId,
    record_width: usize,
    ids: Vec<NodeId>,
    cursor: usize,
}

impl NodeByLabelScan {
    pub fn new(slot: SlotIdx, label: LabelId, record_width: usize) -> Self {
        Self {
            slot,
            label,
            record_width,
            ids: Vec::new(),
            cursor: 0,
        }
    }
}

impl Operator for NodeByLabelScan {
    fn init(&mut self, ctx: &mut QueryContext) -> GraphResult<()> {
        self.ids = ctx.graph.node_ids_with_label(self.label);
        self.cursor = 0;
        Ok(())
    }

    fn consume(&mut self, _ctx: &mut QueryContext) -> GraphResult<Option<Record>> {
        let Some(&id) = self.ids.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        let mut record = Record::with_width(self.record_width);
        record.set(self.slot, SIValue::Node(NodeRef::new(id)));
        Ok(Some(record))
    }

    fn reset(&mut self) -> GraphResult<()> {
        self.cursor = 0;
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }

    fn modifies(&self) -> &[SlotIdx] {
        std::slice::from_ref(&self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{Graph, PendingMutations, PendingNode, RuntimeConfig};
    use std::sync::Arc;

    fn two_node_graph() -> (Graph, LabelId) {
        let g = Graph::default();
        let label = g.labels().intern("Person");
        let a = g.reserve_node_id();
        let b = g.reserve_node_id();
        let mut pending = PendingMutations::default();
        pending.node_creates.push(PendingNode {
            id: a,
            labels: smallvec::smallvec![label],
            properties: Default::default(),
        });
        pending.node_creates.push(PendingNode {
            id: b,
            labels: Default::default(),
            properties: Default::default(),
        });
        g.commit(pending).unwrap();
        (g, label)
    }

    #[test]
    fn all_node_scan_visits_every_node_once() {
        let (g, _) = two_node_graph();
        let mut ctx = QueryContext::new(Arc::new(g), RuntimeConfig::default());
        let mut op = AllNodeScan::new(0, 1);
        let out = crate::record_stream::run(&mut op, &mut ctx).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn node_by_label_scan_filters_to_matching_label() {
        let (g, label) = two_node_graph();
        let mut ctx = QueryContext::new(Arc::new(g), RuntimeConfig::default());
        let mut op = NodeByLabelScan::new(0, label, 1);
        let out = crate::record_stream::run(&mut op, &mut ctx).unwrap();
        assert_eq!(out.len(), 1);
    }
}
