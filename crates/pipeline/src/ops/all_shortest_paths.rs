//! `AllShortestPaths` (spec.md §4.3 "AllShortestPaths"): given two already-
//! bound endpoint nodes, yields one record per distinct path achieving the
//! shortest hop count between them. Valid only as a `WITH`/`RETURN`
//! projection expression — a planner-level restriction upstream of this
//! operator, not enforced here. Minimum hop count is fixed at `1`: a
//! source equal to its destination never yields the trivial zero-length
//! path, matching `op_all_shortest_paths.c`'s refusal to treat identical
//! endpoints as already "found."
//!
//! Unlike `VarLenTraverse`'s bounded-depth DFS, this is a level-synchronous
//! BFS that tracks every predecessor reached at a node's shortest distance,
//! stopping the moment the destination's level is fully expanded, then
//! reconstructs every tied-shortest path backward from the destination.

use crate::context::QueryContext;
use crate::record_stream::Operator;
use graph_model::{GraphResult, NodeId, NodeRef, Path, Record, RelTypeId, SIValue, SlotIdx};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::var_len_traverse::TraverseDirection;

pub struct AllShortestPaths {
    child: Box<dyn Operator>,
    src_slot: SlotIdx,
    dest_slot: SlotIdx,
    path_slot: SlotIdx,
    rel_types: SmallVec<[RelTypeId; 4]>,
    direction: TraverseDirection,
    max_hops: Option<u32>,
    pending: Vec<Record>,
    pending_cursor: usize,
}

impl AllShortestPaths {
    pub fn new(
        child: Box<dyn Operator>,
        src_slot: SlotIdx,
        dest_slot: SlotIdx,
        path_slot: SlotIdx,
        rel_types: SmallVec<[RelTypeId; 4]>,
        direction: TraverseDirection,
        max_hops: Option<u32>,
    ) -> Self {
        Self {
            child,
            src_slot,
            dest_slot,
            path_slot,
            rel_types,
            direction,
            max_hops,
            pending: Vec::new(),
            pending_cursor: 0,
        }
    }

    fn neighbors(&self, ctx: &QueryContext, node: NodeId) -> Vec<NodeId> {
        match self.direction {
            TraverseDirection::Outgoing => ctx.graph.out_neighbors(node, &self.rel_types),
            TraverseDirection::Incoming => ctx.graph.in_neighbors(node, &self.rel_types),
        }
    }

    fn shortest_paths(&self, ctx: &QueryContext, src: NodeId, dest: NodeId) -> Vec<Vec<NodeId>> {
        if src == dest {
            return Vec::new();
        }

        let mut preds: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
        let mut visited_at: FxHashMap<NodeId, u32> = FxHashMap::default();
        visited_at.insert(src, 0);
        let mut frontier = vec![src];
        let mut hop = 0u32;
        let mut dest_hop = None;

        while !frontier.is_empty() {
            hop += 1;
            if let Some(cap) = self.max_hops {
                if hop > cap {
                    break;
                }
            }
            let mut next_level: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
            for &node in &frontier {
                for neighbor in self.neighbors(ctx, node) {
                    match visited_at.get(&neighbor) {
                        None => next_level.entry(neighbor).or_default().push(node),
                        Some(&d) if d == hop => next_level.entry(neighbor).or_default().push(node),
                        _ => {}
                    }
                }
            }
            if next_level.is_empty() {
                break;
            }
            for (&node, ps) in &next_level {
                visited_at.entry(node).or_insert(hop);
                preds.entry(node).or_default().extend(ps.iter().copied());
            }
            if next_level.contains_key(&dest) {
                dest_hop = Some(hop);
                break;
            }
            frontier = next_level.keys().copied().collect();
        }

        let Some(_) = dest_hop else {
            return Vec::new();
        };

        let mut out = Vec::new();
        let mut stack = vec![vec![dest]];
        while let Some(partial) = stack.pop() {
            let head = *partial.last().expect("path non-empty");
            if head == src {
                let mut path = partial;
                path.reverse();
                out.push(path);
                continue;
            }
            for &pred in preds.get(&head).into_iter().flatten() {
                let mut extended = partial.clone();
                extended.push(pred);
                stack.push(extended);
            }
        }
        out
    }

    fn emit(&self, record: &Record, dest: NodeId, path: &[NodeId]) -> Record {
        let mut out = record.clone();
        out.set(self.dest_slot, SIValue::Node(NodeRef::new(dest)));
        let nodes = path.iter().map(|&id| NodeRef::new(id)).collect();
        out.set(self.path_slot, SIValue::Path(std::sync::Arc::new(Path { nodes, edges: Vec::new() })));
        out
    }
}

impl Operator for AllShortestPaths {
    fn init(&mut self, ctx: &mut QueryContext) -> GraphResult<()> {
        self.pending.clear();
        self.pending_cursor = 0;
        self.child.init(ctx)
    }

    fn consume(&mut self, ctx: &mut QueryContext) -> GraphResult<Option<Record>> {
        loop {
            if let Some(record) = self.pending.get(self.pending_cursor).cloned() {
                self.pending_cursor += 1;
                return Ok(Some(record));
            }
            self.pending.clear();
            self.pending_cursor = 0;

            match self.child.consume(ctx)? {
                None => return Ok(None),
                Some(record) => {
                    let (SIValue::Node(src), SIValue::Node(dest)) = (record.get(self.src_slot).clone(), record.get(self.dest_slot).clone()) else {
                        continue;
                    };
                    let paths = self.shortest_paths(ctx, src.id, dest.id);
                    self.pending = paths.iter().map(|p| self.emit(&record, dest.id, p)).collect();
                }
            }
        }
    }

    fn reset(&mut self) -> GraphResult<()> {
        self.pending.clear();
        self.pending_cursor = 0;
        self.child.reset()
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(Self::new(
            self.child.clone_box(),
            self.src_slot,
            self.dest_slot,
            self.path_slot,
            self.rel_types.clone(),
            self.direction,
            self.max_hops,
        ))
    }

    fn modifies(&self) -> &[SlotIdx] {
        std::slice::from_ref(&self.path_slot)
    }

    fn free(&mut self) {
        self.pending.clear();
        self.child.free();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{Graph, PendingEdge, PendingMutations, PendingNode, RuntimeConfig};
    use std::sync::Arc;

    /// Diamond: a -> b -> d, a -> c -> d. Two shortest (length-2) paths.
    fn diamond_graph() -> (Graph, RelTypeId) {
        let g = Graph::default();
        let rel = g.reltypes().intern("EDGE");
        let ids: Vec<NodeId> = (0..4).map(|_| g.reserve_node_id()).collect();
        let mut pending = PendingMutations::default();
        for &id in &ids {
            pending.node_creates.push(PendingNode { id, labels: Default::default(), properties: Default::default() });
        }
        for (from, to) in [(0, 1), (0, 2), (1, 3), (2, 3)] {
            pending.edge_creates.push(PendingEdge {
                id: g.reserve_edge_id(),
                rel_type: rel,
                src: ids[from],
                dest: ids[to],
                properties: Default::default(),
            });
        }
        g.commit(pending).unwrap();
        (g, rel)
    }

    struct SingleRow(bool, NodeId, NodeId);
    impl Operator for SingleRow {
        fn consume(&mut self, _ctx: &mut QueryContext) -> GraphResult<Option<Record>> {
            if self.0 {
                self.0 = false;
                let mut r = Record::with_width(3);
                r.set(0, SIValue::Node(NodeRef::new(self.1)));
                r.set(1, SIValue::Node(NodeRef::new(self.2)));
                Ok(Some(r))
            } else {
                Ok(None)
            }
        }
        fn reset(&mut self) -> GraphResult<()> {
            self.0 = true;
            Ok(())
        }
        fn clone_box(&self) -> Box<dyn Operator> {
            Box::new(SingleRow(true, self.1, self.2))
        }
        fn modifies(&self) -> &[SlotIdx] {
            &[]
        }
    }

    #[test]
    fn finds_both_tied_shortest_paths_through_a_diamond() {
        let (g, rel) = diamond_graph();
        let g = Arc::new(g);
        let mut ctx = QueryContext::new(g, RuntimeConfig::default());
        let child = Box::new(SingleRow(true, 0, 3));
        let mut op = AllShortestPaths::new(child, 0, 1, 2, SmallVec::from_slice(&[rel]), TraverseDirection::Outgoing, None);
        let out = crate::record_stream::run(&mut op, &mut ctx).unwrap();
        assert_eq!(out.len(), 2);
        for record in &out {
            let SIValue::Path(path) = record.get(2) else { panic!("expected a path") };
            assert_eq!(path.nodes.len(), 3, "shortest path should be exactly 2 hops");
        }
    }

    #[test]
    fn identical_endpoints_never_yield_the_trivial_zero_length_path() {
        let (g, rel) = diamond_graph();
        let g = Arc::new(g);
        let mut ctx = QueryContext::new(g, RuntimeConfig::default());
        let child = Box::new(SingleRow(true, 0, 0));
        let mut op = AllShortestPaths::new(child, 0, 1, 2, SmallVec::from_slice(&[rel]), TraverseDirection::Outgoing, None);
        let out = crate::record_stream::run(&mut op, &mut ctx).unwrap();
        assert!(out.is_empty());
    }
}
