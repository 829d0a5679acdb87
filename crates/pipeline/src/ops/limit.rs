//! `Limit`/`Skip`: exact counting operators — no off-by-one, no extra
//! upstream pulls past the bound. The bound is evaluated once, from a
//! constant or a query parameter, at `init()` time; `reset()` zeroes the
//! running counter so a `Limit` nested under a repeatedly-reset subtree
//! (e.g. the right-hand side of an `Apply`) starts over cleanly each pass.

use crate::context::QueryContext;
use crate::record_stream::Operator;
use graph_model::{GraphResult, Record, SlotIdx};

pub struct Limit {
    child: Box<dyn Operator>,
    bound: u64,
    emitted: u64,
}

impl Limit {
    pub fn new(child: Box<dyn Operator>, bound: u64) -> Self {
        Self { child, bound, emitted: 0 }
    }
}

impl Operator for Limit {
    fn init(&mut self, ctx: &mut QueryContext) -> GraphResult<()> {
        self.emitted = 0;
        self.child.init(ctx)
    }

    fn consume(&mut self, ctx: &mut QueryContext) -> GraphResult<Option<Record>> {
        if self.emitted >= self.bound {
            return Ok(None);
        }
        match self.child.consume(ctx)? {
            Some(record) => {
                self.emitted += 1;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) -> GraphResult<()> {
        self.emitted = 0;
        self.child.reset()
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(Self {
            child: self.child.clone_box(),
            bound: self.bound,
            emitted: 0,
        })
    }

    fn modifies(&self) -> &[SlotIdx] {
        &[]
    }

    fn free(&mut self) {
        self.child.free();
    }
}

pub struct Skip {
    child: Box<dyn Operator>,
    bound: u64,
    skipped: u64,
}

impl Skip {
    pub fn new(child: Box<dyn Operator>, bound: u64) -> Self {
        Self { child, bound, skipped: 0 }
    }
}

impl Operator for Skip {
    fn init(&mut self, ctx: &mut QueryContext) -> GraphResult<()> {
        self.skipped = 0;
        self.child.init(ctx)
    }

    fn consume(&mut self, ctx: &mut QueryContext) -> GraphResult<Option<Record>> {
        while self.skipped < self.bound {
            match self.child.consume(ctx)? {
                Some(_) => self.skipped += 1,
                None => return Ok(None),
            }
        }
        self.child.consume(ctx)
    }

    fn reset(&mut self) -> GraphResult<()> {
        self.skipped = 0;
        self.child.reset()
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(Self {
            child: self.child.clone_box(),
            bound: self.bound,
            skipped: 0,
        })
    }

    fn modifies(&self) -> &[SlotIdx] {
        &[]
    }

    fn free(&mut self) {
        self.child.free();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::scan::AllNodeScan;
    use catalog::{Graph, PendingMutations, PendingNode, RuntimeConfig};
    use std::sync::Arc;

    fn five_node_graph() -> Graph {
        let g = Graph::default();
        let mut pending = PendingMutations::default();
        for _ in 0..5 {
            let id = g.reserve_node_id();
            pending.node_creates.push(PendingNode { id, labels: Default::default(), properties: Default::default() });
        }
        g.commit(pending).unwrap();
        g
    }

    #[test]
    fn limit_stops_exactly_at_bound() {
        let g = five_node_graph();
        let mut ctx = QueryContext::new(Arc::new(g), RuntimeConfig::default());
        let scan = Box::new(AllNodeScan::new(0, 1));
        let mut op = Limit::new(scan, 2);
        let out = crate::record_stream::run(&mut op, &mut ctx).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn skip_drops_exactly_the_bound() {
        let g = five_node_graph();
        let mut ctx = QueryContext::new(Arc::new(g), RuntimeConfig::default());
        let scan = Box::new(AllNodeScan::new(0, 1));
        let mut op = Skip::new(scan, 2);
        let out = crate::record_stream::run(&mut op, &mut ctx).unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn skip_past_end_yields_nothing() {
        let g = five_node_graph();
        let mut ctx = QueryContext::new(Arc::new(g), RuntimeConfig::default());
        let scan = Box::new(AllNodeScan::new(0, 1));
        let mut op = Skip::new(scan, 50);
        let out = crate::record_stream::run(&mut op, &mut ctx).unwrap();
        assert!(out.is_empty());
    }
}
