//! `Filter` (spec.md §4.3 "Projection/control operators"): drops records
//! whose predicate does not evaluate to `Bool(true)`. Anything else —
//! `Null`, a type error, `Bool(false)` — excludes the row; a predicate
//! evaluation error still propagates, it is not swallowed into "excluded".

use crate::context::QueryContext;
use crate::expr::{eval, Expr};
use crate::record_stream::Operator;
use graph_model::{GraphResult, Record, SIValue, SlotIdx};

pub struct Filter {
    child: Box<dyn Operator>,
    predicate: Expr,
}

impl Filter {
    pub fn new(child: Box<dyn Operator>, predicate: Expr) -> Self {
        Self { child, predicate }
    }
}

impl Operator for Filter {
    fn init(&mut self, ctx: &mut QueryContext) -> GraphResult<()> {
        self.child.init(ctx)
    }

    fn consume(&mut self, ctx: &mut QueryContext) -> GraphResult<Option<Record>> {
        loop {
            match self.child.consume(ctx)? {
                None => return Ok(None),
                Some(record) => {
                    let keep = matches!(eval(&self.predicate, &record, &ctx.graph)?, SIValue::Bool(true));
                    if keep {
                        return Ok(Some(record));
                    }
                }
            }
        }
    }

    fn reset(&mut self) -> GraphResult<()> {
        self.child.reset()
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(Self {
            child: self.child.clone_box(),
            predicate: self.predicate.clone(),
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
    use crate::expr::BinOp;
    use crate::ops::scan::AllNodeScan;
    use catalog::{Graph, PendingMutations, PendingNode, RuntimeConfig};
    use std::sync::Arc;

    #[test]
    fn filter_keeps_only_matching_records() {
        let g = Graph::default();
        let key = g.properties().intern("age");
        let a = g.reserve_node_id();
        let b = g.reserve_node_id();
        let mut pending = PendingMutations::default();
        let mut props_a = rustc_hash::FxHashMap::default();
        props_a.insert(key, SIValue::Int64(10));
        pending.node_creates.push(PendingNode { id: a, labels: Default::default(), properties: props_a });
        let mut props_b = rustc_hash::FxHashMap::default();
        props_b.insert(key, SIValue::Int64(20));
        pending.node_creates.push(PendingNode { id: b, labels: Default::default(), properties: props_b });
        g.commit(pending).unwrap();

        let mut ctx = QueryContext::new(Arc::new(g), RuntimeConfig::default());
        let scan = Box::new(AllNodeScan::new(0, 1));
        let predicate = Expr::Binary(
            BinOp::Gt,
            Box::new(Expr::Property(Box::new(Expr::Slot(0)), key)),
            Box::new(Expr::literal(15i64)),
        );
        let mut op = Filter::new(scan, predicate);
        let out = crate::record_stream::run(&mut op, &mut ctx).unwrap();
        assert_eq!(out.len(), 1);
    }
}
