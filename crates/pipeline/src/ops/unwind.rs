//! `Unwind`: an empty list yields zero rows, `UNWIND null` also yields
//! zero rows, and unwinding a non-list scalar yields one row equal to that
//! scalar. The list expression may be a constant, evaluated once at
//! `init()`, or a per-record expression re-evaluated on every pull.

use crate::context::QueryContext;
use crate::expr::{eval, Expr};
use crate::record_stream::Operator;
use graph_model::{GraphResult, Record, SIValue, SlotIdx};

pub struct Unwind {
    child: Box<dyn Operator>,
    list_expr: Expr,
    dest_slot: SlotIdx,
    current: Option<(Record, Vec<SIValue>, usize)>,
}

impl Unwind {
    pub fn new(child: Box<dyn Operator>, list_expr: Expr, dest_slot: SlotIdx) -> Self {
        Self {
            child,
            list_expr,
            dest_slot,
            current: None,
        }
    }

    /// `UNWIND` on a non-array value: `Null` contributes no rows, any other
    /// scalar contributes exactly one row equal to itself.
    fn items_for(value: SIValue) -> Vec<SIValue> {
        match value {
            SIValue::Null => Vec::new(),
            SIValue::Array(items) => (*items).clone(),
            scalar => vec![scalar],
        }
    }
}

impl Operator for Unwind {
    fn init(&mut self, ctx: &mut QueryContext) -> GraphResult<()> {
        self.current = None;
        self.child.init(ctx)
    }

    fn consume(&mut self, ctx: &mut QueryContext) -> GraphResult<Option<Record>> {
        loop {
            if let Some((record, items, idx)) = &mut self.current {
                if let Some(item) = items.get(*idx).cloned() {
                    *idx += 1;
                    let mut out = record.clone();
                    out.set(self.dest_slot, item);
                    return Ok(Some(out));
                }
                self.current = None;
            }

            match self.child.consume(ctx)? {
                None => return Ok(None),
                Some(record) => {
                    let value = eval(&self.list_expr, &record, &ctx.graph)?;
                    let items = Self::items_for(value);
                    self.current = Some((record, items, 0));
                }
            }
        }
    }

    fn reset(&mut self) -> GraphResult<()> {
        self.current = None;
        self.child.reset()
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(Self {
            child: self.child.clone_box(),
            list_expr: self.list_expr.clone(),
            dest_slot: self.dest_slot,
            current: None,
        })
    }

    fn modifies(&self) -> &[SlotIdx] {
        std::slice::from_ref(&self.dest_slot)
    }

    fn free(&mut self) {
        self.current = None;
        self.child.free();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::scan::AllNodeScan;
    use catalog::{Graph, PendingMutations, PendingNode, RuntimeConfig};
    use std::sync::Arc;

    fn one_node_graph() -> Graph {
        let g = Graph::default();
        let id = g.reserve_node_id();
        let mut pending = PendingMutations::default();
        pending.node_creates.push(PendingNode { id, labels: Default::default(), properties: Default::default() });
        g.commit(pending).unwrap();
        g
    }

    #[test]
    fn unwind_list_literal_fans_out_one_row_per_item() {
        let g = one_node_graph();
        let mut ctx = QueryContext::new(Arc::new(g), RuntimeConfig::default());
        let scan = Box::new(AllNodeScan::new(0, 2));
        let list = Expr::List(vec![Expr::literal(1i64), Expr::literal(2i64), Expr::literal(3i64)]);
        let mut op = Unwind::new(scan, list, 1);
        let out = crate::record_stream::run(&mut op, &mut ctx).unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn unwind_null_yields_no_rows() {
        let g = one_node_graph();
        let mut ctx = QueryContext::new(Arc::new(g), RuntimeConfig::default());
        let scan = Box::new(AllNodeScan::new(0, 2));
        let mut op = Unwind::new(scan, Expr::literal(SIValue::Null), 1);
        let out = crate::record_stream::run(&mut op, &mut ctx).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn unwind_scalar_yields_exactly_one_row() {
        let g = one_node_graph();
        let mut ctx = QueryContext::new(Arc::new(g), RuntimeConfig::default());
        let scan = Box::new(AllNodeScan::new(0, 2));
        let mut op = Unwind::new(scan, Expr::literal(42i64), 1);
        let out = crate::record_stream::run(&mut op, &mut ctx).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get(1), &SIValue::Int64(42));
    }
}
