//! `Project` (spec.md §4.3 "Projection/control operators"): evaluates a
//! fixed list of `(expr, dest_slot)` pairs against every incoming record,
//! writing results into a (possibly wider) output record. Unlisted slots
//! from the child record are dropped unless explicitly carried forward by
//! an identity expression — matching a Cypher `WITH`/`RETURN` clause's
//! "only named projections survive" semantics.

use crate::context::QueryContext;
use crate::expr::{eval, Expr};
use crate::record_stream::Operator;
use graph_model::{GraphResult, Record, SlotIdx};
use smallvec::SmallVec;

pub struct Project {
    child: Box<dyn Operator>,
    projections: Vec<(Expr, SlotIdx)>,
    output_width: usize,
    modifies: SmallVec<[SlotIdx; 4]>,
}

impl Project {
    pub fn new(child: Box<dyn Operator>, projections: Vec<(Expr, SlotIdx)>, output_width: usize) -> Self {
        let modifies = projections.iter().map(|(_, slot)| *slot).collect();
        Self {
            child,
            projections,
            output_width,
            modifies,
        }
    }
}

impl Operator for Project {
    fn init(&mut self, ctx: &mut QueryContext) -> GraphResult<()> {
        self.child.init(ctx)
    }

    fn consume(&mut self, ctx: &mut QueryContext) -> GraphResult<Option<Record>> {
        let Some(input) = self.child.consume(ctx)? else {
            return Ok(None);
        };
        let mut output = Record::with_width(self.output_width);
        for (expr, slot) in &self.projections {
            let value = eval(expr, &input, &ctx.graph)?;
            output.set(*slot, value);
        }
        Ok(Some(output))
    }

    fn reset(&mut self) -> GraphResult<()> {
        self.child.reset()
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(Self {
            child: self.child.clone_box(),
            projections: self.projections.clone(),
            output_width: self.output_width,
            modifies: self.modifies.clone(),
        })
    }

    fn modifies(&self) -> &[SlotIdx] {
        &self.modifies
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
    use graph_model::SIValue;
    use std::sync::Arc;

    #[test]
    fn project_evaluates_expressions_into_new_slots() {
        let g = Graph::default();
        let id = g.reserve_node_id();
        let mut pending = PendingMutations::default();
        pending.node_creates.push(PendingNode { id, labels: Default::default(), properties: Default::default() });
        g.commit(pending).unwrap();

        let mut ctx = QueryContext::new(Arc::new(g), RuntimeConfig::default());
        let scan = Box::new(AllNodeScan::new(0, 1));
        let mut op = Project::new(scan, vec![(Expr::literal(7i64), 0)], 1);
        let out = crate::record_stream::run(&mut op, &mut ctx).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get(0), &SIValue::Int64(7));
    }
}
