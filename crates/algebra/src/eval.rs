//! `execute(expression, out_matrix)`: walks an
//! [`AlgebraicExpression`]'s tree right-to-left, multiplying the bound
//! frontier in from the destination side, producing one intermediate
//! sparse matrix per `Mul`/`Add`/`Transpose` node.
//!
//! Grounded in `sparql::executor`'s recursive algebra-tree walk (one match
//! arm per `Algebra` variant, each returning an owned result the caller
//! combines further up the tree), generalized from a `BindingSet` result to
//! a boolean adjacency `Matrix`.

use crate::expr::{AlgebraicExpression, ExprNode};
use graph_model::GraphResult;
use matrix::{method, semiring::any_pair, Descriptor, Matrix, Sauna};
use std::sync::Arc;

/// Evaluate one algebraic expression against a bound frontier (the column
/// of currently-matched source nodes), returning the resulting destination
/// frontier.
///
/// `ConditionalTraverse`'s "leftmost operand is a frontier vector derived
/// from the child record" is modeled here as: evaluate the
/// expression's label/adjacency product tree on its own, then multiply the
/// caller-supplied `frontier` in as the rightmost operand — unless the tree
/// already contains an explicit frontier leaf (the degenerate all-labels
/// empty-segment case `build_segment` falls back to), in which case that
/// leaf is bound instead and no extra multiply happens.
pub fn execute(expr: &AlgebraicExpression, frontier: Arc<Matrix<bool>>, sauna: &mut Sauna<bool>) -> GraphResult<Arc<Matrix<bool>>> {
    let semiring = any_pair();
    if contains_frontier(&expr.root) {
        bind_frontier(&expr.root, &frontier);
        return eval_node(&expr.root, &semiring, sauna);
    }

    let relation = eval_node(&expr.root, &semiring, sauna)?;
    let c = method::mxm(&relation, &frontier, &semiring, None, &Descriptor::none(), sauna)?;
    Ok(Arc::new(c))
}

fn contains_frontier(node: &ExprNode) -> bool {
    match node {
        ExprNode::Operand(op) => op.is_frontier(),
        ExprNode::Mul(l, r) | ExprNode::Add(l, r) => contains_frontier(l) || contains_frontier(r),
        ExprNode::Transpose(inner) => contains_frontier(inner),
        ExprNode::Shared(shared) => contains_frontier(&shared.node),
    }
}

fn bind_frontier(node: &ExprNode, frontier: &Arc<Matrix<bool>>) {
    match node {
        ExprNode::Operand(op) => {
            if op.is_frontier() {
                op.bind_frontier(frontier.clone());
            }
        }
        ExprNode::Mul(l, r) | ExprNode::Add(l, r) => {
            bind_frontier(l, frontier);
            bind_frontier(r, frontier);
        }
        ExprNode::Transpose(inner) => bind_frontier(inner, frontier),
        ExprNode::Shared(shared) => bind_frontier(&shared.node, frontier),
    }
}

fn eval_node(
    node: &ExprNode,
    semiring: &matrix::DynSemiring<bool>,
    sauna: &mut Sauna<bool>,
) -> GraphResult<Arc<Matrix<bool>>> {
    match node {
        ExprNode::Operand(op) => Ok(op.resolve()),
        ExprNode::Mul(l, r) => {
            let a = eval_node(l, semiring, sauna)?;
            let b = eval_node(r, semiring, sauna)?;
            let c = method::mxm(&a, &b, semiring, None, &Descriptor::none(), sauna)?;
            Ok(Arc::new(c))
        }
        ExprNode::Add(l, r) => {
            let a = eval_node(l, semiring, sauna)?;
            let b = eval_node(r, semiring, sauna)?;
            let c = method::ewise_add(&a, &b, |x, y| *x || *y)?;
            Ok(Arc::new(c))
        }
        ExprNode::Transpose(inner) => {
            let a = eval_node(inner, semiring, sauna)?;
            Ok(Arc::new(method::transpose(&a)))
        }
        ExprNode::Shared(shared) => {
            if let Some(cached) = shared.cached() {
                return Ok(cached);
            }
            let value = eval_node(&shared.node, semiring, sauna)?;
            shared.store(value.clone());
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_path;
    use crate::pattern::{Direction, PatternEdge, PatternNode, PatternPath};
    use catalog::Graph;

    fn linear_graph() -> (Graph, graph_model::RelTypeId) {
        let g = Graph::default();
        let rel = g.reltypes().intern("R");
        let mut pending = catalog::PendingMutations::default();
        let a = g.reserve_node_id();
        let b = g.reserve_node_id();
        let c = g.reserve_node_id();
        for id in [a, b, c] {
            pending.node_creates.push(catalog::PendingNode {
                id,
                labels: Default::default(),
                properties: Default::default(),
            });
        }
        pending.edge_creates.push(catalog::PendingEdge {
            id: g.reserve_edge_id(),
            rel_type: rel,
            src: a,
            dest: b,
            properties: Default::default(),
        });
        pending.edge_creates.push(catalog::PendingEdge {
            id: g.reserve_edge_id(),
            rel_type: rel,
            src: b,
            dest: c,
            properties: Default::default(),
        });
        g.commit(pending).unwrap();
        (g, rel)
    }

    #[test]
    fn single_hop_frontier_multiply_reaches_destination() {
        let (g, rel) = linear_graph();
        let path = PatternPath::new(
            vec![PatternNode::unlabeled(Some(0)), PatternNode::unlabeled(Some(1))],
            vec![PatternEdge::single_hop(None, &[rel], Direction::Outgoing)],
        );
        let exprs = build_path(&path, &g);
        let mut sauna = Sauna::new(3);

        // Frontier: node 0 (`a`) bound.
        let frontier = {
            let idx = vec![0usize];
            Arc::new(matrix::build(3, 3, &idx, &idx, &vec![true], |x, y| *x || *y))
        };
        let dest = execute(&exprs[0], frontier, &mut sauna).unwrap();
        assert!(dest.column(0).iter().any(|&(i, v)| i == 1 && v));
    }

    #[test]
    fn transpose_equivalence_reverses_arrow() {
        let (g, rel) = linear_graph();
        let path = PatternPath::new(
            vec![PatternNode::unlabeled(Some(0)), PatternNode::unlabeled(Some(1))],
            vec![PatternEdge::single_hop(None, &[rel], Direction::Incoming)],
        );
        let exprs = build_path(&path, &g);
        let mut sauna = Sauna::new(3);

        // Frontier bound at node 1 (`b`); `<-` should land us back at node 0 (`a`).
        let frontier = {
            let idx = vec![1usize];
            Arc::new(matrix::build(3, 3, &idx, &idx, &vec![true], |x, y| *x || *y))
        };
        let dest = execute(&exprs[0], frontier, &mut sauna).unwrap();
        assert!(dest.column(0).iter().any(|&(i, v)| i == 0 && v));
    }
}
