//! Expression-tree rewrites: transpose hoisting, sum-of-products
//! distribution with shared-subexpression reuse. Diagonal detection is not
//! a tree rewrite here — `matrix::method::mxm` already recognizes a
//! diagonal operand at evaluation time and takes the row/column-scale fast
//! path itself, so there is nothing for the tree walker to rewrite for
//! that one.
//!
//! Grounded in `sparql::optimizer::QueryOptimizer`'s shape: a tree-rewrite
//! pass that runs once after the builder produces a raw plan, replacing
//! join-order heuristics with these two algebraic identities.

use crate::expr::{ExprNode, SharedNode};

/// Rewrite one expression tree in place, returning the optimized tree.
pub fn optimize(node: ExprNode) -> ExprNode {
    match node {
        ExprNode::Transpose(inner) => hoist_transpose(optimize(*inner)),
        ExprNode::Mul(l, r) => distribute(optimize(*l), optimize(*r)),
        ExprNode::Add(l, r) => ExprNode::Add(Box::new(optimize(*l)), Box::new(optimize(*r))),
        leaf @ (ExprNode::Operand(_) | ExprNode::Shared(_)) => leaf,
    }
}

/// Push a `TRANSPOSE` node down through `MUL`/`ADD`, canceling a double
/// transpose and flipping an operand's lazy flag in place when it reaches a
/// leaf: `(A·B)ᵀ → Bᵀ·Aᵀ` with the `transpose` flag pushed onto operands.
fn hoist_transpose(node: ExprNode) -> ExprNode {
    match node {
        ExprNode::Transpose(inner) => {
            tracing::trace!("optimizer: double transpose cancels");
            *inner
        }
        ExprNode::Operand(op) => {
            op.toggle_transpose();
            ExprNode::Operand(op)
        }
        ExprNode::Mul(l, r) => {
            tracing::debug!("optimizer: hoisting transpose through Mul, swapping operand order");
            ExprNode::Mul(Box::new(hoist_transpose(*r)), Box::new(hoist_transpose(*l)))
        }
        ExprNode::Add(l, r) => ExprNode::Add(Box::new(hoist_transpose(*l)), Box::new(hoist_transpose(*r))),
        // A shared subtree may be referenced from a sibling branch that was
        // not transposed; hoisting through it would corrupt that sibling's
        // view, so the transpose is wrapped around it instead of pushed in.
        shared @ ExprNode::Shared(_) => ExprNode::Transpose(Box::new(shared)),
    }
}

/// `A·(B+C) → A·B + A·C` when the other side of the product is itself a
/// `·` node, marking the shared operand `Shared` so evaluation
/// materializes it once instead of twice.
fn distribute(l: ExprNode, r: ExprNode) -> ExprNode {
    match (l, r) {
        (l, ExprNode::Add(b, c)) if is_product(&l) => {
            tracing::debug!("optimizer: distributing A*(B+C) -> A*B + A*C, sharing A");
            let shared = SharedNode::new(l);
            ExprNode::Add(
                Box::new(ExprNode::Mul(Box::new(ExprNode::Shared(shared.clone())), b)),
                Box::new(ExprNode::Mul(Box::new(ExprNode::Shared(shared)), c)),
            )
        }
        (ExprNode::Add(a, b), r) if is_product(&r) => {
            tracing::debug!("optimizer: distributing (A+B)*C -> A*C + B*C, sharing C");
            let shared = SharedNode::new(r);
            ExprNode::Add(
                Box::new(ExprNode::Mul(a, Box::new(ExprNode::Shared(shared.clone())))),
                Box::new(ExprNode::Mul(b, Box::new(ExprNode::Shared(shared)))),
            )
        }
        (l, r) => ExprNode::Mul(Box::new(l), Box::new(r)),
    }
}

fn is_product(node: &ExprNode) -> bool {
    matches!(node, ExprNode::Mul(_, _) | ExprNode::Shared(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Operand, OperandSource};
    use matrix::{build, Matrix};
    use std::sync::Arc;

    fn bool_matrix(edges: &[(usize, usize)], n: usize) -> Arc<Matrix<bool>> {
        let i: Vec<usize> = edges.iter().map(|&(r, _)| r).collect();
        let j: Vec<usize> = edges.iter().map(|&(_, c)| c).collect();
        Arc::new(build(n, n, &i, &j, &vec![true; edges.len()], |a, b| *a || *b))
    }

    fn adj_operand(edges: &[(usize, usize)], rel: u32) -> ExprNode {
        ExprNode::Operand(Operand::new(
            OperandSource::Adjacency(graph_model::RelTypeId(rel)),
            bool_matrix(edges, 4),
            false,
        ))
    }

    #[test]
    fn double_transpose_cancels() {
        let op = adj_operand(&[(1, 0)], 0);
        let t = ExprNode::Transpose(Box::new(ExprNode::Transpose(Box::new(op))));
        match optimize(t) {
            ExprNode::Operand(op) => assert!(!op.wants_transpose()),
            _ => panic!("expected a bare operand after double-transpose cancellation"),
        }
    }

    #[test]
    fn transpose_of_product_swaps_and_transposes_both_sides() {
        let a = adj_operand(&[(1, 0)], 0);
        let b = adj_operand(&[(2, 1)], 1);
        let mul = ExprNode::Mul(Box::new(a), Box::new(b));
        let t = ExprNode::Transpose(Box::new(mul));
        match optimize(t) {
            ExprNode::Mul(l, r) => {
                // (A*B)^T = B^T * A^T: left child was originally B, right was A.
                match (*l, *r) {
                    (ExprNode::Operand(lo), ExprNode::Operand(ro)) => {
                        assert!(lo.wants_transpose());
                        assert!(ro.wants_transpose());
                    }
                    _ => panic!("expected two bare transposed operands"),
                }
            }
            _ => panic!("expected a Mul node after transpose hoisting"),
        }
    }

    #[test]
    fn sum_of_products_shares_the_common_operand() {
        let a = adj_operand(&[(1, 0)], 0);
        let b = adj_operand(&[(2, 0)], 1);
        let c = adj_operand(&[(3, 0)], 2);
        // a * (b_mul + c_mul) where b_mul/c_mul are themselves products so
        // the "other side is a product" guard is satisfied.
        let b_mul = ExprNode::Mul(Box::new(adj_operand(&[(0, 0)], 3)), Box::new(b));
        let c_mul = ExprNode::Mul(Box::new(adj_operand(&[(0, 0)], 3)), Box::new(c));
        let sum = ExprNode::Add(Box::new(b_mul), Box::new(c_mul));
        let expr = ExprNode::Mul(Box::new(a), Box::new(sum));
        match optimize(expr) {
            ExprNode::Add(l, r) => {
                let shared_l = matches!(*l, ExprNode::Mul(ref lhs, _) if matches!(**lhs, ExprNode::Shared(_)));
                let shared_r = matches!(*r, ExprNode::Mul(ref lhs, _) if matches!(**lhs, ExprNode::Shared(_)));
                assert!(shared_l && shared_r);
            }
            _ => panic!("expected an Add node after sum-of-products distribution"),
        }
    }
}
