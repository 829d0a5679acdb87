//! Lowers a [`PatternPath`] into an ordered list of
//! [`AlgebraicExpression`]s.
//!
//! Grounded in `sparql::variable_ordering`'s job of turning a parsed
//! pattern into an ordered plan of joins; generalized here from picking a
//! join order over triple patterns to picking matrix-multiply operand
//! order over a single directed path, since the graph-query core expresses
//! the whole pattern as one product chain rather than a join tree.

use crate::expr::{AlgebraicExpression, ExprNode, Operand, OperandSource};
use crate::pattern::{Direction, PatternPath};
use catalog::Graph;
use graph_model::RelTypeId;
use smallvec::SmallVec;

/// Build the ordered list of algebraic expressions for one pattern path,
/// resolving label/reltype operands against `catalog`'s current snapshot.
///
/// Segments are split at every interior node or edge the query binds to a
/// name, so the pipeline can expose that variable as a record slot; a
/// path with no interior references at all lowers to a
/// single expression.
pub fn build_path(path: &PatternPath, catalog: &Graph) -> Vec<AlgebraicExpression> {
    let mut expressions = Vec::new();
    let mut segment_start = 0usize;

    for edge_idx in 0..path.edges.len() {
        let is_last = edge_idx + 1 == path.edges.len();
        let is_var_len = path.edges[edge_idx].variable_length;

        // Variable-length edges are isolated into their own segment no
        // matter what — the expression wrapping the `[:R*m..n]` segment
        // holds exactly one adjacency operand — flushing any accumulated
        // single-hop edges ahead of it first.
        if is_var_len {
            if segment_start < edge_idx {
                expressions.push(build_segment(path, segment_start, edge_idx - 1, catalog));
            }
            expressions.push(build_segment(path, edge_idx, edge_idx, catalog));
            segment_start = edge_idx + 1;
            continue;
        }

        let interior_node_referenced = !is_last && path.nodes[edge_idx + 1].slot.is_some();
        let edge_referenced = path.edges[edge_idx].slot.is_some();
        let must_split = is_last || interior_node_referenced || edge_referenced;

        if must_split {
            expressions.push(build_segment(path, segment_start, edge_idx, catalog));
            segment_start = edge_idx + 1;
        }
    }

    expressions
}

/// Build one segment spanning `path.edges[first..=last]`, with any label
/// selector adjacent to a variable-length edge migrated to a neighboring
/// single-hop segment by the caller's splitting above (a variable-length
/// edge is always its own segment here, so there is never a label operand
/// to migrate out of it — it simply never picks one up).
fn build_segment(path: &PatternPath, first: usize, last: usize, catalog: &Graph) -> AlgebraicExpression {
    let src_node = first;
    let dest_node = last + 1;
    let is_isolated_var_len = first == last && path.edges[first].variable_length;

    // Right-to-left operand order: start from the destination-side label
    // selector (if any) and walk back toward the source. A variable-length
    // segment holds exactly one adjacency operand — any boundary-node
    // label selector is left for the neighboring single-hop segment that
    // shares that node to pick up instead.
    let mut operands: Vec<ExprNode> = Vec::new();

    if !is_isolated_var_len {
        if let Some(op) = label_operand(&path.nodes[dest_node], catalog) {
            operands.push(ExprNode::Operand(op));
        }
    }

    for edge_pos in (first..=last).rev() {
        operands.push(ExprNode::Operand(adjacency_operand(&path.edges[edge_pos], catalog)));
        if edge_pos > first {
            if let Some(op) = label_operand(&path.nodes[edge_pos], catalog) {
                operands.push(ExprNode::Operand(op));
            }
        }
    }

    if !is_isolated_var_len {
        if let Some(op) = label_operand(&path.nodes[src_node], catalog) {
            operands.push(ExprNode::Operand(op));
        }
    }

    // `operands` is stored right-to-left; fold it into a
    // left-associated `Mul` tree so evaluation multiplies the same way:
    // `mxm(opN, mxm(opN-1, ... mxm(op1, op0)))`.
    let root = operands
        .into_iter()
        .reduce(|acc, next| ExprNode::Mul(Box::new(next), Box::new(acc)))
        .unwrap_or_else(|| ExprNode::Operand(Operand::frontier()));

    let relation_ids: SmallVec<[RelTypeId; 4]> = path.edges[first..=last]
        .iter()
        .flat_map(|e| e.rel_types.iter().copied())
        .collect();

    let single_edge = (last == first).then_some(first);
    let edge = single_edge.and_then(|i| path.edges[i].slot.map(|_| i));

    AlgebraicExpression {
        root,
        src_node,
        dest_node,
        edge,
        src_node_idx: path.nodes[src_node].slot,
        dest_node_idx: path.nodes[dest_node].slot,
        edge_idx: single_edge.and_then(|i| path.edges[i].slot),
        min_hops: path.edges[first..=last].iter().map(|e| e.min_hops).min().unwrap_or(1),
        max_hops: path.edges[first..=last].iter().map(|e| e.max_hops).max().unwrap_or(1),
        relation_ids,
    }
}

fn label_operand(node: &crate::pattern::PatternNode, catalog: &Graph) -> Option<Operand> {
    match node.labels.as_slice() {
        [] => None,
        [single] => {
            let m = catalog.label_matrix(*single);
            Some(Operand::new(OperandSource::Label(*single), m, false))
        }
        many => {
            // Multiple labels on one node (`(a:A:B)`) narrow by intersection,
            // not union; pre-combine via eWiseMult-style AND instead of the
            // multi-relation-edge OR rule, which only applies to `|`
            // alternation on edges.
            let mut acc = (*catalog.label_matrix(many[0])).clone();
            for lbl in &many[1..] {
                let next = catalog.label_matrix(*lbl);
                acc = matrix::method::ewise_add(&acc, &next, |a, b| *a && *b)
                    .expect("label selector matrices share the node-count dimension");
            }
            Some(Operand::new(
                OperandSource::LabelIntersection(many.iter().copied().collect()),
                std::sync::Arc::new(acc),
                false,
            ))
        }
    }
}

fn adjacency_operand(edge: &crate::pattern::PatternEdge, catalog: &Graph) -> Operand {
    let transpose = edge.direction == Direction::Incoming;
    match edge.rel_types.as_slice() {
        [] => {
            // No relation-type constraint: union of every known reltype.
            // Empty-relation-type fast exit lives in the pipeline layer,
            // which can see that the catalog has zero reltypes at all and
            // skip building this operand entirely.
            let n = catalog.reltypes().len();
            let ids: SmallVec<[RelTypeId; 4]> = (0..n as u32).map(RelTypeId).collect();
            let m = catalog.union_adjacency(&ids);
            Operand::new(OperandSource::MultiRelation(ids), m, transpose)
        }
        [single] => {
            let m = catalog.adjacency_matrix(*single);
            Operand::new(OperandSource::Adjacency(*single), m, transpose)
        }
        many => {
            let ids: SmallVec<[RelTypeId; 4]> = many.iter().copied().collect();
            let m = catalog.union_adjacency(many);
            Operand::new(OperandSource::MultiRelation(ids), m, transpose)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{PatternEdge, PatternNode};
    use catalog::Graph;

    fn three_hop_graph() -> (Graph, RelTypeId, graph_model::LabelId) {
        let g = Graph::default();
        let rel = g.reltypes().intern("KNOWS");
        let label = g.labels().intern("Person");
        (g, rel, label)
    }

    #[test]
    fn single_hop_unreferenced_path_lowers_to_one_expression() {
        let (g, rel, _label) = three_hop_graph();
        let path = PatternPath::new(
            vec![PatternNode::unlabeled(Some(0)), PatternNode::unlabeled(Some(1))],
            vec![PatternEdge::single_hop(None, &[rel], Direction::Outgoing)],
        );
        let exprs = build_path(&path, &g);
        assert_eq!(exprs.len(), 1);
        assert_eq!(exprs[0].src_node, 0);
        assert_eq!(exprs[0].dest_node, 1);
    }

    #[test]
    fn referenced_interior_node_splits_into_two_segments() {
        let (g, rel, _label) = three_hop_graph();
        let path = PatternPath::new(
            vec![
                PatternNode::unlabeled(Some(0)),
                PatternNode::unlabeled(Some(1)),
                PatternNode::unlabeled(Some(2)),
            ],
            vec![
                PatternEdge::single_hop(None, &[rel], Direction::Outgoing),
                PatternEdge::single_hop(None, &[rel], Direction::Outgoing),
            ],
        );
        let exprs = build_path(&path, &g);
        assert_eq!(exprs.len(), 2);
        assert_eq!(exprs[0].dest_node, 1);
        assert_eq!(exprs[1].src_node, 1);
    }

    #[test]
    fn variable_length_edge_is_its_own_segment() {
        let (g, rel, label) = three_hop_graph();
        let path = PatternPath::new(
            vec![
                PatternNode::new(Some(0), &[label]),
                PatternNode::unlabeled(None),
                PatternNode::new(Some(2), &[label]),
            ],
            vec![
                PatternEdge::variable_length(None, &[rel], Direction::Outgoing, 2, 4),
                PatternEdge::single_hop(None, &[rel], Direction::Outgoing),
            ],
        );
        let exprs = build_path(&path, &g);
        assert_eq!(exprs.len(), 2);
        assert!(exprs[0].is_variable_length());
        assert_eq!(exprs[0].min_hops, 2);
        assert_eq!(exprs[0].max_hops, 4);
    }

    #[test]
    fn incoming_direction_marks_transpose() {
        let (g, rel, _label) = three_hop_graph();
        let path = PatternPath::new(
            vec![PatternNode::unlabeled(Some(0)), PatternNode::unlabeled(Some(1))],
            vec![PatternEdge::single_hop(None, &[rel], Direction::Incoming)],
        );
        let exprs = build_path(&path, &g);
        match &exprs[0].root {
            ExprNode::Operand(op) => assert!(op.wants_transpose()),
            _ => panic!("single-edge segment with no labels should lower to a bare operand"),
        }
    }
}
