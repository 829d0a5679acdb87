//! A minimal expression IR and evaluator.
//!
//! Cypher expression parsing is out of scope (spec.md §1): the validated
//! AST is assumed as input, and a full expression language belongs to that
//! external parser. This module is the small, already-lowered expression
//! tree every `Project`/`Filter`/`Create`/`Update`/`Aggregate` operator
//! needs *something* concrete to evaluate against a [`Record`] — property
//! access, arithmetic, and the handful of null-handling rules spec.md §4.4
//! pins down (shift-mean average, `n-1` sample stdev, `DivisionByZero`,
//! `coalesce` as the one documented null-propagation exception).
//!
//! Grounded in the shape of `sparql::Expression` (an owned enum tree with a
//! `coalesce` "does not propagate null" case called out by name),
//! generalized from RDF term evaluation to property-graph `SIValue`
//! evaluation over a catalog-backed property store.

use catalog::Graph;
use graph_model::{GraphError, GraphResult, PropertyKeyId, Record, SIValue, SlotIdx};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(SIValue),
    /// Read an already-bound record slot (a prior operator's output).
    Slot(SlotIdx),
    /// Property access on a node/edge-valued sub-expression.
    Property(Box<Expr>, PropertyKeyId),
    List(Vec<Expr>),
    /// `coalesce(a, b, ...)` — the one documented exception to null
    /// propagation (spec.md §4.4): returns the first non-null argument.
    Coalesce(Vec<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Unary(UnOp, Box<Expr>),
}

impl Expr {
    pub fn literal(v: impl Into<SIValue>) -> Self {
        Expr::Literal(v.into())
    }
}

impl From<i64> for SIValue {
    fn from(v: i64) -> Self {
        SIValue::Int64(v)
    }
}
impl From<f64> for SIValue {
    fn from(v: f64) -> Self {
        SIValue::Double(v)
    }
}
impl From<bool> for SIValue {
    fn from(v: bool) -> Self {
        SIValue::Bool(v)
    }
}
impl From<&str> for SIValue {
    fn from(v: &str) -> Self {
        SIValue::string(v)
    }
}

/// Evaluate `expr` against `record`, resolving property lookups through
/// `graph`'s committed snapshot.
pub fn eval(expr: &Expr, record: &Record, graph: &Graph) -> GraphResult<SIValue> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Slot(idx) => Ok(record.get(*idx).clone()),
        Expr::Property(base, key) => {
            let base_val = eval(base, record, graph)?;
            Ok(resolve_property(&base_val, *key, graph))
        }
        Expr::List(items) => {
            let values = items.iter().map(|e| eval(e, record, graph)).collect::<GraphResult<Vec<_>>>()?;
            Ok(SIValue::array(values))
        }
        Expr::Coalesce(items) => {
            for item in items {
                let v = eval(item, record, graph)?;
                if !v.is_null() {
                    return Ok(v);
                }
            }
            Ok(SIValue::Null)
        }
        Expr::Unary(op, inner) => eval_unary(*op, eval(inner, record, graph)?),
        Expr::Binary(op, l, r) => {
            let lv = eval(l, record, graph)?;
            let rv = eval(r, record, graph)?;
            eval_binary(*op, lv, rv)
        }
    }
}

/// `Display` wraps strings in quotes (for readable query output); string
/// concatenation needs the bare contents instead.
fn display_unquoted(v: &SIValue) -> String {
    match v {
        SIValue::String(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn resolve_property(base: &SIValue, key: PropertyKeyId, graph: &Graph) -> SIValue {
    match base {
        SIValue::Node(n) => graph
            .get_node(n.id)
            .and_then(|entry| entry.properties.get(&key).cloned())
            .unwrap_or(SIValue::Null),
        SIValue::Edge(e) => graph
            .get_edge(e.id)
            .and_then(|entry| entry.properties.get(&key).cloned())
            .unwrap_or(SIValue::Null),
        _ => SIValue::Null,
    }
}

fn eval_unary(op: UnOp, v: SIValue) -> GraphResult<SIValue> {
    match op {
        UnOp::IsNull => Ok(SIValue::Bool(v.is_null())),
        UnOp::IsNotNull => Ok(SIValue::Bool(!v.is_null())),
        UnOp::Not => match v {
            SIValue::Null => Ok(SIValue::Null),
            SIValue::Bool(b) => Ok(SIValue::Bool(!b)),
            other => Err(GraphError::TypeMismatch(format!("NOT applied to {}", other.type_name()))),
        },
        UnOp::Neg => match v {
            SIValue::Null => Ok(SIValue::Null),
            SIValue::Int64(i) => Ok(SIValue::Int64(-i)),
            SIValue::Double(d) => Ok(SIValue::Double(-d)),
            other => Err(GraphError::TypeMismatch(format!("unary - applied to {}", other.type_name()))),
        },
    }
}

/// Any arithmetic on a `Null` propagates to `Null` except `coalesce`
/// (spec.md §4.4). Division by zero on either numeric domain raises
/// `DivisionByZero` rather than producing `inf`/`NaN`.
fn eval_binary(op: BinOp, l: SIValue, r: SIValue) -> GraphResult<SIValue> {
    if matches!(op, BinOp::Eq | BinOp::Ne) {
        let eq = l == r;
        return Ok(SIValue::Bool(if op == BinOp::Eq { eq } else { !eq }));
    }
    if l.is_null() || r.is_null() {
        return Ok(SIValue::Null);
    }

    match op {
        BinOp::And | BinOp::Or | BinOp::Xor => {
            let (lb, rb) = match (l.as_bool(), r.as_bool()) {
                (Some(lb), Some(rb)) => (lb, rb),
                _ => return Err(GraphError::TypeMismatch("logical operator applied to non-Boolean".into())),
            };
            let result = match op {
                BinOp::And => lb && rb,
                BinOp::Or => lb || rb,
                BinOp::Xor => lb != rb,
                _ => unreachable!(),
            };
            Ok(SIValue::Bool(result))
        }
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ord = l.partial_cmp(&r).ok_or_else(|| {
                GraphError::TypeMismatch(format!("cannot compare {} and {}", l.type_name(), r.type_name()))
            })?;
            let result = match op {
                BinOp::Lt => ord.is_lt(),
                BinOp::Le => ord.is_le(),
                BinOp::Gt => ord.is_gt(),
                BinOp::Ge => ord.is_ge(),
                _ => unreachable!(),
            };
            Ok(SIValue::Bool(result))
        }
        BinOp::Add if matches!(l, SIValue::String(_)) || matches!(r, SIValue::String(_)) => {
            Ok(SIValue::string(format!("{}{}", display_unquoted(&l), display_unquoted(&r))))
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
            let (lf, rf) = match (l.as_f64(), r.as_f64()) {
                (Some(lf), Some(rf)) => (lf, rf),
                _ => return Err(GraphError::TypeMismatch(format!("arithmetic on {} and {}", l.type_name(), r.type_name()))),
            };
            if matches!(op, BinOp::Div | BinOp::Mod) && rf == 0.0 {
                return Err(GraphError::DivisionByZero);
            }
            let result = match op {
                BinOp::Add => lf + rf,
                BinOp::Sub => lf - rf,
                BinOp::Mul => lf * rf,
                BinOp::Div => lf / rf,
                BinOp::Mod => lf % rf,
                _ => unreachable!(),
            };
            // Two integer operands and an integral result stay an Int64,
            // matching Cypher's numeric-type-preservation rule.
            if matches!(l, SIValue::Int64(_)) && matches!(r, SIValue::Int64(_)) && op != BinOp::Div {
                Ok(SIValue::Int64(result as i64))
            } else {
                Ok(SIValue::Double(result))
            }
        }
        BinOp::Eq | BinOp::Ne => unreachable!("handled above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_model::NodeRef;

    #[test]
    fn coalesce_skips_nulls() {
        let record = Record::with_width(0);
        let graph = Graph::default();
        let e = Expr::Coalesce(vec![Expr::literal(SIValue::Null), Expr::literal(5i64)]);
        assert_eq!(eval(&e, &record, &graph).unwrap(), SIValue::Int64(5));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let record = Record::with_width(0);
        let graph = Graph::default();
        let e = Expr::Binary(BinOp::Div, Box::new(Expr::literal(1i64)), Box::new(Expr::literal(0i64)));
        assert!(matches!(eval(&e, &record, &graph), Err(GraphError::DivisionByZero)));
    }

    #[test]
    fn null_propagates_through_arithmetic() {
        let record = Record::with_width(0);
        let graph = Graph::default();
        let e = Expr::Binary(BinOp::Add, Box::new(Expr::literal(SIValue::Null)), Box::new(Expr::literal(1i64)));
        assert_eq!(eval(&e, &record, &graph).unwrap(), SIValue::Null);
    }

    #[test]
    fn property_access_reads_committed_value() {
        let graph = Graph::default();
        let key = graph.properties().intern("age");
        let id = graph.reserve_node_id();
        let mut pending = catalog::PendingMutations::default();
        let mut props = rustc_hash::FxHashMap::default();
        props.insert(key, SIValue::Int64(42));
        pending.node_creates.push(catalog::PendingNode {
            id,
            labels: Default::default(),
            properties: props,
        });
        graph.commit(pending).unwrap();

        let mut record = Record::with_width(1);
        record.set(0, SIValue::Node(NodeRef::new(id)));
        let e = Expr::Property(Box::new(Expr::Slot(0)), key);
        assert_eq!(eval(&e, &record, &graph).unwrap(), SIValue::Int64(42));
    }

    #[test]
    fn missing_property_is_null_not_an_error() {
        let graph = Graph::default();
        let key = graph.properties().intern("missing");
        let id = graph.reserve_node_id();
        let mut pending = catalog::PendingMutations::default();
        pending.node_creates.push(catalog::PendingNode {
            id,
            labels: Default::default(),
            properties: Default::default(),
        });
        graph.commit(pending).unwrap();

        let mut record = Record::with_width(1);
        record.set(0, SIValue::Node(NodeRef::new(id)));
        let e = Expr::Property(Box::new(Expr::Slot(0)), key);
        assert_eq!(eval(&e, &record, &graph).unwrap(), SIValue::Null);
    }
}
