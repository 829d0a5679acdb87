//! `SIValue` — the tagged union of property and record-slot values.
//!
//! Mirrors the shape of `rdf_model::Node` (a small, cheaply-cloned enum with
//! one variant per concrete kind), but carries the property-graph value set
//! from spec.md §3 instead of RDF term kinds: `Null`, `Bool`, `Int64`,
//! `Double`, `String`, `Array`, `Node`, `Edge`, `Path`.

use crate::node::{EdgeRef, NodeRef, Path};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A single value flowing through a record slot or stored as a property.
#[derive(Debug, Clone)]
pub enum SIValue {
    Null,
    Bool(bool),
    Int64(i64),
    Double(f64),
    String(Arc<str>),
    Array(Arc<Vec<SIValue>>),
    Node(NodeRef),
    Edge(EdgeRef),
    Path(Arc<Path>),
}

impl SIValue {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        SIValue::String(s.into())
    }

    pub fn array(values: Vec<SIValue>) -> Self {
        SIValue::Array(Arc::new(values))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SIValue::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SIValue::Null => "Null",
            SIValue::Bool(_) => "Bool",
            SIValue::Int64(_) => "Integer",
            SIValue::Double(_) => "Float",
            SIValue::String(_) => "String",
            SIValue::Array(_) => "Array",
            SIValue::Node(_) => "Node",
            SIValue::Edge(_) => "Edge",
            SIValue::Path(_) => "Path",
        }
    }

    /// Numeric coercion used by arithmetic operators: `Int64` widens to
    /// `Double` when mixed with another `Double`, everything else is not a
    /// number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SIValue::Int64(i) => Some(*i as f64),
            SIValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SIValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[SIValue]> {
        match self {
            SIValue::Array(a) => Some(a.as_slice()),
            _ => None,
        }
    }
}

impl fmt::Display for SIValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SIValue::Null => write!(f, "null"),
            SIValue::Bool(b) => write!(f, "{b}"),
            SIValue::Int64(i) => write!(f, "{i}"),
            SIValue::Double(d) => write!(f, "{d}"),
            SIValue::String(s) => write!(f, "\"{s}\""),
            SIValue::Array(a) => {
                write!(f, "[")?;
                for (i, v) in a.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            SIValue::Node(n) => write!(f, "{n}"),
            SIValue::Edge(e) => write!(f, "{e}"),
            SIValue::Path(_) => write!(f, "<path>"),
        }
    }
}

impl PartialEq for SIValue {
    fn eq(&self, other: &Self) -> bool {
        use SIValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int64(a), Int64(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (Int64(a), Double(b)) | (Double(b), Int64(a)) => (*a as f64) == *b,
            (String(a), String(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Node(a), Node(b)) => a == b,
            (Edge(a), Edge(b)) => a == b,
            _ => false,
        }
    }
}

/// Total order used for `ORDER BY` and aggregate grouping keys: `Null` sorts
/// last, numeric types compare by value, everything else compares by its
/// `Display` form as a last resort — matching the property-graph convention
/// that incomparable types still sort deterministically.
impl PartialOrd for SIValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        use SIValue::*;
        match (self, other) {
            (Null, Null) => Some(Ordering::Equal),
            (Null, _) => Some(Ordering::Greater),
            (_, Null) => Some(Ordering::Less),
            (Bool(a), Bool(b)) => a.partial_cmp(b),
            (Int64(a), Int64(b)) => a.partial_cmp(b),
            (Double(a), Double(b)) => a.partial_cmp(b),
            (Int64(a), Double(b)) => (*a as f64).partial_cmp(b),
            (Double(a), Int64(b)) => a.partial_cmp(&(*b as f64)),
            (String(a), String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}
