//! The pull-based operator pipeline runtime: scan,
//! conditional/variable-length traverse, all-shortest-paths, filter,
//! project, aggregate, unwind, limit/skip, and the write operators
//! (create/merge/merge-create/update/delete), all driven by a single
//! [`record_stream::run`] loop against a shared [`context::QueryContext`].
//!
//! This crate sits directly on top of `algebra` (which supplies the
//! traversal operators' matrix-algebra kernels) and `catalog` (which owns
//! the committed graph state and the two-phase write discipline every
//! writing operator stages into). It does not parse Cypher and does not
//! plan queries — it only executes an already-built operator DAG.

#![deny(unsafe_code)]

pub mod context;
pub mod expr;
pub mod ops;
pub mod record_stream;

pub use context::QueryContext;
pub use expr::{BinOp, Expr, UnOp};
pub use record_stream::{run, Operator};
