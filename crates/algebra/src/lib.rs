//! The algebraic expression IR: builds a per-path sequence of matrix
//! multiply/add/transpose expressions from a parsed pattern, optimizes the
//! tree (transpose hoisting, sum-of-products, diagonal detection), and
//! evaluates it against a bound frontier.
//!
//! Grounded in `sparql::algebra`/`sparql::optimizer`'s split between an
//! owned expression tree and a separate rewrite pass over it, generalized
//! from a SPARQL join-order optimizer to matrix-product rewrites.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod builder;
pub mod eval;
pub mod expr;
pub mod optimizer;
pub mod pattern;

pub use builder::build_path;
pub use eval::execute;
pub use expr::{AlgebraicExpression, ExprNode, Operand, OperandSource, PatternNodeIdx, SharedNode};
pub use optimizer::optimize;
pub use pattern::{Direction, PatternEdge, PatternNode, PatternPath};
